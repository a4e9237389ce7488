/// Menu suggestion service
///
/// Shapes a structured prompt from the shop, the user profile, and the
/// requested categories, and normalizes the provider's untrusted JSON
/// reply into a per-category string mapping. Every gateway failure,
/// credential exhaustion included, degrades to `None` here; the
/// orchestrator never sees a raw provider error.
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::models::{Category, CategorySelection, UserProfile, NOT_APPLICABLE};
use crate::services::providers::{gemini::strip_code_fences, TextGenerator};

pub struct MenuSuggestionService {
    generator: Arc<dyn TextGenerator>,
}

impl MenuSuggestionService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Suggests one item per requested category for the given shop.
    ///
    /// `reroll` narrows the request to a single category regardless of the
    /// selection set. An empty selection with no reroll target is the
    /// legitimate nothing-to-do case: it yields an empty mapping without a
    /// generation call. `None` always means the suggestion failed.
    pub async fn suggest(
        &self,
        shop: &str,
        profile: &UserProfile,
        selection: CategorySelection,
        reroll: Option<Category>,
    ) -> Option<BTreeMap<Category, String>> {
        let requested: Vec<Category> = match reroll {
            Some(category) => vec![category],
            None => selection.selected(),
        };

        if requested.is_empty() {
            return Some(BTreeMap::new());
        }

        let prompt = build_prompt(shop, profile, &requested, reroll.is_some());

        let text = match self.generator.generate_json(&prompt).await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::warn!(shop = %shop, "generation succeeded but returned no candidate text");
                return None;
            }
            Err(e) => {
                tracing::error!(shop = %shop, error = %e, "menu suggestion failed");
                return None;
            }
        };

        let parsed = parse_suggestions(&text, &requested);
        if parsed.is_none() {
            tracing::warn!(shop = %shop, "unparsable menu suggestion payload");
        }
        parsed
    }
}

fn field_hint(category: Category) -> &'static str {
    match category {
        Category::Food => "Thai menu name",
        Category::Drink => "Beverage menu name",
        Category::Dessert => "Dessert menu name",
    }
}

fn build_prompt(
    shop: &str,
    profile: &UserProfile,
    requested: &[Category],
    is_reroll: bool,
) -> String {
    let (task, output_format) = if is_reroll {
        let category = requested[0];
        (
            format!(
                "Look up the menu for \"{}\". Suggest ONLY a recommended \"{}\" item.",
                shop, category
            ),
            format!(
                "Return ONLY a JSON object with a single key: \"{}\". Value MUST be a string.",
                category
            ),
        )
    } else {
        let category_list = requested
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let fields = requested
            .iter()
            .map(|c| format!("\"{}\": \"{}\"", c, field_hint(*c)))
            .collect::<Vec<_>>()
            .join(", ");
        (
            format!(
                "Analyze the REAL restaurant \"{}\" in Thailand. Suggest items for [{}] that ACTUALLY exist on their menu.",
                shop, category_list
            ),
            format!(
                "Return ONLY a JSON object with keys: {}. Values MUST be strings.",
                fields
            ),
        )
    };

    let allergy = if profile.allergy.is_empty() {
        "None"
    } else {
        profile.allergy.as_str()
    };

    format!(
        "Context: You are a Thai local expert.\n\
         Task: {task}\n\
         \n\
         User Profile:\n\
         - Budget: {min} - {max} THB (Allocate this budget across the SELECTED items only)\n\
         - Preferences: Spicy({spicy}/5), Veg({veg}/5)\n\
         - Allergies: {allergy} (STRICTLY AVOID)\n\
         - Exclusions: {exclusions}\n\
         \n\
         {output_format}\n\
         Constraint: If the shop type doesn't support a category (e.g. A coffee shop usually \
         doesn't have Main Food), return \"N/A\" for that key. Do not return objects or arrays \
         as values.",
        task = task,
        min = profile.price_range.min,
        max = profile.price_range.max,
        spicy = profile.spicy,
        veg = profile.veg,
        allergy = allergy,
        exclusions = profile.exclusions.join(", "),
        output_format = output_format,
    )
}

/// Normalizes the raw reply into one string per requested category.
///
/// The provider's output is untrusted: strings pass through, missing and
/// null fields become the "N/A" sentinel, and any other JSON value is
/// stringified. A reply that is not a JSON object at all is a failure.
fn parse_suggestions(
    raw: &str,
    requested: &[Category],
) -> Option<BTreeMap<Category, String>> {
    let cleaned = strip_code_fences(raw);
    let value: serde_json::Value = serde_json::from_str(&cleaned).ok()?;
    let object = value.as_object()?;

    let mut suggestions = BTreeMap::new();
    for category in requested {
        let normalized = match object.get(category.as_str()) {
            None | Some(serde_json::Value::Null) => NOT_APPLICABLE.to_string(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        suggestions.insert(*category, normalized);
    }

    Some(suggestions)
}
