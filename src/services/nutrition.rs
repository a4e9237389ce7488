/// Nutrition analysis service
///
/// Turns a finalized meal set into a fixed-shape nutrition report. Only
/// real items are analyzed; a set with nothing but sentinels yields no
/// report and no network call. Failures are not retried at this layer;
/// credential rotation already happened inside the gateway.
use std::sync::Arc;

use crate::models::{Category, MealSet, NutritionReport};
use crate::services::providers::{gemini::strip_code_fences, TextGenerator};

const SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=10;

pub struct NutritionService {
    generator: Arc<dyn TextGenerator>,
}

impl NutritionService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Analyzes the meal set, or `None` when there is nothing to analyze
    /// or the provider's reply is unusable.
    pub async fn analyze(&self, meal: &MealSet) -> Option<NutritionReport> {
        let items = analyzable_items(meal);
        if items.is_empty() {
            return None;
        }

        let prompt = build_prompt(meal.shop_name().unwrap_or("an unknown shop"), &items);

        let text = match self.generator.generate_json(&prompt).await {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                tracing::error!(error = %e, "nutrition analysis failed");
                return None;
            }
        };

        parse_report(&text)
    }
}

/// Labeled real items across the three categories; sentinels are skipped
fn analyzable_items(meal: &MealSet) -> Vec<String> {
    Category::ALL
        .into_iter()
        .filter_map(|category| {
            meal.slot(category)
                .value
                .as_item()
                .map(|name| format!("{}: {}", category.analysis_label(), name))
        })
        .collect()
}

fn build_prompt(shop: &str, items: &[String]) -> String {
    format!(
        "Role: Thai Nutritionist.\n\
         Analyze this set from {shop}: {items}.\n\
         Output JSON:\n\
         {{\n\
           \"calories\": integer (total kcal),\n\
           \"comment\": \"short witty thai comment\",\n\
           \"health_tip\": \"short thai health tip\",\n\
           \"score\": integer (1-10)\n\
         }}",
        shop = shop,
        items = items.join(", "),
    )
}

/// Strict parse of the four-field report. A score outside 1-10 means the
/// provider ignored the instructions, and the whole report is rejected.
fn parse_report(raw: &str) -> Option<NutritionReport> {
    let cleaned = strip_code_fences(raw);
    let report: NutritionReport = match serde_json::from_str(&cleaned) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "unparsable nutrition payload");
            return None;
        }
    };

    if !SCORE_RANGE.contains(&report.score) {
        tracing::warn!(score = report.score, "nutrition score out of range");
        return None;
    }

    Some(report)
}
