use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One of the three randomizable menu categories.
///
/// The shop slot is tracked separately: it is picked from the candidate
/// pool rather than suggested by the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Drink,
    Dessert,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Food, Category::Drink, Category::Dessert];

    /// Key used in prompts and provider JSON objects
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Drink => "drink",
            Category::Dessert => "dessert",
        }
    }

    /// Label used when listing items for nutrition analysis
    pub fn analysis_label(&self) -> &'static str {
        match self {
            Category::Food => "Main",
            Category::Drink => "Drink",
            Category::Dessert => "Dessert",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which categories the next full randomization should fill.
///
/// All three default to on. An empty selection is legal: a full
/// randomization then settles the shop and leaves every slot untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    pub food: bool,
    pub drink: bool,
    pub dessert: bool,
}

impl Default for CategorySelection {
    fn default() -> Self {
        Self {
            food: true,
            drink: true,
            dessert: true,
        }
    }
}

impl CategorySelection {
    pub fn contains(&self, category: Category) -> bool {
        match category {
            Category::Food => self.food,
            Category::Drink => self.drink,
            Category::Dessert => self.dessert,
        }
    }

    pub fn toggle(&mut self, category: Category) {
        match category {
            Category::Food => self.food = !self.food,
            Category::Drink => self.drink = !self.drink,
            Category::Dessert => self.dessert = !self.dessert,
        }
    }

    /// Selected categories in canonical order
    pub fn selected(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.contains(*c))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        !self.food && !self.drink && !self.dessert
    }
}
