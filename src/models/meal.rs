use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

use super::Category;

/// Provider sentinel meaning "this category does not apply to this shop"
pub const NOT_APPLICABLE: &str = "N/A";

/// Sentinel shown in a slot whose lookup failed. The image cache refuses
/// queries containing this marker, so error text never hits the photo API.
pub const ERROR_SENTINEL: &str = "Error";

/// Value of a single meal slot.
///
/// The four outcomes are deliberately distinct: `Pending` (not yet
/// decided), `NotApplicable` (the shop has no such category), `Item` (a
/// real suggestion), and `Error` (the lookup failed). Callers must
/// distinguish them before rendering or favoriting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotValue {
    #[default]
    Pending,
    NotApplicable,
    Item(String),
    Error,
}

impl SlotValue {
    /// Maps a normalized provider string onto a slot value. Provider
    /// output is untrusted: the empty string and the "N/A" sentinel both
    /// mean the category is inapplicable.
    pub fn from_provider(raw: &str) -> Self {
        if raw.is_empty() || raw == NOT_APPLICABLE {
            SlotValue::NotApplicable
        } else {
            SlotValue::Item(raw.to_string())
        }
    }

    /// The item name, when the slot holds a real suggestion
    pub fn as_item(&self) -> Option<&str> {
        match self {
            SlotValue::Item(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_item(&self) -> bool {
        matches!(self, SlotValue::Item(_))
    }
}

// Wire shape mirrors the sentinels the UI layer expects: null for
// pending, "N/A", the item string, or the error marker.
impl Serialize for SlotValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SlotValue::Pending => serializer.serialize_none(),
            SlotValue::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
            SlotValue::Item(name) => serializer.serialize_str(name),
            SlotValue::Error => serializer.serialize_str(ERROR_SENTINEL),
        }
    }
}

/// One randomizable slot: the chosen item plus its photo, if any
#[derive(Debug, Clone, Default, Serialize)]
pub struct MealSlot {
    pub value: SlotValue,
    pub image_url: Option<String>,
}

/// The per-session meal set: one slot per category plus the shop
#[derive(Debug, Clone, Default, Serialize)]
pub struct MealSet {
    pub food: MealSlot,
    pub drink: MealSlot,
    pub dessert: MealSlot,
    pub shop: SlotValue,
}

impl MealSet {
    pub fn slot(&self, category: Category) -> &MealSlot {
        match category {
            Category::Food => &self.food,
            Category::Drink => &self.drink,
            Category::Dessert => &self.dessert,
        }
    }

    pub fn slot_mut(&mut self, category: Category) -> &mut MealSlot {
        match category {
            Category::Food => &mut self.food,
            Category::Drink => &mut self.drink,
            Category::Dessert => &mut self.dessert,
        }
    }

    /// The settled shop name, if one has been picked
    pub fn shop_name(&self) -> Option<&str> {
        self.shop.as_item()
    }
}

/// Per-slot animation flags for the reveal state machine. Purely
/// cosmetic: never authoritative over the meal set contents.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SpinningState {
    pub food: bool,
    pub drink: bool,
    pub dessert: bool,
    pub shop: bool,
}

impl SpinningState {
    pub fn set(&mut self, category: Category, spinning: bool) {
        match category {
            Category::Food => self.food = spinning,
            Category::Drink => self.drink = spinning,
            Category::Dessert => self.dessert = spinning,
        }
    }

    pub fn clear(&mut self) {
        *self = SpinningState::default();
    }

    pub fn any(&self) -> bool {
        self.food || self.drink || self.dessert || self.shop
    }
}

/// Nutrition commentary for a finalized meal set.
///
/// A report is only trustworthy for the exact meal it was computed from;
/// the orchestrator discards it whenever any slot changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionReport {
    /// Estimated total kilocalories
    pub calories: u32,
    pub comment: String,
    pub health_tip: String,
    /// Healthiness score, 1-10
    pub score: u8,
}

/// A user-curated copy of a meal slot. Survives re-randomization.
#[derive(Debug, Clone, Serialize)]
pub struct Favorite {
    pub id: Uuid,
    pub category: Category,
    pub name: String,
    pub image_url: Option<String>,
    pub shop: Option<String>,
    pub rating: u8,
    pub comment: String,
    pub saved_at: DateTime<Utc>,
}

impl Favorite {
    pub fn new(
        category: Category,
        name: String,
        image_url: Option<String>,
        shop: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category,
            name,
            image_url,
            shop,
            rating: 0,
            comment: String::new(),
            saved_at: Utc::now(),
        }
    }
}
