mod category;
mod meal;
mod profile;

pub use category::{Category, CategorySelection};
pub use meal::{
    Favorite, MealSet, MealSlot, NutritionReport, SlotValue, SpinningState, ERROR_SENTINEL,
    NOT_APPLICABLE,
};
pub use profile::{PriceRange, UserProfile, PRICE_CEILING, PRICE_FLOOR};
