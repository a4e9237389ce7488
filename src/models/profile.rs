use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Lowest and highest accepted per-meal budget, in local currency units
pub const PRICE_FLOOR: u32 = 1;
pub const PRICE_CEILING: u32 = 999;

/// Search radius bounds in kilometers
pub const RADIUS_MIN_KM: f64 = 1.0;
pub const RADIUS_MAX_KM: f64 = 10.0;

const SCORE_MIN: u8 = 1;
const SCORE_MAX: u8 = 5;

/// Per-meal budget range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u32,
    pub max: u32,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self { min: 50, max: 300 }
    }
}

/// User preference profile consumed read-only by the orchestrator.
///
/// Scores are 1-5 with 3 meaning indifferent; they default when the
/// questionnaire was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Spice tolerance score
    #[serde(default = "default_score")]
    pub spicy: u8,

    /// Vegetable preference score
    #[serde(default = "default_score")]
    pub veg: u8,

    #[serde(default)]
    pub price_range: PriceRange,

    /// Venue search radius in kilometers
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,

    /// Free-text allergies, strictly avoided in suggestions
    #[serde(default)]
    pub allergy: String,

    /// Item names the user has banned from future suggestions
    #[serde(default)]
    pub exclusions: Vec<String>,
}

fn default_score() -> u8 {
    3
}

fn default_radius_km() -> f64 {
    1.0
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            spicy: default_score(),
            veg: default_score(),
            price_range: PriceRange::default(),
            radius_km: default_radius_km(),
            allergy: String::new(),
            exclusions: Vec::new(),
        }
    }
}

impl UserProfile {
    /// Clamps every field into its legal range and rejects an inverted
    /// budget. Runs before a profile is stored, so downstream prompt
    /// building never sees out-of-range values.
    pub fn normalized(mut self) -> AppResult<Self> {
        self.spicy = self.spicy.clamp(SCORE_MIN, SCORE_MAX);
        self.veg = self.veg.clamp(SCORE_MIN, SCORE_MAX);
        self.radius_km = self.radius_km.clamp(RADIUS_MIN_KM, RADIUS_MAX_KM);

        self.price_range.min = self.price_range.min.clamp(PRICE_FLOOR, PRICE_CEILING);
        self.price_range.max = self.price_range.max.clamp(PRICE_FLOOR, PRICE_CEILING);
        if self.price_range.min >= self.price_range.max {
            return Err(AppError::InvalidInput(format!(
                "price range minimum {} must be below maximum {}",
                self.price_range.min, self.price_range.max
            )));
        }

        Ok(self)
    }

    /// Search radius converted for the place discovery query
    pub fn radius_meters(&self) -> u32 {
        (self.radius_km * 1000.0) as u32
    }
}
