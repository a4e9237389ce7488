/// Randomization orchestrator
///
/// Drives the spin-and-reveal cycle over one session's meal set: the
/// cosmetic candidate ticking, the authoritative shop pick, the single
/// menu suggestion call, the concurrent image fan-out, and independent
/// per-slot rerolls.
///
/// Every cycle takes a fresh version token; all state writes re-check the
/// token under the lock, so a result that arrives after a logically newer
/// cycle has settled is discarded rather than overwriting it. The lock is
/// never held across an await of provider I/O.
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Category, CategorySelection, Favorite, MealSet, NutritionReport, SlotValue, SpinningState,
        UserProfile,
    },
    services::{images::ImageCache, menu::MenuSuggestionService, nutrition::NutritionService},
};

const MAX_FAVORITE_RATING: u8 = 5;

/// Pacing of the reveal cycle. Injected so tests run in milliseconds.
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Interval between cosmetic candidate previews
    pub tick_interval: Duration,
    /// Number of previews before the authoritative pick
    pub tick_budget: u32,
    /// Perceptibility delay before a single-slot reroll resolves
    pub reroll_delay: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(100),
            tick_budget: 10,
            reroll_delay: Duration::from_millis(800),
        }
    }
}

/// Mutable per-session state behind the orchestrator's lock
#[derive(Default)]
struct Session {
    profile: UserProfile,
    selection: CategorySelection,
    candidates: Vec<String>,
    meal: MealSet,
    spinning: SpinningState,
    analysis: Option<NutritionReport>,
    favorites: Vec<Favorite>,
    version: u64,
}

/// Observable session state returned across the API boundary
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub meal: MealSet,
    pub spinning: SpinningState,
    pub selection: CategorySelection,
    pub profile: UserProfile,
    pub analysis: Option<NutritionReport>,
    pub candidates: Vec<String>,
    pub favorites: Vec<Favorite>,
}

enum RerollPlan {
    /// No settled shop (or no pool) to reroll against; run a full cycle
    Redirect,
    Run {
        token: u64,
        shop: String,
        profile: UserProfile,
        selection: CategorySelection,
    },
}

pub struct Randomizer {
    session: RwLock<Session>,
    menu: Arc<MenuSuggestionService>,
    nutrition: Arc<NutritionService>,
    images: Arc<ImageCache>,
    timings: Timings,
}

impl Randomizer {
    pub fn new(
        menu: Arc<MenuSuggestionService>,
        nutrition: Arc<NutritionService>,
        images: Arc<ImageCache>,
        timings: Timings,
    ) -> Self {
        Self {
            session: RwLock::new(Session::default()),
            menu,
            nutrition,
            images,
            timings,
        }
    }

    pub async fn snapshot(&self) -> SessionView {
        let s = self.session.read().await;
        SessionView {
            meal: s.meal.clone(),
            spinning: s.spinning,
            selection: s.selection,
            profile: s.profile.clone(),
            analysis: s.analysis.clone(),
            candidates: s.candidates.clone(),
            favorites: s.favorites.clone(),
        }
    }

    /// Stores a normalized profile; rejects an inverted budget range
    pub async fn set_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let profile = profile.normalized()?;
        let mut s = self.session.write().await;
        s.profile = profile.clone();
        Ok(profile)
    }

    pub async fn profile(&self) -> UserProfile {
        self.session.read().await.profile.clone()
    }

    /// Flips one category in the selection set. Slot values are untouched:
    /// a deselected category simply stops participating in full cycles.
    pub async fn toggle_category(&self, category: Category) -> CategorySelection {
        let mut s = self.session.write().await;
        s.selection.toggle(category);
        s.selection
    }

    /// Adds an item to the banned-exclusions list
    pub async fn ban_item(&self, item: String) -> AppResult<Vec<String>> {
        let item = item.trim().to_string();
        if item.is_empty() {
            return Err(AppError::InvalidInput(
                "cannot ban an empty item name".to_string(),
            ));
        }

        let mut s = self.session.write().await;
        if !s.profile.exclusions.contains(&item) {
            s.profile.exclusions.push(item);
        }
        Ok(s.profile.exclusions.clone())
    }

    /// Replaces the candidate pool with freshly discovered venue names
    pub async fn install_candidates(&self, names: Vec<String>) -> usize {
        let mut s = self.session.write().await;
        s.candidates = names;
        s.candidates.len()
    }

    /// Runs a full randomization cycle to settlement.
    ///
    /// An empty candidate pool makes this a no-op. Otherwise the cycle
    /// previews random candidates for the tick budget, makes an
    /// independent authoritative shop pick, requests one suggestion set
    /// for the selected categories, resolves their images concurrently,
    /// and settles. Failures settle too, with error sentinels; no slot is
    /// ever left spinning.
    pub async fn randomize_all(&self) {
        let Some((token, profile, selection)) = self.begin_full_cycle().await else {
            return;
        };

        for _ in 0..self.timings.tick_budget {
            if !self.show_tick_preview(token).await {
                return;
            }
            tokio::time::sleep(self.timings.tick_interval).await;
        }

        // The tick loop is over before the authoritative pick begins; a
        // stale token here means a newer cycle owns the session.
        let Some(shop) = self.pick_shop(token).await else {
            return;
        };
        tracing::info!(shop = %shop, "authoritative shop pick");

        match self.menu.suggest(&shop, &profile, selection, None).await {
            Some(menu) => {
                let resolved = self.resolve_slot_images(selection, &menu).await;

                let mut s = self.session.write().await;
                if s.version != token {
                    tracing::debug!("discarding superseded full randomization");
                    return;
                }
                s.meal.shop = SlotValue::Item(shop);
                for (category, value, image) in resolved {
                    let slot = s.meal.slot_mut(category);
                    slot.value = value;
                    slot.image_url = image;
                }
                s.spinning.clear();
            }
            None => {
                let mut s = self.session.write().await;
                if s.version != token {
                    return;
                }
                s.meal.shop = SlotValue::Error;
                for category in selection.selected() {
                    let slot = s.meal.slot_mut(category);
                    slot.value = SlotValue::Error;
                    slot.image_url = None;
                }
                s.spinning.clear();
            }
        }
    }

    /// Rerolls a single slot against the already-settled shop.
    ///
    /// Without a settled shop (or with an empty pool) the request becomes
    /// a full randomization instead. Only the targeted slot changes;
    /// failure marks only that slot.
    pub async fn reroll_slot(&self, category: Category) {
        let plan = {
            let mut s = self.session.write().await;
            match s.meal.shop_name().map(str::to_string) {
                Some(shop) if !s.candidates.is_empty() => {
                    s.version += 1;
                    s.analysis = None;
                    s.spinning.set(category, true);
                    s.meal.slot_mut(category).value = SlotValue::Pending;
                    RerollPlan::Run {
                        token: s.version,
                        shop,
                        profile: s.profile.clone(),
                        selection: s.selection,
                    }
                }
                _ => RerollPlan::Redirect,
            }
        };

        let RerollPlan::Run {
            token,
            shop,
            profile,
            selection,
        } = plan
        else {
            return self.randomize_all().await;
        };

        tokio::time::sleep(self.timings.reroll_delay).await;

        let outcome = match self
            .menu
            .suggest(&shop, &profile, selection, Some(category))
            .await
        {
            Some(menu) => {
                let value = normalized_slot_value(&menu, category);
                let image = match value.as_item() {
                    Some(name) => self.images.resolve(name).await,
                    None => None,
                };
                Some((value, image))
            }
            None => None,
        };

        let mut s = self.session.write().await;
        if s.version != token {
            tracing::debug!(category = %category, "discarding stale slot reroll");
            return;
        }
        let slot = s.meal.slot_mut(category);
        match outcome {
            Some((value, image)) => {
                slot.value = value;
                slot.image_url = image;
            }
            None => {
                slot.value = SlotValue::Error;
            }
        }
        s.spinning.set(category, false);
    }

    /// Analyzes the current meal set and stores the report.
    ///
    /// The report is dropped (and `None` returned) if any randomization
    /// superseded the meal while the analysis was in flight.
    pub async fn analyze(&self) -> Option<NutritionReport> {
        let (token, meal) = {
            let s = self.session.read().await;
            (s.version, s.meal.clone())
        };

        let report = self.nutrition.analyze(&meal).await?;

        let mut s = self.session.write().await;
        if s.version != token {
            tracing::debug!("discarding stale nutrition report");
            return None;
        }
        s.analysis = Some(report.clone());
        Some(report)
    }

    /// Copies a settled slot into the favorites list
    pub async fn add_favorite(&self, category: Category) -> AppResult<Favorite> {
        let mut s = self.session.write().await;

        let (name, image_url, shop) = {
            let slot = s.meal.slot(category);
            let Some(name) = slot.value.as_item() else {
                return Err(AppError::InvalidInput(format!(
                    "the {} slot has no settled item to favorite",
                    category
                )));
            };
            (
                name.to_string(),
                slot.image_url.clone(),
                s.meal.shop_name().map(str::to_string),
            )
        };

        if s.favorites.iter().any(|f| f.name == name) {
            return Err(AppError::InvalidInput(format!(
                "\"{}\" is already a favorite",
                name
            )));
        }

        let favorite = Favorite::new(category, name, image_url, shop);
        s.favorites.push(favorite.clone());
        Ok(favorite)
    }

    pub async fn remove_favorite(&self, id: Uuid) -> AppResult<()> {
        let mut s = self.session.write().await;
        let before = s.favorites.len();
        s.favorites.retain(|f| f.id != id);
        if s.favorites.len() == before {
            return Err(AppError::NotFound(format!("favorite {} not found", id)));
        }
        Ok(())
    }

    pub async fn review_favorite(
        &self,
        id: Uuid,
        rating: u8,
        comment: String,
    ) -> AppResult<Favorite> {
        let mut s = self.session.write().await;
        let favorite = s
            .favorites
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::NotFound(format!("favorite {} not found", id)))?;

        favorite.rating = rating.min(MAX_FAVORITE_RATING);
        favorite.comment = comment;
        Ok(favorite.clone())
    }

    /// Opens a full cycle: bumps the version, flags the participating
    /// slots, clears the stale analysis. `None` when the pool is empty.
    async fn begin_full_cycle(&self) -> Option<(u64, UserProfile, CategorySelection)> {
        let mut s = self.session.write().await;
        if s.candidates.is_empty() {
            tracing::debug!("randomize requested with an empty candidate pool");
            return None;
        }

        s.version += 1;
        let token = s.version;
        s.analysis = None;
        s.spinning.shop = true;
        s.meal.shop = SlotValue::Pending;

        let selection = s.selection;
        for category in selection.selected() {
            s.spinning.set(category, true);
            s.meal.slot_mut(category).value = SlotValue::Pending;
        }

        Some((token, s.profile.clone(), selection))
    }

    /// Writes one transient candidate preview into the shop slot.
    /// Returns false when the cycle has been superseded.
    async fn show_tick_preview(&self, token: u64) -> bool {
        let mut s = self.session.write().await;
        if s.version != token {
            return false;
        }
        if let Some(preview) = pick(&s.candidates).cloned() {
            s.meal.shop = SlotValue::Item(preview);
        }
        true
    }

    /// Fresh uniform draw for the authoritative pick, independent of
    /// whatever the ticks previewed
    async fn pick_shop(&self, token: u64) -> Option<String> {
        let s = self.session.read().await;
        if s.version != token {
            return None;
        }
        pick(&s.candidates).cloned()
    }

    /// Resolves slot values and their images; lookups run concurrently
    /// and partial failures leave individual images unset.
    async fn resolve_slot_images(
        &self,
        selection: CategorySelection,
        menu: &BTreeMap<Category, String>,
    ) -> Vec<(Category, SlotValue, Option<String>)> {
        let mut pending = Vec::new();
        for category in selection.selected() {
            let value = normalized_slot_value(menu, category);
            let lookup = value.as_item().map(|name| {
                let images = Arc::clone(&self.images);
                let query = name.to_string();
                tokio::spawn(async move { images.resolve(&query).await })
            });
            pending.push((category, value, lookup));
        }

        let mut resolved = Vec::new();
        for (category, value, lookup) in pending {
            let image = match lookup {
                Some(handle) => handle.await.unwrap_or(None),
                None => None,
            };
            resolved.push((category, value, image));
        }
        resolved
    }
}

fn normalized_slot_value(menu: &BTreeMap<Category, String>, category: Category) -> SlotValue {
    menu.get(&category)
        .map(|raw| SlotValue::from_provider(raw))
        .unwrap_or(SlotValue::NotApplicable)
}

fn pick(pool: &[String]) -> Option<&String> {
    if pool.is_empty() {
        return None;
    }
    Some(&pool[rand::thread_rng().gen_range(0..pool.len())])
}
