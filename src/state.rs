use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    services::{
        images::ImageCache,
        menu::MenuSuggestionService,
        nutrition::NutritionService,
        providers::{
            gemini::{HttpGenerationBackend, KeyRotationGateway},
            overpass::OverpassClient,
            unsplash::UnsplashClient,
            ImageSearcher, TextGenerator,
        },
        randomizer::{Randomizer, Timings},
    },
};

/// Shared application state: the session registry plus the provider
/// bundle every session draws from.
///
/// Sessions are independent orchestrators; the generation gateway and the
/// photo searcher are shared, but each session owns its meal state and
/// its image cache (cache lifecycle is tied to the session).
#[derive(Clone)]
pub struct AppState {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Randomizer>>>>,
    generator: Arc<dyn TextGenerator>,
    image_searcher: Arc<dyn ImageSearcher>,
    pub places: Arc<OverpassClient>,
    timings: Timings,
}

impl AppState {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        image_searcher: Arc<dyn ImageSearcher>,
        places: Arc<OverpassClient>,
        timings: Timings,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            generator,
            image_searcher,
            places,
            timings,
        }
    }

    /// Wires the real provider stack from configuration
    pub fn from_config(config: &Config) -> Self {
        let backend = HttpGenerationBackend::new(
            config.gemini_api_url.clone(),
            config.gemini_model.clone(),
        );
        let gateway =
            KeyRotationGateway::from_delimited(Arc::new(backend), &config.gemini_api_keys);

        Self::new(
            Arc::new(gateway),
            Arc::new(UnsplashClient::new(
                config.unsplash_api_url.clone(),
                config.unsplash_access_key.clone(),
            )),
            Arc::new(OverpassClient::new(config.overpass_api_url.clone())),
            Timings::default(),
        )
    }

    /// Creates a session with its own meal state and image cache
    pub async fn create_session(&self) -> (Uuid, Arc<Randomizer>) {
        let menu = Arc::new(MenuSuggestionService::new(Arc::clone(&self.generator)));
        let nutrition = Arc::new(NutritionService::new(Arc::clone(&self.generator)));
        let images = Arc::new(ImageCache::new(Arc::clone(&self.image_searcher)));
        let randomizer = Arc::new(Randomizer::new(menu, nutrition, images, self.timings));

        let id = Uuid::new_v4();
        self.sessions
            .write()
            .await
            .insert(id, Arc::clone(&randomizer));

        tracing::info!(session_id = %id, "session created");
        (id, randomizer)
    }

    pub async fn session(&self, id: Uuid) -> AppResult<Arc<Randomizer>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("session {} not found", id)))
    }
}
