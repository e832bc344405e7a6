use moka::future::Cache;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::{TemplateService, TemplateServiceClient};
use crate::config::AppConfig;
use crate::session::FormSession;
use crate::store::{ActiveSpecCache, FileSpecStore, SpecStore};

pub type SessionHandle = Arc<Mutex<FormSession>>;

const MAX_SESSIONS: u64 = 10_000;

/// Shared across actix workers; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub templates: Arc<dyn TemplateService>,
    pub active_spec: ActiveSpecCache,
    pub sessions: Cache<Uuid, SessionHandle>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(std::time::Duration::from_secs(900))
            .timeout(config.http_timeout)
            .user_agent(concat!("docform/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let templates = Arc::new(TemplateServiceClient::new(
            config.template_api_url.clone(),
            http_client,
        ));
        let store = Arc::new(FileSpecStore::new(&config.spec_store_dir));

        Ok(Self::with_parts(config, templates, store))
    }

    /// Assembles the state from explicit collaborators.
    pub fn with_parts(
        config: AppConfig,
        templates: Arc<dyn TemplateService>,
        store: Arc<dyn SpecStore>,
    ) -> Self {
        let sessions = Cache::builder()
            .time_to_idle(config.session_idle)
            .max_capacity(MAX_SESSIONS)
            .eviction_listener(|id: Arc<Uuid>, _, cause| {
                log::info!("Form session {} discarded ({:?})", id, cause);
            })
            .build();

        Self {
            config: Arc::new(config),
            templates,
            active_spec: ActiveSpecCache::new(store),
            sessions,
        }
    }
}
