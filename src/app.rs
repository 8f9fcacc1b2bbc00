// Application state shared across handlers
use std::sync::Arc;

use crate::{app_config::AppConfig, cache::UrlCache, services::UrlFilterService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub url_filter: Arc<UrlFilterService>,
    pub cache: Arc<dyn UrlCache>,
}
