use std::sync::Arc;

use crate::services::LanguageModelService;

/// Explicit bundle of the long-lived collaborators, constructed once in
/// `run()` and passed down by reference. No ambient singletons.
#[derive(Clone)]
pub struct AppContext {
    pub language_model: Arc<dyn LanguageModelService>,
}

impl AppContext {
    pub fn new(language_model: Arc<dyn LanguageModelService>) -> Self {
        Self { language_model }
    }
}
