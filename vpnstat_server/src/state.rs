//! Shared collector state handed to every handler.

use std::sync::Arc;

use crate::gateway::Collector;

#[derive(Clone)]
pub struct AppState {
    pub collector: Arc<Collector>,
    pub bot_token: Arc<str>,
}

impl AppState {
    pub fn new(collector: Collector, bot_token: impl Into<Arc<str>>) -> Self {
        Self {
            collector: Arc::new(collector),
            bot_token: bot_token.into(),
        }
    }
}
