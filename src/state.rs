use std::sync::Arc;

use crate::config::AppConfig;
use crate::openai::client::{CompletionClient, OpenAiClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub completions: Arc<dyn CompletionClient>,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let completions =
            Arc::new(OpenAiClient::new(&config.openai)?) as Arc<dyn CompletionClient>;
        Ok(Self {
            config,
            completions,
        })
    }

    pub fn from_parts(config: Arc<AppConfig>, completions: Arc<dyn CompletionClient>) -> Self {
        Self {
            config,
            completions,
        }
    }
}
