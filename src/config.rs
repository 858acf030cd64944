use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub vision_model: String,
    pub chat_model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub openai: OpenAiConfig,
    pub port: u16,
    pub cors_origin: String,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let openai = OpenAiConfig {
            api_key: std::env::var("OPENAI_API_KEY")?,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
            vision_model: std::env::var("OPENAI_MODEL_VISION")
                .unwrap_or_else(|_| "gpt-4o-mini".into()),
            chat_model: std::env::var("OPENAI_MODEL_CHAT")
                .unwrap_or_else(|_| "gpt-4-turbo-preview".into()),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT_SECONDS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60),
        };
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(3000);
        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".into());
        let environment = std::env::var("NODE_ENV").unwrap_or_else(|_| "development".into());
        Ok(Self {
            openai,
            port,
            cors_origin,
            environment,
        })
    }
}
