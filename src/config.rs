use std::time::Duration;

/// Runtime configuration, read once at startup and passed explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub provider_url: String,
    pub default_voice: String,
    pub synthesis_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .ok()
            .map(|v| v.parse().map_err(|_| format!("PORT is not a number: {v}")))
            .transpose()?
            .unwrap_or(5000);

        let provider_url = std::env::var("TTS_PROVIDER_URL")
            .map_err(|_| "TTS_PROVIDER_URL must be set".to_string())?
            .trim_end_matches('/')
            .to_string();

        let default_voice = std::env::var("DEFAULT_VOICE")
            .unwrap_or_else(|_| "en-US-AriaNeural".to_string());

        let synthesis_timeout_secs = std::env::var("SYNTHESIS_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Self {
            host,
            port,
            provider_url,
            default_voice,
            synthesis_timeout_secs,
        })
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test touching process env, so no var races between tests.
    #[test]
    fn from_env_applies_defaults_and_trims_provider_url() {
        std::env::set_var("TTS_PROVIDER_URL", "http://tts.internal:8080/");
        std::env::remove_var("HOST");
        std::env::remove_var("PORT");
        std::env::remove_var("DEFAULT_VOICE");
        std::env::remove_var("SYNTHESIS_TIMEOUT_SECS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.provider_url, "http://tts.internal:8080");
        assert_eq!(config.default_voice, "en-US-AriaNeural");
        assert_eq!(config.synthesis_timeout(), Duration::from_secs(60));
    }
}
