use std::time::Duration;

/// Fixed per-round play budget before auto-submission, in seconds.
pub const DEFAULT_PLAY_DURATION_SECS: u32 = 20;

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the quiz service (round data, metadata, schedule).
    pub service_base_url: String,
    /// Base URL media file names are joined onto.
    pub media_base_url: String,
    pub play_duration_secs: u32,
    /// Schedule statistics poll cadence.
    pub schedule_poll_secs: u64,
    pub request_timeout: Duration,
    /// Clip duration the console shell assumes, since it cannot decode media.
    pub assumed_media_duration_secs: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_base_url: "http://localhost:8000".to_string(),
            media_base_url: "https://nawdist.animemusicquiz.com/".to_string(),
            play_duration_secs: DEFAULT_PLAY_DURATION_SECS,
            schedule_poll_secs: 5,
            request_timeout: Duration::from_secs(30),
            assumed_media_duration_secs: 90.0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            service_base_url: env_trimmed("SERVICE_BASE_URL").unwrap_or(defaults.service_base_url),
            media_base_url: env_trimmed("MEDIA_BASE_URL").unwrap_or(defaults.media_base_url),
            play_duration_secs: env_parsed("PLAY_DURATION_SECS")
                .unwrap_or(defaults.play_duration_secs),
            schedule_poll_secs: env_parsed("SCHEDULE_POLL_SECS")
                .unwrap_or(defaults.schedule_poll_secs),
            request_timeout: env_parsed("REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            assumed_media_duration_secs: env_parsed("ASSUMED_MEDIA_DURATION_SECS")
                .unwrap_or(defaults.assumed_media_duration_secs),
        }
    }
}

fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_trimmed(name).and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_when_env_is_empty() {
        std::env::remove_var("SERVICE_BASE_URL");
        std::env::remove_var("PLAY_DURATION_SECS");

        let config = Config::from_env();
        assert_eq!(config.service_base_url, "http://localhost:8000");
        assert_eq!(config.play_duration_secs, DEFAULT_PLAY_DURATION_SECS);
        assert_eq!(config.schedule_poll_secs, 5);
    }

    #[test]
    #[serial]
    fn env_overrides_and_trims() {
        std::env::set_var("SERVICE_BASE_URL", "  http://quiz.local  ");
        std::env::set_var("PLAY_DURATION_SECS", "30");

        let config = Config::from_env();
        assert_eq!(config.service_base_url, "http://quiz.local");
        assert_eq!(config.play_duration_secs, 30);

        std::env::remove_var("SERVICE_BASE_URL");
        std::env::remove_var("PLAY_DURATION_SECS");
    }

    #[test]
    #[serial]
    fn unparseable_values_fall_back() {
        std::env::set_var("PLAY_DURATION_SECS", "soon");
        let config = Config::from_env();
        assert_eq!(config.play_duration_secs, DEFAULT_PLAY_DURATION_SECS);
        std::env::remove_var("PLAY_DURATION_SECS");
    }
}
