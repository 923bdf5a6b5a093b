use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_FLASH_MODEL: &str = "gemini-3-flash-preview";
const DEFAULT_PRO_MODEL: &str = "gemini-3-pro-preview";
const DEFAULT_ANALYSIS_THINKING_BUDGET: u32 = 8192;
const MAX_THINKING_BUDGET: u32 = 32768;
const APP_DIR: &str = "statimatch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub fixtures_model: String,
    pub booking_model: String,
    pub analysis_model: String,
    pub analysis_fallback_model: String,
    pub fixtures_thinking_budget: Option<u32>,
    pub analysis_thinking_budget: Option<u32>,
    pub request_timeout: Option<Duration>,
    pub demo: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            fixtures_model: DEFAULT_FLASH_MODEL.to_string(),
            booking_model: DEFAULT_FLASH_MODEL.to_string(),
            analysis_model: DEFAULT_PRO_MODEL.to_string(),
            analysis_fallback_model: DEFAULT_FLASH_MODEL.to_string(),
            fixtures_thinking_budget: None,
            analysis_thinking_budget: Some(DEFAULT_ANALYSIS_THINKING_BUDGET),
            request_timeout: None,
            demo: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_key = env_string("GEMINI_API_KEY").or_else(|| env_string("API_KEY"));
        let demo = env_bool("STATIMATCH_DEMO", false) || api_key.is_none();
        let request_timeout = env::var("STATIMATCH_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            api_key,
            base_url: env_string("GEMINI_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            fixtures_model: env_string("STATIMATCH_FIXTURES_MODEL")
                .unwrap_or_else(|| DEFAULT_FLASH_MODEL.to_string()),
            booking_model: env_string("STATIMATCH_BOOKING_MODEL")
                .unwrap_or_else(|| DEFAULT_FLASH_MODEL.to_string()),
            analysis_model: env_string("STATIMATCH_ANALYSIS_MODEL")
                .unwrap_or_else(|| DEFAULT_PRO_MODEL.to_string()),
            analysis_fallback_model: env_string("STATIMATCH_ANALYSIS_FALLBACK_MODEL")
                .unwrap_or_else(|| DEFAULT_FLASH_MODEL.to_string()),
            fixtures_thinking_budget: thinking_budget(
                env::var("STATIMATCH_FIXTURES_THINKING_BUDGET").ok().as_deref(),
                0,
            ),
            analysis_thinking_budget: thinking_budget(
                env::var("STATIMATCH_ANALYSIS_THINKING_BUDGET").ok().as_deref(),
                DEFAULT_ANALYSIS_THINKING_BUDGET,
            ),
            request_timeout,
            demo,
        }
    }
}

/// `0` leaves the budget to the model.
fn thinking_budget(raw: Option<&str>, default: u32) -> Option<u32> {
    let budget = raw
        .and_then(|val| val.trim().parse::<u32>().ok())
        .unwrap_or(default)
        .min(MAX_THINKING_BUDGET);
    (budget > 0).then_some(budget)
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(val) => matches!(
            val.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

pub fn log_dir() -> PathBuf {
    if let Some(dir) = env_string("STATIMATCH_LOG_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(base) = env_string("XDG_STATE_HOME") {
        return PathBuf::from(base).join(APP_DIR);
    }
    if let Some(home) = env_string("HOME") {
        return PathBuf::from(home).join(".local").join("state").join(APP_DIR);
    }
    PathBuf::from("logs")
}

pub fn cache_dir() -> Option<PathBuf> {
    if let Some(base) = env_string("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env_string("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thinking_budget_defaults_and_clamps() {
        assert_eq!(thinking_budget(None, 8192), Some(8192));
        assert_eq!(thinking_budget(Some("0"), 8192), None);
        assert_eq!(thinking_budget(Some("abc"), 0), None);
        assert_eq!(thinking_budget(Some(" 1024 "), 0), Some(1024));
        assert_eq!(thinking_budget(Some("999999"), 0), Some(MAX_THINKING_BUDGET));
    }

    #[test]
    fn default_tiers_pair_pro_with_flash() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.analysis_model, DEFAULT_PRO_MODEL);
        assert_eq!(cfg.analysis_fallback_model, DEFAULT_FLASH_MODEL);
        assert!(cfg.request_timeout.is_none());
    }
}
