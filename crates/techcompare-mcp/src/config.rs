use std::time::Duration;

use techcompare_engine::{GeminiConfig, NarrativeProviderConfig, OpenAiCompatibleConfig};

pub const DEFAULT_DB_PATH: &str = "./data/catalog.json";
pub const DEFAULT_CACHE_CAPACITY: usize = 256;
pub const DEFAULT_NARRATIVE_TIMEOUT_MS: u64 = 8_000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: String,
    /// Zero disables the comparison cache.
    pub cache_capacity: usize,
    pub narrative_timeout: Duration,
}

impl ServerConfig {
    pub fn with_db_path(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            narrative_timeout: Duration::from_millis(DEFAULT_NARRATIVE_TIMEOUT_MS),
        }
    }

    pub fn from_env() -> Self {
        let db_path =
            std::env::var("TECHCOMPARE_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
        Self {
            db_path,
            cache_capacity: env_usize(
                "TECHCOMPARE_CACHE_CAPACITY",
                DEFAULT_CACHE_CAPACITY,
                0,
                10_000,
            ),
            narrative_timeout: Duration::from_millis(env_u64(
                "TECHCOMPARE_NARRATIVE_TIMEOUT_MS",
                DEFAULT_NARRATIVE_TIMEOUT_MS,
                100,
                60_000,
            )),
        }
    }
}

/// Narrative provider selected by `TECHCOMPARE_NARRATIVE_PROVIDER`.
/// `Ok(None)` means narratives are switched off.
pub fn narrative_config_from_env(
    timeout: Duration,
) -> Result<Option<NarrativeProviderConfig>, String> {
    let provider = std::env::var("TECHCOMPARE_NARRATIVE_PROVIDER")
        .unwrap_or_else(|_| "none".to_string())
        .trim()
        .to_ascii_lowercase();

    match provider.as_str() {
        "" | "none" | "off" => Ok(None),
        "openai-compatible" | "openai" => {
            let api_key = std::env::var("TECHCOMPARE_NARRATIVE_API_KEY")
                .or_else(|_| std::env::var("OPENAI_API_KEY"))
                .map_err(|_| {
                    "TECHCOMPARE_NARRATIVE_API_KEY or OPENAI_API_KEY is required".to_string()
                })?;
            let model = std::env::var("TECHCOMPARE_NARRATIVE_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string());
            let mut cfg = OpenAiCompatibleConfig::new(api_key, model);
            if let Ok(base_url) = std::env::var("TECHCOMPARE_NARRATIVE_BASE_URL") {
                cfg.base_url = base_url;
            }
            cfg.timeout = timeout;
            Ok(Some(NarrativeProviderConfig::OpenAiCompatible(cfg)))
        }
        "gemini" => {
            let api_key = std::env::var("TECHCOMPARE_NARRATIVE_API_KEY")
                .or_else(|_| std::env::var("GEMINI_API_KEY"))
                .map_err(|_| {
                    "TECHCOMPARE_NARRATIVE_API_KEY or GEMINI_API_KEY is required".to_string()
                })?;
            let model = std::env::var("TECHCOMPARE_NARRATIVE_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string());
            let mut cfg = GeminiConfig::new(api_key, model);
            if let Ok(base_url) = std::env::var("TECHCOMPARE_NARRATIVE_BASE_URL") {
                cfg.base_url = base_url;
            }
            cfg.timeout = timeout;
            Ok(Some(NarrativeProviderConfig::Gemini(cfg)))
        }
        other => Err(format!(
            "unknown TECHCOMPARE_NARRATIVE_PROVIDER '{other}' (none, openai-compatible, gemini)"
        )),
    }
}

fn env_usize(name: &str, default: usize, min: usize, max: usize) -> usize {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}

fn env_u64(name: &str, default: u64, min: u64, max: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
        .clamp(min, max)
}
