//! Runtime configuration read from the environment (and `.env`, if present).

use std::path::PathBuf;

use crate::core::errors::{AppError, AppResult};

pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MAX_TRANSCRIPT_CHARS: usize = 20_000;
pub const DEFAULT_BLOG_TABLE: &str = "Blog Posts";
pub const DEFAULT_ORIGIN: &str = "https://claropdf.com";

/// What to do when the model output has no recoverable analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizePolicy {
    /// Fill in defaults and keep going.
    #[default]
    Lenient,
    /// Fail with a description of the missing fields.
    Strict,
}

impl NormalizePolicy {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(AppError::Config(format!(
                "DATACLARO_NORMALIZE must be `lenient` or `strict`, got `{other}`"
            ))),
        }
    }
}

/// Key the prompt asks the model to use for the recommendations list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListKey {
    #[default]
    ActionItems,
    Takeaways,
}

impl ListKey {
    pub fn parse(raw: &str) -> AppResult<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "action_items" => Ok(Self::ActionItems),
            "takeaways" => Ok(Self::Takeaways),
            other => Err(AppError::Config(format!(
                "DATACLARO_LIST_KEY must be `action_items` or `takeaways`, got `{other}`"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActionItems => "action_items",
            Self::Takeaways => "takeaways",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Clone)]
pub struct AirtableConfig {
    pub api_key: String,
    pub base_id: String,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub groq_api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub max_transcript_chars: usize,
    pub normalize_policy: NormalizePolicy,
    pub list_key: ListKey,
    pub data_dir: Option<PathBuf>,
    pub origin: String,
    pub supabase: Option<SupabaseConfig>,
    pub airtable: Option<AirtableConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            groq_api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            max_transcript_chars: DEFAULT_MAX_TRANSCRIPT_CHARS,
            normalize_policy: NormalizePolicy::default(),
            list_key: ListKey::default(),
            data_dir: None,
            origin: DEFAULT_ORIGIN.to_string(),
            supabase: None,
            airtable: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup so tests don't have to
    /// touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let max_transcript_chars = match get("DATACLARO_MAX_TRANSCRIPT_CHARS") {
            Some(raw) => {
                let parsed = raw.trim().parse::<usize>().map_err(|err| {
                    AppError::Config(format!("DATACLARO_MAX_TRANSCRIPT_CHARS `{raw}`: {err}"))
                })?;
                if parsed == 0 {
                    return Err(AppError::Config(
                        "DATACLARO_MAX_TRANSCRIPT_CHARS must be greater than zero".to_string(),
                    ));
                }
                parsed
            }
            None => defaults.max_transcript_chars,
        };

        let normalize_policy = match get("DATACLARO_NORMALIZE") {
            Some(raw) => NormalizePolicy::parse(&raw)?,
            None => defaults.normalize_policy,
        };
        let list_key = match get("DATACLARO_LIST_KEY") {
            Some(raw) => ListKey::parse(&raw)?,
            None => defaults.list_key,
        };

        let supabase = match (get("SUPABASE_URL"), get("SUPABASE_ANON_KEY")) {
            (Some(url), Some(anon_key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            }),
            (None, None) => None,
            _ => {
                return Err(AppError::Config(
                    "SUPABASE_URL and SUPABASE_ANON_KEY must be set together".to_string(),
                ))
            }
        };

        let airtable = match (get("AIRTABLE_API_KEY"), get("AIRTABLE_BASE_ID")) {
            (Some(api_key), Some(base_id)) => Some(AirtableConfig {
                api_key,
                base_id,
                table: get("AIRTABLE_TABLE").unwrap_or_else(|| DEFAULT_BLOG_TABLE.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            groq_api_key: get("GROQ_API_KEY"),
            model: get("DATACLARO_MODEL").unwrap_or(defaults.model),
            api_base: get("DATACLARO_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            max_transcript_chars,
            normalize_policy,
            list_key,
            data_dir: get("DATACLARO_DATA_DIR").map(PathBuf::from),
            origin: get("DATACLARO_ORIGIN")
                .map(|origin| origin.trim_end_matches('/').to_string())
                .unwrap_or(defaults.origin),
            supabase,
            airtable,
        })
    }
}
