use std::collections::HashMap;

use thiserror::Error;

use crate::matcher::MatcherKind;

const API_KEY_ENV: &str = "GITHUB_OPENER_API_KEY";
const API_BASE_ENV: &str = "GITHUB_OPENER_API_BASE";
const MATCHER_ENV: &str = "GITHUB_OPENER_MATCHER";
const FZF_PATH_ENV: &str = "GITHUB_OPENER_FZF_PATH";
const OPEN_COMMAND_ENV: &str = "GITHUB_OPENER_OPEN_COMMAND";

/// Preference id under which the launcher stores the API token.
pub const API_KEY_PREFERENCE: &str = "api_key";
pub const LOG_FILTER_ENV: &str = "GITHUB_OPENER_LOG";
pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_FZF_PATH: &str = "fzf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub api_key: String,
    pub api_base: String,
    pub matcher: MatcherKind,
    pub fzf_path: String,
    /// Application to open URLs with; `None` uses the system default handler.
    pub open_command: Option<String>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_pairs(std::env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env_map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        // Token is used exactly as given; an empty one still goes out and the API rejects it.
        let api_key = env_map.get(API_KEY_ENV).cloned().unwrap_or_default();

        let api_base = parse_api_base(env_map.get(API_BASE_ENV).map(String::as_str))?;
        let matcher = parse_matcher(env_map.get(MATCHER_ENV).map(String::as_str))?;
        let fzf_path = non_empty(env_map.get(FZF_PATH_ENV).map(String::as_str))
            .unwrap_or(DEFAULT_FZF_PATH)
            .to_string();
        let open_command =
            non_empty(env_map.get(OPEN_COMMAND_ENV).map(String::as_str)).map(ToOwned::to_owned);

        Ok(Self {
            api_key,
            api_base,
            matcher,
            fzf_path,
            open_command,
        })
    }
}

fn non_empty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|value| !value.is_empty())
}

fn parse_api_base(raw: Option<&str>) -> Result<String, ConfigError> {
    let Some(value) = non_empty(raw) else {
        return Ok(DEFAULT_API_BASE.to_string());
    };

    if !(value.starts_with("https://") || value.starts_with("http://")) {
        return Err(ConfigError::InvalidApiBase(value.to_string()));
    }

    Ok(value.trim_end_matches('/').to_string())
}

fn parse_matcher(raw: Option<&str>) -> Result<MatcherKind, ConfigError> {
    let Some(value) = non_empty(raw) else {
        return Ok(MatcherKind::Fzf);
    };

    MatcherKind::parse(value).ok_or_else(|| ConfigError::InvalidMatcher(value.to_string()))
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid GITHUB_OPENER_API_BASE: {0} (expected http:// or https:// URL)")]
    InvalidApiBase(String),
    #[error("invalid GITHUB_OPENER_MATCHER: {0} (expected fzf or builtin)")]
    InvalidMatcher(String),
}
