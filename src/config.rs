use crate::error::{Error, Result};
use reqwest::Url;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.mailgun.net/v3";

pub const ENV_BASE_URL: &str = "MG_BASE_URL";
pub const ENV_OLD_DOMAIN: &str = "MG_OLD_MAIL_DOMAIN";
pub const ENV_NEW_DOMAIN: &str = "MG_NEW_MAIL_DOMAIN";
pub const ENV_API_KEY: &str = "MG_API_KEY";

/// Optional on-disk settings. Every field can be overridden from the environment.
#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub old_domain: Option<String>,
    #[serde(default)]
    pub new_domain: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl FileConfig {
    /// `~/.mg-template-migrate/config.json`, or `None` without a home directory.
    fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".mg-template-migrate").join("config.json"))
    }

    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config: FileConfig = serde_json::from_str(&content)?;
        Ok(config)
    }
}

/// Resolved settings for one migration run.
#[derive(Clone)]
pub struct Config {
    pub base_url: Url,
    pub old_domain: String,
    pub new_domain: String,
    pub api_key: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url.as_str())
            .field("old_domain", &self.old_domain)
            .field("new_domain", &self.new_domain)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Read the config file (if any) and apply `MG_*` environment overrides.
    pub fn load() -> Result<Self> {
        let file = FileConfig::load()?;
        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Merge file settings with an environment lookup. Empty values count as unset.
    pub fn resolve(file: FileConfig, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |v: String| Some(v.trim().to_string()).filter(|v| !v.is_empty());
        let pick = |key: &str, fallback: Option<String>| {
            env(key)
                .and_then(non_empty)
                .or_else(|| fallback.and_then(non_empty))
        };

        let base_url = pick(ENV_BASE_URL, file.base_url).unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let old_domain = pick(ENV_OLD_DOMAIN, file.old_domain);
        let new_domain = pick(ENV_NEW_DOMAIN, file.new_domain);
        let api_key = pick(ENV_API_KEY, file.api_key);

        let (Some(old_domain), Some(new_domain), Some(api_key)) =
            (old_domain.clone(), new_domain.clone(), api_key.clone())
        else {
            return Err(Error::MissingConfig {
                old_domain: old_domain.unwrap_or_else(|| "None".into()),
                new_domain: new_domain.unwrap_or_else(|| "None".into()),
                api_key: api_key.map_or_else(|| "None".into(), |_| "<set>".into()),
            });
        };

        if old_domain == new_domain {
            return Err(Error::Config(format!(
                "{ENV_OLD_DOMAIN} and {ENV_NEW_DOMAIN} must differ (both are {old_domain})"
            )));
        }

        Ok(Self {
            base_url: parse_base_url(&base_url)?,
            old_domain,
            new_domain,
            api_key,
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)
        .map_err(|e| Error::Config(format!("Invalid {ENV_BASE_URL} {raw:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(Error::Config(format!(
            "Invalid {ENV_BASE_URL} {raw:?}: expected an http(s) URL"
        ))),
    }
}
