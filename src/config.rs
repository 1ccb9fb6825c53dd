use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the integration token.
pub const ENV_API_KEY: &str = "NOTION_API_KEY";
/// Environment variable holding the page that new collections are created under.
pub const ENV_PAGE_ID: &str = "NOTION_PAGE_ID";
/// Environment variable holding the Daily Routine collection id.
pub const ENV_DAILY_ROUTINE_DB_ID: &str = "DAILY_ROUTINE_DB_ID";
/// Environment variable holding the Monthly Summary collection id.
pub const ENV_MONTHLY_SUMMARY_DB_ID: &str = "MONTHLY_SUMMARY_DB_ID";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Integration token. Never read from the config file.
    #[serde(skip)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_notion_version")]
    pub notion_version: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            notion_version: default_notion_version(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.notion.com/v1".to_string()
}
fn default_notion_version() -> String {
    "2022-06-28".to_string()
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkspaceConfig {
    #[serde(default)]
    pub parent_page_id: Option<String>,
    #[serde(default)]
    pub daily_routine_db_id: Option<String>,
    #[serde(default)]
    pub monthly_summary_db_id: Option<String>,
}

impl Config {
    /// Defaults only: public API endpoint, no ids, no credential.
    pub fn minimal() -> Self {
        Self {
            api: ApiConfig::default(),
            workspace: WorkspaceConfig::default(),
            api_key: None,
        }
    }

    /// Overlay values from a variable lookup on top of the file values.
    ///
    /// Blank values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(id) = get(ENV_PAGE_ID) {
            self.workspace.parent_page_id = Some(id);
        }
        if let Some(id) = get(ENV_DAILY_ROUTINE_DB_ID) {
            self.workspace.daily_routine_db_id = Some(id);
        }
        if let Some(id) = get(ENV_MONTHLY_SUMMARY_DB_ID) {
            self.workspace.monthly_summary_db_id = Some(id);
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        require(self.api_key.as_deref(), ENV_API_KEY, None)
    }

    pub fn require_parent_page_id(&self) -> Result<&str> {
        require(
            self.workspace.parent_page_id.as_deref(),
            ENV_PAGE_ID,
            Some("workspace.parent_page_id"),
        )
    }

    pub fn require_daily_routine_db_id(&self) -> Result<&str> {
        require(
            self.workspace.daily_routine_db_id.as_deref(),
            ENV_DAILY_ROUTINE_DB_ID,
            Some("workspace.daily_routine_db_id"),
        )
    }

    pub fn require_monthly_summary_db_id(&self) -> Result<&str> {
        require(
            self.workspace.monthly_summary_db_id.as_deref(),
            ENV_MONTHLY_SUMMARY_DB_ID,
            Some("workspace.monthly_summary_db_id"),
        )
    }
}

fn require<'a>(value: Option<&'a str>, env: &str, file_key: Option<&str>) -> Result<&'a str> {
    match value {
        Some(v) => Ok(v),
        None => match file_key {
            Some(key) => bail!("{} not set (set the environment variable or `{}` in the config file)", env, key),
            None => bail!("{} environment variable not set", env),
        },
    }
}

/// Load configuration from `path`, then overlay the process environment.
///
/// A `.env` file in the working directory is loaded first. When
/// `allow_missing` is set and the file does not exist, defaults are used.
pub fn load_config(path: &Path, allow_missing: bool) -> Result<Config> {
    if let Err(e) = dotenv_outcome(dotenvy::dotenv()) {
        tracing::warn!(error = %e, "ignoring unreadable .env file");
    }

    let mut config = if allow_missing && !path.exists() {
        Config::minimal()
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    };

    config.apply_env(|key| std::env::var(key).ok());
    validate(&config)?;
    Ok(config)
}

/// Only an absent `.env` file is silent; a malformed or unreadable one is
/// returned so the caller can report it.
fn dotenv_outcome(result: dotenvy::Result<PathBuf>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match result {
        Ok(path) => Ok(Some(path)),
        Err(dotenvy::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let base = &config.api.base_url;
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        bail!("api.base_url must start with http:// or https://, got '{}'", base);
    }
    if config.api.notion_version.trim().is_empty() {
        bail!("api.notion_version must not be empty");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_dotenv_is_silent() {
        let missing = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(dotenv_outcome(Err(missing)).unwrap().is_none());

        let found = PathBuf::from("/work/.env");
        assert_eq!(dotenv_outcome(Ok(found.clone())).unwrap(), Some(found));
    }

    #[test]
    fn test_malformed_dotenv_is_reported() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(".env");
        std::fs::write(&path, "ROUTINE_TEST_UNSET_VAR value without equals\n").unwrap();

        let err = dotenv_outcome(dotenvy::from_path(&path).map(|_| path.clone())).unwrap_err();
        assert!(matches!(err, dotenvy::Error::LineParse(..)), "err={:?}", err);
    }

    #[test]
    fn test_unreadable_dotenv_is_reported() {
        let denied = dotenvy::Error::Io(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        assert!(dotenv_outcome(Err(denied)).is_err());
    }

    #[test]
    fn test_parse_full_config() {
        let cfg = parse_config(
            r#"
[api]
base_url = "http://127.0.0.1:9000/v1"
notion_version = "2022-06-28"

[workspace]
parent_page_id = "page-1"
daily_routine_db_id = "daily-1"
"#,
        )
        .unwrap();
        assert_eq!(cfg.api.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(cfg.workspace.parent_page_id.as_deref(), Some("page-1"));
        assert_eq!(cfg.workspace.daily_routine_db_id.as_deref(), Some("daily-1"));
        assert!(cfg.workspace.monthly_summary_db_id.is_none());
        assert!(cfg.api_key.is_none());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.api.base_url, "https://api.notion.com/v1");
        assert_eq!(cfg.api.notion_version, "2022-06-28");
    }

    #[test]
    fn test_env_overrides_file() {
        let mut cfg = parse_config("[workspace]\nparent_page_id = \"from-file\"\n").unwrap();
        let vars: HashMap<&str, &str> = [
            (ENV_API_KEY, "secret_abc"),
            (ENV_PAGE_ID, "from-env"),
            (ENV_MONTHLY_SUMMARY_DB_ID, "   "),
        ]
        .into_iter()
        .collect();
        cfg.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(cfg.require_api_key().unwrap(), "secret_abc");
        assert_eq!(cfg.require_parent_page_id().unwrap(), "from-env");
        // blank values count as unset
        assert!(cfg.require_monthly_summary_db_id().is_err());
    }

    #[test]
    fn test_require_names_the_variable() {
        let cfg = Config::minimal();
        let err = cfg.require_api_key().unwrap_err().to_string();
        assert!(err.contains("NOTION_API_KEY"));
        let err = cfg.require_daily_routine_db_id().unwrap_err().to_string();
        assert!(err.contains("DAILY_ROUTINE_DB_ID"));
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut cfg = Config::minimal();
        cfg.api.base_url = "api.notion.com".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_load_missing_file_allowed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("absent.toml");
        assert!(load_config(&path, true).is_ok());
        assert!(load_config(&path, false).is_err());
    }
}
