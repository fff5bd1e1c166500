//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.portail/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PortailConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AdminConfig {
    pub email: Option<String>,
    pub page_size: Option<usize>,
    pub export_limit: Option<usize>,
    pub allowed_roles: Option<Vec<String>>,
    pub audit: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SearchConfig {
    pub per_collection_limit: Option<usize>,
    pub log_searches: Option<bool>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_LOG_LEVEL: &str = "debug";
pub const DEFAULT_EXPORT_LIMIT: usize = 10_000;
pub const DEFAULT_PER_COLLECTION: usize = 10;
pub const DEFAULT_ALLOWED_ROLES: [&str; 2] = ["admin", "editor"];

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub log_level: log::LevelFilter,
    pub backend_url: String,
    pub anon_key: String,
    pub email: Option<String>,
    pub password: Option<String>,
    /// Rows per page for every model; `None` keeps each model's own size.
    pub page_size: Option<usize>,
    pub export_limit: usize,
    pub allowed_roles: Vec<String>,
    pub audit: bool,
    pub per_collection_limit: usize,
    pub log_searches: bool,
}

/// Values given on the command line (None = not specified).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub backend_url: Option<String>,
    pub email: Option<String>,
    pub page_size: Option<usize>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.portail/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".portail").join("config.toml"))
}

/// Load config from `~/.portail/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `PortailConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<PortailConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(PortailConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(PortailConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config: PortailConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Portail Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_level = "debug"               # "error", "warn", "info", "debug", "trace"

# [backend]
# url = "https://xyzcompany.supabase.co"   # Or set PORTAIL_BACKEND_URL
# anon_key = "eyJhbGciOi..."               # Or set PORTAIL_ANON_KEY

# [admin]
# email = "admin@ministere.gov"     # Or set PORTAIL_EMAIL (password: PORTAIL_PASSWORD)
# page_size = 10                    # Unset: each page uses its own size
# export_limit = 10000
# allowed_roles = ["admin", "editor"]
# audit = true                      # Write an audit_logs row per change

# [search]
# per_collection_limit = 10
# log_searches = true
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &PortailConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an explicit environment lookup.
pub fn resolve_with(
    config: &PortailConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    let backend_url = cli
        .backend_url
        .clone()
        .or_else(|| env("PORTAIL_BACKEND_URL"))
        .or_else(|| config.backend.url.clone())
        .unwrap_or_default();

    let anon_key = env("PORTAIL_ANON_KEY")
        .or_else(|| config.backend.anon_key.clone())
        .unwrap_or_default();

    let email = cli
        .email
        .clone()
        .or_else(|| env("PORTAIL_EMAIL"))
        .or_else(|| config.admin.email.clone());

    // Page size: CLI → env → config; unset leaves the per-model size
    let page_size = cli
        .page_size
        .or_else(|| env("PORTAIL_PAGE_SIZE").and_then(|v| v.parse().ok()))
        .or(config.admin.page_size)
        .map(|n| n.max(1));

    let log_level = config
        .general
        .log_level
        .as_deref()
        .unwrap_or(DEFAULT_LOG_LEVEL)
        .parse()
        .unwrap_or(log::LevelFilter::Debug);

    ResolvedConfig {
        log_level,
        backend_url,
        anon_key,
        email,
        password: env("PORTAIL_PASSWORD"),
        page_size,
        export_limit: config
            .admin
            .export_limit
            .unwrap_or(DEFAULT_EXPORT_LIMIT)
            .max(1),
        allowed_roles: config
            .admin
            .allowed_roles
            .clone()
            .unwrap_or_else(|| DEFAULT_ALLOWED_ROLES.iter().map(|r| r.to_string()).collect()),
        audit: config.admin.audit.unwrap_or(true),
        per_collection_limit: config
            .search
            .per_collection_limit
            .unwrap_or(DEFAULT_PER_COLLECTION)
            .max(1),
        log_searches: config.search.log_searches.unwrap_or(true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with(&PortailConfig::default(), &CliOverrides::default(), no_env);
        assert_eq!(resolved.page_size, None);
        assert_eq!(resolved.export_limit, DEFAULT_EXPORT_LIMIT);
        assert_eq!(resolved.allowed_roles, vec!["admin", "editor"]);
        assert_eq!(resolved.log_level, log::LevelFilter::Debug);
        assert!(resolved.backend_url.is_empty());
        assert!(resolved.audit);
        assert!(resolved.log_searches);
    }

    #[test]
    fn test_override_order() {
        let config = PortailConfig {
            backend: BackendConfig {
                url: Some("https://from-file".to_string()),
                anon_key: Some("file-key".to_string()),
            },
            admin: AdminConfig {
                page_size: Some(25),
                ..Default::default()
            },
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            ("PORTAIL_BACKEND_URL", "https://from-env"),
            ("PORTAIL_PAGE_SIZE", "50"),
        ]
        .into_iter()
        .collect();
        let lookup = |k: &str| env.get(k).map(|v| v.to_string());

        let resolved = resolve_with(&config, &CliOverrides::default(), lookup);
        assert_eq!(resolved.backend_url, "https://from-env");
        assert_eq!(resolved.anon_key, "file-key");
        assert_eq!(resolved.page_size, Some(50));

        let cli = CliOverrides {
            backend_url: Some("https://from-cli".to_string()),
            page_size: Some(5),
            ..Default::default()
        };
        let resolved = resolve_with(&config, &cli, lookup);
        assert_eq!(resolved.backend_url, "https://from-cli");
        assert_eq!(resolved.page_size, Some(5));
    }

    #[test]
    fn test_bad_env_page_size_falls_through() {
        let resolved = resolve_with(
            &PortailConfig::default(),
            &CliOverrides::default(),
            |k| (k == "PORTAIL_PAGE_SIZE").then(|| "lots".to_string()),
        );
        assert_eq!(resolved.page_size, None);
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r#"
[general]
log_level = "warn"

[backend]
url = "https://abc.supabase.co"
anon_key = "key-123"

[admin]
page_size = 20
allowed_roles = ["admin"]
audit = false

[search]
per_collection_limit = 5
log_searches = false
"#;
        let config: PortailConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.url.as_deref(), Some("https://abc.supabase.co"));
        assert_eq!(config.admin.page_size, Some(20));

        let resolved = resolve_with(&config, &CliOverrides::default(), no_env);
        assert_eq!(resolved.log_level, log::LevelFilter::Warn);
        assert_eq!(resolved.allowed_roles, vec!["admin"]);
        assert_eq!(resolved.per_collection_limit, 5);
        assert!(!resolved.audit);
        assert!(!resolved.log_searches);
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let config: PortailConfig = toml::from_str("[admin]\nexport_limit = 500\n").unwrap();
        assert_eq!(config.admin.export_limit, Some(500));
        assert!(config.backend.url.is_none());
        assert!(config.search.per_collection_limit.is_none());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        let err = toml::from_str::<PortailConfig>("[admin]\npage_size = \"ten\"\n").unwrap_err();
        assert!(ConfigError::Parse(err).to_string().starts_with("config parse error"));
    }
}
