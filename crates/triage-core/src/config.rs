use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::theme::Theme;

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/process";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server: Option<ServerConfig>,
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Full URL of the classification endpoint.
    pub endpoint: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Theme used when nothing is persisted and the OS has no preference.
    pub theme: Option<String>,
}

/// Platform config directory path: `<config_dir>/triage/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("triage").join("config.toml"))
}

/// Load config by cascading CWD `.triage.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".triage.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        server: Some(ServerConfig {
            endpoint: overlay
                .server
                .as_ref()
                .and_then(|s| s.endpoint.clone())
                .or_else(|| base.server.as_ref().and_then(|s| s.endpoint.clone())),
            timeout_secs: overlay
                .server
                .as_ref()
                .and_then(|s| s.timeout_secs)
                .or_else(|| base.server.as_ref().and_then(|s| s.timeout_secs)),
        }),
        display: Some(DisplayConfig {
            theme: overlay
                .display
                .as_ref()
                .and_then(|d| d.theme.clone())
                .or_else(|| base.display.as_ref().and_then(|d| d.theme.clone())),
        }),
    }
}

/// Fully resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub timeout: Duration,
    pub fallback_theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            fallback_theme: Theme::default(),
        }
    }
}

impl Settings {
    /// Resolve from a config file with `TRIAGE_ENDPOINT` / `TRIAGE_TIMEOUT`
    /// taking precedence.
    pub fn resolve(config: &ConfigFile) -> Self {
        Self::resolve_with(config, |key| std::env::var(key).ok())
    }

    /// Like [`Settings::resolve`], reading variables through `env`.
    pub fn resolve_with(config: &ConfigFile, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let server = config.server.clone().unwrap_or_default();

        let endpoint = env("TRIAGE_ENDPOINT")
            .filter(|v| !v.trim().is_empty())
            .or(server.endpoint)
            .unwrap_or(defaults.endpoint);

        let timeout = env("TRIAGE_TIMEOUT")
            .and_then(|v| v.trim().parse().ok())
            .or(server.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let fallback_theme = config
            .display
            .as_ref()
            .and_then(|d| d.theme.as_deref())
            .and_then(|name| match name.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring configured theme");
                    None
                }
            })
            .unwrap_or(defaults.fallback_theme);

        Self {
            endpoint,
            timeout,
            fallback_theme,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn empty_config_uses_defaults() {
        let settings = Settings::resolve_with(&ConfigFile::default(), no_env);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn overlay_wins_over_base() {
        let base: ConfigFile = toml::from_str(
            r#"
            [server]
            endpoint = "http://base/process"
            timeout_secs = 10

            [display]
            theme = "dark"
            "#,
        )
        .unwrap();
        let overlay: ConfigFile = toml::from_str(
            r#"
            [server]
            endpoint = "http://local/process"
            "#,
        )
        .unwrap();

        let merged = merge(base, overlay);
        let server = merged.server.unwrap();
        assert_eq!(server.endpoint.as_deref(), Some("http://local/process"));
        assert_eq!(server.timeout_secs, Some(10));
        assert_eq!(merged.display.unwrap().theme.as_deref(), Some("dark"));
    }

    #[test]
    fn env_overrides_config() {
        let config: ConfigFile = toml::from_str(
            r#"
            [server]
            endpoint = "http://file/process"
            timeout_secs = 10
            "#,
        )
        .unwrap();

        let settings = Settings::resolve_with(&config, |key| match key {
            "TRIAGE_ENDPOINT" => Some("http://env/process".to_string()),
            "TRIAGE_TIMEOUT" => Some("5".to_string()),
            _ => None,
        });
        assert_eq!(settings.endpoint, "http://env/process");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn bad_values_fall_back() {
        let config: ConfigFile = toml::from_str(
            r#"
            [server]
            timeout_secs = 12

            [display]
            theme = "sepia"
            "#,
        )
        .unwrap();

        let settings = Settings::resolve_with(&config, |key| match key {
            "TRIAGE_TIMEOUT" => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(settings.timeout, Duration::from_secs(12));
        assert_eq!(settings.fallback_theme, Theme::Light);
    }

    #[test]
    fn load_from_path_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[display]\ntheme = \"dark\"\n").unwrap();

        let config = load_from_path(&path).unwrap();
        let settings = Settings::resolve_with(&config, no_env);
        assert_eq!(settings.fallback_theme, Theme::Dark);

        std::fs::write(&path, "not = [valid").unwrap();
        assert!(load_from_path(&path).is_none());
        assert!(load_from_path(&dir.path().join("missing.toml")).is_none());
    }
}
