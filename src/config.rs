use std::env;
use std::path::PathBuf;

pub const DEFAULT_URL: &str = "https://duelingbook.com";
pub const SITE_DOMAIN: &str = "duelingbook.com";

/// Startup options read from the process environment (after `.env` is loaded).
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub url: String,
    pub data_dir: Option<PathBuf>,
    pub extra_themes_dir: Option<PathBuf>,
    /// Opens the inspector at startup. Only honoured in debug builds; release
    /// builds are compiled without devtools.
    pub devtools: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            data_dir: None,
            extra_themes_dir: None,
            devtools: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let url = match non_empty("DUELINGBOOK_URL") {
            Some(url) => {
                log::info!("DUEL-INIT: Using DUELINGBOOK_URL={}", url);
                if !is_site_url(&url) {
                    log::warn!(
                        "DUEL-INIT: {} is outside {}, the page can't call back into the app",
                        url,
                        SITE_DOMAIN
                    );
                }
                url
            }
            None => DEFAULT_URL.to_string(),
        };

        let devtools = non_empty("DUELINGBOOK_DEVTOOLS")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        if devtools && !devtools_available() {
            log::warn!("DUEL-INIT: DUELINGBOOK_DEVTOOLS is ignored in release builds");
        }

        Self {
            url,
            data_dir: non_empty("DUELINGBOOK_DATA_DIR").map(PathBuf::from),
            extra_themes_dir: non_empty("DUELINGBOOK_THEMES_DIR").map(PathBuf::from),
            devtools: devtools && devtools_available(),
        }
    }
}

pub fn devtools_available() -> bool {
    cfg!(debug_assertions)
}

/// Whether `url` is an https page on duelingbook.com or one of its subdomains,
/// the only origins the main window's capability lets talk to the app.
pub fn is_site_url(url: &str) -> bool {
    let Ok(parsed) = tauri::Url::parse(url) else {
        return false;
    };
    if parsed.scheme() != "https" {
        return false;
    }
    match parsed.host_str() {
        Some(host) => {
            let host = host.to_ascii_lowercase();
            host == SITE_DOMAIN || host.ends_with(&format!(".{}", SITE_DOMAIN))
        }
        None => false,
    }
}

pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => log::info!("DUEL-INIT: ✓ Loaded {}", path.display()),
        Err(e) if e.not_found() => log::debug!("DUEL-INIT: No .env file"),
        Err(e) => log::warn!("DUEL-INIT: Could not load .env: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> AppConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        assert_eq!(config_from(&[]), AppConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DUELINGBOOK_URL", "http://localhost:8080"),
            ("DUELINGBOOK_DATA_DIR", "/tmp/db"),
            ("DUELINGBOOK_THEMES_DIR", "/tmp/themes"),
            ("DUELINGBOOK_DEVTOOLS", "TRUE"),
        ]);
        assert_eq!(config.url, "http://localhost:8080");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/db")));
        assert_eq!(config.extra_themes_dir, Some(PathBuf::from("/tmp/themes")));
        assert_eq!(config.devtools, devtools_available());
    }

    #[test]
    fn test_site_url() {
        assert!(is_site_url(DEFAULT_URL));
        assert!(is_site_url("https://www.duelingbook.com/html5"));
        assert!(is_site_url("https://DuelingBook.com/"));
        assert!(!is_site_url("http://duelingbook.com"));
        assert!(!is_site_url("https://notduelingbook.com"));
        assert!(!is_site_url("https://duelingbook.com.evil.example"));
        assert!(!is_site_url("http://localhost:8080"));
        assert!(!is_site_url("not a url"));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let config = config_from(&[("DUELINGBOOK_URL", "  "), ("DUELINGBOOK_DEVTOOLS", "0")]);
        assert_eq!(config.url, DEFAULT_URL);
        assert!(!config.devtools);
    }
}
