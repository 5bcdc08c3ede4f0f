use crate::error::{Error, Result};
use crate::settings::DEFAULT_THEME;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const STYLE_FILE_NAME: &str = "style.css";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThemeChoice {
    Default,
    Named(String),
}

impl ThemeChoice {
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if name.is_empty() || name == DEFAULT_THEME {
            ThemeChoice::Default
        } else {
            ThemeChoice::Named(name.to_string())
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ThemeChoice::Default => DEFAULT_THEME,
            ThemeChoice::Named(name) => name,
        }
    }
}

/// Theme folders found under one or more roots, each holding a `style.css`.
///
/// Roots are searched in order and a later root wins when two contain the same
/// theme name, so user themes can shadow the bundled ones.
#[derive(Debug, Clone, Default)]
pub struct ThemeCatalog {
    roots: Vec<PathBuf>,
}

impl ThemeCatalog {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn scan(&self) -> BTreeMap<String, PathBuf> {
        let mut found = BTreeMap::new();
        for root in &self.roots {
            let entries = match std::fs::read_dir(root) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let name = match entry.file_name().into_string() {
                    Ok(name) => name,
                    Err(_) => continue,
                };
                // Choices are trimmed when parsed, so a padded folder name could be
                // listed but never selected.
                if name.trim() != name || name.is_empty() {
                    log::warn!(
                        "DUEL-THEMES: Skipping {}, theme names can't start or end with whitespace",
                        entry.path().display()
                    );
                    continue;
                }
                if name == DEFAULT_THEME {
                    log::warn!(
                        "DUEL-THEMES: Skipping {}, \"{}\" is reserved",
                        entry.path().display(),
                        DEFAULT_THEME
                    );
                    continue;
                }
                let style = entry.path().join(STYLE_FILE_NAME);
                if style.is_file() {
                    found.insert(name, style);
                }
            }
        }
        found
    }

    /// Available theme names, sorted case-insensitively.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.scan().into_keys().collect();
        names.sort_by_key(|name| name.to_lowercase());
        names
    }

    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        if matches!(ThemeChoice::parse(name), ThemeChoice::Default) {
            return None;
        }
        self.scan().remove(name)
    }

    pub fn read_css(&self, name: &str) -> Result<String> {
        let path = self
            .resolve(name)
            .ok_or_else(|| Error::UnknownTheme(name.to_string()))?;
        std::fs::read_to_string(&path).map_err(|e| Error::io(path, e))
    }

    /// Stylesheet for a choice. `None` means "no custom theme", which is also what a
    /// theme whose folder has since disappeared degrades to.
    pub fn load_css(&self, choice: &ThemeChoice) -> Option<String> {
        match choice {
            ThemeChoice::Default => None,
            ThemeChoice::Named(name) => match self.read_css(name) {
                Ok(css) => Some(css),
                Err(e) => {
                    log::warn!("DUEL-THEMES: Falling back to default: {}", e);
                    None
                }
            },
        }
    }
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
}
