use crate::themes::ThemeChoice;
use tauri::menu::{CheckMenuItem, IsMenuItem, Menu, MenuItem, PredefinedMenuItem, Submenu};
use tauri::{Manager, Runtime};

const THEME_PREFIX: &str = "theme:";
const SETTINGS_ID: &str = "settings";
const OPEN_THEMES_FOLDER_ID: &str = "open-themes-folder";
const RELOAD_ID: &str = "reload";
const DEVTOOLS_ID: &str = "devtools";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    SelectTheme(ThemeChoice),
    OpenSettings,
    OpenThemesFolder,
    Reload,
    DevTools,
}

impl MenuAction {
    pub fn from_id(id: &str) -> Option<Self> {
        if let Some(name) = id.strip_prefix(THEME_PREFIX) {
            if name.trim().is_empty() {
                return None;
            }
            return Some(MenuAction::SelectTheme(ThemeChoice::parse(name)));
        }
        match id {
            SETTINGS_ID => Some(MenuAction::OpenSettings),
            OPEN_THEMES_FOLDER_ID => Some(MenuAction::OpenThemesFolder),
            RELOAD_ID => Some(MenuAction::Reload),
            DEVTOOLS_ID => Some(MenuAction::DevTools),
            _ => None,
        }
    }

    pub fn id(&self) -> String {
        match self {
            MenuAction::SelectTheme(choice) => format!("{}{}", THEME_PREFIX, choice.name()),
            MenuAction::OpenSettings => SETTINGS_ID.to_string(),
            MenuAction::OpenThemesFolder => OPEN_THEMES_FOLDER_ID.to_string(),
            MenuAction::Reload => RELOAD_ID.to_string(),
            MenuAction::DevTools => DEVTOOLS_ID.to_string(),
        }
    }
}

/// Right-click menu: Themes ▸ [Default, …], Settings, Open Themes Folder.
/// The entry for `active_theme` is checked.
pub fn build_context_menu<R: Runtime, M: Manager<R>>(
    manager: &M,
    themes: &[String],
    active_theme: &str,
) -> tauri::Result<Menu<R>> {
    let active = ThemeChoice::parse(active_theme);

    let mut theme_items = Vec::with_capacity(themes.len() + 1);
    theme_items.push(CheckMenuItem::with_id(
        manager,
        MenuAction::SelectTheme(ThemeChoice::Default).id(),
        "Default",
        true,
        active == ThemeChoice::Default,
        None::<&str>,
    )?);
    for name in themes {
        let choice = ThemeChoice::Named(name.clone());
        let checked = choice == active;
        theme_items.push(CheckMenuItem::with_id(
            manager,
            MenuAction::SelectTheme(choice).id(),
            name,
            true,
            checked,
            None::<&str>,
        )?);
    }
    let theme_refs: Vec<&dyn IsMenuItem<R>> = theme_items
        .iter()
        .map(|item| item as &dyn IsMenuItem<R>)
        .collect();

    let settings = MenuItem::with_id(manager, SETTINGS_ID, "Settings", true, None::<&str>)?;
    let open_folder = MenuItem::with_id(
        manager,
        OPEN_THEMES_FOLDER_ID,
        "Open Themes Folder",
        true,
        None::<&str>,
    )?;

    Menu::with_items(
        manager,
        &[
            &Submenu::with_items(manager, "Themes", true, &theme_refs)?,
            &settings,
            &PredefinedMenuItem::separator(manager)?,
            &open_folder,
        ],
    )
}

/// macOS always shows an application menu; keep the standard edit shortcuts working.
#[cfg(target_os = "macos")]
pub fn build_app_menu<R: Runtime, M: Manager<R>>(manager: &M) -> tauri::Result<Menu<R>> {
    use tauri::menu::AboutMetadata;

    let reload = MenuItem::with_id(manager, RELOAD_ID, "Reload Page", true, Some("CmdOrCtrl+R"))?;
    let devtools = MenuItem::with_id(
        manager,
        DEVTOOLS_ID,
        "Open DevTools",
        true,
        Some("CmdOrCtrl+Option+I"),
    )?;

    Menu::with_items(
        manager,
        &[
            &Submenu::with_items(
                manager,
                "App",
                true,
                &[
                    &PredefinedMenuItem::about(manager, None, Some(AboutMetadata::default()))?,
                    &PredefinedMenuItem::separator(manager)?,
                    &PredefinedMenuItem::hide(manager, None)?,
                    &PredefinedMenuItem::hide_others(manager, None)?,
                    &PredefinedMenuItem::show_all(manager, None)?,
                    &PredefinedMenuItem::separator(manager)?,
                    &PredefinedMenuItem::quit(manager, None)?,
                ],
            )?,
            &Submenu::with_items(
                manager,
                "Edit",
                true,
                &[
                    &PredefinedMenuItem::undo(manager, None)?,
                    &PredefinedMenuItem::redo(manager, None)?,
                    &PredefinedMenuItem::separator(manager)?,
                    &PredefinedMenuItem::cut(manager, None)?,
                    &PredefinedMenuItem::copy(manager, None)?,
                    &PredefinedMenuItem::paste(manager, None)?,
                    &PredefinedMenuItem::separator(manager)?,
                    &PredefinedMenuItem::select_all(manager, None)?,
                ],
            )?,
            &Submenu::with_items(manager, "View", true, &[&reload, &devtools])?,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_ids() {
        assert_eq!(
            MenuAction::from_id("theme:default"),
            Some(MenuAction::SelectTheme(ThemeChoice::Default))
        );
        assert_eq!(
            MenuAction::from_id("theme:midnight"),
            Some(MenuAction::SelectTheme(ThemeChoice::Named("midnight".into())))
        );
        // Theme names may themselves contain the separator.
        assert_eq!(
            MenuAction::from_id("theme:neo:dark"),
            Some(MenuAction::SelectTheme(ThemeChoice::Named("neo:dark".into())))
        );
        assert_eq!(MenuAction::from_id("theme:"), None);
    }

    #[test]
    fn test_fixed_ids() {
        assert_eq!(MenuAction::from_id("settings"), Some(MenuAction::OpenSettings));
        assert_eq!(
            MenuAction::from_id("open-themes-folder"),
            Some(MenuAction::OpenThemesFolder)
        );
        assert_eq!(MenuAction::from_id("reload"), Some(MenuAction::Reload));
        assert_eq!(MenuAction::from_id("devtools"), Some(MenuAction::DevTools));
        assert_eq!(MenuAction::from_id("quit"), None);
        assert_eq!(MenuAction::from_id(""), None);
    }

    #[test]
    fn test_id_round_trips_through_from_id() {
        let actions = [
            MenuAction::SelectTheme(ThemeChoice::Default),
            MenuAction::SelectTheme(ThemeChoice::Named("parchment".into())),
            MenuAction::OpenSettings,
            MenuAction::OpenThemesFolder,
        ];
        for action in actions {
            assert_eq!(MenuAction::from_id(&action.id()), Some(action));
        }
    }
}
