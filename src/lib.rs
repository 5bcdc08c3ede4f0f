pub mod config;
pub mod error;
pub mod inject;
pub mod lifecycle;
pub mod menu;
pub mod settings;
pub mod themes;

use config::AppConfig;
use error::{Error, Result};
use lifecycle::{MainWindowAction, RestartGuard, SaveDebounce};
use menu::MenuAction;
use settings::{Settings, MIN_HEIGHT, MIN_WIDTH, SETTINGS_FILE_NAME};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tauri::webview::PageLoadEvent;
use tauri::{AppHandle, Manager, State, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};
use tauri_plugin_opener::OpenerExt;
use themes::{ThemeCatalog, ThemeChoice};

pub const MAIN_WINDOW: &str = "main";
pub const SETTINGS_WINDOW: &str = "settings";

// Resizes and slider drags arrive in bursts; only the last one in this window hits disk.
const SAVE_DEBOUNCE_MS: u64 = 400;

pub struct AppState {
    settings: Mutex<Settings>,
    settings_path: PathBuf,
    themes: ThemeCatalog,
    user_themes_dir: PathBuf,
    restart: RestartGuard,
    saves: SaveDebounce,
}

impl AppState {
    fn settings(&self) -> MutexGuard<'_, Settings> {
        self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self) -> Result<()> {
        let snapshot = self.settings().clone();
        snapshot.save(&self.settings_path)
    }
}

#[tauri::command]
fn get_settings(state: State<'_, AppState>) -> Settings {
    state.settings().clone()
}

#[tauri::command]
fn list_themes(state: State<'_, AppState>) -> Vec<String> {
    state.themes.list()
}

#[tauri::command]
fn select_theme(name: String, app: AppHandle) -> std::result::Result<(), String> {
    choose_theme(&app, ThemeChoice::parse(&name)).map_err(|e| e.to_string())
}

#[tauri::command]
fn set_volume(
    value: f64,
    app: AppHandle,
    state: State<'_, AppState>,
) -> std::result::Result<f64, String> {
    let gain = state.settings().set_volume(value);
    log::debug!("DUEL-VOLUME: Gain set to {}", gain);

    if let Some(main) = app.get_webview_window(MAIN_WINDOW) {
        main.eval(&inject::set_volume_script(gain))
            .map_err(|e| format!("Failed to update volume: {}", e))?;
    }
    schedule_save(&app);
    Ok(gain)
}

#[tauri::command]
fn show_context_menu(
    window: tauri::Window,
    state: State<'_, AppState>,
) -> std::result::Result<(), String> {
    let active = state.settings().theme.clone();
    let menu = menu::build_context_menu(&window, &state.themes.list(), &active)
        .map_err(|e| format!("Failed to build context menu: {}", e))?;
    window
        .popup_menu(&menu)
        .map_err(|e| format!("Failed to show context menu: {}", e))
}

/// Applies, persists and relaunches. A second choice while a relaunch is pending is ignored.
fn choose_theme(app: &AppHandle, choice: ThemeChoice) -> Result<()> {
    let state = app.state::<AppState>();

    if let ThemeChoice::Named(name) = &choice {
        if state.themes.resolve(name).is_none() {
            return Err(Error::UnknownTheme(name.clone()));
        }
    }

    if !state.restart.try_begin() {
        log::info!("DUEL-THEMES: Restart already in progress, ignoring \"{}\"", choice.name());
        return Ok(());
    }

    log::info!("DUEL-THEMES: Switching to \"{}\"", choice.name());
    if let Some(main) = app.get_webview_window(MAIN_WINDOW) {
        apply_theme(&main, &state.themes, &choice);
    }

    state.settings().set_theme(choice.name());
    if let Err(e) = state.persist() {
        state.restart.cancel();
        return Err(e);
    }

    log::info!("DUEL-THEMES: ✓ Saved, relaunching");
    app.restart()
}

fn apply_theme(window: &WebviewWindow, themes: &ThemeCatalog, choice: &ThemeChoice) {
    let css = themes.load_css(choice);
    if let Err(e) = window.eval(&inject::theme_script(css.as_deref())) {
        log::error!("DUEL-THEMES: ❌ Failed to apply \"{}\": {}", choice.name(), e);
    }
}

fn inject_page_scripts(window: &WebviewWindow) {
    let state = window.state::<AppState>();
    let (volume, theme) = {
        let settings = state.settings();
        (settings.volume, ThemeChoice::parse(&settings.theme))
    };
    let css = state.themes.load_css(&theme);

    for script in inject::page_load_scripts(volume, css.as_deref()) {
        if let Err(e) = window.eval(&script) {
            log::error!("DUEL-WINDOW: ❌ Injection failed: {}", e);
        }
    }
    log::debug!("DUEL-WINDOW: Injected volume, ad and theme scripts (theme={})", theme.name());
}

fn schedule_save(app: &AppHandle) {
    let generation = app.state::<AppState>().saves.schedule();
    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(Duration::from_millis(SAVE_DEBOUNCE_MS)).await;
        let state = app.state::<AppState>();
        if !state.saves.is_latest(generation) {
            return;
        }
        if let Err(e) = state.persist() {
            log::error!("DUEL-SETTINGS: ❌ Failed to save: {}", e);
        }
    });
}

fn on_main_window_event(app: &AppHandle, event: &WindowEvent) {
    let scale = app
        .get_webview_window(MAIN_WINDOW)
        .and_then(|w| w.scale_factor().ok())
        .unwrap_or(1.0);

    match lifecycle::main_window_action(event, scale) {
        MainWindowAction::RememberSize(size) => {
            app.state::<AppState>().settings().set_window_size(size);
            schedule_save(app);
        }
        MainWindowAction::Flush => {
            let state = app.state::<AppState>();
            state.saves.invalidate();
            if let Err(e) = state.persist() {
                log::error!("DUEL-SETTINGS: ❌ Failed to save on close: {}", e);
            }
        }
        MainWindowAction::Exit => {
            // Takes the settings window down with it.
            log::info!("DUEL-WINDOW: Main window closed, exiting");
            app.exit(0);
        }
        MainWindowAction::Ignore => {}
    }
}

fn open_settings_window(app: &AppHandle) -> Result<()> {
    if let Some(existing) = app.get_webview_window(SETTINGS_WINDOW) {
        existing.show()?;
        existing.set_focus()?;
        return Ok(());
    }

    let main = app
        .get_webview_window(MAIN_WINDOW)
        .ok_or(Error::WindowNotFound(MAIN_WINDOW))?;

    WebviewWindowBuilder::new(app, SETTINGS_WINDOW, WebviewUrl::App("settings.html".into()))
        .title("Settings")
        .inner_size(400.0, 300.0)
        .resizable(false)
        .minimizable(false)
        .maximizable(false)
        .parent(&main)?
        .build()?;
    log::info!("DUEL-WINDOW: Settings window opened");
    Ok(())
}

fn open_themes_folder(app: &AppHandle) -> Result<()> {
    let dir = app.state::<AppState>().user_themes_dir.clone();
    themes::ensure_dir(&dir)?;
    app.opener()
        .open_path(dir.to_string_lossy(), None::<&str>)?;
    Ok(())
}

fn handle_menu_event(app: &AppHandle, id: &str) {
    let Some(action) = MenuAction::from_id(id) else {
        return;
    };
    log::debug!("DUEL-MENU: {:?}", action);

    let result = match action {
        MenuAction::SelectTheme(choice) => choose_theme(app, choice),
        MenuAction::OpenSettings => open_settings_window(app),
        MenuAction::OpenThemesFolder => open_themes_folder(app),
        MenuAction::Reload => match app.get_webview_window(MAIN_WINDOW) {
            Some(main) => main.eval("window.location.reload()").map_err(Error::from),
            None => Err(Error::WindowNotFound(MAIN_WINDOW)),
        },
        MenuAction::DevTools => {
            #[cfg(debug_assertions)]
            if let Some(main) = app.get_webview_window(MAIN_WINDOW) {
                main.open_devtools();
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        log::error!("DUEL-MENU: ❌ \"{}\" failed: {}", id, e);
    }
}

fn theme_roots(app: &AppHandle, user_themes_dir: &Path, config: &AppConfig) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    match app.path().resource_dir() {
        Ok(dir) => roots.push(dir.join("themes")),
        Err(e) => log::warn!("DUEL-THEMES: No resource dir, bundled themes unavailable: {}", e),
    }
    roots.push(user_themes_dir.to_path_buf());
    if let Some(extra) = &config.extra_themes_dir {
        roots.push(extra.clone());
    }
    roots
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let log_level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_log::Builder::new().level(log_level).build())
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            config::load_dotenv();
            let config = AppConfig::from_env();

            let data_dir = match &config.data_dir {
                Some(dir) => dir.clone(),
                None => app.path().app_data_dir()?,
            };
            std::fs::create_dir_all(&data_dir)?;
            let settings_path = data_dir.join(SETTINGS_FILE_NAME);
            let user_themes_dir = data_dir.join("themes");
            log::info!("DUEL-INIT: Data dir {}", data_dir.display());

            let settings = Settings::load_or_init(&settings_path)?;
            let catalog = ThemeCatalog::new(theme_roots(app.handle(), &user_themes_dir, &config));
            log::info!("DUEL-INIT: {} theme(s) available", catalog.list().len());

            let size = settings.window_size;
            app.manage(AppState {
                settings: Mutex::new(settings),
                settings_path,
                themes: catalog,
                user_themes_dir,
                restart: RestartGuard::default(),
                saves: SaveDebounce::default(),
            });

            #[cfg(target_os = "macos")]
            app.set_menu(menu::build_app_menu(app)?)?;

            app.on_menu_event(|app, event| handle_menu_event(app, event.id().as_ref()));

            let url: tauri::Url = config.url.parse()?;
            let main_window = WebviewWindowBuilder::new(app, MAIN_WINDOW, WebviewUrl::External(url))
                .title("Duelingbook")
                .inner_size(size.width, size.height)
                .min_inner_size(MIN_WIDTH, MIN_HEIGHT)
                .resizable(true)
                .center()
                .devtools(config.devtools || cfg!(debug_assertions))
                .initialization_script(inject::context_menu_hook())
                .on_page_load(|window, payload| {
                    if matches!(payload.event(), PageLoadEvent::Finished) {
                        log::info!("DUEL-WINDOW: Loaded {}", payload.url());
                        inject_page_scripts(&window);
                    }
                })
                .build()?;

            #[cfg(debug_assertions)]
            if config.devtools {
                main_window.open_devtools();
            }

            let app_handle = app.handle().clone();
            main_window.on_window_event(move |event| on_main_window_event(&app_handle, event));

            log::info!("DUEL-INIT: ✓ Main window opened at {}", config.url);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_settings,
            list_themes,
            select_theme,
            set_volume,
            show_context_menu
        ])
        .run(tauri::generate_context!())
        .expect("error while running duelingbook application");
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    fn permissions(capability: &str) -> Vec<String> {
        let parsed: Value = serde_json::from_str(capability).unwrap();
        parsed["permissions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_remote_page_only_gets_context_menu() {
        let main = include_str!("../capabilities/main.json");
        assert_eq!(permissions(main), vec!["allow-show-context-menu"]);
    }

    #[test]
    fn test_settings_window_commands() {
        let settings = include_str!("../capabilities/settings.json");
        let granted = permissions(settings);
        for command in ["get-settings", "set-volume", "list-themes", "select-theme"] {
            assert!(granted.contains(&format!("allow-{}", command)), "{}", command);
        }
        assert!(!granted.contains(&"allow-show-context-menu".to_string()));
    }
}
