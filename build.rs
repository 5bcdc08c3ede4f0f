// Declaring the app's commands turns on per-window permission checks for them;
// see capabilities/ for who may call what.
const COMMANDS: &[&str] = &[
    "get_settings",
    "list_themes",
    "select_theme",
    "set_volume",
    "show_context_menu",
];

fn main() {
    tauri_build::try_build(
        tauri_build::Attributes::new()
            .app_manifest(tauri_build::AppManifest::new().commands(COMMANDS)),
    )
    .expect("failed to run tauri-build");
}
