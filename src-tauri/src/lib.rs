//! KekeFinder library
//! Lists the trackers registered to an account and shows which of them are
//! in Bluetooth range, and roughly how far away.

pub mod api;
pub mod auth;
#[cfg(feature = "app")]
pub mod commands;
pub mod config;
pub mod core;
pub mod logging;
pub mod state;
pub mod utils;

/// Runs the desktop app.
#[cfg(feature = "app")]
pub fn run() {
    use log::{LevelFilter, info};
    use tauri::Manager;

    use crate::commands::{
        get_display_snapshot, is_authenticated, login, login_with_token, logout, open_link,
        start_tracking, stop_tracking,
    };
    use crate::state::AppState;

    let builder = tauri::Builder::default().plugin(tauri_plugin_opener::init());

    #[cfg(desktop)]
    let builder = builder.plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
        if let Some(window) = app.get_webview_window("main") {
            let _ = window.show();
            let _ = window.set_focus();
        }
    }));

    builder
        .invoke_handler(tauri::generate_handler![
            login,
            login_with_token,
            logout,
            is_authenticated,
            start_tracking,
            stop_tracking,
            get_display_snapshot,
            open_link
        ])
        .setup(|app| {
            if logging::TauriLogger::init(app.handle().clone(), log::Level::Info).is_err() {
                logging::init_env_logger(LevelFilter::Info);
            }

            let config_dir = app.path().app_config_dir()?;
            let app_state = tauri::async_runtime::block_on(async {
                info!("Starting AppState initialization in Tauri setup.");
                AppState::new(&config_dir).await
            })
            .map_err(|e| format!("Failed to initialize AppState: {}", e))?;

            app.manage(app_state);
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
