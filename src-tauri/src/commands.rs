//! Tauri commands
//! This module defines all the commands that can be invoked from the frontend.

use std::sync::Arc;

use log::{error, info, warn};
use tauri::{AppHandle, Emitter, State};
use tauri_plugin_opener::OpenerExt;
use tokio::sync::{Mutex, watch};
use url::Url;

use crate::core::{DisplaySnapshot, TrackingSession};
use crate::state::AppState;

pub const DISPLAY_UPDATED_EVENT: &str = "display-updated";
pub const AUTH_LOST_EVENT: &str = "auth-lost";

const AUTH_LOST_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Logs in with email and PIN.
///
/// # Returns
/// The alert text for the login screen on failure, e.g. "Server not accessible".
#[tauri::command]
pub async fn login(email: String, pin: String, app_state: State<'_, AppState>) -> Result<(), String> {
    app_state
        .auth
        .login(&email, &pin)
        .await
        .map(|_| ())
        .map_err(|e| e.user_message())
}

/// Accepts a token delivered by a deep link.
#[tauri::command]
pub async fn login_with_token(token: String, app_state: State<'_, AppState>) -> Result<(), String> {
    app_state
        .auth
        .accept_token(&token)
        .await
        .map(|_| ())
        .map_err(|e| e.user_message())
}

#[tauri::command]
pub async fn logout(app_state: State<'_, AppState>) -> Result<(), String> {
    app_state.stop_tracking().await;
    app_state.auth.logout().await.map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn is_authenticated(app_state: State<'_, AppState>) -> Result<bool, String> {
    Ok(app_state.auth.is_authenticated().await)
}

/// Starts tracking for the device list screen, replacing any running session.
///
/// Emits while running:
/// - "display-updated" with a `DisplaySnapshot` on every change
/// - "auth-lost" with an alert text when the token is rejected; the session
///   is stopped afterwards
#[tauri::command]
pub async fn start_tracking(app: AppHandle, app_state: State<'_, AppState>) -> Result<DisplaySnapshot, String> {
    app_state.stop_tracking().await;

    let session = TrackingSession::start(app_state.session_deps(), app_state.session_options())
        .await
        .map_err(|e| e.to_string())?;
    let snapshot = session.snapshot();
    let snapshots = session.subscribe();

    *app_state.tracker.lock().await = Some(session);
    tokio::spawn(forward_snapshots(app, snapshots, app_state.tracker.clone()));

    Ok(snapshot)
}

#[tauri::command]
pub async fn stop_tracking(app_state: State<'_, AppState>) -> Result<(), String> {
    app_state.stop_tracking().await;
    Ok(())
}

/// The latest snapshot, or `None` while no session is running.
#[tauri::command]
pub async fn get_display_snapshot(app_state: State<'_, AppState>) -> Result<Option<DisplaySnapshot>, String> {
    Ok(app_state.tracker.lock().await.as_ref().map(TrackingSession::snapshot))
}

/// Opens a device's map or settings page in the system browser.
#[tauri::command]
pub async fn open_link(app: AppHandle, url: String) -> Result<(), String> {
    let url = Url::parse(&url).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("Refusing to open {} link", url.scheme()));
    }
    app.opener()
        .open_url(url.as_str(), None::<&str>)
        .map_err(|e| e.to_string())
}

async fn forward_snapshots(
    app: AppHandle,
    mut snapshots: watch::Receiver<DisplaySnapshot>,
    tracker: Arc<Mutex<Option<TrackingSession>>>,
) {
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        let authenticated = snapshot.authenticated;

        if let Err(e) = app.emit(DISPLAY_UPDATED_EVENT, snapshot) {
            error!("Failed to emit {} event: {}", DISPLAY_UPDATED_EVENT, e);
        }

        if !authenticated {
            warn!("Authentication lost, stopping tracking.");
            if let Err(e) = app.emit(AUTH_LOST_EVENT, AUTH_LOST_MESSAGE) {
                error!("Failed to emit {} event: {}", AUTH_LOST_EVENT, e);
            }
            let mut guard = tracker.lock().await;
            // a newer session may have replaced ours meanwhile
            if guard.as_ref().is_some_and(|s| !s.snapshot().authenticated) {
                if let Some(session) = guard.take() {
                    drop(guard);
                    session.stop().await;
                }
            }
            break;
        }
    }
    info!("Snapshot forwarding finished.");
}
