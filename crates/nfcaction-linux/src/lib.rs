//! Linux-specific implementation for nfcaction
//!
//! This crate names the desktop programs nfcaction hands intents to on Linux.

#![cfg(target_os = "linux")]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

/// Initialize Linux-specific components
///
/// # Errors
///
/// Returns an error if initialization fails
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("DISPLAY").is_none() && std::env::var_os("WAYLAND_DISPLAY").is_none() {
        tracing::debug!("No graphical session detected, URLs may not open");
    }
    Ok(())
}

/// Get platform name
#[must_use]
pub fn platform_name() -> &'static str {
    "Linux"
}

/// Program that opens URLs with the user's preferred application
#[must_use]
pub fn opener_program() -> &'static str {
    "xdg-open"
}

/// Command line posting a desktop notification
#[must_use]
pub fn notify_command(title: &str, body: &str) -> Vec<String> {
    vec![
        "notify-send".to_string(),
        "--app-name=nfcact".to_string(),
        title.to_string(),
        body.to_string(),
    ]
}
