//! macOS-specific implementation for nfcaction.
//!
//! This crate names the programs nfcaction hands intents to on macOS.
//! Notifications go through AppleScript's `display notification`.

#![cfg(target_os = "macos")]
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

/// Initialize macOS-specific components.
///
/// # Errors
///
/// Returns an error if initialization fails.
pub fn init() -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Initializing macOS platform components");
    Ok(())
}

/// Get the platform name.
#[must_use]
pub fn platform_name() -> &'static str {
    "macOS"
}

/// Program that opens URLs with the default browser.
#[must_use]
pub fn opener_program() -> &'static str {
    "open"
}

/// Command line posting a Notification Center banner.
#[must_use]
pub fn notify_command(title: &str, body: &str) -> Vec<String> {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        applescript_escape(body),
        applescript_escape(title)
    );
    vec!["osascript".to_string(), "-e".to_string(), script]
}

/// Escape text for use inside an AppleScript string literal.
fn applescript_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
