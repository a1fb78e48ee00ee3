//! Action descriptors stored on tags.
//!
//! A tag carries a small JSON object naming an action and its parameters:
//!
//! ```json
//! {"action": "set_timer", "duration": 300, "message": "Tea"}
//! {"action": "open_url", "url": "https://example.com"}
//! ```
//!
//! Decoding is lenient: missing or mistyped parameters fall
//! back to defaults and are rejected later, when the action is dispatched.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::ActionConfig;
use crate::ndef::{NdefMessage, NdefRecord};

/// Message used for timers that do not name one.
pub const DEFAULT_TIMER_MESSAGE: &str = "NFC Timer";

/// A decoded action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Start a countdown timer.
    SetTimer {
        /// Length in seconds. Not validated at decode time.
        duration: i32,
        /// Label shown with the timer.
        message: String,
    },
    /// Open a URL in the browser.
    OpenUrl {
        /// The URL. May be empty when the tag omitted it.
        url: String,
    },
}

/// Why a text could not be turned into an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The text is not a JSON object.
    #[error("Non-JSON content detected")]
    NotJson,

    /// The `action` key named something this build cannot perform.
    #[error("Unrecognized action: {action}")]
    Unrecognized {
        /// Value of the `action` key (empty when missing).
        action: String,
    },
}

impl Action {
    /// Decode an action descriptor.
    ///
    /// `default_message` labels timers whose descriptor has no `message`.
    ///
    /// # Errors
    ///
    /// Returns [`DescriptorError::NotJson`] if `text` does not start with a
    /// JSON object and [`DescriptorError::Unrecognized`] if the action is
    /// unknown.
    pub fn from_json(text: &str, default_message: &str) -> Result<Self, DescriptorError> {
        // Only the first value counts. Tags often pad the text with NULs.
        let first = serde_json::Deserializer::from_str(text)
            .into_iter::<Value>()
            .next();
        let object = match first {
            Some(Ok(Value::Object(object))) => object,
            _ => return Err(DescriptorError::NotJson),
        };

        match opt_string(&object, "action", "").as_str() {
            "set_timer" => Ok(Self::SetTimer {
                duration: opt_int(&object, "duration", 0),
                message: opt_string(&object, "message", default_message),
            }),
            "open_url" => Ok(Self::OpenUrl {
                url: opt_string(&object, "url", ""),
            }),
            other => Err(DescriptorError::Unrecognized {
                action: other.to_string(),
            }),
        }
    }

    /// Serialize as a compact JSON descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// The descriptor's `action` name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetTimer { .. } => "set_timer",
            Self::OpenUrl { .. } => "open_url",
        }
    }
}

/// Read an integer, accepting numbers and numeric strings.
///
/// Fractions truncate toward zero. Integers outside the `i32` range keep
/// their low 32 bits, so `2147483648` reads as `i32::MIN`. Anything else
/// yields `default`.
#[must_use]
pub fn opt_int(object: &Map<String, Value>, key: &str, default: i32) -> i32 {
    match object.get(key) {
        Some(Value::Number(number)) => number
            .as_i64()
            .map(wrap_i64)
            .or_else(|| number.as_f64().map(saturate_f64))
            .unwrap_or(default),
        Some(Value::String(text)) => text
            .trim()
            .parse::<i64>()
            .map(wrap_i64)
            .or_else(|_| text.trim().parse::<f64>().map(saturate_f64))
            .unwrap_or(default),
        _ => default,
    }
}

/// Read a string. `null` and missing keys yield `default`; other values are
/// rendered as JSON text.
#[must_use]
pub fn opt_string(object: &Map<String, Value>, key: &str, default: &str) -> String {
    match object.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn wrap_i64(value: i64) -> i32 {
    value as i32
}

#[allow(clippy::cast_possible_truncation)]
fn saturate_f64(value: f64) -> i32 {
    // `as` saturates and maps NaN to zero.
    value.trunc() as i32
}

/// The kind of action a form describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionKind {
    /// A countdown timer.
    #[default]
    Timer,
    /// A URL to open.
    OpenUrl,
}

/// Why an [`ActionForm`] could not be turned into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    /// The timer duration was left blank.
    #[error("Duration cannot be empty")]
    EmptyDuration,

    /// The timer duration was not an integer.
    #[error("Duration must be a whole number of seconds: '{value}'")]
    InvalidDuration {
        /// The rejected input.
        value: String,
    },

    /// The URL was blank or did not use an accepted scheme.
    #[error("The URL is invalid: '{url}'")]
    InvalidUrl {
        /// The rejected input.
        url: String,
    },

    /// The descriptor could not be serialized.
    #[error("failed to build the JSON descriptor: {0}")]
    Serialize(String),
}

/// Raw user input for an action, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionForm {
    /// Which action the form describes.
    pub kind: ActionKind,
    /// Timer length as typed, in seconds.
    pub timer_duration: String,
    /// Timer label as typed.
    pub timer_message: String,
    /// URL as typed.
    pub url: String,
}

impl ActionForm {
    /// A timer form.
    #[must_use]
    pub fn timer(duration: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Timer,
            timer_duration: duration.into(),
            timer_message: message.into(),
            url: String::new(),
        }
    }

    /// A URL form.
    #[must_use]
    pub fn open_url(url: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::OpenUrl,
            url: url.into(),
            ..Self::default()
        }
    }

    /// Validate the form and build the action.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] describing the first invalid field.
    pub fn to_action(&self, rules: &ActionConfig) -> Result<Action, DraftError> {
        match self.kind {
            ActionKind::Timer => {
                if self.timer_duration.trim().is_empty() {
                    return Err(DraftError::EmptyDuration);
                }
                let duration =
                    self.timer_duration
                        .parse::<i32>()
                        .map_err(|_| DraftError::InvalidDuration {
                            value: self.timer_duration.clone(),
                        })?;
                let message = if self.timer_message.trim().is_empty() {
                    rules.default_timer_message.clone()
                } else {
                    self.timer_message.clone()
                };
                Ok(Action::SetTimer { duration, message })
            }
            ActionKind::OpenUrl => {
                let blank = self.url.trim().is_empty();
                let scheme_ok = !rules.require_https || self.url.starts_with("https://");
                if blank || !scheme_ok {
                    return Err(DraftError::InvalidUrl {
                        url: self.url.clone(),
                    });
                }
                Ok(Action::OpenUrl {
                    url: self.url.clone(),
                })
            }
        }
    }

    /// Validate the form and serialize the resulting descriptor.
    ///
    /// # Errors
    ///
    /// Returns a [`DraftError`] if validation or serialization fails.
    pub fn to_json(&self, rules: &ActionConfig) -> Result<String, DraftError> {
        self.to_action(rules)?
            .to_json()
            .map_err(|e| DraftError::Serialize(e.to_string()))
    }

    /// Validate the form and build the single text record message a tag
    /// stores.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Draft`](crate::Error::Draft) for an invalid form and
    /// [`Error::Ndef`](crate::Error::Ndef) for an invalid language code.
    pub fn to_message(&self, rules: &ActionConfig, language: &str) -> crate::Result<NdefMessage> {
        let json = self.to_json(rules)?;
        let record = NdefRecord::text(language, &json)?;
        Ok(NdefMessage::new(vec![record])?)
    }
}
