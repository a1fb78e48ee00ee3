//! Dispatching decoded actions to the host.
//!
//! An [`Action`] is mapped to an [`Intent`], which a [`Launcher`] first
//! resolves to a handler and then starts. Every failure along the way ends
//! in a [`DispatchOutcome`] carrying a user-facing message; nothing is
//! retried.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::action::{Action, DescriptorError};
use crate::config::Config;
use crate::error::Result;

/// A request for the host to do something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Start a countdown timer.
    SetTimer {
        /// Length in seconds, always positive.
        length_secs: u32,
        /// Label for the timer.
        message: String,
        /// Start without showing the clock UI.
        skip_ui: bool,
    },
    /// Open a URI with the default handler.
    View {
        /// The URI to open.
        uri: String,
    },
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SetTimer {
                length_secs,
                message,
                ..
            } => write!(f, "set timer '{message}' for {length_secs}s"),
            Self::View { uri } => write!(f, "view {uri}"),
        }
    }
}

/// Something that can carry out intents on the host.
#[async_trait]
pub trait Launcher: Send + Sync + std::fmt::Debug {
    /// Find the handler for `intent`, `None` when nothing can handle it.
    fn resolve(&self, intent: &Intent) -> Option<String>;

    /// Carry out `intent`.
    ///
    /// # Errors
    ///
    /// Returns an error if the handler cannot be started.
    async fn start(&self, intent: &Intent) -> Result<()>;
}

/// How dispatching a tag's text ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The intent was handed to its handler.
    Launched {
        /// The intent.
        intent: Intent,
        /// The handler that took it.
        handler: String,
    },
    /// The text is not a JSON object.
    NotJson,
    /// The `action` key is unknown.
    Unrecognized {
        /// The unknown action.
        action: String,
    },
    /// A timer had a zero or negative length.
    InvalidTimerDuration {
        /// The rejected length.
        duration: i32,
    },
    /// An `open_url` action had no URL.
    MissingUrl,
    /// No handler could take the intent.
    NoHandler {
        /// The unhandled intent.
        intent: Intent,
    },
    /// The handler was found but failed to start.
    LaunchFailed {
        /// The intent.
        intent: Intent,
        /// What went wrong.
        reason: String,
    },
}

impl DispatchOutcome {
    /// User-facing message, `None` when a successful launch needs no notice.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Launched {
                intent: Intent::SetTimer {
                    length_secs,
                    message,
                    ..
                },
                ..
            } => Some(format!("Timer '{message}' started for {length_secs}s")),
            Self::Launched { .. } => None,
            Self::NotJson => Some(DescriptorError::NotJson.to_string()),
            Self::Unrecognized { action } => Some(
                DescriptorError::Unrecognized {
                    action: action.clone(),
                }
                .to_string(),
            ),
            Self::InvalidTimerDuration { .. } => Some("Invalid timer duration".to_string()),
            Self::MissingUrl => Some("Invalid or missing URL".to_string()),
            Self::NoHandler {
                intent: Intent::SetTimer { .. },
            } => Some("No clock application found".to_string()),
            Self::NoHandler {
                intent: Intent::View { .. },
            } => Some("No browser application found".to_string()),
            Self::LaunchFailed { reason, .. } => Some(format!("Error: {reason}")),
        }
    }

    /// Whether the action reached its handler.
    #[must_use]
    pub fn is_launched(&self) -> bool {
        matches!(self, Self::Launched { .. })
    }
}

/// A dispatch outcome with the time it was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    /// When dispatching finished.
    pub at: DateTime<Utc>,
    /// The text that was dispatched.
    pub text: String,
    /// How it ended.
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
}

/// Options for mapping actions to intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Label for timers without one.
    pub default_timer_message: String,
    /// Start timers without UI.
    pub skip_ui: bool,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            default_timer_message: crate::action::DEFAULT_TIMER_MESSAGE.to_string(),
            skip_ui: true,
        }
    }
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            default_timer_message: config.action.default_timer_message.clone(),
            skip_ui: config.dispatch.skip_ui,
        }
    }
}

/// Turns tag text into intents and hands them to a [`Launcher`].
#[derive(Debug)]
pub struct ActionDispatcher<L> {
    launcher: L,
    options: DispatchOptions,
}

impl<L: Launcher> ActionDispatcher<L> {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(launcher: L, options: DispatchOptions) -> Self {
        Self { launcher, options }
    }

    /// The underlying launcher.
    #[must_use]
    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Decode `text` as an action descriptor and carry it out.
    pub async fn execute(&self, text: &str) -> DispatchReport {
        let outcome = self.execute_outcome(text).await;
        DispatchReport {
            at: Utc::now(),
            text: text.to_string(),
            outcome,
        }
    }

    async fn execute_outcome(&self, text: &str) -> DispatchOutcome {
        let action = match Action::from_json(text, &self.options.default_timer_message) {
            Ok(action) => action,
            Err(DescriptorError::NotJson) => return DispatchOutcome::NotJson,
            Err(DescriptorError::Unrecognized { action }) => {
                debug!(%action, "Unrecognized action");
                return DispatchOutcome::Unrecognized { action };
            }
        };

        let intent = match self.intent_for(action) {
            Ok(intent) => intent,
            Err(outcome) => return outcome,
        };

        let Some(handler) = self.launcher.resolve(&intent) else {
            error!(%intent, "No handler resolved for intent");
            return DispatchOutcome::NoHandler { intent };
        };

        match self.launcher.start(&intent).await {
            Ok(()) => {
                info!(%intent, %handler, "Intent started");
                DispatchOutcome::Launched { intent, handler }
            }
            Err(e) => {
                error!(%intent, %handler, error = %e, "Intent failed to start");
                DispatchOutcome::LaunchFailed {
                    intent,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn intent_for(&self, action: Action) -> std::result::Result<Intent, DispatchOutcome> {
        match action {
            Action::SetTimer { duration, message } => {
                let length_secs = u32::try_from(duration)
                    .ok()
                    .filter(|&secs| secs > 0)
                    .ok_or(DispatchOutcome::InvalidTimerDuration { duration })?;
                Ok(Intent::SetTimer {
                    length_secs,
                    message,
                    skip_ui: self.options.skip_ui,
                })
            }
            Action::OpenUrl { url } => {
                if url.trim().is_empty() {
                    return Err(DispatchOutcome::MissingUrl);
                }
                Ok(Intent::View { uri: url })
            }
        }
    }
}
