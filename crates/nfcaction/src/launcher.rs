//! Launchers that carry out intents.
//!
//! [`SystemLauncher`] opens URIs with the desktop's opener program and runs
//! timers in-process, posting a desktop notification when one expires.
//! [`RecordingLauncher`] only records what it was asked to do.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::dispatch::{Intent, Launcher};
use crate::error::{Error, Result};

/// Handler name reported for in-process timers.
pub const TIMER_HANDLER: &str = "timer";

/// Builds the argv of a notification command from a title and a body.
pub type NotifyCommand = fn(&str, &str) -> Vec<String>;

/// Launches intents on the local desktop.
#[derive(Debug)]
pub struct SystemLauncher {
    opener: String,
    notify: Option<NotifyCommand>,
    timers: tokio::sync::Mutex<JoinSet<()>>,
}

impl SystemLauncher {
    /// Create a launcher that opens URIs with `opener`.
    ///
    /// `notify` builds the command run when a timer expires. Without it,
    /// expiry is only logged.
    #[must_use]
    pub fn new(opener: impl Into<String>, notify: Option<NotifyCommand>) -> Self {
        Self {
            opener: opener.into(),
            notify,
            timers: tokio::sync::Mutex::new(JoinSet::new()),
        }
    }

    /// The program used to open URIs.
    #[must_use]
    pub fn opener(&self) -> &str {
        &self.opener
    }

    /// Wait until every started timer has expired.
    pub async fn wait_for_timers(&self) {
        let mut timers = self.timers.lock().await;
        while let Some(joined) = timers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Timer task failed");
            }
        }
    }

    /// Number of timers still running.
    pub async fn pending_timers(&self) -> usize {
        self.timers.lock().await.len()
    }

    async fn open(&self, uri: &str) -> Result<()> {
        debug!(opener = %self.opener, %uri, "Opening URI");
        let status = Command::new(&self.opener)
            .arg(uri)
            .status()
            .await
            .map_err(|e| Error::launch(&self.opener, e))?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::HandlerFailed {
                program: self.opener.clone(),
                status,
            })
        }
    }

    async fn start_timer(&self, length_secs: u32, message: &str, skip_ui: bool) -> Result<()> {
        let notify = self.notify;
        if !skip_ui {
            if let Some(build) = notify {
                run_notify(&build("Timer started", &format!("{message} ({length_secs}s)"))).await;
            }
        }

        let message = message.to_string();
        let mut timers = self.timers.lock().await;
        reap_finished(&mut timers);
        timers.spawn(async move {
            tokio::time::sleep(Duration::from_secs(u64::from(length_secs))).await;
            info!(%message, length_secs, "Timer finished");
            if let Some(build) = notify {
                run_notify(&build("Timer finished", &message)).await;
            }
        });
        Ok(())
    }
}

#[async_trait]
impl Launcher for SystemLauncher {
    fn resolve(&self, intent: &Intent) -> Option<String> {
        match intent {
            Intent::SetTimer { .. } => Some(TIMER_HANDLER.to_string()),
            Intent::View { uri } => {
                if let Err(e) = url::Url::parse(uri) {
                    debug!(%uri, error = %e, "URI does not parse");
                    return None;
                }
                find_program(&self.opener).map(|path| path.display().to_string())
            }
        }
    }

    async fn start(&self, intent: &Intent) -> Result<()> {
        match intent {
            Intent::SetTimer {
                length_secs,
                message,
                skip_ui,
            } => self.start_timer(*length_secs, message, *skip_ui).await,
            Intent::View { uri } => self.open(uri).await,
        }
    }
}

/// Drop timers that have already expired so a long watch does not
/// accumulate them.
fn reap_finished(timers: &mut JoinSet<()>) {
    while let Some(joined) = timers.try_join_next() {
        if let Err(e) = joined {
            warn!(error = %e, "Timer task failed");
        }
    }
}

async fn run_notify(argv: &[String]) {
    let Some((program, args)) = argv.split_first() else {
        return;
    };
    match Command::new(program).args(args).status().await {
        Ok(status) if status.success() => {}
        Ok(status) => warn!(%program, %status, "Notification command failed"),
        Err(e) => warn!(%program, error = %e, "Notification command could not start"),
    }
}

/// Locate `program` the way a shell would.
///
/// Names containing a path separator are checked as given; bare names are
/// looked up in `PATH`.
#[must_use]
pub fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

/// A launcher that records intents instead of carrying them out.
///
/// Used for dry runs.
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    started: Mutex<Vec<Intent>>,
    refuse: bool,
    failure: Option<String>,
}

impl RecordingLauncher {
    /// A launcher that accepts every intent.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A launcher that resolves no handler for any intent.
    #[must_use]
    pub fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    /// A launcher whose handlers always fail with `reason`.
    #[must_use]
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Intents started so far, oldest first.
    #[must_use]
    pub fn started(&self) -> Vec<Intent> {
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Launcher for RecordingLauncher {
    fn resolve(&self, _intent: &Intent) -> Option<String> {
        (!self.refuse).then(|| "dry-run".to_string())
    }

    async fn start(&self, intent: &Intent) -> Result<()> {
        if let Some(reason) = &self.failure {
            return Err(Error::platform(reason.clone()));
        }
        info!(%intent, "Dry run, not launching");
        self.started
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(intent.clone());
        Ok(())
    }
}

/// The launcher selected by configuration.
#[derive(Debug)]
pub enum HostLauncher {
    /// Launch on the local desktop.
    System(SystemLauncher),
    /// Record intents only.
    DryRun(RecordingLauncher),
}

impl HostLauncher {
    /// Pick a launcher for `config`.
    ///
    /// `default_opener` is used when no opener is configured.
    #[must_use]
    pub fn from_config(
        config: &DispatchConfig,
        default_opener: &str,
        notify: Option<NotifyCommand>,
    ) -> Self {
        if config.dry_run {
            return Self::DryRun(RecordingLauncher::new());
        }
        let opener = config.opener.as_deref().unwrap_or(default_opener);
        Self::System(SystemLauncher::new(opener, notify))
    }

    /// Whether intents are only recorded.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }

    /// Number of timers still running.
    pub async fn pending_timers(&self) -> usize {
        match self {
            Self::System(launcher) => launcher.pending_timers().await,
            Self::DryRun(_) => 0,
        }
    }

    /// Wait until every started timer has expired.
    pub async fn wait_for_timers(&self) {
        if let Self::System(launcher) = self {
            launcher.wait_for_timers().await;
        }
    }
}

#[async_trait]
impl Launcher for HostLauncher {
    fn resolve(&self, intent: &Intent) -> Option<String> {
        match self {
            Self::System(launcher) => launcher.resolve(intent),
            Self::DryRun(launcher) => launcher.resolve(intent),
        }
    }

    async fn start(&self, intent: &Intent) -> Result<()> {
        match self {
            Self::System(launcher) => launcher.start(intent).await,
            Self::DryRun(launcher) => launcher.start(intent).await,
        }
    }
}
