//! `nfcact` - CLI for nfcaction
//!
//! This binary reads and writes NFC action tags stored as tag image files
//! and runs their actions on the local desktop.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};

use nfcaction::cli::{
    Cli, Command, ConfigCommand, DecodeCommand, DispatchCommand, EncodeCommand, ReadCommand,
    StatusCommand, WatchCommand, WriteCommand,
};
use nfcaction::launcher::find_program;
use nfcaction::session::SessionOutcome;
use nfcaction::{
    init_logging, reader, ActionDispatcher, Config, DispatchOptions, FileTag, FileTagOptions,
    HostLauncher, NdefMessage, NdefTag, PresentedTag, Session, SessionReport,
    TagIntent, TagWatcher,
};

// Platform-specific imports using conditional compilation
#[cfg(target_os = "linux")]
use nfcaction_linux as platform;

#[cfg(target_os = "macos")]
use nfcaction_mac as platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let mut config = Config::load_from(cli.config.clone()).context("loading configuration")?;
    if cli.dry_run {
        config.dispatch.dry_run = true;
    }

    platform::init().map_err(|e| anyhow!("platform initialization failed: {e}"))?;

    match cli.command {
        Command::Read(cmd) => handle_read(&config, cmd).await,
        Command::Write(cmd) => handle_write(&config, &cmd).await,
        Command::Encode(cmd) => handle_encode(&config, &cmd),
        Command::Decode(cmd) => handle_decode(&config, &cmd).await,
        Command::Dispatch(cmd) => handle_dispatch(&config, &cmd).await,
        Command::Watch(cmd) => handle_watch(&config, &cmd).await,
        Command::Status(cmd) => handle_status(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn dispatcher(config: &Config) -> ActionDispatcher<HostLauncher> {
    let launcher = HostLauncher::from_config(
        &config.dispatch,
        platform::opener_program(),
        Some(platform::notify_command),
    );
    if launcher.is_dry_run() {
        info!("Dry run, actions are recorded instead of launched");
    }
    ActionDispatcher::new(launcher, DispatchOptions::from(config))
}

fn open_tag(path: &Path, options: FileTagOptions) -> anyhow::Result<Option<FileTag>> {
    let tag = FileTag::get(path, options).map_err(nfcaction::Error::from);
    tag.with_context(|| format!("opening tag image {}", path.display()))
}

fn presented(tag: Option<&mut FileTag>) -> PresentedTag<'_> {
    match tag {
        Some(tag) => PresentedTag::Ndef(tag),
        None => PresentedTag::NotNdef,
    }
}

fn print_report(report: &SessionReport) {
    println!("{}", report.status);
    for notice in &report.notices {
        eprintln!("{notice}");
    }
}

async fn wait_for_timers(launcher: &HostLauncher) {
    let pending = launcher.pending_timers().await;
    if pending > 0 {
        eprintln!("Waiting for {pending} timer(s) to finish, press Ctrl-C to abandon");
        tokio::select! {
            () = launcher.wait_for_timers() => {}
            _ = tokio::signal::ctrl_c() => info!("Abandoning running timers"),
        }
    }
}

async fn wait_for_presentation(path: &Path, config: &Config) -> anyhow::Result<()> {
    if path.exists() {
        return Ok(());
    }
    eprintln!("Waiting for a tag at {}...", path.display());
    let mut watcher = TagWatcher::new(path, config.poll_interval());
    let handle = watcher.handle();
    let (tx, mut rx) = mpsc::channel(1);
    let task = tokio::spawn(async move { watcher.start(tx).await });

    let presentation = tokio::select! {
        presentation = rx.recv() => presentation,
        _ = tokio::signal::ctrl_c() => None,
    };
    handle.stop();
    task.await.context("tag watcher task failed")?;

    match presentation {
        Some(presentation) => {
            debug!(hash = %presentation.content_hash, "Tag presented");
            Ok(())
        }
        None => bail!("no tag presented"),
    }
}

async fn handle_read(config: &Config, cmd: ReadCommand) -> anyhow::Result<()> {
    if cmd.wait {
        wait_for_presentation(&cmd.tag, config).await?;
    }

    let options = FileTagOptions {
        create_missing: false,
        ..FileTagOptions::from(&config.tag)
    };
    let mut tag = open_tag(&cmd.tag, options)?;

    if cmd.no_dispatch {
        let message = reader::read_tag(tag.as_mut().map(|t| t as &mut dyn NdefTag))?;
        return print_text(&message, cmd.json);
    }

    let mut session = Session::new(dispatcher(config), config);
    let report = session
        .on_new_intent(TagIntent::tag(presented(tag.as_mut())))
        .await;
    finish_read(&session, &report, cmd.json).await
}

async fn finish_read(
    session: &Session<HostLauncher>,
    report: &SessionReport,
    json: bool,
) -> anyhow::Result<()> {
    let Some(SessionOutcome::Dispatched(dispatch)) = &report.outcome else {
        bail!("{}", report.status);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(dispatch)?);
    } else {
        print_report(report);
    }
    wait_for_timers(session.dispatcher().launcher()).await;

    if dispatch.outcome.is_launched() {
        Ok(())
    } else {
        bail!("action was not run")
    }
}

fn print_text(message: &NdefMessage, json: bool) -> anyhow::Result<()> {
    let text = reader::parse_ndef_message(message)?;
    if json {
        let value = serde_json::json!({
            "language": text.language,
            "encoding": text.encoding.to_string(),
            "text": text.text,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", text.text);
    }
    Ok(())
}

async fn handle_write(config: &Config, cmd: &WriteCommand) -> anyhow::Result<()> {
    let options = FileTagOptions {
        read_only: cmd.read_only,
        ..FileTagOptions::from(&config.tag)
    };
    let mut tag = open_tag(&cmd.tag, options)?;

    let mut session = Session::new(dispatcher(config), config);
    session.toggle_write_mode();
    session.set_form(cmd.action.to_form());

    let report = session
        .on_new_intent(TagIntent::tag(presented(tag.as_mut())))
        .await;
    for notice in &report.notices {
        eprintln!("{notice}");
    }

    match report.outcome {
        Some(SessionOutcome::Written(result)) if result.is_success() => {
            info!(tag = %cmd.tag.display(), "Action written");
            Ok(())
        }
        _ => bail!("tag {} was not written", cmd.tag.display()),
    }
}

fn handle_encode(config: &Config, cmd: &EncodeCommand) -> anyhow::Result<()> {
    let form = cmd.action.to_form();
    if cmd.descriptor {
        println!("{}", form.to_json(&config.action)?);
        return Ok(());
    }

    let message = form.to_message(&config.action, &config.tag.language)?;
    println!("{}", message.to_hex());
    Ok(())
}

async fn handle_decode(config: &Config, cmd: &DecodeCommand) -> anyhow::Result<()> {
    let message = NdefMessage::from_hex(&cmd.hex).context("decoding hex input")?;

    if cmd.no_dispatch {
        return print_text(&message, cmd.json);
    }

    let mut session = Session::new(dispatcher(config), config);
    let report = session
        .on_new_intent(TagIntent::ndef(vec![message], PresentedTag::Missing))
        .await;
    finish_read(&session, &report, cmd.json).await
}

async fn handle_dispatch(config: &Config, cmd: &DispatchCommand) -> anyhow::Result<()> {
    let dispatcher = dispatcher(config);
    let report = dispatcher.execute(&cmd.descriptor).await;

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if let Some(message) = report.outcome.message() {
        println!("{message}");
    }
    wait_for_timers(dispatcher.launcher()).await;

    if report.outcome.is_launched() {
        Ok(())
    } else {
        bail!("action was not run")
    }
}

async fn handle_watch(config: &Config, cmd: &WatchCommand) -> anyhow::Result<()> {
    let poll_interval = cmd
        .interval
        .map_or_else(|| config.poll_interval(), std::time::Duration::from_millis);
    if poll_interval.is_zero() {
        bail!("poll interval must be greater than 0");
    }

    let mut watcher = TagWatcher::new(&cmd.tag, poll_interval);
    let handle = watcher.handle();
    let (tx, mut rx) = mpsc::channel(8);
    let task = tokio::spawn(async move { watcher.start(tx).await });

    let mut session = Session::new(dispatcher(config), config);
    println!("{}", session.status());

    let options = FileTagOptions {
        create_missing: false,
        ..FileTagOptions::from(&config.tag)
    };
    loop {
        tokio::select! {
            presentation = rx.recv() => {
                let Some(presentation) = presentation else { break };
                debug!(path = %presentation.path.display(), "Handling presented tag");
                let mut tag = match open_tag(&presentation.path, options.clone()) {
                    Ok(tag) => tag,
                    Err(e) => {
                        eprintln!("{e:#}");
                        continue;
                    }
                };
                let report = session
                    .on_new_intent(TagIntent::tag(presented(tag.as_mut())))
                    .await;
                print_report(&report);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping tag watch");
                break;
            }
        }
    }

    handle.stop();
    task.await.context("tag watcher task failed")?;
    wait_for_timers(session.dispatcher().launcher()).await;
    Ok(())
}

fn handle_status(config: &Config, cmd: &StatusCommand) -> anyhow::Result<()> {
    let opener = config
        .dispatch
        .opener
        .as_deref()
        .unwrap_or_else(|| platform::opener_program());
    let opener_path = find_program(opener);
    let config_path = Config::default_config_path();

    if cmd.json {
        let status = serde_json::json!({
            "platform": platform::platform_name(),
            "config_path": config_path,
            "config_exists": config_path.exists(),
            "opener": opener,
            "opener_path": opener_path,
            "dry_run": config.dispatch.dry_run,
            "language": config.tag.language,
            "capacity": config.tag.capacity,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("nfcact status");
        println!("-------------");
        println!("Platform:      {}", platform::platform_name());
        println!(
            "Config:        {}{}",
            config_path.display(),
            if config_path.exists() { "" } else { " (not found, using defaults)" }
        );
        match &opener_path {
            Some(path) => println!("URL opener:    {opener} ({})", path.display()),
            None => println!("URL opener:    {opener} (not found, URLs cannot be opened)"),
        }
        println!("Timers:        built in");
        println!("Dry run:       {}", config.dispatch.dry_run);
        println!("Tag language:  {}", config.tag.language);
        println!("Tag capacity:  {} bytes", config.tag.capacity);
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Tag]");
                println!("  Language:               {}", config.tag.language);
                println!("  Capacity (bytes):       {}", config.tag.capacity);
                println!("  Create missing images:  {}", config.tag.create_missing);
                println!();
                println!("[Action]");
                println!(
                    "  Default timer message:  {}",
                    config.action.default_timer_message
                );
                println!("  Require https:          {}", config.action.require_https);
                println!();
                println!("[Dispatch]");
                println!("  Dry run:                {}", config.dispatch.dry_run);
                println!("  Skip timer UI:          {}", config.dispatch.skip_ui);
                println!(
                    "  Opener:                 {}",
                    config
                        .dispatch
                        .opener
                        .as_deref()
                        .unwrap_or_else(|| platform::opener_program())
                );
                println!();
                println!("[Watch]");
                println!("  Poll interval (ms):     {}", config.watch.poll_interval_ms);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
