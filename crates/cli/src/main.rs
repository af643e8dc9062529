// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! berth: command-line front end for the app lifecycle manager.

use anyhow::{bail, Context, Result};
use berth_core::{Line, LineTag, OnLine, SystemClock};
use berth_engine::{Deps, InputTicket, Job, JobDispatcher, LibraryOps, OnInput};
use berth_envs::EnvProvisioner;
use berth_platform::PathResolver;
use berth_shell::ProcessEngine;
use berth_storage::StateStore;
use berth_tunnel::{AgentBroker, TunnelConfig};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "berth", about = "Cloud app lifecycle manager", version)]
struct Cli {
    /// Override the platform base directory.
    #[arg(long, global = true)]
    base: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the detected platform and its resources.
    Platform,
    /// Show all apps, or one app in detail.
    Status { app_name: Option<String> },
    /// Install an app from an installer file.
    Install {
        /// Path to install.json / install.js / requirements.txt.
        installer: PathBuf,
        app_name: String,
    },
    /// Launch an installed app and wait for its web UI.
    Launch {
        app_name: String,
        /// Seconds to keep watching for the UI-ready signal.
        #[arg(long, default_value_t = 20)]
        wait: u64,
    },
    /// Stop a running app.
    Stop { app_name: String },
    /// Uninstall an app: environment, files, and record.
    Uninstall { app_name: String },
    /// Read or write an app's config.json.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Drop stale error records and compact the state database.
    Cleanup,
}

#[derive(Subcommand)]
enum ConfigAction {
    Get { app_name: String },
    Set { app_name: String, json: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut descriptor = berth_platform::probe().context("platform detection failed")?;
    if let Some(base) = cli.base {
        descriptor.base_path = base;
    }

    if let Command::Platform = cli.command {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    let paths = PathResolver::new(&descriptor);
    let processes = Arc::new(ProcessEngine::new()?);
    let envs = Arc::new(EnvProvisioner::new(
        &descriptor,
        paths.envs()?,
        Arc::clone(&processes),
    )?);
    let store = Arc::new(StateStore::open(&paths.config()?, SystemClock)?);
    let sink = terminal_sink();
    let broker = Arc::new(AgentBroker::new(
        TunnelConfig::default(),
        Arc::clone(&processes),
        Arc::clone(&sink),
    ));
    let deps = Arc::new(Deps { store, envs, processes, paths, broker });

    match cli.command {
        Command::Platform => unreachable!("handled above"),
        Command::Status { app_name } => status(&deps, app_name.as_deref()),
        Command::Install { installer, app_name } => {
            run_job(&deps, &sink, Job::Install { app_name, installer })
        }
        Command::Launch { app_name, wait } => launch(&deps, &sink, app_name, wait),
        Command::Stop { app_name } => run_job(&deps, &sink, Job::Stop { app_name }),
        Command::Uninstall { app_name } => run_job(&deps, &sink, Job::Uninstall { app_name }),
        Command::Config { action } => config(&deps, action),
        Command::Cleanup => {
            let removed = deps.store.cleanup()?;
            println!("removed {removed} stale record(s)");
            Ok(())
        }
    }
}

/// Sink that prints process output to stdout and diagnostics to stderr.
fn terminal_sink() -> OnLine {
    Arc::new(|line: &Line| match line.tag {
        LineTag::Error => eprintln!("! {}", line.text),
        _ => println!("{}", line.text),
    })
}

/// Interactive input steps read their answers from the terminal.
fn stdin_input() -> OnInput {
    Arc::new(|request| {
        let default_hint = request
            .default
            .as_deref()
            .map(|d| format!(" [{d}]"))
            .unwrap_or_default();
        eprint!("{}{}: ", request.prompt, default_hint);
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        let value = match std::io::stdin().lock().read_line(&mut answer) {
            Ok(_) => {
                let trimmed = answer.trim();
                if trimmed.is_empty() {
                    request.default.clone()
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(_) => None,
        };
        InputTicket::ready(value)
    })
}

/// Enqueue one job and wait for the dispatcher to finish it.
fn run_job(deps: &Arc<Deps<SystemClock>>, sink: &OnLine, job: Job) -> Result<()> {
    let dispatcher =
        JobDispatcher::new(Arc::clone(deps), Arc::clone(sink), Some(stdin_input()), None);
    let (done_tx, done_rx) = mpsc::channel::<()>();
    dispatcher.subscribe(Arc::new(move |_| {
        let _ = done_tx.send(());
    }));
    let app_name = job.app_name().to_string();
    let requires_record = matches!(job, Job::Launch { .. } | Job::Stop { .. });
    if !dispatcher.enqueue(job) {
        bail!("dispatcher is not running");
    }
    done_rx.recv().ok();
    dispatcher.shutdown();

    match deps.store.get(&app_name)? {
        Some(record) => {
            println!("{}: {}", record.app_name, record.status);
            if record.status == berth_core::AppStatus::Error {
                bail!(
                    "{}",
                    record.error_message.unwrap_or_else(|| "job failed".to_string())
                );
            }
        }
        None if requires_record => bail!("app '{app_name}' not found"),
        None => {}
    }
    Ok(())
}

/// Launch, then keep the process alive long enough to observe the
/// UI-ready signal and tunnel attach.
fn launch(
    deps: &Arc<Deps<SystemClock>>,
    sink: &OnLine,
    app_name: String,
    wait: u64,
) -> Result<()> {
    run_job(deps, sink, Job::Launch { app_name: app_name.clone() })?;

    let deadline = Instant::now() + Duration::from_secs(wait);
    while Instant::now() < deadline {
        if let Some(record) = deps.store.get(&app_name)? {
            if let Some(url) = record.tunnel_url {
                println!("public url: {url}");
                return Ok(());
            }
        }
        std::thread::sleep(Duration::from_millis(500));
    }
    println!("no web ui detected within {wait}s (app is still running)");
    Ok(())
}

fn status(deps: &Arc<Deps<SystemClock>>, app_name: Option<&str>) -> Result<()> {
    match app_name {
        Some(app_name) => {
            let record = deps
                .store
                .get(app_name)?
                .with_context(|| format!("app '{app_name}' not found"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        None => {
            let records = deps.store.all()?;
            if records.is_empty() {
                println!("no apps installed");
                return Ok(());
            }
            for record in records {
                let url = record.tunnel_url.as_deref().unwrap_or("-");
                let pid = record
                    .process_pid
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{:<24} {:<12} pid={:<8} {}", record.app_name, record.status, pid, url);
            }
        }
    }
    Ok(())
}

fn config(deps: &Arc<Deps<SystemClock>>, action: ConfigAction) -> Result<()> {
    let library = LibraryOps::new(Arc::clone(deps));
    match action {
        ConfigAction::Get { app_name } => {
            let value = library.get_config(&app_name)?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        ConfigAction::Set { app_name, json } => {
            let value: serde_json::Value =
                serde_json::from_str(&json).context("config must be valid json")?;
            library.set_config(&app_name, &value)?;
            println!("config updated for '{app_name}'");
        }
    }
    Ok(())
}
