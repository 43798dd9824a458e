//! CLI commands for DroneWatch using clap.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::agent::AgentSnapshot;
use crate::config::{get_settings_path, load_settings_or_default, save_settings, Settings};
use crate::persistence::{default_db_path, MemorySink, MessageRecord, PersistenceSink, SqliteSink};
use crate::protocol::contract_net::THIEF_DETECTED;
use crate::protocol::{Envelope, Performative};
use crate::sim::{open_sink, Simulation};
use crate::web::{run_server, AppState, WebServerConfig};

/// DroneWatch - message-driven security drone simulation.
#[derive(Parser)]
#[command(name = "dronewatch")]
#[command(version)]
#[command(about = "DroneWatch - drone, camera, guard and robber agents over a KQML-style channel", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the simulation with its HTTP gateway
    Serve {
        /// Bind address (overrides settings)
        #[arg(long, env = "DRONEWATCH_HOST")]
        host: Option<String>,

        /// Port (overrides settings)
        #[arg(short, long, env = "DRONEWATCH_PORT")]
        port: Option<u16>,
    },

    /// Run the thief-detection exchange in-process and print the outcome
    Scenario {
        /// Number of clock ticks to run
        #[arg(short, long, default_value_t = 30)]
        ticks: u32,

        /// Accept the drone's proposal on this tick
        #[arg(long)]
        accept_at: Option<u32>,

        /// Write records to the configured store instead of memory
        #[arg(long)]
        record: bool,
    },

    /// Show recorded agent snapshots and messages
    History {
        /// Number of messages to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show or initialize settings
    Config {
        /// Write default settings (keeps an existing file unless --force)
        #[arg(long)]
        init: bool,

        #[arg(long, requires = "init")]
        force: bool,
    },
}

impl Commands {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Command::Serve { host, port } => cmd_serve(host.clone(), *port).await,
            Command::Scenario {
                ticks,
                accept_at,
                record,
            } => cmd_scenario(*ticks, *accept_at, *record).await,
            Command::History { limit } => cmd_history(*limit),
            Command::Config { init, force } => cmd_config(*init, *force),
        }
    }
}

// Command implementations

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut settings = load_settings_or_default();
    if let Some(host) = host {
        settings.gateway.host = host;
    }
    if let Some(port) = port {
        settings.gateway.port = port;
    }

    let sim = Simulation::from_settings(&settings)?;
    sim.record_initial_state();
    let clock = sim.spawn();

    let config = WebServerConfig::from(settings.gateway.clone());
    println!("DroneWatch gateway on http://{}:{}", config.host, config.port);
    println!("  POST /kqml_message  POST /agent_action  POST /log_message");
    println!("  GET  /agents  GET /queue  GET /health");
    println!("Press Ctrl+C to stop");

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown requested");
    };
    let served = run_server(config, AppState::from(&sim), shutdown).await;

    sim.stop().await;
    match clock.await {
        Ok(result) => result?,
        Err(e) => tracing::error!("Clock task ended abnormally: {}", e),
    }
    served?;
    Ok(())
}

async fn cmd_scenario(ticks: u32, accept_at: Option<u32>, record: bool) -> Result<()> {
    let settings = load_settings_or_default();
    let memory = Arc::new(MemorySink::new());
    let sink: Arc<dyn PersistenceSink> = if record {
        open_sink(&settings)?
    } else {
        memory.clone()
    };

    let sim = Simulation::new(&settings, sink);
    sim.record_initial_state();

    let report = format!("{} nearby", THIEF_DETECTED);
    println!("Camera reports: {}", report);
    sim.channel()
        .enqueue(Envelope::new("CameraAgent", "CameraAgent", Performative::Inform, report));

    let mut ticker = tokio::time::interval(sim.clock().period());
    for tick in 0..ticks {
        ticker.tick().await;
        if accept_at == Some(tick) {
            println!("[tick {:>3}] camera accepts the drone's proposal", tick);
            sim.channel().enqueue(Envelope::new(
                "CameraAgent",
                "DroneAgent",
                Performative::AcceptProposal,
                "",
            ));
        }
        let result = sim.clock().tick();
        if result.drained > 0 {
            println!("[tick {:>3}] {}", tick, result);
        }
    }
    // Let a timer due on the last tick land before reporting.
    tokio::time::sleep(Duration::from_millis(10)).await;

    println!();
    print_snapshots(&sim.registry().snapshots());

    if !record {
        println!();
        print_messages(&memory.messages());
    }
    Ok(())
}

fn cmd_history(limit: usize) -> Result<()> {
    let settings = load_settings_or_default();
    let path = match settings.persistence.db_path {
        Some(path) => path,
        None => default_db_path()?,
    };
    if !path.exists() {
        println!("No records at {}", path.display());
        return Ok(());
    }

    let store = SqliteSink::open(&path)?;
    println!("Records: {}", path.display());
    println!();
    print_snapshots(&store.agents()?);
    println!();
    println!(
        "Messages ({} of {}):",
        limit.min(store.message_count()?),
        store.message_count()?
    );
    let mut messages = store.recent_messages(limit)?;
    messages.reverse();
    print_messages(&messages);
    Ok(())
}

fn cmd_config(init: bool, force: bool) -> Result<()> {
    let path = get_settings_path()?;
    if init {
        if path.exists() && !force {
            println!("Settings already exist at {} (use --force to overwrite)", path.display());
            return Ok(());
        }
        let written = save_settings(&Settings::default())?;
        println!("Wrote default settings to {}", written.display());
        return Ok(());
    }

    let settings = load_settings_or_default();
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn print_snapshots(snapshots: &[AgentSnapshot]) {
    println!("Agents:");
    for snapshot in snapshots {
        let battery = snapshot
            .battery
            .map(|b| format!("{:.1}", b))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<12} | {:<16} | pos=({}, {}, {}) | battery={}",
            snapshot.role,
            snapshot.status,
            snapshot.position.x,
            snapshot.position.y,
            snapshot.position.z,
            battery
        );
    }
}

fn print_messages(messages: &[MessageRecord]) {
    if messages.is_empty() {
        println!("No messages recorded.");
        return;
    }
    println!("Message log:");
    for message in messages {
        println!(
            "  {} {} -> {} ({}): {}",
            format_ts_ms(message.recorded_at),
            message.sender.as_deref().unwrap_or("?"),
            message.receiver,
            message.performative,
            message.content
        );
    }
}

fn format_ts_ms(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| {
            dt.with_timezone(&chrono::Local)
                .format("%H:%M:%S%.3f")
                .to_string()
        })
        .unwrap_or_else(|| ts.to_string())
}
