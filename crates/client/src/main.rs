// Command-line admin agent
// Logs in as this device and watches for the session being taken over

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cyt_client::{
    AdminAgent, AgentConfig, AgentEvent, AgentState, FileStore, HttpSessionApi, LocalStore,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[derive(Parser)]
#[command(name = "admin-agent")]
#[command(about = "Cielo y Tierra admin session agent")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Server base URL
    #[arg(short, long, global = true, env = "CYT_SERVER", default_value = "http://localhost:3000")]
    server: String,

    /// Directory holding the device id and token
    #[arg(long, global = true, env = "CYT_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Seconds between keepalive checks
    #[arg(long, global = true, default_value_t = 30)]
    poll_interval_secs: u64,

    /// Seconds before a verify call is abandoned
    #[arg(long, global = true, default_value_t = 5)]
    verify_timeout_secs: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Log in as this device (closes any other admin session)
    Login {
        #[arg(short, long, default_value = "admin")]
        username: String,
        #[arg(long, env = "CYT_ADMIN_PASSWORD")]
        password: String,
        /// Keep running and watch the session after logging in
        #[arg(long)]
        watch: bool,
    },
    /// Log out this device
    Logout,
    /// Check whether this device holds the admin session
    Status,
    /// Poll the server until the session is closed or Ctrl-C
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let cli = Cli::parse();

    let config = AgentConfig {
        poll_interval: Duration::from_secs(cli.poll_interval_secs.max(1)),
        verify_timeout: Duration::from_secs(cli.verify_timeout_secs.max(1)),
        ..AgentConfig::with_base_url(&cli.server)
    };
    let store = FileStore::in_dir(cli.state_dir.as_deref()).context("Failed to open local state")?;
    let api = HttpSessionApi::new(&config).context("Failed to build HTTP client")?;
    let agent = Arc::new(AdminAgent::new(api, store, config));

    match cli.command {
        Command::Login {
            username,
            password,
            watch: keep_watching,
        } => {
            if agent.other_device_active().await.unwrap_or(false) {
                println!("Otro dispositivo tiene una sesión activa; será cerrada.");
            }
            let response = agent.login(&username, &password).await?;
            println!("Sesión iniciada en {}", response.device_id);
            if keep_watching {
                watch(&agent).await?;
            }
        }
        Command::Logout => {
            agent.logout().await?;
            println!("Sesión cerrada");
        }
        Command::Status => {
            let device_id = agent.store().device_id()?;
            match agent.check_session().await {
                AgentState::Authenticated => println!("Sesión activa en {}", device_id),
                AgentState::Unauthenticated { error: Some(e) } => {
                    println!("Sin sesión ({})", e)
                }
                _ => println!("Sin sesión en {}", device_id),
            }
        }
        Command::Watch => {
            if agent.check_session().await != AgentState::Authenticated {
                anyhow::bail!("No hay sesión activa en este dispositivo; ejecuta `admin-agent login`");
            }
            watch(&agent).await?;
        }
    }

    Ok(())
}

async fn watch(agent: &Arc<AdminAgent<HttpSessionApi, FileStore>>) -> Result<()> {
    let mut events = agent.subscribe_events();
    let handle = agent.spawn_keepalive();
    println!("Vigilando la sesión (Ctrl-C para salir)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.stop().await;
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(AgentEvent::SessionClosed { reason }) => {
                    eprintln!("\n*** {} ***", reason);
                    eprintln!("Vuelve a iniciar sesión con `admin-agent login`.");
                    agent.acknowledge_closed();
                    handle.finished().await;
                    return Ok(());
                }
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => anyhow::bail!("Event stream closed"),
            },
        }
    }
}
