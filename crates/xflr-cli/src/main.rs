//! xflr - command-line front end for a running XFLR5-RPC server.
//!
//! Connects to the server, runs one command and prints the result.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use xflr_core::{CallStats, ConnectionConfig, RemoteCollection, XflrClient};

#[derive(Parser, Debug)]
#[command(name = "xflr")]
#[command(about = "Inspect and drive a running XFLR5-RPC server")]
struct Args {
    /// Server host
    #[arg(long, default_value = ConnectionConfig::DEFAULT_HOST)]
    host: String,

    /// Server port
    #[arg(short, long, default_value_t = ConnectionConfig::DEFAULT_PORT)]
    port: u16,

    /// Per-call timeout in seconds
    #[arg(long, default_value_t = ConnectionConfig::CONNECT_TIMEOUT.as_secs())]
    timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Print per-method call statistics after the command
    #[arg(long)]
    stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show connection, mode and project state
    Status,
    /// List foils
    Foils,
    /// Generate a NACA 4-digit foil
    Naca {
        /// 1 to 4 digit designation, e.g. 2412
        code: String,
        /// Foil name (default "NACA dddd")
        #[arg(long)]
        name: Option<String>,
    },
    /// Load .dat foil files from the server's file system
    Load {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List planes
    Planes {
        /// Also print each plane's derived quantities
        #[arg(long)]
        detail: bool,
    },
    /// Measure round-trip time with repeated pings
    Stats {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: u32,
    },
}

fn init_logging(debug: bool, json: bool) {
    let log_level = if debug { Level::DEBUG } else { Level::INFO };
    let builder = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false);

    // RUST_LOG, when set, overrides the level flag
    match (EnvFilter::try_from_default_env(), json) {
        (Ok(filter), true) => builder.with_env_filter(filter).json().init(),
        (Ok(filter), false) => builder.with_env_filter(filter).compact().init(),
        (Err(_), true) => builder.json().init(),
        (Err(_), false) => builder.compact().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug, args.json_logs);

    let client = XflrClient::builder()
        .host(args.host.clone())
        .port(args.port)
        .timeout(Duration::from_secs(args.timeout))
        .connect()
        .await
        .with_context(|| format!("Could not connect to {}:{}", args.host, args.port))?;
    debug!("Connected: {}", client);

    run(&client, &args.command).await?;

    if wants_trailing_stats(&args) {
        print_stats(&client.call_stats());
    }
    client.close().await?;
    Ok(())
}

async fn run(client: &XflrClient, command: &Command) -> Result<()> {
    match command {
        Command::Status => {
            let status = client.state().await?;
            let project = client.project().state().await?;
            let mode = client
                .modes()
                .active()
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("server:    {}", client.session().address().unwrap_or_default());
            println!("connected: {}", status.connected);
            println!("mode:      {}", mode);
            println!(
                "project:   {} ({})",
                project.project_name.as_deref().unwrap_or("<unnamed>"),
                if project.saved == Some(true) { "saved" } else { "not saved" }
            );
            if let Some(path) = &project.project_path {
                println!("path:      {}", path);
            }
            println!("display:   {}", serde_json::to_string(&status.display)?);
        }
        Command::Foils => {
            let foils = client.foils().to_list().await?;
            println!(
                "{:<32} {:>9} {:>9} {:>9} {:>9} {:>6}",
                "name", "camber", "camber_x", "thick", "thick_x", "points"
            );
            for foil in &foils {
                let data = foil.data()?;
                println!(
                    "{:<32} {:>9.4} {:>9.4} {:>9.4} {:>9.4} {:>6}",
                    data.name, data.camber, data.camber_x, data.thickness, data.thickness_x, data.n
                );
            }
            info!("{} foil(s)", foils.len());
        }
        Command::Naca { code, name } => {
            let foil = client
                .foils()
                .create_naca(code.as_str(), name.as_deref())
                .await?;
            println!("{}", foil);
        }
        Command::Load { paths } => {
            client.foils().load(paths.as_slice()).await?;
            println!("Loaded {} file(s)", paths.len());
        }
        Command::Planes { detail } => {
            for plane in client.planes().to_list().await? {
                let data = plane.data();
                println!(
                    "{} (semi-span {:.3} m, {} main wing section(s))",
                    plane,
                    data.wing.semi_span(),
                    data.wing.sections.len()
                );
                if *detail {
                    for (key, quantity) in &plane.detail().await?.quantities {
                        println!("    {:<28} {:>12} {}", key, quantity.value, quantity.unit);
                    }
                }
            }
        }
        Command::Stats { count } => {
            for _ in 0..*count {
                if !client.is_connected().await {
                    anyhow::bail!("Server stopped answering pings");
                }
            }
            print_stats(&client.call_stats());
        }
    }
    Ok(())
}

/// `--stats` after any command except `stats`, which already printed them.
fn wants_trailing_stats(args: &Args) -> bool {
    args.stats && !matches!(args.command, Command::Stats { .. })
}

fn print_stats(stats: &CallStats) {
    println!("{} call(s)", stats.total_calls);
    for (method, entry) in &stats.methods {
        let mean = entry.total_time.as_secs_f64() * 1000.0 / entry.count.max(1) as f64;
        println!(
            "  {:<20} {:>6} calls {:>10.3} ms total {:>8.3} ms mean",
            method,
            entry.count,
            entry.total_time.as_secs_f64() * 1000.0,
            mean
        );
    }
}
