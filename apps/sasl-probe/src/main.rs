use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use amqp_sasl_core::{framing::FrameLimits, MechanismRegistry};
use amqp_sasl_net_tokio::connect_tcp;

#[derive(Parser)]
#[command(name = "sasl-probe", version, about = "Authenticate against an AMQP 1.0 broker and report the SASL outcome")]
struct Cli {
    // Broker address, e.g. 127.0.0.1:5672
    #[arg(long)]
    connect: String,

    /// Username for the PLAIN mechanism
    #[arg(long)]
    username: String,

    /// Password for the PLAIN mechanism
    #[arg(long, env = "SASL_PROBE_PASSWORD", hide_env_values = true)]
    password: String,

    /// Largest inbound frame accepted, header included
    #[arg(long, default_value_t = FrameLimits::DEFAULT.max_frame_len)]
    max_frame_len: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.username.is_empty() {
        return Err(anyhow!("--username must not be empty"));
    }

    let registry = MechanismRegistry::new().with_plain(cli.username, cli.password);
    let limits = FrameLimits {
        max_frame_len: cli.max_frame_len,
    };

    match connect_tcp(&cli.connect, registry, limits).await {
        Ok(conn) => {
            info!(mechanism = %conn.mechanism(), code = %conn.outcome().code, "authenticated");
            println!("ok {}", conn.mechanism());
            Ok(())
        }
        Err(e) => {
            let hint = if e.is_transient() {
                "transient failure, retrying may help"
            } else {
                "permanent failure"
            };
            Err(e).with_context(|| format!("sasl negotiation with {} failed ({hint})", cli.connect))
        }
    }
}
