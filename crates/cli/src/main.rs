//! `airgate`, the polling gateway's command-line entry point.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use airgate_audit::AuditLog;
use airgate_broker::MqttPublisher;
use airgate_client::{HttpSensorApi, SensorApi};
use airgate_core::{JobDescriptor, SystemClock};
use airgate_gateway::Supervisor;

mod config;

use config::GatewayConfig;

/// Multi-tenant sensor polling gateway.
#[derive(Parser, Debug)]
#[command(
    name = "airgate",
    about = "Polls sensor-data accounts and republishes telemetry to MQTT brokers"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, env = "AIRGATE_CONFIG", default_value = "airgate.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the gateway until interrupted (the default).
    Run,
    /// List the devices visible to each configured account, then exit.
    Devices,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = GatewayConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config))?;
    let jobs = config.validated_jobs();
    info!(path = %cli.config, jobs = jobs.len(), "configuration loaded");

    match cli.command {
        Some(Commands::Devices) => list_devices(&config, &jobs).await,
        Some(Commands::Run) | None => run_gateway(&config, jobs).await,
    }
}

/// Start one runner per enabled job and hold the process open until ctrl-c.
async fn run_gateway(config: &GatewayConfig, jobs: Vec<JobDescriptor>) -> anyhow::Result<()> {
    let api = Arc::new(HttpSensorApi::new(config.api.to_api_config()));
    let publisher = Arc::new(MqttPublisher::new());
    let audit = Arc::new(AuditLog::new(&config.audit.dir, config.audit.max_lines));
    let supervisor = Supervisor::new(api, publisher, audit, Arc::new(SystemClock));

    let handle = supervisor.start(jobs);
    info!(jobs = handle.job_count(), "gateway running; press ctrl-c to stop");

    tokio::signal::ctrl_c()
        .await
        .context("listening for shutdown signal")?;
    info!("shutdown requested");

    handle.shutdown();
    handle.wait().await;
    info!("gateway stopped");
    Ok(())
}

/// One-shot discovery sweep: authenticate each account and print what it
/// can see. Per-job failures are printed and skipped.
async fn list_devices(config: &GatewayConfig, jobs: &[JobDescriptor]) -> anyhow::Result<()> {
    let api = HttpSensorApi::new(config.api.to_api_config());

    for job in jobs {
        println!(">>> {} ({})", job.name, job.credentials.email);
        let token = match api
            .authenticate(&job.credentials.email, &job.credentials.password)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                println!("    login failed: {e}");
                continue;
            }
        };
        match api.fetch_devices(&token).await {
            Ok(devices) if devices.is_empty() => println!("    (no devices in this account)"),
            Ok(devices) => {
                for device in devices {
                    println!("    - {:<24} serial {}", device.name, device.serial);
                }
            }
            Err(e) => println!("    device fetch failed: {e}"),
        }
    }
    Ok(())
}
