mod config;

use std::sync::Arc;

use clap::Parser;

use umc_bus::{MessageBus, PERSIST_ADDR};
use umc_collector::{
    ArtifactoryCollector, JenkinsCollector, Poller, PollerHandle, ServiceClient,
    SonarqubeCollector,
};
use umc_digester::{InfluxClient, InfluxDigester};

use crate::config::AppConfig;

/// Universal metrics collector daemon
#[derive(Parser, Debug)]
#[command(name = "umc-collector", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "umc-collector.toml")]
    config: String,

    /// Dump default configuration and exit
    #[arg(long)]
    dump_default_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.dump_default_config {
        println!("{}", toml::to_string_pretty(&AppConfig::default())?);
        return Ok(());
    }

    let config = AppConfig::load(&args.config)?;
    let _log_guard = umc_logging::init(&config.logging);

    tracing::info!(config = %args.config, "starting metrics collector");

    let bus = Arc::new(MessageBus::new());
    let http = reqwest::Client::new();

    let influx = InfluxClient::new(http.clone(), &config.influx);
    bus.subscribe(PERSIST_ADDR, Arc::new(InfluxDigester::new(influx)));

    let mut pollers: Vec<PollerHandle> = Vec::new();
    let collector = &config.collector;

    for server in &collector.artifactory {
        let client = ServiceClient::new(http.clone(), server);
        pollers.push(
            Poller::new(
                Arc::new(ArtifactoryCollector::new(client)),
                bus.clone(),
                collector.interval_for(server),
            )
            .spawn(),
        );
    }
    for server in &collector.jenkins {
        let client = ServiceClient::new(http.clone(), server);
        pollers.push(
            Poller::new(
                Arc::new(JenkinsCollector::new(client)),
                bus.clone(),
                collector.interval_for(server),
            )
            .spawn(),
        );
    }
    for server in &collector.sonarqube {
        let client = ServiceClient::new(http.clone(), server);
        pollers.push(
            Poller::new(
                Arc::new(SonarqubeCollector::new(client)),
                bus.clone(),
                collector.interval_for(server),
            )
            .spawn(),
        );
    }

    if pollers.is_empty() {
        tracing::warn!("no targets configured, nothing will be collected");
    } else {
        tracing::info!(targets = pollers.len(), "pollers running");
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");

    for poller in pollers {
        poller.stop().await;
    }
    bus.close();

    Ok(())
}
