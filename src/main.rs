use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use macvlan_repair::checkpoint::CheckpointStore;
use macvlan_repair::config::cli::{print_default_config, CliArgs};
use macvlan_repair::config::AppConfig;
use macvlan_repair::docker::BollardInventory;
use macvlan_repair::network::namespace::KernelBackend;
use macvlan_repair::repair::Repairer;
use macvlan_repair::AppError;

// Namespace switches are per thread: keep every task on the main thread.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), AppError> {
    let cli = CliArgs::parse();

    if cli.print_default_config {
        print_default_config();
        return Ok(());
    }

    let config = AppConfig::load(&cli)?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_level))
        .init();

    if cli.validate_config {
        info!("Configuration is valid: {:?}", config);
        return Ok(());
    }

    info!(
        check = cli.check,
        fix = cli.fix,
        checkpoint_dir = %config.checkpoint_dir.display(),
        "Starting macvlan repair"
    );

    let inventory = BollardInventory::with_socket(&config.docker_socket)?;
    let backend = KernelBackend::connect()?;
    let repairer = Repairer::new(
        inventory,
        backend,
        CheckpointStore::new(&config.checkpoint_dir),
        config.uplink.clone(),
    );

    let report = repairer.run(cli.check, cli.fix).await.map_err(|e| {
        error!("Failed to list containers: {}", e);
        e
    })?;

    if cli.fix && !report.gated {
        println!(
            "repaired={} intact={} failed={}",
            report.repaired(),
            report.intact(),
            report.failed()
        );
    }

    Ok(())
}
