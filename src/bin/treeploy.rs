use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use treeploy::cli::{
    build_template_values, init_logging, parse_driver_options, warn_if_not_root, TreeployCli,
};
use treeploy::deploy::treeploy_paths;
use treeploy::drivers::DriverRegistry;

#[tokio::main]
async fn main() {
    let cli = TreeployCli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: TreeployCli) -> Result<()> {
    info!("Starting treeploy v{}", env!("CARGO_PKG_VERSION"));
    warn_if_not_root(cli.noroot);

    let values = build_template_values(&cli)
        .await
        .context("Failed to build the template model")?;
    let source_options =
        parse_driver_options(&cli.source_driver).context("Invalid source driver option")?;
    let target_options =
        parse_driver_options(&cli.target_driver).context("Invalid target driver option")?;

    let registry = DriverRegistry::with_default_drivers();
    let summary = treeploy_paths(
        &registry,
        &cli.source,
        &cli.target,
        cli.deploy_options(values),
        source_options,
        target_options,
    )
    .await
    .with_context(|| format!("Failed to deploy {} to {}", cli.source, cli.target))?;

    info!("{summary}");
    Ok(())
}
