use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use zoneforge::cli::Cli;
use zoneforge::commands::App;
use zoneforge::config::Settings;
use zoneforge::dialogs::TerminalDialogs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::new_with_cli(&cli)?;

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(settings.log_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!(base_url = %settings.backend.base_url, "starting zoneforge client");

    let dialogs = TerminalDialogs::new(settings.assume_yes);
    let app = App::connect(settings).await?;
    let report = app.execute(&cli.command, &dialogs).await?;

    if report.is_failure() {
        anyhow::bail!("{}", report);
    }
    println!("{}", report);

    Ok(())
}
