use fire_markers::config::Settings;
use fire_markers::coordinator::CoordinatorBuilder;
use fire_markers::error::AppError;
use tracing::Level;

fn init_logging(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let settings = Settings::load()?;
    init_logging(&settings.log_level);

    let once = std::env::args().skip(1).any(|arg| arg == "--once");
    let mut coordinator = CoordinatorBuilder::new(settings).build()?;

    if once {
        let outcome = coordinator.run_once().await;
        tracing::info!("Single run finished: {:?}", outcome);
        return Ok(());
    }

    let cancel_token = coordinator.cancel_token();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Ctrl-C received, shutting down"),
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
        cancel_token.cancel();
    });

    coordinator.run().await;
    Ok(())
}
