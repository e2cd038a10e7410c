use ethos::{config::ServerConfig, context::AppContext, error::EthosResult, server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> EthosResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        format!("ethos={level},tower_http={level}").into()
    });

    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print banner
    print_banner(&config.service.app_name);

    // Create application context
    let ctx = AppContext::new(config).await?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner(app_name: &str) {
    println!(
        r#"
        _   _
   ___ | |_| |__   ___  ___
  / _ \| __| '_ \ / _ \/ __|
 |  __/| |_| | | | (_) \__ \
  \___| \__|_| |_|\___/|___/

        {} v{}
        "#,
        app_name,
        env!("CARGO_PKG_VERSION")
    );
}
