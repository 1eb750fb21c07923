//! luavm entry point.
//!
//! Starts the interactive menu. Exits with status 0 when the operator
//! chooses Exit; any error escaping the menu loop exits non-zero.

use luavm_cli::{App, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with the menus on stdout
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("luavm=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let settings = Settings::from_env();
    tracing::info!(?settings, "Settings loaded");

    let mut app = App::new(settings);
    app.run().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
