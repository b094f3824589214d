mod app;
mod host;
mod keys;

pub use app::App;

use anyhow::Context;
use gabor_core::ProvidedConfig;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let provided = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            serde_json::from_str::<ProvidedConfig>(&text)
                .with_context(|| format!("parsing config {path}"))?
        }
        None => ProvidedConfig::default(),
    };

    let app = App::new(provided)?;
    app.run()?;

    Ok(())
}
