use std::path::PathBuf;

use tabage_core::Config;
use tabage_host::App;

/// Config file location: `$TABAGE_CONFIG`, else `config.json` in the data dir
fn config_path() -> PathBuf {
    std::env::var_os("TABAGE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| Config::data_dir().join("config.json"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tabage_core::init_logging();

    let path = config_path();
    let config = Config::load(&path)?;
    tracing::info!(
        config = %path.display(),
        database = %config.database_path.display(),
        "Tab age host starting"
    );

    let app = App::new(config)?;
    app.serve(tokio::io::stdin(), tokio::io::stdout()).await?;

    tracing::info!("Tab age host stopped");
    Ok(())
}
