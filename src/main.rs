use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use daylog::config::{self, LogConfig};
use daylog::{setup, Level, LogRecord};

#[tokio::main]
async fn main() -> Result<()> {
    // Config path from the first argument, else ~/.daylog/config.toml if present
    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => LogConfig::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => {
            let path = config::config_file_path();
            if path.exists() {
                LogConfig::load(&path).context("Failed to load default config")?
            } else {
                LogConfig::default()
            }
        }
    };

    let (handler, jobs) = setup::init(config).context("Failed to start log sink")?;

    // Append every stdin line as an INFO record until EOF
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = handler.log(&LogRecord::new(Level::Info, line)) {
            eprintln!("daylog: {}", e);
        }
    }

    jobs.shutdown().await;
    Ok(())
}
