use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use mpy_base::config::Config;
use mpy_base::config::constants::LOG_FILTER_ENV;

/// Send everything to the log file; the terminal belongs to the UI.
pub fn init(config: &Config) -> io::Result<()> {
    let path = config.log_file();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(&config.log.filter)))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}
