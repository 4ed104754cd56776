mod app;
mod logging;
mod modules;
mod ui;

use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};

use mpy_base::config::{Config, ConfigError};
use mpy_mpd::MpdClient;

use app::{AppError, Controller};
use ui::surface::{TerminalGuard, TerminalSurface, install_panic_hook};

/// Command-line overrides, applied on top of the config file and environment.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, ConfigError> {
    let mut parsed = Args::default();
    while let Some(arg) = args.next() {
        let mut value = |key: &'static str| {
            args.next().ok_or_else(|| ConfigError::Invalid { key, reason: "missing value".to_string() })
        };
        match arg.as_str() {
            "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
            "--host" => parsed.host = Some(value("--host")?),
            "--port" => {
                let port = value("--port")?;
                parsed.port = Some(
                    port.parse()
                        .map_err(|_| ConfigError::Invalid { key: "--port", reason: format!("{:?} is not a port", port) })?,
                );
            }
            other => return Err(ConfigError::Invalid { key: "argument", reason: format!("unknown {:?}", other) }),
        }
    }
    Ok(parsed)
}

fn load_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok())?;
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    Ok(config)
}

fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let args = parse_args(std::env::args().skip(1))?;
    let config = load_config(&args)?;
    logging::init(&config)?;

    let mut remote = MpdClient::connect(&config.server.host, config.server.port)?;
    info!(host = %config.server.host, port = config.server.port, version = remote.version(), "connected");
    if let Some(password) = &config.server.password {
        remote.password(password)?;
    }
    let modules = modules::all_modules(&config)?;

    install_panic_hook();
    let _guard = TerminalGuard::enter()?;
    let surface = TerminalSurface::new()?;
    Controller::new(remote, surface, config, modules).run()
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            eprintln!("mpy: {}", e);
            ExitCode::FAILURE
        }
    }
}
