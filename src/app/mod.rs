mod controller;
mod controls;
mod focus;
pub mod sync;

#[cfg(test)]
mod tests;

use thiserror::Error;

use mpy_base::config::ConfigError;
use mpy_base::remote::RemoteError;

pub use controller::Controller;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
