pub mod board;
pub mod config;
pub mod module;
pub mod pending;
pub mod remote;
pub mod scroll;
pub mod search;
pub mod snapshot;
pub mod ui;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;
