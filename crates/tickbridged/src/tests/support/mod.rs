//! Test harness utilities shared by the behavioural suites.

mod client;
mod config_loader;
mod reporter;
mod world;

pub use client::BridgeClient;
pub use config_loader::{FailingConfigLoader, InvalidConfigLoader, TestConfigLoader};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
