pub mod alerts;
pub mod chance;
pub mod clock;
pub mod commands;
pub mod dashboard;
pub mod engine;
pub mod feed;
pub mod fleet;
pub mod geo;
pub mod history;
pub mod playback;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod store;
pub mod systems;
pub mod telemetry_export;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
