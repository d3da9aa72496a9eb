pub mod connection;
pub mod expiry;
pub mod fleet_tick;
pub mod history;
pub mod operator_command;
pub mod playback_step;
pub mod route_snap;
