pub mod schedule;
pub mod vehicles;
pub mod world;
