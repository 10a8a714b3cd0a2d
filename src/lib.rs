pub mod almanac;
pub mod config;
pub mod error;
pub mod events;
pub mod grid;
pub mod lunar;
pub mod tables;
pub mod ui;
