pub mod app;
pub mod chime;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod engine;
pub mod events;
pub mod job;
pub mod language;
pub mod logging;
pub mod models;
pub mod storage;
pub mod transcript;

pub use app::run;
