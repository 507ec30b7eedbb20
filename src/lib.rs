//! # Shoal
//!
//! Headless driver for the fish evolution simulation: the async frame loop
//! and its shutdown handling. The engine lives in `shoal_core`, the shared
//! data types in `shoal_data`.

pub mod app;

pub use app::App;
pub use shoal_core::config::AppConfig;
