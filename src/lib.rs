//! motorpool application library
//!
//! Application modules plus the bootstrap that wires them to the configured store.

pub mod app;
pub mod modules;

pub use app::Application;
