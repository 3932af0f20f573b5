// Public API - diagnostics engine
pub mod config;
pub mod diag;
pub mod dns;
pub mod export;
pub mod host;
pub mod sink;
pub mod stream;

// Front ends
pub mod cli;
pub mod prefs;
pub mod tui;
