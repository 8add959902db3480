pub mod config;
pub mod paths;
pub mod sessions;
pub mod state;
