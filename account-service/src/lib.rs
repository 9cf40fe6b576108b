pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod plugin;
pub mod services;
pub mod startup;
