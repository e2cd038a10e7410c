/// Ethos - personal productivity tracker
///
/// Goals with time-sliced targets, manual and focus-session progress logs,
/// and aggregated statistics, served over a JSON API.

pub mod account;
pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod focus;
pub mod goals;
pub mod server;
pub mod settings;
pub mod stats;
