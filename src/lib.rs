pub mod athlete;
pub mod challenge;
pub mod coaching;
pub mod config;
pub mod db;
pub mod environment;
pub mod errors;
pub mod great_circle;
pub mod io;
pub mod item;
pub mod normalization;
pub mod position;
pub mod routes;
pub mod run;
pub mod urls;
pub mod user;

/// Identifies every stored record.
pub type Id = i64;
