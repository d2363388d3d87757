//! # Job Board Library
//!
//! Core of the job board service: search and ranking, the ad lifecycle,
//! payment reconciliation and engagement tracking, plus the HTTP API that
//! exposes them.

pub mod apply;
pub mod auth;
pub mod config;
pub mod db;
pub mod engagement;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod lifecycle;
pub mod mail;
pub mod models;
pub mod payments;
pub mod repositories;
pub mod search;
pub mod server;
pub mod sweeper;
pub mod telemetry;
pub use migration;
