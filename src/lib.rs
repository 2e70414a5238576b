//! clicklink - a URL shortener with expiring shortcodes and click analytics.
//!
//! The binary in `main.rs` is a thin CLI over this library; integration
//! tests drive the same router through [`routes::create_router`].

pub mod activity;
pub mod config;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod util;
