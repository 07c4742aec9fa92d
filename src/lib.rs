//! Recipe catalog backend: accounts with cookie-carried JWT sessions, a
//! per-owner recipe store and a public, filterable recipe listing.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod recipes;
pub mod state;
pub mod users;
