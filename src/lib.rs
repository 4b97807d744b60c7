//! Loanbook Backend Library
//!
//! This library exports the core modules for the loan administration
//! backend server.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod i18n;
pub mod loan;
pub mod routes;
pub mod schema;
pub mod state;
