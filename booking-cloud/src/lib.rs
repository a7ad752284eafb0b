//! booking-cloud: settlement service for the childcare booking platform
//!
//! Long-running service that:
//! - Cancels bookings and issues refunds / wallet credit
//! - Runs the Tax-Free Childcare reference lifecycle (create, confirm, cancel, sweep)
//! - Manages parent wallets (spend, transfer, goodwill, expiry)
//! - Computes franchise fees and venue period settlements

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod jobs;
pub mod services;
pub mod state;
