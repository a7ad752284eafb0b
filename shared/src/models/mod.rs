//! Data models
//!
//! Shared between booking-cloud and API clients.
//! Statuses are stored as lowercase TEXT; `from_db` / `as_db` convert.
//! All IDs are `i64` snowflakes, all timestamps Unix millis.

pub mod booking;
pub mod tfc;
pub mod user;
pub mod venue;
pub mod wallet;

// Re-exports
pub use booking::*;
pub use tfc::*;
pub use user::*;
pub use venue::*;
pub use wallet::*;
