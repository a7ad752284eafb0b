//! Database access layer
//!
//! Free functions over `&PgPool` for reads and `&mut PgConnection` for
//! anything that must run inside a caller's transaction.

pub mod audit;
pub mod bookings;
pub mod notifications;
pub mod refunds;
pub mod settlements;
pub mod tfc;
pub mod venues;
pub mod wallet;
