//! Business operations
//!
//! Each operation runs in one transaction: lock the rows it changes, apply
//! the pure rules from `shared::settlement`, write the results, commit.

pub mod cancellation;
pub mod settlement;
pub mod tfc;
pub mod wallet;
