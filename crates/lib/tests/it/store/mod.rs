//! Cell store integration tests
//!
//! Transactions, committed reads, versioning and observer notification.

mod concurrency;
mod observers;
