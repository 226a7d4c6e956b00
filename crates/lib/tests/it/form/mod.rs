//! Form lifecycle integration tests
//!
//! Bulk mutations, reset/revalidate/clear, submission, mounting and the
//! ready signal.

mod bulk;
