//! List integration tests
//!
//! Structural operations on list nodes and recycling of row ids.

mod operations;
