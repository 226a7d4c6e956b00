//! Constants used throughout the formwork library.
//!
//! This module provides central definitions for the path separator
//! shared by the path, tree and list modules.

/// Separator between the segments of a qualified field path.
pub const SEPARATOR: char = '.';

/// Same separator, as a string slice for joining.
pub const SEPARATOR_STR: &str = ".";
