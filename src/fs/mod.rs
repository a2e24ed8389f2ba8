//! File system traversal for candidate enumeration.

pub mod enumerate;
