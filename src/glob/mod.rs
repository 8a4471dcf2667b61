// src/glob/mod.rs

//! Wildcard argument expansion.
//!
//! Arguments containing `*` or `?` are resolved into the existing paths they
//! match, walking the filesystem one segment at a time from the root (or the
//! context's current folder for relative patterns). Arguments without
//! wildcards pass through untouched, with no existence check.
//!
//! - [`pattern`] translates a single path segment into an anchored matcher.
//! - [`expand`] owns the stack-based traversal and the zero-match policy.

pub mod expand;
pub mod pattern;

pub use expand::Expander;
pub use pattern::SegmentPattern;
