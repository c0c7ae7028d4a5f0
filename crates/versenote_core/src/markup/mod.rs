//! Inline markup grammar, header segmentation and field extraction.
//!
//! # Responsibility
//! - Recognize the `@`-delimited note markup forms.
//! - Split outline text into an own segment and immediate child segments.
//! - Derive structured attributes from an own segment.
//!
//! # Invariants
//! - Pure text functions: no store access, no id generation.
//! - Malformed markup yields absent values, never an error.

pub mod extractor;
pub mod grammar;
pub mod segmenter;
