//! Core utilities for gqlcost.
//!
//! This crate provides foundational types used throughout gqlcost:
//! - `span`: Source location tracking
//! - `line_index`: Byte offset to line/column mapping
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod line_index;
pub mod span;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use line_index::{LineCol, LineIndex};
pub use span::Span;
