//! `ratatui-simple-markdown-core` holds the small building blocks the markdown renderer shares
//! with apps that want to style or lay out its output themselves.
//!
//! - [`styles::StyleSheet`]: named style regions (`"strong"`, `"heading1"`, `"view"`, ...) with
//!   terminal defaults and a shallow merge for caller overrides.
//! - [`wrapping::wrap_spans`]: word wrapping over styled spans, preserving each span's style.
//!
//! Most users should depend on `ratatui-simple-markdown` instead.
pub mod styles;

pub mod wrapping;
