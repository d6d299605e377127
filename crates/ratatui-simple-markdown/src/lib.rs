//! Rule-driven markdown rendering for `ratatui`.
//!
//! A render pass builds a rule table, parses the source with `pulldown-cmark` (recognizing only
//! the constructs whose rules are selected), merges adjacent text runs, and draws the tree into a
//! [`view::ViewNode`] hierarchy painted with a [`StyleSheet`].
//!
//! ## Layers
//!
//! - [`markdown::Markdown`]: source + options, cached render, error routing.
//! - [`rules`]: rule tables, the layered builder and the whitelist/blacklist selector.
//! - [`parse`], [`normalize`], [`render`]: the individual pipeline stages.
//! - [`view`]: the rendered tree, its layout and a ratatui widget.
pub mod ast;
pub mod error;
pub mod markdown;
pub mod normalize;
pub mod parse;
pub mod render;
pub mod rules;
pub mod view;

pub use error::RenderError;
pub use markdown::Markdown;
pub use markdown::MarkdownOptions;
pub use ratatui_simple_markdown_core::styles::StyleSheet;
pub use ratatui_simple_markdown_core::styles::region;
pub use view::MarkdownWidget;
pub use view::ViewNode;
