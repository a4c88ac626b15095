//! Markdown token tree to render tree transformation.
//!
//! The crate turns markdown into a toolkit-independent tree of
//! [`RenderNode`]s that a UI layer can draw directly.
//!
//! # Architecture
//!
//! Rendering happens in two stages:
//! - [`tokenize`]: pulldown-cmark events are folded into a [`Token`] tree with
//!   the shape used by JavaScript markdown lexers (nested inline tokens,
//!   verbatim `raw` text)
//! - [`DocumentRenderer`]: each token maps to exactly one child slot of the
//!   output, preserving branching and sibling order
//!
//! Token trees can also come from elsewhere. [`Token`] deserializes from the
//! JSON those lexers emit, so pre-lexed documents render the same way.
//!
//! [`to_html`] is a reference presentation layer over the render tree.
//!
//! # Example
//!
//! ```
//! use quire_renderer::{DocumentRenderer, RenderNode, to_html};
//!
//! let markdown = "# Hello\n\n**Bold** text";
//! let nodes = DocumentRenderer::new().with_gfm(true).render(markdown).unwrap();
//!
//! assert_eq!(nodes.len(), 2);
//! assert!(matches!(nodes[0], Some(RenderNode::Heading { level: 1, .. })));
//! assert_eq!(to_html(&nodes), "<h1>Hello</h1><p><strong>Bold</strong> text</p>");
//! ```

mod html;
mod lexer;
pub mod node;
mod renderer;
pub mod token;
mod util;

pub use html::{escape_html, to_html};
pub use lexer::{parser_options, tokenize, tokenize_bounded, tokenize_with};
pub use node::{
    Alignment, Children, OutlineEntry, RenderNode, TableCell, TableRow, outline, plain_text,
};
pub use renderer::{DEFAULT_MAX_DEPTH, DocumentRenderer, Source, render};
pub use token::{Align, Cell, Token, deserialize_tokens};
