//! Render tree produced by [`DocumentRenderer`](crate::DocumentRenderer).
//!
//! Nodes are toolkit-independent descriptions of what to draw. Text leaves hold
//! unescaped display text; escaping belongs to whichever presentation layer
//! consumes the tree (see [`to_html`](crate::to_html)).

use serde::Serialize;

/// Child slots of a node, one per input token.
///
/// `None` marks a token that renders to nothing (whitespace, definitions,
/// unknown kinds). Keeping the slot preserves positional correspondence with
/// the token sequence.
pub type Children = Vec<Option<RenderNode>>;

/// One renderable unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
    Text {
        text: String,
    },
    Paragraph {
        children: Children,
    },
    Heading {
        level: u8,
        children: Children,
    },
    Blockquote {
        children: Children,
    },
    Emphasis {
        children: Children,
    },
    Strong {
        children: Children,
    },
    Strikethrough {
        children: Children,
    },
    InlineCode {
        text: String,
    },
    CodeBlock {
        #[serde(skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        text: String,
    },
    OrderedList {
        start: u64,
        children: Children,
    },
    UnorderedList {
        children: Children,
    },
    ListItem {
        /// Task list state; `None` for ordinary items.
        #[serde(skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        children: Children,
    },
    Link {
        href: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        children: Children,
    },
    Image {
        src: String,
        alt: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    Table {
        /// Alignment per column.
        align: Vec<Alignment>,
        header: TableRow,
        rows: Vec<TableRow>,
    },
    /// Block-level text that contains inline markup.
    InlineGroup {
        children: Children,
    },
    ThematicBreak,
    LineBreak,
}

/// One row of a table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

/// One table cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableCell {
    pub align: Alignment,
    pub children: Children,
}

/// Horizontal alignment of a table column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Unset,
    Left,
    Center,
    Right,
}

impl RenderNode {
    /// Build a text leaf.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Child slots of container nodes. Leaves and tables return `None`.
    #[must_use]
    pub fn children(&self) -> Option<&[Option<RenderNode>]> {
        match self {
            Self::Paragraph { children }
            | Self::Heading { children, .. }
            | Self::Blockquote { children }
            | Self::Emphasis { children }
            | Self::Strong { children }
            | Self::Strikethrough { children }
            | Self::OrderedList { children, .. }
            | Self::UnorderedList { children }
            | Self::ListItem { children, .. }
            | Self::Link { children, .. }
            | Self::InlineGroup { children } => Some(children),
            _ => None,
        }
    }

    /// Display text with all structure removed.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Self::Text { text } | Self::InlineCode { text } | Self::CodeBlock { text, .. } => {
                out.push_str(text);
            }
            Self::Image { alt, .. } => out.push_str(alt),
            Self::LineBreak => out.push('\n'),
            Self::ThematicBreak => {}
            Self::Table { header, rows, .. } => {
                for cell in std::iter::once(header).chain(rows).flat_map(|row| &row.cells) {
                    push_plain_text(&cell.children, out);
                }
            }
            other => {
                if let Some(children) = other.children() {
                    push_plain_text(children, out);
                }
            }
        }
    }
}

/// Concatenate the display text of a slot sequence.
#[must_use]
pub fn plain_text(nodes: &[Option<RenderNode>]) -> String {
    let mut out = String::new();
    push_plain_text(nodes, &mut out);
    out
}

fn push_plain_text(nodes: &[Option<RenderNode>], out: &mut String) {
    for node in nodes.iter().flatten() {
        node.push_plain_text(out);
    }
}

/// A heading in the document outline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutlineEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text with markup removed.
    pub title: String,
}

/// List top-level headings in document order.
#[must_use]
pub fn outline(nodes: &[Option<RenderNode>]) -> Vec<OutlineEntry> {
    nodes
        .iter()
        .flatten()
        .filter_map(|node| match node {
            RenderNode::Heading { level, children } => Some(OutlineEntry {
                level: *level,
                title: plain_text(children).trim().to_owned(),
            }),
            _ => None,
        })
        .collect()
}
