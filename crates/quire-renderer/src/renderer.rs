//! Token tree to render tree transformation.

use crate::lexer::{parser_options, tokenize_bounded};
use crate::node::{Alignment, Children, RenderNode, TableCell, TableRow};
use crate::token::{Align, Cell, Token};

/// Default bound on token nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Input accepted by [`DocumentRenderer::render`].
#[derive(Clone, Copy, Debug)]
pub enum Source<'a> {
    /// Markdown text, tokenized before rendering.
    Markdown(&'a str),
    /// An already tokenized document.
    Tokens(&'a [Token]),
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(markdown: &'a str) -> Self {
        Self::Markdown(markdown)
    }
}

impl<'a> From<&'a String> for Source<'a> {
    fn from(markdown: &'a String) -> Self {
        Self::Markdown(markdown)
    }
}

impl<'a> From<&'a [Token]> for Source<'a> {
    fn from(tokens: &'a [Token]) -> Self {
        Self::Tokens(tokens)
    }
}

impl<'a> From<&'a Vec<Token>> for Source<'a> {
    fn from(tokens: &'a Vec<Token>) -> Self {
        Self::Tokens(tokens)
    }
}

/// Recursive markdown renderer producing a [`RenderNode`] tree.
///
/// Every token maps to exactly one child slot, so the output mirrors the
/// input tree: same branching, same sibling order. Tokens that display
/// nothing (`space`, `def`, unknown kinds) occupy a `None` slot.
///
/// Raw HTML is never interpreted. A lone line-break tag becomes
/// [`RenderNode::LineBreak`]; any other markup becomes a text leaf that shows
/// the literal source.
///
/// # Example
///
/// ```
/// use quire_renderer::{DocumentRenderer, RenderNode};
///
/// let nodes = DocumentRenderer::new().render("# Hello").unwrap();
/// assert!(matches!(nodes[0], Some(RenderNode::Heading { level: 1, .. })));
/// ```
#[derive(Clone, Debug)]
pub struct DocumentRenderer {
    gfm: bool,
    max_depth: usize,
}

impl DocumentRenderer {
    /// Create a renderer with GFM enabled and the default depth bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gfm: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Enable or disable GitHub Flavored Markdown when tokenizing markdown input.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Bound the token nesting depth. Tokens nested deeper render to nothing.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Tokenize markdown with this renderer's parser options and depth bound.
    #[must_use]
    pub fn tokenize(&self, markdown: &str) -> Vec<Token> {
        tokenize_bounded(markdown, parser_options(self.gfm), self.max_depth)
    }

    /// Render markdown text or a token sequence.
    ///
    /// Returns `None` for empty input, otherwise one slot per top-level token.
    #[must_use]
    pub fn render<'a>(&self, source: impl Into<Source<'a>>) -> Option<Children> {
        match source.into() {
            Source::Markdown("") => None,
            Source::Markdown(markdown) => self.render_tokens(&self.tokenize(markdown)),
            Source::Tokens(tokens) => self.render_tokens(tokens),
        }
    }

    /// Render a token sequence.
    #[must_use]
    pub fn render_tokens(&self, tokens: &[Token]) -> Option<Children> {
        let mut pass = RenderPass {
            max_depth: self.max_depth,
            truncated: false,
        };
        pass.render(tokens, 0)
    }
}

impl Default for DocumentRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Render with default settings.
///
/// # Example
///
/// ```
/// use quire_renderer::render;
///
/// assert!(render("").is_none());
/// assert_eq!(render("a\n\nb").map(|nodes| nodes.len()), Some(2));
/// ```
#[must_use]
pub fn render<'a>(source: impl Into<Source<'a>>) -> Option<Children> {
    DocumentRenderer::new().render(source)
}

/// State of one render call.
struct RenderPass {
    max_depth: usize,
    truncated: bool,
}

impl RenderPass {
    fn render(&mut self, tokens: &[Token], depth: usize) -> Option<Children> {
        if tokens.is_empty() {
            return None;
        }
        Some(
            tokens
                .iter()
                .map(|token| self.node(token, depth))
                .collect(),
        )
    }

    fn children(&mut self, tokens: &[Token], depth: usize) -> Children {
        self.render(tokens, depth + 1).unwrap_or_default()
    }

    fn node(&mut self, token: &Token, depth: usize) -> Option<RenderNode> {
        if depth >= self.max_depth {
            if !self.truncated {
                self.truncated = true;
                tracing::warn!(
                    max_depth = self.max_depth,
                    "markdown nesting exceeds depth limit, deeper content dropped"
                );
            }
            return None;
        }

        // Nested tokens are rendered before the node itself.
        let children = token.tokens().map(|tokens| self.children(tokens, depth));

        let node = match token {
            Token::Paragraph { .. } => RenderNode::Paragraph {
                children: children.unwrap_or_default(),
            },
            Token::Heading { depth: level, .. } => RenderNode::Heading {
                level: *level,
                children: children.unwrap_or_default(),
            },
            Token::Blockquote { .. } => RenderNode::Blockquote {
                children: children.unwrap_or_default(),
            },
            Token::List {
                ordered,
                start,
                items,
                ..
            } => {
                let children = self.children(items, depth);
                if *ordered {
                    RenderNode::OrderedList {
                        start: match *start {
                            Some(n) if n != 0 => n,
                            _ => 1,
                        },
                        children,
                    }
                } else {
                    RenderNode::UnorderedList { children }
                }
            }
            Token::ListItem { checked, .. } => RenderNode::ListItem {
                checked: *checked,
                children: children.unwrap_or_default(),
            },
            Token::Table {
                header,
                rows,
                align,
            } => self.table(header, rows, align, depth),
            Token::Code { text, lang, .. } => RenderNode::CodeBlock {
                lang: lang.as_deref().filter(|l| !l.is_empty()).map(str::to_owned),
                text: text.clone(),
            },
            Token::Codespan { text } => RenderNode::InlineCode { text: text.clone() },
            Token::Strong { .. } => RenderNode::Strong {
                children: children.unwrap_or_default(),
            },
            Token::Em { .. } => RenderNode::Emphasis {
                children: children.unwrap_or_default(),
            },
            Token::Del { .. } => RenderNode::Strikethrough {
                children: children.unwrap_or_default(),
            },
            Token::Link {
                href,
                title,
                text,
                raw,
                ..
            } => {
                // Autolinks and mailto links display their source text as the label,
                // as do links without label tokens.
                let children = match children {
                    Some(children) if text != href && !href.starts_with("mailto:") => children,
                    _ => vec![Some(RenderNode::text(raw.clone()))],
                };
                RenderNode::Link {
                    href: href.clone(),
                    title: title.clone(),
                    children,
                }
            }
            Token::Image { href, title, text } => RenderNode::Image {
                src: href.clone(),
                alt: text.clone(),
                title: title.clone(),
            },
            Token::Text { raw, .. } => match children {
                Some(children) => RenderNode::InlineGroup { children },
                // `text` holds the entity-escaped form; `raw` is what the author wrote.
                None => RenderNode::text(raw.clone()),
            },
            Token::Escape { text } => RenderNode::text(text.clone()),
            Token::Html { raw } => {
                if is_line_break_tag(raw) {
                    RenderNode::LineBreak
                } else {
                    RenderNode::text(raw.clone())
                }
            }
            Token::Hr => RenderNode::ThematicBreak,
            Token::Br => RenderNode::LineBreak,
            Token::Space => return None,
            Token::Def { tag, .. } => {
                tracing::debug!(tag = %tag, "unsupported token: def");
                return None;
            }
            Token::Unknown => {
                tracing::debug!("unsupported token type dropped");
                return None;
            }
        };
        Some(node)
    }

    fn table(
        &mut self,
        header: &[Cell],
        rows: &[Vec<Cell>],
        align: &[Option<Align>],
        depth: usize,
    ) -> RenderNode {
        let column = |index: usize| -> Alignment {
            align
                .get(index)
                .copied()
                .flatten()
                .map_or(Alignment::Unset, Alignment::from)
        };
        let mut row = |cells: &[Cell]| TableRow {
            cells: cells
                .iter()
                .enumerate()
                .map(|(index, cell)| TableCell {
                    align: column(index),
                    children: self.children(&cell.tokens, depth),
                })
                .collect(),
        };

        let header = row(header);
        let rows = rows.iter().map(|cells| row(cells)).collect();
        let columns = align.len().max(header.cells.len());
        RenderNode::Table {
            align: (0..columns).map(column).collect(),
            header,
            rows,
        }
    }
}

impl From<Align> for Alignment {
    fn from(align: Align) -> Self {
        match align {
            Align::Left => Self::Left,
            Align::Center => Self::Center,
            Align::Right => Self::Right,
        }
    }
}

/// The only raw HTML that is given meaning.
fn is_line_break_tag(raw: &str) -> bool {
    matches!(raw.trim(), "<br>" | "<br >" | "<br/>" | "<br />")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::plain_text;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Token {
        Token::text(s)
    }

    fn leaf(s: &str) -> Option<RenderNode> {
        Some(RenderNode::text(s))
    }

    fn render_one(token: Token) -> Option<RenderNode> {
        render(&vec![token]).unwrap().remove(0)
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert_eq!(render(""), None);
        assert_eq!(render(&Vec::<Token>::new()), None);
    }

    #[test]
    fn test_length_and_order_preserved() {
        let tokens = vec![
            Token::Space,
            Token::Hr,
            Token::Def {
                tag: "id".to_owned(),
                href: "http://x.com".to_owned(),
                title: None,
            },
            Token::Paragraph {
                tokens: vec![text("a"), Token::Space, text("b")],
            },
            Token::Unknown,
        ];
        let nodes = render(&tokens).unwrap();
        assert_eq!(
            nodes,
            vec![
                None,
                Some(RenderNode::ThematicBreak),
                None,
                Some(RenderNode::Paragraph {
                    children: vec![leaf("a"), None, leaf("b")],
                }),
                None,
            ]
        );
    }

    #[test]
    fn test_text_uses_raw_not_escaped_text() {
        let node = render_one(Token::Text {
            raw: "it's".to_owned(),
            text: "it&#39;s".to_owned(),
            tokens: None,
        });
        assert_eq!(node, leaf("it's"));
    }

    #[test]
    fn test_text_with_tokens_is_inline_group() {
        let node = render_one(Token::Text {
            raw: "*a*".to_owned(),
            text: "*a*".to_owned(),
            tokens: Some(vec![Token::Em {
                tokens: vec![text("a")],
            }]),
        });
        assert_eq!(
            node,
            Some(RenderNode::InlineGroup {
                children: vec![Some(RenderNode::Emphasis {
                    children: vec![leaf("a")],
                })],
            })
        );
    }

    #[test]
    fn test_autolink_label_is_raw() {
        let node = render_one(Token::Link {
            href: "http://x.com".to_owned(),
            title: None,
            text: "http://x.com".to_owned(),
            raw: "http://x.com".to_owned(),
            tokens: Some(vec![Token::Strong {
                tokens: vec![text("http://x.com")],
            }]),
        });
        assert_eq!(
            node,
            Some(RenderNode::Link {
                href: "http://x.com".to_owned(),
                title: None,
                children: vec![leaf("http://x.com")],
            })
        );
    }

    #[test]
    fn test_mailto_label_is_raw() {
        let node = render_one(Token::Link {
            href: "mailto:me@example.com".to_owned(),
            title: None,
            text: "me@example.com".to_owned(),
            raw: "<me@example.com>".to_owned(),
            tokens: Some(vec![text("me@example.com")]),
        });
        let Some(RenderNode::Link { children, .. }) = node else {
            panic!("expected link");
        };
        assert_eq!(children, vec![leaf("<me@example.com>")]);
    }

    #[test]
    fn test_link_label_from_children() {
        let node = render_one(Token::Link {
            href: "http://x.com".to_owned(),
            title: Some("X".to_owned()),
            text: "here".to_owned(),
            raw: "[*here*](http://x.com)".to_owned(),
            tokens: Some(vec![Token::Em {
                tokens: vec![text("here")],
            }]),
        });
        assert_eq!(
            node,
            Some(RenderNode::Link {
                href: "http://x.com".to_owned(),
                title: Some("X".to_owned()),
                children: vec![Some(RenderNode::Emphasis {
                    children: vec![leaf("here")],
                })],
            })
        );
    }

    #[test]
    fn test_link_without_label_tokens_shows_raw() {
        let node = render_one(Token::Link {
            href: "http://a".to_owned(),
            title: None,
            text: "here".to_owned(),
            raw: "[here](http://a)".to_owned(),
            tokens: None,
        });
        assert_eq!(
            node,
            Some(RenderNode::Link {
                href: "http://a".to_owned(),
                title: None,
                children: vec![leaf("[here](http://a)")],
            })
        );
    }

    #[test]
    fn test_link_with_empty_label_stays_empty() {
        let node = render_one(Token::Link {
            href: "http://a".to_owned(),
            title: None,
            text: String::new(),
            raw: "[](http://a)".to_owned(),
            tokens: Some(Vec::new()),
        });
        let Some(RenderNode::Link { children, .. }) = node else {
            panic!("expected link");
        };
        assert!(children.is_empty());
    }

    #[test]
    fn test_malformed_json_tokens_render_as_empty_slots() {
        let json = r#"[
            {"type": "hr"},
            {"type": "heading", "tokens": []},
            {"type": "link", "text": "x"},
            {"type": "paragraph", "tokens": [{"type": "text", "raw": "ok", "text": "ok"}]}
        ]"#;
        let mut de = serde_json::Deserializer::from_str(json);
        let tokens = crate::deserialize_tokens(&mut de).unwrap();
        assert_eq!(
            render(&tokens).unwrap(),
            vec![
                Some(RenderNode::ThematicBreak),
                None,
                None,
                Some(RenderNode::Paragraph {
                    children: vec![leaf("ok")],
                }),
            ]
        );
    }

    #[test]
    fn test_html_is_never_interpreted() {
        let raw = "<script>alert(1)</script>";
        let node = render_one(Token::Html {
            raw: raw.to_owned(),
        });
        assert_eq!(node, leaf(raw));
    }

    #[test]
    fn test_html_line_break_spellings() {
        for raw in ["<br>", "<br >", "<br/>", "<br />", "  <br>\n"] {
            let node = render_one(Token::Html {
                raw: raw.to_owned(),
            });
            assert_eq!(node, Some(RenderNode::LineBreak), "{raw:?}");
        }
        let node = render_one(Token::Html {
            raw: "<br class=x>".to_owned(),
        });
        assert_eq!(node, leaf("<br class=x>"));
    }

    #[test]
    fn test_heading_levels() {
        for depth in 1..=6u8 {
            let node = render_one(Token::Heading {
                depth,
                tokens: vec![text("T")],
            });
            assert_eq!(
                node,
                Some(RenderNode::Heading {
                    level: depth,
                    children: vec![leaf("T")],
                })
            );
        }
    }

    #[test]
    fn test_table_shape_and_alignment() {
        let cell = |s: &str| Cell {
            text: s.to_owned(),
            tokens: vec![text(s)],
        };
        let node = render_one(Token::Table {
            header: vec![cell("a"), cell("b"), cell("c")],
            rows: vec![
                vec![cell("1"), cell("2"), cell("3")],
                vec![cell("4"), cell("5"), cell("6")],
            ],
            align: vec![None, Some(Align::Center), Some(Align::Right)],
        });
        let Some(RenderNode::Table {
            align,
            header,
            rows,
        }) = node
        else {
            panic!("expected table");
        };
        assert_eq!(
            align,
            vec![Alignment::Unset, Alignment::Center, Alignment::Right]
        );
        assert_eq!(header.cells.len(), 3);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.cells.len(), 3);
            assert_eq!(row.cells[0].align, Alignment::Unset);
            assert_eq!(row.cells[1].align, Alignment::Center);
            assert_eq!(row.cells[2].align, Alignment::Right);
        }
        assert_eq!(header.cells[1].align, Alignment::Center);
        assert_eq!(rows[1].cells[2].children, vec![leaf("6")]);
    }

    #[test]
    fn test_table_missing_alignment_entries_unset() {
        let node = render_one(Token::Table {
            header: vec![Cell::default(), Cell::default()],
            rows: Vec::new(),
            align: Vec::new(),
        });
        let Some(RenderNode::Table { align, header, .. }) = node else {
            panic!("expected table");
        };
        assert_eq!(align, vec![Alignment::Unset, Alignment::Unset]);
        assert!(header.cells.iter().all(|c| c.children.is_empty()));
    }

    #[test]
    fn test_ordered_list_start() {
        let list = |ordered, start| Token::List {
            ordered,
            start,
            loose: false,
            items: vec![Token::ListItem {
                task: false,
                checked: None,
                tokens: vec![text("x")],
            }],
        };

        let Some(RenderNode::OrderedList { start, children }) = render_one(list(true, Some(5)))
        else {
            panic!("expected ordered list");
        };
        assert_eq!(start, 5);
        assert_eq!(
            children,
            vec![Some(RenderNode::ListItem {
                checked: None,
                children: vec![leaf("x")],
            })]
        );

        assert!(matches!(
            render_one(list(true, None)),
            Some(RenderNode::OrderedList { start: 1, .. })
        ));
        assert!(matches!(
            render_one(list(true, Some(0))),
            Some(RenderNode::OrderedList { start: 1, .. })
        ));
        assert!(matches!(
            render_one(list(false, Some(5))),
            Some(RenderNode::UnorderedList { .. })
        ));
    }

    #[test]
    fn test_code_is_verbatim() {
        let node = render_one(Token::Code {
            text: "# not a heading\n<b>".to_owned(),
            lang: Some(String::new()),
            code_block_style: None,
        });
        assert_eq!(
            node,
            Some(RenderNode::CodeBlock {
                lang: None,
                text: "# not a heading\n<b>".to_owned(),
            })
        );
        assert_eq!(
            render_one(Token::Codespan {
                text: "**x**".to_owned()
            }),
            Some(RenderNode::InlineCode {
                text: "**x**".to_owned()
            })
        );
    }

    #[test]
    fn test_image_is_leaf() {
        assert_eq!(
            render_one(Token::Image {
                href: "a.png".to_owned(),
                title: None,
                text: "alt".to_owned(),
            }),
            Some(RenderNode::Image {
                src: "a.png".to_owned(),
                alt: "alt".to_owned(),
                title: None,
            })
        );
    }

    #[test]
    fn test_escape_and_breaks() {
        let nodes = render(&vec![
            Token::Escape {
                text: "*".to_owned(),
            },
            Token::Br,
            Token::Hr,
        ])
        .unwrap();
        assert_eq!(
            nodes,
            vec![
                leaf("*"),
                Some(RenderNode::LineBreak),
                Some(RenderNode::ThematicBreak)
            ]
        );
    }

    #[test]
    fn test_empty_container_has_no_children() {
        assert_eq!(
            render_one(Token::Strong { tokens: Vec::new() }),
            Some(RenderNode::Strong {
                children: Vec::new()
            })
        );
    }

    #[test]
    fn test_depth_limit_drops_deep_content_only() {
        let mut token = text("deep");
        for _ in 0..10 {
            token = Token::Blockquote {
                tokens: vec![token],
            };
        }
        let tokens = vec![token, Token::Hr];
        let nodes = DocumentRenderer::new()
            .with_max_depth(3)
            .render(&tokens)
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1], Some(RenderNode::ThematicBreak));
        assert_eq!(
            nodes[0],
            Some(RenderNode::Blockquote {
                children: vec![Some(RenderNode::Blockquote {
                    children: vec![Some(RenderNode::Blockquote {
                        children: vec![None],
                    })],
                })],
            })
        );
    }

    #[test]
    fn test_deep_nesting_within_default_limit() {
        let mut token = text("deep");
        for _ in 0..100 {
            token = Token::Blockquote {
                tokens: vec![token],
            };
        }
        let nodes = render(&vec![token]).unwrap();
        assert_eq!(plain_text(&nodes), "deep");
    }

    #[test]
    fn test_deeply_nested_markdown_is_bounded() {
        let markdown = format!("{} x\n\nafter", ">".repeat(20_000));
        let nodes = DocumentRenderer::new()
            .with_max_depth(64)
            .render(markdown.as_str())
            .unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            nodes[1],
            Some(RenderNode::Paragraph {
                children: vec![leaf("after")],
            })
        );

        let mut depth = 0;
        let mut node = nodes[0].as_ref();
        while let Some(RenderNode::Blockquote { children }) = node {
            depth += 1;
            node = children.first().and_then(Option::as_ref);
        }
        assert_eq!(depth, 64);
    }

    #[test]
    fn test_tokenize_respects_configured_depth() {
        let renderer = DocumentRenderer::new().with_max_depth(4);
        let mut tokens = renderer.tokenize(&format!("{} x", ">".repeat(50)));
        let mut depth = 0;
        while let Some(Token::Blockquote { tokens: inner }) = tokens.pop() {
            depth += 1;
            tokens = inner;
        }
        assert_eq!(depth, 4);
    }

    #[test]
    fn test_end_to_end_document() {
        let nodes = render("# Title\n\nSee [here](http://x.com) and ~~old~~ *new*.").unwrap();
        assert_eq!(
            nodes,
            vec![
                Some(RenderNode::Heading {
                    level: 1,
                    children: vec![leaf("Title")],
                }),
                Some(RenderNode::Paragraph {
                    children: vec![
                        leaf("See "),
                        Some(RenderNode::Link {
                            href: "http://x.com".to_owned(),
                            title: None,
                            children: vec![leaf("here")],
                        }),
                        leaf(" and "),
                        Some(RenderNode::Strikethrough {
                            children: vec![leaf("old")],
                        }),
                        leaf(" "),
                        Some(RenderNode::Emphasis {
                            children: vec![leaf("new")],
                        }),
                        leaf("."),
                    ],
                }),
            ]
        );
    }

    #[test]
    fn test_markdown_autolink_shows_source() {
        let nodes = render("<http://x.com>").unwrap();
        let Some(RenderNode::Paragraph { children }) = &nodes[0] else {
            panic!("expected paragraph");
        };
        assert_eq!(
            children[0],
            Some(RenderNode::Link {
                href: "http://x.com".to_owned(),
                title: None,
                children: vec![leaf("<http://x.com>")],
            })
        );
    }

    #[test]
    fn test_markdown_tight_list_renders_inline_group() {
        let nodes = render("- **a**").unwrap();
        assert_eq!(
            nodes,
            vec![Some(RenderNode::UnorderedList {
                children: vec![Some(RenderNode::ListItem {
                    checked: None,
                    children: vec![Some(RenderNode::InlineGroup {
                        children: vec![Some(RenderNode::Strong {
                            children: vec![leaf("a")],
                        })],
                    })],
                })],
            })]
        );
    }

    #[test]
    fn test_markdown_reference_definition_slot() {
        let nodes = render("[a][x]\n\n[x]: http://x.com").unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].is_some());
        assert_eq!(nodes[1], None);
    }

    #[test]
    fn test_gfm_disabled_keeps_tildes() {
        let nodes = DocumentRenderer::new()
            .with_gfm(false)
            .render("~~old~~")
            .unwrap();
        assert_eq!(plain_text(&nodes), "~~old~~");
    }

    #[test]
    fn test_renderer_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DocumentRenderer>();
        assert_send_sync::<RenderNode>();
    }
}
