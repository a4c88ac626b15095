//! Token tree construction on top of pulldown-cmark.
//!
//! pulldown-cmark does the lexing and emits a flat stream of start/end events.
//! [`tokenize`] folds that stream into the nested [`Token`] tree: every start
//! event opens a frame, every end event closes it into a token that is pushed
//! onto the enclosing frame.
//!
//! Nesting is bounded: containers opened below the depth limit are flattened
//! into their nearest kept ancestor, so the token tree never grows deeper than
//! the limit no matter how the input is nested.

use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};

use crate::renderer::DEFAULT_MAX_DEPTH;
use crate::token::{Align, Cell, Token, plain_text};
use crate::util::heading_level_to_num;

/// Parser options for GitHub Flavored Markdown (tables, strikethrough, task lists).
#[must_use]
pub fn parser_options(gfm: bool) -> Options {
    if gfm {
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
    } else {
        Options::empty()
    }
}

/// Tokenize markdown with GFM extensions enabled.
///
/// # Example
///
/// ```
/// use quire_renderer::{Token, tokenize};
///
/// let tokens = tokenize("Hello *world*");
/// assert!(matches!(tokens[0], Token::Paragraph { .. }));
/// ```
#[must_use]
pub fn tokenize(markdown: &str) -> Vec<Token> {
    tokenize_with(markdown, parser_options(true))
}

/// Tokenize markdown with explicit parser options and the default depth bound.
#[must_use]
pub fn tokenize_with(markdown: &str, options: Options) -> Vec<Token> {
    tokenize_bounded(markdown, options, DEFAULT_MAX_DEPTH)
}

/// Tokenize markdown, flattening containers nested `max_depth` levels deep.
///
/// # Example
///
/// ```
/// use quire_renderer::{Token, parser_options, tokenize_bounded};
///
/// let tokens = tokenize_bounded("> > > deep", parser_options(true), 1);
/// let Token::Blockquote { tokens } = &tokens[0] else { panic!() };
/// assert_eq!(tokens, &[Token::text("deep")]);
/// ```
#[must_use]
pub fn tokenize_bounded(markdown: &str, options: Options, max_depth: usize) -> Vec<Token> {
    let parser = Parser::new_ext(markdown, options);

    let mut definitions: Vec<(Range<usize>, Token)> = parser
        .reference_definitions()
        .iter()
        .map(|(label, def)| {
            let token = Token::Def {
                tag: label.to_owned(),
                href: def.dest.to_string(),
                title: def.title.as_ref().map(ToString::to_string),
            };
            (def.span.clone(), token)
        })
        .collect();
    definitions.sort_by_key(|(span, _)| span.start);

    let mut builder = TreeBuilder::new(markdown, max_depth);
    for (event, range) in parser.into_offset_iter() {
        builder.event(event, range);
    }
    builder.finish(definitions)
}

/// Container currently being collected.
enum Container {
    Root,
    Paragraph,
    Heading(u8),
    Blockquote,
    CodeBlock {
        lang: Option<String>,
        indented: bool,
    },
    HtmlBlock,
    List(Option<u64>),
    Item,
    Table(Vec<Option<Align>>),
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link {
        href: String,
        title: Option<String>,
    },
    Image {
        href: String,
        title: Option<String>,
    },
    /// Constructs without a token kind; children are spliced into the parent.
    Transparent,
}

struct Frame {
    container: Container,
    span: Range<usize>,
    tokens: Vec<Token>,
    /// Cells of the current table row (`TableHead` / `TableRow`).
    cells: Vec<Cell>,
    /// Header and body rows (`Table`).
    header: Vec<Cell>,
    rows: Vec<Vec<Cell>>,
    /// Literal content of code and HTML blocks.
    verbatim: String,
    /// Task list state (`Item`).
    checked: Option<bool>,
}

impl Frame {
    fn new(container: Container, span: Range<usize>) -> Self {
        Self {
            container,
            span,
            tokens: Vec::new(),
            cells: Vec::new(),
            header: Vec::new(),
            rows: Vec::new(),
            verbatim: String::new(),
            checked: None,
        }
    }

    fn is_verbatim(&self) -> bool {
        matches!(
            self.container,
            Container::CodeBlock { .. } | Container::HtmlBlock
        )
    }
}

struct TreeBuilder<'s> {
    source: &'s str,
    stack: Vec<Frame>,
    /// Source spans of the top-level tokens, for placing definitions.
    root_spans: Vec<Range<usize>>,
    max_depth: usize,
    flattened: bool,
}

impl<'s> TreeBuilder<'s> {
    fn new(source: &'s str, max_depth: usize) -> Self {
        Self {
            source,
            stack: vec![Frame::new(Container::Root, 0..source.len())],
            root_spans: Vec::new(),
            max_depth,
            flattened: false,
        }
    }

    fn top(&mut self) -> &mut Frame {
        // The root frame is never popped.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn event(&mut self, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(tag, range),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.text(&text, range),
            Event::Code(code) => self.emit(
                Token::Codespan {
                    text: code.to_string(),
                },
                range,
            ),
            Event::Html(html) | Event::InlineHtml(html) => {
                if self.top().is_verbatim() {
                    self.top().verbatim.push_str(&html);
                } else {
                    self.emit(
                        Token::Html {
                            raw: html.to_string(),
                        },
                        range,
                    );
                }
            }
            Event::SoftBreak => {
                if self.top().is_verbatim() {
                    self.top().verbatim.push('\n');
                } else {
                    self.push_text("\n", "\n", range);
                }
            }
            Event::HardBreak => self.emit(Token::Br, range),
            Event::Rule => self.emit(Token::Hr, range),
            Event::TaskListMarker(checked) => {
                if let Some(item) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|frame| matches!(frame.container, Container::Item))
                {
                    item.checked = Some(checked);
                }
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                tracing::debug!(range = ?range, "markdown construct without token kind skipped");
            }
        }
    }

    fn start(&mut self, tag: Tag<'_>, span: Range<usize>) {
        let container = match tag {
            Tag::Paragraph => Container::Paragraph,
            Tag::Heading { level, .. } => Container::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => Container::Blockquote,
            Tag::CodeBlock(kind) => match kind {
                CodeBlockKind::Fenced(info) => Container::CodeBlock {
                    lang: info.split_whitespace().next().map(str::to_owned),
                    indented: false,
                },
                CodeBlockKind::Indented => Container::CodeBlock {
                    lang: None,
                    indented: true,
                },
            },
            Tag::HtmlBlock => Container::HtmlBlock,
            Tag::List(start) => Container::List(start),
            Tag::Item => Container::Item,
            Tag::Table(alignments) => {
                Container::Table(alignments.iter().map(|a| convert_alignment(*a)).collect())
            }
            Tag::TableHead => Container::TableHead,
            Tag::TableRow => Container::TableRow,
            Tag::TableCell => Container::TableCell,
            Tag::Emphasis => Container::Emphasis,
            Tag::Strong => Container::Strong,
            Tag::Strikethrough => Container::Strikethrough,
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => Container::Link {
                href: link_href(link_type, &dest_url),
                title: non_empty(&title),
            },
            Tag::Image {
                dest_url, title, ..
            } => Container::Image {
                href: dest_url.to_string(),
                title: non_empty(&title),
            },
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_)
            | Tag::Superscript
            | Tag::Subscript => Container::Transparent,
        };

        // The root frame does not count towards the depth.
        let container = if self.stack.len() > self.max_depth {
            if !self.flattened {
                self.flattened = true;
                tracing::warn!(
                    max_depth = self.max_depth,
                    "markdown nesting exceeds depth limit, deeper containers flattened"
                );
            }
            Container::Transparent
        } else {
            container
        };
        self.stack.push(Frame::new(container, span));
    }

    fn end(&mut self, _tag: TagEnd) {
        if self.stack.len() == 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };
        let span = frame.span.clone();

        let token = match frame.container {
            Container::Root => return,
            Container::Paragraph => Token::Paragraph {
                tokens: frame.tokens,
            },
            Container::Heading(depth) => Token::Heading {
                depth,
                tokens: frame.tokens,
            },
            Container::Blockquote => Token::Blockquote {
                tokens: frame.tokens,
            },
            Container::CodeBlock { lang, indented } => {
                let mut text = frame.verbatim;
                if text.ends_with('\n') {
                    text.pop();
                }
                Token::Code {
                    text,
                    lang,
                    code_block_style: indented.then(|| "indented".to_owned()),
                }
            }
            Container::HtmlBlock => Token::Html {
                raw: frame.verbatim,
            },
            Container::List(start) => {
                let loose = frame.tokens.iter().any(|item| {
                    item.tokens()
                        .is_some_and(|t| t.iter().any(|c| matches!(c, Token::Paragraph { .. })))
                });
                Token::List {
                    ordered: start.is_some(),
                    start,
                    loose,
                    items: frame.tokens,
                }
            }
            Container::Item => Token::ListItem {
                task: frame.checked.is_some(),
                checked: frame.checked,
                tokens: wrap_inline_runs(frame.tokens),
            },
            Container::Table(align) => Token::Table {
                header: frame.header,
                rows: frame.rows,
                align,
            },
            Container::TableHead => {
                self.top().header = frame.cells;
                return;
            }
            Container::TableRow => {
                self.top().rows.push(frame.cells);
                return;
            }
            Container::TableCell => {
                let cell = Cell {
                    text: plain_text(&frame.tokens),
                    tokens: frame.tokens,
                };
                self.top().cells.push(cell);
                return;
            }
            Container::Emphasis => Token::Em {
                tokens: frame.tokens,
            },
            Container::Strong => Token::Strong {
                tokens: frame.tokens,
            },
            Container::Strikethrough => Token::Del {
                tokens: frame.tokens,
            },
            Container::Link { href, title } => Token::Link {
                href,
                title,
                text: plain_text(&frame.tokens),
                raw: self.source.get(span.clone()).unwrap_or_default().to_owned(),
                tokens: Some(frame.tokens),
            },
            Container::Image { href, title } => Token::Image {
                href,
                title,
                text: plain_text(&frame.tokens),
            },
            Container::Transparent => {
                let at_root = self.stack.len() == 1;
                for token in frame.tokens {
                    self.top().tokens.push(token);
                    if at_root {
                        self.root_spans.push(span.clone());
                    }
                }
                return;
            }
        };
        self.emit(token, span);
    }

    fn text(&mut self, text: &str, range: Range<usize>) {
        if self.top().is_verbatim() {
            self.top().verbatim.push_str(text);
            return;
        }

        let source = self.source.get(range.clone()).unwrap_or(text);
        if source != text && is_entity(source) {
            self.emit(
                Token::Escape {
                    text: text.to_owned(),
                },
                range,
            );
            return;
        }

        // The lexer drops the backslash and starts the text at the escaped character.
        if let Some(first) = text.chars().next()
            && first.is_ascii_punctuation()
            && is_backslash_escaped(self.source, range.start)
        {
            let (escaped, rest) = text.split_at(first.len_utf8());
            self.emit(
                Token::Escape {
                    text: escaped.to_owned(),
                },
                range.start..range.start + escaped.len(),
            );
            if !rest.is_empty() {
                let rest_range = range.start + escaped.len()..range.end;
                self.push_text(rest, rest, rest_range);
            }
            return;
        }

        let raw = if source == text { source } else { text };
        self.push_text(raw, text, range);
    }

    /// Append to the previous plain text token, or start a new one.
    fn push_text(&mut self, raw: &str, text: &str, range: Range<usize>) {
        if let Some(Token::Text {
            raw: prev_raw,
            text: prev_text,
            tokens: None,
        }) = self.top().tokens.last_mut()
        {
            prev_raw.push_str(raw);
            prev_text.push_str(text);
            return;
        }
        self.emit(
            Token::Text {
                raw: raw.to_owned(),
                text: text.to_owned(),
                tokens: None,
            },
            range,
        );
    }

    fn emit(&mut self, token: Token, span: Range<usize>) {
        if self.stack.len() == 1 {
            self.root_spans.push(span);
        }
        self.top().tokens.push(token);
    }

    fn finish(mut self, definitions: Vec<(Range<usize>, Token)>) -> Vec<Token> {
        // Unclosed frames only occur on malformed event streams; fold them up.
        while self.stack.len() > 1 {
            self.end(TagEnd::Paragraph);
        }
        let blocks = std::mem::take(&mut self.top().tokens);
        interleave_definitions(blocks, &self.root_spans, definitions)
    }
}

/// Merge top-level definition tokens into the block sequence by source position.
///
/// Definitions that fall inside a block (e.g. within a blockquote) stay hidden.
fn interleave_definitions(
    blocks: Vec<Token>,
    spans: &[Range<usize>],
    definitions: Vec<(Range<usize>, Token)>,
) -> Vec<Token> {
    let mut definitions = definitions
        .into_iter()
        .filter(|(def, _)| !spans.iter().any(|span| span.contains(&def.start)))
        .peekable();
    if definitions.peek().is_none() {
        return blocks;
    }

    let mut out = Vec::with_capacity(blocks.len());
    for (token, span) in blocks.into_iter().zip(spans) {
        while let Some((def, _)) = definitions.peek() {
            if def.start >= span.start {
                break;
            }
            if let Some((_, definition)) = definitions.next() {
                out.push(definition);
            }
        }
        out.push(token);
    }
    out.extend(definitions.map(|(_, definition)| definition));
    out
}

/// Wrap inline runs directly inside a list item in block-level text tokens.
fn wrap_inline_runs(tokens: Vec<Token>) -> Vec<Token> {
    let mut out = Vec::new();
    let mut run = Vec::new();
    for token in tokens {
        if token.is_inline() {
            run.push(token);
        } else {
            flush_run(&mut run, &mut out);
            out.push(token);
        }
    }
    flush_run(&mut run, &mut out);
    out
}

fn flush_run(run: &mut Vec<Token>, out: &mut Vec<Token>) {
    if run.is_empty() {
        return;
    }
    let tokens = std::mem::take(run);
    let text = plain_text(&tokens);
    out.push(Token::Text {
        raw: text.clone(),
        text,
        tokens: Some(tokens),
    });
}

/// Entity and numeric character references (`&amp;`, `&#39;`).
fn is_entity(source: &str) -> bool {
    source.len() > 2 && source.starts_with('&') && source.ends_with(';')
}

/// Whether the byte at `pos` is preceded by an odd run of backslashes.
fn is_backslash_escaped(source: &str, pos: usize) -> bool {
    let preceding = source
        .as_bytes()
        .get(..pos)
        .unwrap_or_default()
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    preceding % 2 == 1
}

fn link_href(link_type: LinkType, dest: &str) -> String {
    if link_type == LinkType::Email && !dest.starts_with("mailto:") {
        format!("mailto:{dest}")
    } else {
        dest.to_owned()
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_owned())
}

fn convert_alignment(alignment: Alignment) -> Option<Align> {
    match alignment {
        Alignment::None => None,
        Alignment::Left => Some(Align::Left),
        Alignment::Center => Some(Align::Center),
        Alignment::Right => Some(Align::Right),
    }
}
