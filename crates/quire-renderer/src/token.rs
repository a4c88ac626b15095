//! Lexer-shaped markdown token tree.
//!
//! [`Token`] mirrors the JSON emitted by common JavaScript markdown lexers:
//! every node carries a `type` tag, containers carry their inline children in
//! `tokens`, and lists carry their entries in `items`. The same shape is
//! produced by [`tokenize`](crate::tokenize) and accepted by the renderer, so
//! pre-tokenized documents can be rendered without running the lexer.
//!
//! Nested token sequences deserialize leniently: a token that fails to parse
//! becomes [`Token::Unknown`] instead of rejecting the whole document. Use
//! [`deserialize_tokens`] for the top-level sequence to get the same behavior.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One node of the markdown token tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Token {
    Paragraph {
        #[serde(default, deserialize_with = "deserialize_tokens")]
        tokens: Vec<Token>,
    },
    Heading {
        depth: u8,
        #[serde(default, deserialize_with = "deserialize_tokens")]
        tokens: Vec<Token>,
    },
    Blockquote {
        #[serde(default, deserialize_with = "deserialize_tokens")]
        tokens: Vec<Token>,
    },
    List {
        #[serde(default)]
        ordered: bool,
        /// Number of the first item. Lexers emit `false` (or an empty string)
        /// for unordered lists; both deserialize to `None`.
        #[serde(
            default,
            deserialize_with = "deserialize_start",
            serialize_with = "serialize_start"
        )]
        start: Option<u64>,
        #[serde(default)]
        loose: bool,
        #[serde(default, deserialize_with = "deserialize_tokens")]
        items: Vec<Token>,
    },
    ListItem {
        #[serde(default)]
        task: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        checked: Option<bool>,
        #[serde(default, deserialize_with = "deserialize_tokens")]
        tokens: Vec<Token>,
    },
    Table {
        #[serde(default)]
        header: Vec<Cell>,
        #[serde(default)]
        rows: Vec<Vec<Cell>>,
        #[serde(default)]
        align: Vec<Option<Align>>,
    },
    Code {
        #[serde(default)]
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        /// `"indented"` for indented code blocks, absent for fenced ones.
        #[serde(
            default,
            rename = "codeBlockStyle",
            skip_serializing_if = "Option::is_none"
        )]
        code_block_style: Option<String>,
    },
    Codespan {
        #[serde(default)]
        text: String,
    },
    Strong {
        #[serde(default, deserialize_with = "deserialize_tokens")]
        tokens: Vec<Token>,
    },
    Em {
        #[serde(default, deserialize_with = "deserialize_tokens")]
        tokens: Vec<Token>,
    },
    Del {
        #[serde(default, deserialize_with = "deserialize_tokens")]
        tokens: Vec<Token>,
    },
    Link {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        text: String,
        #[serde(default)]
        raw: String,
        /// Label markup. When absent the label is the raw source.
        #[serde(
            default,
            deserialize_with = "deserialize_optional_tokens",
            skip_serializing_if = "Option::is_none"
        )]
        tokens: Option<Vec<Token>>,
    },
    Image {
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default)]
        text: String,
    },
    /// Plain text. Block-level text (tight list items) carries nested inline
    /// markup in `tokens`; inline text never does.
    Text {
        #[serde(default)]
        raw: String,
        #[serde(default)]
        text: String,
        #[serde(
            default,
            deserialize_with = "deserialize_optional_tokens",
            skip_serializing_if = "Option::is_none"
        )]
        tokens: Option<Vec<Token>>,
    },
    Escape {
        #[serde(default)]
        text: String,
    },
    Html {
        #[serde(default)]
        raw: String,
    },
    Hr,
    Br,
    Space,
    /// Link reference definition (`[id]: https://example.com "title"`).
    Def {
        #[serde(default)]
        tag: String,
        #[serde(default)]
        href: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    /// Any token type this crate does not know about.
    #[serde(other)]
    Unknown,
}

/// One table cell.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "deserialize_tokens")]
    pub tokens: Vec<Token>,
}

/// Column alignment declared in a table delimiter row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Token {
    /// Build an inline text token whose raw and decoded text are the same.
    #[must_use]
    pub fn text(content: impl Into<String>) -> Self {
        let content = content.into();
        Self::Text {
            raw: content.clone(),
            text: content,
            tokens: None,
        }
    }

    /// The token's `type` tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Paragraph { .. } => "paragraph",
            Self::Heading { .. } => "heading",
            Self::Blockquote { .. } => "blockquote",
            Self::List { .. } => "list",
            Self::ListItem { .. } => "list_item",
            Self::Table { .. } => "table",
            Self::Code { .. } => "code",
            Self::Codespan { .. } => "codespan",
            Self::Strong { .. } => "strong",
            Self::Em { .. } => "em",
            Self::Del { .. } => "del",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
            Self::Text { .. } => "text",
            Self::Escape { .. } => "escape",
            Self::Html { .. } => "html",
            Self::Hr => "hr",
            Self::Br => "br",
            Self::Space => "space",
            Self::Def { .. } => "def",
            Self::Unknown => "unknown",
        }
    }

    /// Nested inline children, for token kinds that carry a `tokens` field.
    ///
    /// Lists and tables keep their children in `items` / cells and return `None`.
    #[must_use]
    pub fn tokens(&self) -> Option<&[Token]> {
        match self {
            Self::Paragraph { tokens }
            | Self::Heading { tokens, .. }
            | Self::Blockquote { tokens }
            | Self::ListItem { tokens, .. }
            | Self::Strong { tokens }
            | Self::Em { tokens }
            | Self::Del { tokens } => Some(tokens),
            Self::Link { tokens, .. } | Self::Text { tokens, .. } => tokens.as_deref(),
            _ => None,
        }
    }

    /// Whether the token is inline content (can appear inside a paragraph).
    #[must_use]
    pub fn is_inline(&self) -> bool {
        match self {
            Self::Text { tokens, .. } => tokens.is_none(),
            Self::Escape { .. }
            | Self::Codespan { .. }
            | Self::Strong { .. }
            | Self::Em { .. }
            | Self::Del { .. }
            | Self::Link { .. }
            | Self::Image { .. }
            | Self::Html { .. }
            | Self::Br => true,
            _ => false,
        }
    }

    /// Decoded text content with all markup stripped.
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Self::Text {
                tokens: Some(tokens),
                ..
            } => push_plain_text(tokens, out),
            Self::Text { text, .. }
            | Self::Escape { text }
            | Self::Codespan { text }
            | Self::Code { text, .. }
            | Self::Image { text, .. } => out.push_str(text),
            Self::Br => out.push('\n'),
            Self::List { items, .. } => push_plain_text(items, out),
            Self::Table { header, rows, .. } => {
                for cell in header.iter().chain(rows.iter().flatten()) {
                    push_plain_text(&cell.tokens, out);
                }
            }
            other => {
                if let Some(tokens) = other.tokens() {
                    push_plain_text(tokens, out);
                }
            }
        }
    }
}

/// Concatenate the decoded text of a token sequence.
#[must_use]
pub fn plain_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    push_plain_text(tokens, &mut out);
    out
}

fn push_plain_text(tokens: &[Token], out: &mut String) {
    for token in tokens {
        token.push_plain_text(out);
    }
}

/// One element of a token sequence; anything that is not a valid token is
/// kept as a placeholder so sibling positions are preserved.
#[derive(Deserialize)]
#[serde(untagged)]
enum Slot {
    Token(Token),
    Malformed(#[allow(dead_code)] IgnoredAny),
}

impl From<Slot> for Token {
    fn from(slot: Slot) -> Self {
        match slot {
            Slot::Token(token) => token,
            Slot::Malformed(_) => Self::Unknown,
        }
    }
}

/// Deserialize a token sequence, turning malformed entries into
/// [`Token::Unknown`].
///
/// # Errors
///
/// Fails only when the input is not a sequence at all.
///
/// # Example
///
/// ```
/// use quire_renderer::{Token, deserialize_tokens};
///
/// let json = r#"[{"type": "hr"}, {"type": "heading"}]"#;
/// let mut de = serde_json::Deserializer::from_str(json);
/// let tokens = deserialize_tokens(&mut de).unwrap();
/// assert_eq!(tokens, vec![Token::Hr, Token::Unknown]);
/// ```
pub fn deserialize_tokens<'de, D>(deserializer: D) -> Result<Vec<Token>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = Vec::<Slot>::deserialize(deserializer)?;
    Ok(slots.into_iter().map(Token::from).collect())
}

fn deserialize_optional_tokens<'de, D>(deserializer: D) -> Result<Option<Vec<Token>>, D::Error>
where
    D: Deserializer<'de>,
{
    let slots = Option::<Vec<Slot>>::deserialize(deserializer)?;
    Ok(slots.map(|slots| slots.into_iter().map(Token::from).collect()))
}

/// Lexers disagree on how "no start number" is spelled: `false`, an empty
/// string, or nothing at all.
#[derive(Deserialize)]
#[serde(untagged)]
enum StartRepr {
    Number(u64),
    Text(String),
    Other(#[allow(dead_code)] IgnoredAny),
}

fn deserialize_start<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let repr = Option::<StartRepr>::deserialize(deserializer)?;
    Ok(match repr {
        Some(StartRepr::Number(n)) => Some(n),
        Some(StartRepr::Text(s)) => s.trim().parse().ok(),
        Some(StartRepr::Other(_)) | None => None,
    })
}

#[allow(clippy::ref_option)]
fn serialize_start<S>(start: &Option<u64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match start {
        Some(n) => serializer.serialize_u64(*n),
        None => serializer.serialize_bool(false),
    }
}
