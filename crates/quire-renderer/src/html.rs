//! HTML presentation of the render tree.
//!
//! Produces semantic HTML5. All text and attribute values are escaped here;
//! the render tree itself carries unescaped display text.

use std::fmt::Write;

use crate::node::{Alignment, RenderNode, TableRow};

/// Escape text for use in HTML content and attribute values.
///
/// # Example
///
/// ```
/// use quire_renderer::escape_html;
///
/// assert_eq!(escape_html("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
/// ```
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render a slot sequence to an HTML string. Empty slots emit nothing.
///
/// # Example
///
/// ```
/// use quire_renderer::{render, to_html};
///
/// let nodes = render("Hello <script>").unwrap();
/// assert_eq!(to_html(&nodes), "<p>Hello &lt;script&gt;</p>");
/// ```
#[must_use]
pub fn to_html(nodes: &[Option<RenderNode>]) -> String {
    let mut out = String::with_capacity(1024);
    write_nodes(nodes, &mut out);
    out
}

fn write_nodes(nodes: &[Option<RenderNode>], out: &mut String) {
    for node in nodes.iter().flatten() {
        write_node(node, out);
    }
}

fn wrap(tag: &str, children: &[Option<RenderNode>], out: &mut String) {
    write!(out, "<{tag}>").unwrap();
    write_nodes(children, out);
    write!(out, "</{tag}>").unwrap();
}

fn write_node(node: &RenderNode, out: &mut String) {
    match node {
        RenderNode::Text { text } => out.push_str(&escape_html(text)),
        RenderNode::Paragraph { children } => wrap("p", children, out),
        RenderNode::Heading { level, children } => {
            let level = (*level).clamp(1, 6);
            wrap(&format!("h{level}"), children, out);
        }
        RenderNode::Blockquote { children } => wrap("blockquote", children, out),
        RenderNode::Emphasis { children } => wrap("em", children, out),
        RenderNode::Strong { children } => wrap("strong", children, out),
        RenderNode::Strikethrough { children } => wrap("del", children, out),
        RenderNode::InlineCode { text } => {
            write!(out, "<code>{}</code>", escape_html(text)).unwrap();
        }
        RenderNode::CodeBlock { lang, text } => match lang {
            Some(lang) => write!(
                out,
                r#"<pre><code class="language-{}">{}</code></pre>"#,
                escape_html(lang),
                escape_html(text)
            )
            .unwrap(),
            None => write!(out, "<pre><code>{}</code></pre>", escape_html(text)).unwrap(),
        },
        RenderNode::OrderedList { start, children } => {
            if *start == 1 {
                out.push_str("<ol>");
            } else {
                write!(out, r#"<ol start="{start}">"#).unwrap();
            }
            write_nodes(children, out);
            out.push_str("</ol>");
        }
        RenderNode::UnorderedList { children } => wrap("ul", children, out),
        RenderNode::ListItem { checked, children } => {
            out.push_str("<li>");
            match checked {
                Some(true) => out.push_str(r#"<input type="checkbox" checked disabled> "#),
                Some(false) => out.push_str(r#"<input type="checkbox" disabled> "#),
                None => {}
            }
            write_nodes(children, out);
            out.push_str("</li>");
        }
        RenderNode::Link {
            href,
            title,
            children,
        } => {
            write!(out, r#"<a href="{}""#, escape_html(href)).unwrap();
            if let Some(title) = title {
                write!(out, r#" title="{}""#, escape_html(title)).unwrap();
            }
            out.push_str(r#" target="_blank" rel="noopener noreferrer">"#);
            write_nodes(children, out);
            out.push_str("</a>");
        }
        RenderNode::Image { src, alt, title } => {
            write!(out, r#"<img src="{}""#, escape_html(src)).unwrap();
            if let Some(title) = title {
                write!(out, r#" title="{}""#, escape_html(title)).unwrap();
            }
            write!(out, r#" alt="{}">"#, escape_html(alt)).unwrap();
        }
        RenderNode::Table { header, rows, .. } => {
            out.push_str("<table><thead>");
            write_row(header, "th", out);
            out.push_str("</thead><tbody>");
            for row in rows {
                write_row(row, "td", out);
            }
            out.push_str("</tbody></table>");
        }
        RenderNode::InlineGroup { children } => write_nodes(children, out),
        RenderNode::ThematicBreak => out.push_str("<hr>"),
        RenderNode::LineBreak => out.push_str("<br>"),
    }
}

fn write_row(row: &TableRow, tag: &str, out: &mut String) {
    out.push_str("<tr>");
    for cell in &row.cells {
        write!(out, "<{tag}{}>", alignment_style(cell.align)).unwrap();
        write_nodes(&cell.children, out);
        write!(out, "</{tag}>").unwrap();
    }
    out.push_str("</tr>");
}

fn alignment_style(align: Alignment) -> &'static str {
    match align {
        Alignment::Unset => "",
        Alignment::Left => r#" style="text-align: left""#,
        Alignment::Center => r#" style="text-align: center""#,
        Alignment::Right => r#" style="text-align: right""#,
    }
}
