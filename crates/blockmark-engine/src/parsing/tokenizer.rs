//! Single-line tokenizer built on `pulldown-cmark` offset events.
//!
//! Produces [`TokenRecord`]s in the shape the node tree consumes: a type,
//! the raw markdown slice, the inner text, and nested `tokens` (or `items`
//! for lists). Paragraph wrappers are transparent: a plain line yields its
//! inline tokens directly.
//!
//! Sibling raws always tile their parent's content. Bytes pulldown-cmark
//! does not report (leading/trailing whitespace, the gap left by an escape
//! backslash) are filled in as verbatim `text` tokens, so summing raw
//! lengths recovers exact positions in the line.

use std::ops::Range;

use pulldown_cmark::{Event, Options, Parser, Tag};

/// Type tag of a [`TokenRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    CodeSpan,
    /// ATX heading with its level (1-6).
    Heading(u8),
    List,
    ListItem,
    Strong,
    Em,
    /// A construct the editable tree cannot represent, named after it.
    Unsupported(&'static str),
}

impl TokenKind {
    /// The token type name, as reported in construction errors.
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Text => "text",
            TokenKind::CodeSpan => "codespan",
            TokenKind::Heading(_) => "heading",
            TokenKind::List => "list",
            TokenKind::ListItem => "list_item",
            TokenKind::Strong => "strong",
            TokenKind::Em => "em",
            TokenKind::Unsupported(name) => name,
        }
    }
}

/// One token of a tokenized line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub kind: TokenKind,
    /// The exact markdown slice this token was parsed from.
    pub raw: String,
    /// Rendered text for leaves; for containers the slice spanning their children.
    pub text: Option<String>,
    /// Nested inline tokens (containers other than lists).
    pub tokens: Vec<TokenRecord>,
    /// Nested list items (lists only).
    pub items: Vec<TokenRecord>,
    /// Length of the opening syntax in `raw` before the content starts.
    pub content_offset: usize,
    /// Raw offset of the content inside the line, set by [`super::offsets::annotate`].
    pub begin: usize,
}

impl TokenRecord {
    fn leaf(kind: TokenKind, raw: String, text: String, content_offset: usize) -> Self {
        Self {
            kind,
            raw,
            text: Some(text),
            tokens: Vec::new(),
            items: Vec::new(),
            content_offset,
            begin: 0,
        }
    }

    /// Children of this token, whichever list holds them.
    pub fn children(&self) -> &[TokenRecord] {
        if self.items.is_empty() {
            &self.tokens
        } else {
            &self.items
        }
    }
}

/// Tokenizes one line of markdown.
///
/// The caller must pass single-line input; line breaks produce tokens the
/// tree rejects.
pub fn tokenize(line: &str) -> Vec<TokenRecord> {
    let mut builder = Builder {
        line,
        root: Vec::new(),
        open: Vec::new(),
    };

    for (event, span) in Parser::new_ext(line, Options::empty()).into_offset_iter() {
        match event {
            Event::Start(Tag::Paragraph) => builder.open.push(Frame {
                kind: None,
                span,
                children: Vec::new(),
            }),
            Event::Start(tag) => builder.open.push(Frame {
                kind: Some(container_kind(&tag)),
                span,
                children: Vec::new(),
            }),
            Event::End(_) => builder.close(),
            Event::Text(text) => {
                let raw = slice(line, &span);
                let kind = if raw == &*text {
                    TokenKind::Text
                } else {
                    TokenKind::Unsupported("escape")
                };
                builder.push(Spanned {
                    token: TokenRecord::leaf(kind, raw, String::from(&*text), 0),
                    span,
                });
            }
            Event::Code(code) => {
                let raw = slice(line, &span);
                let fence = raw.bytes().take_while(|&b| b == b'`').count();
                let content_offset = raw
                    .get(fence..)
                    .and_then(|rest| rest.find(&*code))
                    .map_or(fence, |at| fence + at);
                builder.push(Spanned {
                    token: TokenRecord::leaf(
                        TokenKind::CodeSpan,
                        raw,
                        String::from(&*code),
                        content_offset,
                    ),
                    span,
                });
            }
            other => {
                let raw = slice(line, &span);
                builder.push(Spanned {
                    token: TokenRecord::leaf(
                        TokenKind::Unsupported(leaf_name(&other)),
                        raw.clone(),
                        raw,
                        0,
                    ),
                    span,
                });
            }
        }
    }

    while !builder.open.is_empty() {
        builder.close();
    }

    fill_gaps(line, builder.root, Some(0..line.len()))
        .into_iter()
        .map(|spanned| spanned.token)
        .collect()
}

fn container_kind(tag: &Tag<'_>) -> TokenKind {
    match tag {
        Tag::Heading { level, .. } => TokenKind::Heading(*level as u8),
        Tag::List(None) => TokenKind::List,
        Tag::List(Some(_)) => TokenKind::Unsupported("ordered_list"),
        Tag::Item => TokenKind::ListItem,
        Tag::Emphasis => TokenKind::Em,
        Tag::Strong => TokenKind::Strong,
        Tag::BlockQuote(_) => TokenKind::Unsupported("blockquote"),
        Tag::CodeBlock(_) => TokenKind::Unsupported("code"),
        Tag::HtmlBlock => TokenKind::Unsupported("html"),
        Tag::Link { .. } => TokenKind::Unsupported("link"),
        Tag::Image { .. } => TokenKind::Unsupported("image"),
        _ => TokenKind::Unsupported("unknown"),
    }
}

fn leaf_name(event: &Event<'_>) -> &'static str {
    match event {
        Event::Html(_) | Event::InlineHtml(_) => "html",
        Event::Rule => "hr",
        Event::SoftBreak | Event::HardBreak => "break",
        Event::FootnoteReference(_) => "footnote",
        Event::TaskListMarker(_) => "task",
        _ => "unknown",
    }
}

fn slice(line: &str, span: &Range<usize>) -> String {
    line.get(span.clone()).unwrap_or_default().to_string()
}

/// A token together with its byte range in the line.
struct Spanned {
    token: TokenRecord,
    span: Range<usize>,
}

/// An open container; `kind == None` marks a transparent paragraph.
struct Frame {
    kind: Option<TokenKind>,
    span: Range<usize>,
    children: Vec<Spanned>,
}

impl Frame {
    fn finish(self, line: &str) -> Vec<Spanned> {
        let Some(kind) = self.kind else {
            return self.children;
        };

        let children = fill_gaps(line, self.children, None);
        let raw = slice(line, &self.span);
        let (content_offset, text) = match (children.first(), children.last()) {
            (Some(first), Some(last)) => (
                first.span.start.saturating_sub(self.span.start),
                slice(line, &(first.span.start..last.span.end)),
            ),
            _ => (raw.len(), String::new()),
        };

        let nested: Vec<TokenRecord> = children.into_iter().map(|c| c.token).collect();
        let (tokens, items) = if kind == TokenKind::List {
            (Vec::new(), nested)
        } else {
            (nested, Vec::new())
        };

        vec![Spanned {
            token: TokenRecord {
                kind,
                raw,
                text: Some(text),
                tokens,
                items,
                content_offset,
                begin: 0,
            },
            span: self.span,
        }]
    }
}

struct Builder<'a> {
    line: &'a str,
    root: Vec<Spanned>,
    open: Vec<Frame>,
}

impl Builder<'_> {
    fn push(&mut self, item: Spanned) {
        match self.open.last_mut() {
            Some(frame) => push_merging(&mut frame.children, item),
            None => push_merging(&mut self.root, item),
        }
    }

    fn close(&mut self) {
        if let Some(frame) = self.open.pop() {
            for item in frame.finish(self.line) {
                self.push(item);
            }
        }
    }
}

/// Appends `item`, folding it into a preceding adjacent text token.
fn push_merging(out: &mut Vec<Spanned>, item: Spanned) {
    if item.token.kind == TokenKind::Text
        && let Some(last) = out.last_mut()
        && last.token.kind == TokenKind::Text
        && last.span.end == item.span.start
    {
        last.token.raw.push_str(&item.token.raw);
        if let (Some(text), Some(more)) = (last.token.text.as_mut(), item.token.text.as_deref()) {
            text.push_str(more);
        }
        last.span.end = item.span.end;
        return;
    }
    out.push(item);
}

/// Covers bytes between children (and, with `outer`, before and after them)
/// with verbatim text tokens.
fn fill_gaps(line: &str, children: Vec<Spanned>, outer: Option<Range<usize>>) -> Vec<Spanned> {
    let mut cursor = match (&outer, children.first()) {
        (Some(outer), _) => outer.start,
        (None, Some(first)) => first.span.start,
        (None, None) => return children,
    };

    let mut out = Vec::with_capacity(children.len());
    for child in children {
        if child.span.start > cursor {
            push_merging(&mut out, gap(line, cursor..child.span.start));
        }
        cursor = cursor.max(child.span.end);
        push_merging(&mut out, child);
    }
    if let Some(outer) = outer
        && outer.end > cursor
    {
        push_merging(&mut out, gap(line, cursor..outer.end));
    }
    out
}

fn gap(line: &str, span: Range<usize>) -> Spanned {
    let raw = slice(line, &span);
    Spanned {
        token: TokenRecord::leaf(TokenKind::Text, raw.clone(), raw, 0),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn kinds(tokens: &[TokenRecord]) -> Vec<&'static str> {
        tokens.iter().map(|t| t.kind.name()).collect()
    }

    #[test]
    fn plain_line_is_one_text_token() {
        let tokens = tokenize("plain text");
        assert_eq!(kinds(&tokens), vec!["text"]);
        assert_eq!(tokens[0].raw, "plain text");
        assert_eq!(tokens[0].text.as_deref(), Some("plain text"));
    }

    #[test]
    fn code_span_between_text() {
        let tokens = tokenize("a `b` c");
        assert_eq!(kinds(&tokens), vec!["text", "codespan", "text"]);
        assert_eq!(tokens[1].raw, "`b`");
        assert_eq!(tokens[1].text.as_deref(), Some("b"));
        assert_eq!(tokens[1].content_offset, 1);
    }

    #[test]
    fn heading_records_level_and_prefix() {
        let tokens = tokenize("## sub");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Heading(2));
        assert_eq!(tokens[0].content_offset, 3);
        assert_eq!(kinds(&tokens[0].tokens), vec!["text"]);
    }

    #[test]
    fn list_children_live_in_items() {
        let tokens = tokenize("* **bold** item");
        assert_eq!(kinds(&tokens), vec!["list"]);
        let list = &tokens[0];
        assert!(list.tokens.is_empty());
        assert_eq!(kinds(&list.items), vec!["list_item"]);

        let item = &list.items[0];
        assert_eq!(item.content_offset, 2);
        assert_eq!(kinds(&item.tokens), vec!["strong", "text"]);
        assert_eq!(item.tokens[0].content_offset, 2);
        assert_eq!(item.tokens[1].raw, " item");
    }

    #[test]
    fn link_is_reported_as_unsupported() {
        let tokens = tokenize("see [docs](http://x)");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Unsupported("link")));
    }

    #[test]
    fn ordered_list_is_unsupported() {
        let tokens = tokenize("1. first");
        assert_eq!(tokens[0].kind, TokenKind::Unsupported("ordered_list"));
    }

    #[rstest]
    #[case("plain text")]
    #[case("  indented")]
    #[case("trailing  ")]
    #[case("a `b` c")]
    #[case("**bold** and *em*")]
    #[case("# heading text")]
    #[case("* item")]
    #[case("   ")]
    fn top_level_raws_tile_the_line(#[case] line: &str) {
        let joined: String = tokenize(line).iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn empty_line_has_no_tokens() {
        assert!(tokenize("").is_empty());
    }
}
