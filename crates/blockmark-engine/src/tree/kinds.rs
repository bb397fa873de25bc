//! # Node Kinds
//!
//! The node types an editable tree is made of, and the markdown syntax each
//! one owns. Delimiter constants live here, not in serialization code: the
//! serializer asks a kind for its delimiters and never hardcodes `**` or
//! `` ` ``.

use std::fmt;

use crate::parsing::TokenKind;

use super::TreeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Root,
    Text,
    CodeSpan,
    /// ATX heading with its level (1-6).
    Heading(u8),
    List,
    ListItem,
    Strong,
    Em,
}

impl NodeKind {
    /// Leaves hold editable text; everything else derives from its children.
    pub fn is_leaf(self) -> bool {
        matches!(self, NodeKind::Text | NodeKind::CodeSpan)
    }

    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Text => "text",
            NodeKind::CodeSpan => "codespan",
            NodeKind::Heading(_) => "heading",
            NodeKind::List => "list",
            NodeKind::ListItem => "list_item",
            NodeKind::Strong => "strong",
            NodeKind::Em => "em",
        }
    }

    /// Opening and closing syntax wrapped around non-empty `inner` text.
    ///
    /// Empty content gets no delimiters at all, so a line holding only a
    /// marker (`"#"`, `"* "`) serializes to `""` and is emptied on commit.
    pub fn delimiters(self, inner: &str) -> (String, String) {
        match self {
            NodeKind::Root | NodeKind::Text | NodeKind::List => (String::new(), String::new()),
            NodeKind::CodeSpan => CodeSpan::delimiters(inner),
            NodeKind::Heading(level) => (Heading::prefix(level), String::new()),
            NodeKind::ListItem => (ListItem::BULLET.to_string(), String::new()),
            NodeKind::Strong => (Strong::DELIM.to_string(), Strong::DELIM.to_string()),
            NodeKind::Em => (Em::DELIM.to_string(), Em::DELIM.to_string()),
        }
    }
}

impl TryFrom<TokenKind> for NodeKind {
    type Error = TreeError;

    fn try_from(kind: TokenKind) -> Result<Self, Self::Error> {
        Ok(match kind {
            TokenKind::Text => NodeKind::Text,
            TokenKind::CodeSpan => NodeKind::CodeSpan,
            TokenKind::Heading(level) => NodeKind::Heading(level),
            TokenKind::List => NodeKind::List,
            TokenKind::ListItem => NodeKind::ListItem,
            TokenKind::Strong => NodeKind::Strong,
            TokenKind::Em => NodeKind::Em,
            TokenKind::Unsupported(kind) => return Err(TreeError::Unsupported { kind }),
        })
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Heading(level) => write!(f, "heading({level})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Code span syntax: a backtick fence around raw text.
pub struct CodeSpan;

impl CodeSpan {
    pub const TICK: char = '`';

    /// Fence and padding that reproduce `text` exactly when parsed back.
    ///
    /// The fence is one longer than the longest backtick run inside `text`.
    /// A space is padded on both sides when `text` starts or ends with a
    /// backtick, or is itself space-padded (a parser strips one such space).
    pub fn delimiters(text: &str) -> (String, String) {
        let mut longest = 0;
        let mut run = 0;
        for c in text.chars() {
            if c == Self::TICK {
                run += 1;
                longest = longest.max(run);
            } else {
                run = 0;
            }
        }
        let fence = Self::TICK.to_string().repeat(longest + 1);

        let space_padded =
            text.starts_with(' ') && text.ends_with(' ') && text.chars().any(|c| c != ' ');
        let pad = text.starts_with(Self::TICK) || text.ends_with(Self::TICK) || space_padded;
        if pad {
            (format!("{fence} "), format!(" {fence}"))
        } else {
            (fence.clone(), fence)
        }
    }
}

/// ATX heading syntax.
pub struct Heading;

impl Heading {
    pub const MARKER: char = '#';

    fn prefix(level: u8) -> String {
        let mut prefix = Self::MARKER.to_string().repeat(usize::from(level.clamp(1, 6)));
        prefix.push(' ');
        prefix
    }
}

/// Bullet list item syntax.
pub struct ListItem;

impl ListItem {
    pub const BULLET: &'static str = "* ";
}

pub struct Strong;

impl Strong {
    pub const DELIM: &'static str = "**";
}

pub struct Em;

impl Em {
    pub const DELIM: &'static str = "*";
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn wrap(kind: NodeKind, inner: &str) -> String {
        let (open, close) = kind.delimiters(inner);
        format!("{open}{inner}{close}")
    }

    #[test]
    fn wrapping_rules() {
        assert_eq!(wrap(NodeKind::CodeSpan, "code"), "`code`");
        assert_eq!(wrap(NodeKind::Heading(1), "title"), "# title");
        assert_eq!(wrap(NodeKind::Heading(3), "title"), "### title");
        assert_eq!(wrap(NodeKind::ListItem, "item"), "* item");
        assert_eq!(wrap(NodeKind::Strong, "bold"), "**bold**");
        assert_eq!(wrap(NodeKind::Em, "em"), "*em*");
        assert_eq!(wrap(NodeKind::List, "* item"), "* item");
        assert_eq!(wrap(NodeKind::Root, "x"), "x");
    }

    #[test]
    fn code_fence_outgrows_inner_backticks() {
        assert_eq!(wrap(NodeKind::CodeSpan, "a`b"), "``a`b``");
        assert_eq!(wrap(NodeKind::CodeSpan, "a``b`c"), "```a``b`c```");
    }

    #[test]
    fn code_fence_pads_edge_backticks_and_spaces() {
        assert_eq!(wrap(NodeKind::CodeSpan, "`x"), "`` `x ``");
        assert_eq!(wrap(NodeKind::CodeSpan, " x "), "`  x  `");
        assert_eq!(wrap(NodeKind::CodeSpan, "  "), "`  `");
    }

    #[test]
    fn unsupported_token_kinds_are_rejected() {
        assert_eq!(
            NodeKind::try_from(TokenKind::Unsupported("link")),
            Err(TreeError::Unsupported { kind: "link" })
        );
        assert_eq!(
            NodeKind::try_from(TokenKind::Heading(2)),
            Ok(NodeKind::Heading(2))
        );
    }

    #[test]
    fn display_includes_heading_level() {
        assert_eq!(NodeKind::Heading(2).to_string(), "heading(2)");
        assert_eq!(NodeKind::ListItem.to_string(), "list_item");
    }
}
