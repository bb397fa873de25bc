//! # Offset Mapping
//!
//! A leaf shows *rendered* text (syntax stripped) while the block stores
//! *raw* markdown. Each leaf records `begin`, the raw offset where its
//! rendered text starts; from there the two spaces are correlated by
//! walking both strings and skipping raw chars that have no rendered
//! counterpart (backticks, asterisks, heading hashes).
//!
//! ## Functions
//!
//! - **`annotate`**: assigns `begin` to every token of a tokenized line
//! - **`map_offset`**: rendered offset -> raw offset
//! - **`unmap_offset`**: raw offset -> rendered offset
//!
//! All offsets are byte offsets on char boundaries. Walks are bounded by the
//! raw string length; a miss is reported as [`MappingError`], never looped on.

use super::{cursor::Cursor, tokenizer::TokenRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("begin offset {begin} is outside the raw source (len {len})")]
    BeginOutOfRange { begin: usize, len: usize },
    #[error("rendered offset {offset} is outside the rendered text (len {len})")]
    OffsetOutOfRange { offset: usize, len: usize },
    #[error("raw source exhausted before rendered offset {offset} (begin {begin})")]
    Exhausted { begin: usize, offset: usize },
    #[error("no leaf to map from")]
    NoSuchLeaf,
}

/// Assigns `begin` to `tokens` and all their descendants.
///
/// Each token starts at the running sum of the raw lengths of its preceding
/// siblings. Its `begin` is that start plus its opening-marker length, which
/// is also where its children start.
pub fn annotate(tokens: &mut [TokenRecord], base: usize) {
    let mut offset = 0;
    for token in tokens {
        token.begin = base + offset + token.content_offset;
        annotate(&mut token.tokens, token.begin);
        annotate(&mut token.items, token.begin);
        offset += token.raw.len();
    }
}

/// Maps an offset in `rendered` to the corresponding offset in `raw`.
///
/// `rendered` must appear as a subsequence of `raw` starting at `begin`.
pub fn map_offset(
    raw: &str,
    begin: usize,
    rendered: &str,
    rendered_offset: usize,
) -> Result<usize, MappingError> {
    let tail = raw.get(begin..).ok_or(MappingError::BeginOutOfRange {
        begin,
        len: raw.len(),
    })?;
    let wanted = rendered
        .get(..rendered_offset)
        .ok_or(MappingError::OffsetOutOfRange {
            offset: rendered_offset,
            len: rendered.len(),
        })?;

    let mut raw_cur = Cursor::new(tail, begin);
    let mut rendered_cur = Cursor::new(wanted, 0);
    while let Some(want) = rendered_cur.peek() {
        match raw_cur.bump() {
            Some(got) if got == want => {
                rendered_cur.bump();
            }
            Some(_) => {}
            None => {
                return Err(MappingError::Exhausted {
                    begin,
                    offset: rendered_offset,
                });
            }
        }
    }
    Ok(raw_cur.pos())
}

/// Maps an offset in `raw` back into `rendered`.
///
/// Returns `None` when `raw_offset` lies before `begin` or past the raw end
/// of the rendered text.
pub fn unmap_offset(raw: &str, begin: usize, rendered: &str, raw_offset: usize) -> Option<usize> {
    if raw_offset < begin {
        return None;
    }
    let mut raw_cur = Cursor::new(raw.get(begin..)?, begin);
    let mut rendered_cur = Cursor::new(rendered, 0);
    loop {
        if raw_cur.pos() >= raw_offset {
            return (raw_cur.pos() == raw_offset).then_some(rendered_cur.pos());
        }
        let want = rendered_cur.peek()?;
        if raw_cur.bump()? == want {
            rendered_cur.bump();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::tokenize;
    use pretty_assertions::assert_eq;

    fn annotated(line: &str) -> Vec<TokenRecord> {
        let mut tokens = tokenize(line);
        annotate(&mut tokens, 0);
        tokens
    }

    #[test]
    fn code_span_content_maps_past_its_char() {
        let raw = "a `b` c";
        assert_eq!(map_offset(raw, 3, "b", 1), Ok(4));
        assert_eq!(map_offset(raw, 3, "b", 0), Ok(3));
    }

    #[test]
    fn syntax_markers_are_skipped() {
        // leaf "bold" anchored at the opening delimiter rather than the content
        assert_eq!(map_offset("**bold**", 0, "bold", 2), Ok(4));
    }

    #[test]
    fn exhausted_source_is_reported() {
        assert_eq!(
            map_offset("abc", 0, "xyz", 2),
            Err(MappingError::Exhausted { begin: 0, offset: 2 })
        );
    }

    #[test]
    fn out_of_range_inputs_are_reported() {
        assert_eq!(
            map_offset("abc", 7, "a", 0),
            Err(MappingError::BeginOutOfRange { begin: 7, len: 3 })
        );
        assert_eq!(
            map_offset("abc", 0, "a", 4),
            Err(MappingError::OffsetOutOfRange { offset: 4, len: 1 })
        );
        // inside a multibyte char
        assert!(map_offset("é", 0, "é", 1).is_err());
    }

    #[test]
    fn unmap_inverts_map() {
        let raw = "x **bold** y";
        for offset in 0..=4 {
            let at = map_offset(raw, 4, "bold", offset).unwrap();
            assert_eq!(unmap_offset(raw, 4, "bold", at), Some(offset));
        }
        assert_eq!(unmap_offset(raw, 4, "bold", 3), None);
        assert_eq!(unmap_offset(raw, 4, "bold", 9), None);
    }

    #[test]
    fn heading_content_begins_after_hashes() {
        let tokens = annotated("# heading text");
        assert_eq!(tokens[0].begin, 2);
        assert_eq!(tokens[0].tokens[0].begin, 2);
    }

    #[test]
    fn strong_skips_only_the_opening_delimiter() {
        let tokens = annotated("x **bold** y");
        assert_eq!(tokens[1].begin, 4);
        assert_eq!(tokens[1].tokens[0].begin, 4);
        assert_eq!(tokens[2].begin, 10);
    }

    #[test]
    fn nested_list_content_offsets() {
        let tokens = annotated("* **bold** *em*");
        let item = &tokens[0].items[0];
        assert_eq!(item.begin, 2);
        assert_eq!(item.tokens[0].tokens[0].begin, 4); // "bold"
        assert_eq!(item.tokens[1].begin, 10); // " "
        assert_eq!(item.tokens[2].tokens[0].begin, 12); // "em"
    }

    #[test]
    fn code_span_leaf_begins_inside_fence() {
        let tokens = annotated("a `b` c");
        assert_eq!(tokens[1].begin, 3);
        assert_eq!(tokens[2].begin, 5);
    }
}
