/// A char-at-a-time cursor over a string slice with position tracking.
///
/// Operates over a slice while reporting absolute byte positions in the
/// string it was cut from (via the `base` offset). Positions always land on
/// char boundaries because the cursor only ever steps by whole chars.
#[derive(Clone)]
pub struct Cursor<'a> {
    s: &'a str,
    /// Offset of `s` inside the enclosing string.
    base: usize,
    /// Local byte index into `s`.
    i: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a new cursor at the start of `s` with the given base offset.
    pub fn new(s: &'a str, base: usize) -> Self {
        Self { s, base, i: 0 }
    }

    /// Returns the current absolute byte position (base + local index).
    pub fn pos(&self) -> usize {
        self.base + self.i
    }

    /// Peeks at the current char without advancing.
    pub fn peek(&self) -> Option<char> {
        self.s.get(self.i..)?.chars().next()
    }

    /// Advances by one char, returning the consumed char.
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += c.len_utf8();
        Some(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cur = Cursor::new("hello", 10);
        assert_eq!(cur.pos(), 10);
        assert_eq!(cur.peek(), Some('h'));
        assert_eq!(cur.bump(), Some('h'));
        assert_eq!(cur.pos(), 11);
    }

    #[test]
    fn empty_string_input() {
        let cur = Cursor::new("", 0);
        assert_eq!(cur.peek(), None);
        assert_eq!(cur.pos(), 0);
    }

    #[test]
    fn multibyte_chars_advance_by_their_width() {
        let mut cur = Cursor::new("é`ü", 3);
        assert_eq!(cur.bump(), Some('é'));
        assert_eq!(cur.pos(), 5);
        assert_eq!(cur.bump(), Some('`'));
        assert_eq!(cur.bump(), Some('ü'));
        assert_eq!(cur.pos(), 3 + "é`ü".len());
        assert_eq!(cur.peek(), None);
    }

    #[test]
    fn bump_at_eof_returns_none() {
        let mut cur = Cursor::new("x", 0);
        assert_eq!(cur.bump(), Some('x'));
        assert_eq!(cur.bump(), None);
        assert_eq!(cur.bump(), None); // idempotent
        assert_eq!(cur.pos(), 1);
    }
}
