use std::fmt;

/// Unique identifier for a block within one [`IdAllocator`]'s lifetime.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct BlockId(pub u64);

impl BlockId {
    /// Placeholder never returned by an allocator.
    pub(crate) const UNSET: BlockId = BlockId(0);
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "block {}", self.0)
    }
}

/// Hands out monotonically increasing block ids, starting at 1.
///
/// One allocator per document; lists built from different allocators can
/// reuse the same numbers.
#[derive(Debug, Default)]
pub struct IdAllocator {
    last: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> BlockId {
        self.last += 1;
        BlockId(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase_from_one() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), BlockId(1));
        assert_eq!(ids.next_id(), BlockId(2));
        assert!(ids.next_id() > BlockId(2));
    }

    #[test]
    fn allocators_do_not_share_state() {
        let mut first = IdAllocator::new();
        let mut second = IdAllocator::new();
        first.next_id();
        first.next_id();
        assert_eq!(second.next_id(), BlockId(1));
        assert_eq!(first.next_id().to_string(), "block 3");
    }
}
