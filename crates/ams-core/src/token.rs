//! 16-bit identity allocation with wraparound.

use crate::record::LAUNCHER_TOKEN;

/// Highest counter value before the allocator wraps back to `1`.
///
/// Wrapping just before `u16::MAX` keeps the increment from overflowing and
/// the reserved launcher token from ever being revisited.
const TOKEN_WRAP_LIMIT: u16 = u16::MAX - 1;

/// Monotonically increasing token counter.
///
/// Tokens identify non-launcher ability instances; `0` is reserved. There is
/// no reuse tracking beyond the wrap: the caller supplies a liveness
/// predicate and a lookup miss means the token is free, which is acceptable
/// because the working set is one application at a time.
#[derive(Debug)]
pub struct TokenAllocator {
    next: u16,
}

impl Default for TokenAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenAllocator {
    /// Creates an allocator whose first token is `1`.
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocates the next token not reported live by `in_use`.
    pub fn allocate(&mut self, mut in_use: impl FnMut(u16) -> bool) -> u16 {
        loop {
            let candidate = self.next;
            self.next = if self.next >= TOKEN_WRAP_LIMIT {
                1
            } else {
                self.next + 1
            };
            if candidate != LAUNCHER_TOKEN && !in_use(candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_tokens_are_sequential() {
        let mut alloc = TokenAllocator::new();
        assert_eq!(alloc.allocate(|_| false), 1);
        assert_eq!(alloc.allocate(|_| false), 2);
        assert_eq!(alloc.allocate(|_| false), 3);
    }

    #[test]
    fn test_wraparound_skips_zero() {
        let mut alloc = TokenAllocator { next: TOKEN_WRAP_LIMIT - 1 };
        assert_eq!(alloc.allocate(|_| false), TOKEN_WRAP_LIMIT - 1);
        assert_eq!(alloc.allocate(|_| false), TOKEN_WRAP_LIMIT);
        // Wrapped: back to 1, never 0.
        assert_eq!(alloc.allocate(|_| false), 1);
    }

    #[test]
    fn test_live_tokens_are_skipped() {
        let mut alloc = TokenAllocator::new();
        let live: HashSet<u16> = [1, 2, 3].into();
        assert_eq!(alloc.allocate(|t| live.contains(&t)), 4);
    }

    proptest! {
        /// Allocation never returns the launcher token or a live one.
        #[test]
        fn prop_allocation_avoids_live_set(start in 1u16..TOKEN_WRAP_LIMIT, live in proptest::collection::hash_set(1u16..=u16::MAX, 0..8)) {
            let mut alloc = TokenAllocator { next: start };
            let token = alloc.allocate(|t| live.contains(&t));
            prop_assert_ne!(token, LAUNCHER_TOKEN);
            prop_assert!(!live.contains(&token));
        }
    }
}
