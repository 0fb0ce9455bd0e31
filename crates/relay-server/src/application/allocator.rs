//! Account ID allocation.

use std::sync::atomic::{AtomicU8, Ordering};

/// Hands out account IDs for newly created accounts.
///
/// IDs start at 1 (0 is the "unassigned" sentinel on the wire) and are unique
/// for the lifetime of the process: once all 255 are taken the allocator is
/// exhausted and stays exhausted, it never wraps back through 0 or reuses an
/// ID. The allocator is shared between all connection tasks; callers hold it
/// behind an `Arc` rather than reaching for process-wide state.
#[derive(Debug)]
pub struct AccountIdAllocator {
    // Next ID to hand out; 0 marks exhaustion.
    next: AtomicU8,
}

impl AccountIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU8::new(1),
        }
    }

    /// Returns the next free account ID, or `None` once the space is drained.
    pub fn allocate(&self) -> Option<u8> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next != 0).then_some(next.wrapping_add(1))
            })
            .ok()
    }
}

impl Default for AccountIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_id_is_one() {
        let alloc = AccountIdAllocator::new();
        assert_eq!(alloc.allocate(), Some(1));
        assert_eq!(alloc.allocate(), Some(2));
    }

    #[tokio::test]
    async fn test_concurrent_allocations_are_distinct_and_contiguous() {
        // Arrange
        let alloc = Arc::new(AccountIdAllocator::new());
        let mut handles = Vec::new();

        // Act: 50 tasks each take one ID
        for _ in 0..50 {
            let alloc = Arc::clone(&alloc);
            handles.push(tokio::spawn(async move { alloc.allocate() }));
        }
        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().expect("space not drained yet"));
        }

        // Assert: exactly 1..=50, no duplicates, no gaps
        ids.sort_unstable();
        assert_eq!(ids, (1..=50).collect::<Vec<u8>>());
    }

    #[test]
    fn test_drained_allocator_stays_exhausted_and_never_hands_out_zero() {
        // Arrange / Act: take every ID there is
        let alloc = AccountIdAllocator::new();
        let ids: Vec<u8> = std::iter::from_fn(|| alloc.allocate()).collect();

        // Assert: exactly 1..=255 in order, then None forever
        assert_eq!(ids, (1..=255).collect::<Vec<u8>>());
        assert!(!ids.contains(&0), "0 is the unassigned sentinel");
        assert_eq!(alloc.allocate(), None);
        assert_eq!(alloc.allocate(), None, "exhaustion is permanent");
    }
}
