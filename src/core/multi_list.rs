//! Intrusive Multi-List
//!
//! An object can participate in several independent doubly-linked lists at
//! once by embedding a [`MultiListLinks`] with one `prev`/`next` pair per list
//! *slot*. The links are handles (e.g. [`SlabPtr`](super::storage::SlabPtr)),
//! so the lists never own their items and never allocate.
//!
//! The list operations are provided by [`MultiListPtr`], which is implemented
//! by the handle type for a given storage. The head of a list is kept by the
//! owner of the list as a [`PackedOption`] and passed in when it may change.

use core::marker::PhantomData;

use crate::core::utils::{PackedOption, Reserved};

/// The embedded links of an item, one `prev`/`next` pair per list slot.
///
/// # Type Parameters
///
/// - `P`: The pointer type of the items.
/// - `SLOTS`: The number of independent lists.
#[derive(Clone, Copy)]
pub struct MultiListLinks<P: Reserved + Copy, const SLOTS: usize> {
    prev: [PackedOption<P>; SLOTS],
    next: [PackedOption<P>; SLOTS],
}

impl<P: Reserved + Copy, const SLOTS: usize> Default for MultiListLinks<P, SLOTS> {
    fn default() -> Self {
        Self {
            prev: core::array::from_fn(|_| PackedOption::none()),
            next: core::array::from_fn(|_| PackedOption::none()),
        }
    }
}

impl<P: Reserved + Copy, const SLOTS: usize> MultiListLinks<P, SLOTS> {
    /// The previous item in the list of `slot`.
    pub fn prev(&self, slot: usize) -> Option<P> { self.prev[slot].unpack() }

    /// The next item in the list of `slot`.
    pub fn next(&self, slot: usize) -> Option<P> { self.next[slot].unpack() }

    pub(crate) fn set_prev(&mut self, slot: usize, prev: Option<P>) {
        self.prev[slot] = prev.into();
    }

    pub(crate) fn set_next(&mut self, slot: usize, next: Option<P>) {
        self.next[slot] = next.into();
    }
}

/// A pointer to an item linked through [`MultiListLinks`].
///
/// # Type Parameters
///
/// - `S`: The storage the pointer is resolved against.
/// - `SLOTS`: The number of list slots of the item.
pub trait MultiListPtr<S: ?Sized, const SLOTS: usize>: Copy + Eq + Reserved {
    /// Get the links of the item.
    fn links(self, storage: &S) -> &MultiListLinks<Self, SLOTS>;

    /// Get the links of the item mutably.
    fn links_mut(self, storage: &mut S) -> &mut MultiListLinks<Self, SLOTS>;

    /// The next item in the list of `slot`.
    fn next(self, storage: &S, slot: usize) -> Option<Self> { self.links(storage).next(slot) }

    /// The previous item in the list of `slot`.
    fn prev(self, storage: &S, slot: usize) -> Option<Self> { self.links(storage).prev(slot) }

    /// Check if the item has a neighbour in the list of `slot`.
    ///
    /// A single-item list is indistinguishable from an unlinked item, the
    /// owner of the head knows the difference.
    fn has_neighbours(self, storage: &S, slot: usize) -> bool {
        self.next(storage, slot).is_some() || self.prev(storage, slot).is_some()
    }

    /// Insert the item in front of `peer` in the list of `slot`.
    ///
    /// The item must not be linked in that list.
    fn attach(self, storage: &mut S, slot: usize, peer: Self) {
        debug_assert!(self != peer, "attaching an item in front of itself");
        debug_assert!(!self.has_neighbours(storage, slot));

        let prev = peer.prev(storage, slot);
        let links = self.links_mut(storage);
        links.set_prev(slot, prev);
        links.set_next(slot, Some(peer));
        peer.links_mut(storage).set_prev(slot, Some(self));
        if let Some(prev) = prev {
            prev.links_mut(storage).set_next(slot, Some(self));
        }
    }

    /// Unlink the item from the list of `slot`.
    ///
    /// This is a no-op if the item is not linked.
    fn detach(self, storage: &mut S, slot: usize) {
        let prev = self.prev(storage, slot);
        let next = self.next(storage, slot);
        if let Some(prev) = prev {
            prev.links_mut(storage).set_next(slot, next);
        }
        if let Some(next) = next {
            next.links_mut(storage).set_prev(slot, prev);
        }
        let links = self.links_mut(storage);
        links.set_prev(slot, None);
        links.set_next(slot, None);
    }

    /// Unlink the item from all lists.
    fn detach_all(self, storage: &mut S) {
        for slot in 0..SLOTS {
            self.detach(storage, slot);
        }
    }

    /// Make the item the new head of the list of `slot`.
    fn push_front(self, storage: &mut S, slot: usize, head: &mut PackedOption<Self>) {
        if let Some(old) = head.unpack() {
            self.attach(storage, slot, old);
        }
        *head = PackedOption::some(self);
    }

    /// Unlink the item from the list of `slot`, advancing `head` if the item
    /// is the head.
    fn unlink(self, storage: &mut S, slot: usize, head: &mut PackedOption<Self>) {
        if head.unpack() == Some(self) {
            *head = self.next(storage, slot).into();
        }
        self.detach(storage, slot);
    }

    /// Iterate over the list of `slot`, starting from the item.
    fn iter(self, storage: &S, slot: usize) -> MultiListIter<'_, S, Self, SLOTS> {
        MultiListIter {
            storage,
            slot,
            curr: Some(self),
            _phantom: PhantomData,
        }
    }
}

/// An iterator walking a list forward.
pub struct MultiListIter<'a, S: ?Sized, P, const SLOTS: usize> {
    storage: &'a S,
    slot: usize,
    curr: Option<P>,
    _phantom: PhantomData<[P; SLOTS]>,
}

impl<'a, S, P, const SLOTS: usize> Iterator for MultiListIter<'a, S, P, SLOTS>
where
    S: ?Sized,
    P: MultiListPtr<S, SLOTS>,
{
    type Item = P;

    fn next(&mut self) -> Option<P> {
        let curr = self.curr?;
        self.curr = curr.next(self.storage, self.slot);
        Some(curr)
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct ItemPtr(usize);

    impl Reserved for ItemPtr {
        fn reserved() -> Self { Self(usize::MAX) }

        fn is_reserved(&self) -> bool { self.0 == usize::MAX }
    }

    #[derive(Default)]
    struct Item {
        links: MultiListLinks<ItemPtr, 2>,
    }

    impl MultiListPtr<Vec<Item>, 2> for ItemPtr {
        fn links(self, storage: &Vec<Item>) -> &MultiListLinks<Self, 2> { &storage[self.0].links }

        fn links_mut(self, storage: &mut Vec<Item>) -> &mut MultiListLinks<Self, 2> {
            &mut storage[self.0].links
        }
    }

    fn items(n: usize) -> Vec<Item> { (0..n).map(|_| Item::default()).collect() }

    fn collect(head: PackedOption<ItemPtr>, storage: &Vec<Item>, slot: usize) -> Vec<usize> {
        match head.unpack() {
            Some(head) => head.iter(storage, slot).map(|p| p.0).collect(),
            None => Vec::new(),
        }
    }

    #[test]
    fn test_push_front() {
        let mut storage = items(3);
        let mut head = PackedOption::none();
        for i in 0..3 {
            ItemPtr(i).push_front(&mut storage, 0, &mut head);
        }
        assert_eq!(collect(head, &storage, 0), vec![2, 1, 0]);
        assert_eq!(ItemPtr(0).prev(&storage, 0), Some(ItemPtr(1)));
        assert_eq!(ItemPtr(2).prev(&storage, 0), None);
        // the other slot is untouched
        assert!(!ItemPtr(1).has_neighbours(&storage, 1));
    }

    #[test]
    fn test_attach_middle() {
        let mut storage = items(3);
        let mut head = PackedOption::none();
        ItemPtr(0).push_front(&mut storage, 0, &mut head);
        ItemPtr(1).push_front(&mut storage, 0, &mut head);
        ItemPtr(2).attach(&mut storage, 0, ItemPtr(0));
        assert_eq!(collect(head, &storage, 0), vec![1, 2, 0]);
        assert_eq!(ItemPtr(0).prev(&storage, 0), Some(ItemPtr(2)));
        assert_eq!(ItemPtr(2).prev(&storage, 0), Some(ItemPtr(1)));
    }

    #[test]
    fn test_independent_slots() {
        let mut storage = items(4);
        let mut evens = PackedOption::none();
        let mut all = PackedOption::none();
        for i in 0..4 {
            ItemPtr(i).push_front(&mut storage, 1, &mut all);
            if i % 2 == 0 {
                ItemPtr(i).push_front(&mut storage, 0, &mut evens);
            }
        }
        assert_eq!(collect(evens, &storage, 0), vec![2, 0]);
        assert_eq!(collect(all, &storage, 1), vec![3, 2, 1, 0]);

        ItemPtr(2).unlink(&mut storage, 0, &mut evens);
        assert_eq!(collect(evens, &storage, 0), vec![0]);
        assert_eq!(collect(all, &storage, 1), vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_unlink() {
        let mut storage = items(3);
        let mut head = PackedOption::none();
        for i in 0..3 {
            ItemPtr(i).push_front(&mut storage, 0, &mut head);
        }
        ItemPtr(1).unlink(&mut storage, 0, &mut head);
        assert_eq!(collect(head, &storage, 0), vec![2, 0]);
        ItemPtr(2).unlink(&mut storage, 0, &mut head);
        assert_eq!(collect(head, &storage, 0), vec![0]);
        ItemPtr(0).unlink(&mut storage, 0, &mut head);
        assert!(head.is_none());
        // unlinking an unlinked item is a no-op
        ItemPtr(0).detach(&mut storage, 0);
        assert!(!ItemPtr(0).has_neighbours(&storage, 0));
    }

    #[test]
    fn test_detach_all() {
        let mut storage = items(3);
        let mut a = PackedOption::none();
        let mut b = PackedOption::none();
        for i in 0..3 {
            ItemPtr(i).push_front(&mut storage, 0, &mut a);
            ItemPtr(i).push_front(&mut storage, 1, &mut b);
        }
        ItemPtr(1).detach_all(&mut storage);
        assert_eq!(collect(a, &storage, 0), vec![2, 0]);
        assert_eq!(collect(b, &storage, 1), vec![2, 0]);
        assert!(!ItemPtr(1).has_neighbours(&storage, 0));
        assert!(!ItemPtr(1).has_neighbours(&storage, 1));
    }
}
