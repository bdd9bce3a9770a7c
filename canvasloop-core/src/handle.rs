use std::collections::BTreeMap;

/// Opaque handle store mapping monotonically increasing ids to values.
///
/// Ids start at 1 and are never reused within a store, so iteration order
/// is insertion order.
pub struct HandleStore<T> {
    items: BTreeMap<u64, T>,
    next: u64,
}

impl<T> HandleStore<T> {
    pub fn new() -> Self {
        Self {
            items: BTreeMap::new(),
            next: 1,
        }
    }

    /// Insert an item and return its handle.
    pub fn insert(&mut self, item: T) -> u64 {
        let handle = self.next;
        self.next += 1;
        self.items.insert(handle, item);
        handle
    }

    /// Remove and return the item.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        self.items.remove(&handle)
    }

    /// Find the first handle whose item matches `pred`.
    pub fn find(&self, mut pred: impl FnMut(&T) -> bool) -> Option<u64> {
        self.items
            .iter()
            .find(|(_, item)| pred(item))
            .map(|(handle, _)| *handle)
    }

    /// Iterate over all items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&u64, &T)> {
        self.items.iter()
    }

    /// Remove every item, returning them in insertion order.
    pub fn drain(&mut self) -> Vec<(u64, T)> {
        std::mem::take(&mut self.items).into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Default for HandleStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_start_at_one_and_increase() {
        let mut store = HandleStore::new();
        assert_eq!(store.insert("a"), 1);
        assert_eq!(store.insert("b"), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_handles_not_reused_after_remove() {
        let mut store = HandleStore::new();
        let first = store.insert(10);
        assert_eq!(store.remove(first), Some(10));
        let second = store.insert(20);
        assert_ne!(first, second);
        assert_eq!(store.remove(first), None);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_drain_preserves_insertion_order() {
        let mut store = HandleStore::new();
        store.insert('x');
        store.insert('y');
        store.insert('z');
        let drained: Vec<char> = store.drain().into_iter().map(|(_, c)| c).collect();
        assert_eq!(drained, vec!['x', 'y', 'z']);
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_predicate() {
        let mut store = HandleStore::new();
        store.insert(3);
        let h = store.insert(7);
        assert_eq!(store.find(|v| *v == 7), Some(h));
        assert_eq!(store.find(|v| *v == 9), None);
    }
}
