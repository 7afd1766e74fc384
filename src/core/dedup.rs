//! Weak-keyed last-value cache.
//!
//! Entries are keyed by the identity of a live target (`Rc` pointer) and hold
//! only a [`Weak`] reference to it, so the cache never keeps a target alive.
//! Entries whose target has been dropped are treated as absent and pruned.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

struct Entry<T, V> {
    target: Weak<T>,
    value: V,
}

/// Remembers the last value emitted for each target.
pub struct DedupCache<T, V> {
    entries: RefCell<HashMap<usize, Entry<T, V>>>,
}

impl<T, V> Default for DedupCache<T, V> {
    fn default() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<T, V: PartialEq + Clone> DedupCache<T, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `target` if it differs from the stored one.
    ///
    /// Returns `true` when the value is new (no live entry, or a different
    /// value), meaning the caller should emit it.
    pub fn update(&self, target: &Rc<T>, value: &V) -> bool {
        let key = identity(target);
        let mut entries = self.entries.borrow_mut();

        if let Some(entry) = entries.get(&key) {
            let same_target = entry
                .target
                .upgrade()
                .is_some_and(|live| Rc::ptr_eq(&live, target));
            if same_target && entry.value == *value {
                return false;
            }
        } else {
            // New key; a cheap moment to drop entries for dead targets.
            entries.retain(|_, entry| entry.target.strong_count() > 0);
        }

        entries.insert(
            key,
            Entry {
                target: Rc::downgrade(target),
                value: value.clone(),
            },
        );
        true
    }

    /// The last stored value for a live target.
    pub fn get(&self, target: &Rc<T>) -> Option<V> {
        let entries = self.entries.borrow();
        let entry = entries.get(&identity(target))?;
        let live = entry.target.upgrade()?;
        Rc::ptr_eq(&live, target).then(|| entry.value.clone())
    }

    /// Forget a target explicitly.
    pub fn remove(&self, target: &Rc<T>) {
        self.entries.borrow_mut().remove(&identity(target));
    }

    /// Number of entries whose target is still alive.
    pub fn len(&self) -> usize {
        self.entries
            .borrow()
            .values()
            .filter(|entry| entry.target.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

fn identity<T>(target: &Rc<T>) -> usize {
    Rc::as_ptr(target) as *const () as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Target;

    #[test]
    fn test_suppresses_repeated_value() {
        let cache = DedupCache::new();
        let target = Rc::new(Target);

        assert!(cache.update(&target, &"a".to_string()));
        assert!(!cache.update(&target, &"a".to_string()));
        assert!(cache.update(&target, &"b".to_string()));
        assert_eq!(cache.get(&target), Some("b".to_string()));
    }

    #[test]
    fn test_targets_are_independent() {
        let cache = DedupCache::new();
        let first = Rc::new(Target);
        let second = Rc::new(Target);

        assert!(cache.update(&first, &1));
        assert!(cache.update(&second, &1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_entries_do_not_keep_targets_alive() {
        let cache = DedupCache::new();
        let target = Rc::new(Target);
        cache.update(&target, &1);

        let weak = Rc::downgrade(&target);
        drop(target);

        assert!(weak.upgrade().is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_forgets_value() {
        let cache = DedupCache::new();
        let target = Rc::new(Target);

        cache.update(&target, &1);
        cache.remove(&target);
        assert!(cache.update(&target, &1));
    }
}
