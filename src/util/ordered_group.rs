use hashbrown::HashMap;
use std::hash::Hash;

/// An insertion-order-preserving `key -> Vec<value>` mapping.
///
/// MDX set expressions are order-sensitive: hierarchies nest left-to-right in
/// the order they first appear on an axis. Grouping through an unordered hash
/// map would make the generated statement nondeterministic, so groups are kept
/// in a `Vec` in first-seen key order, with a side index for O(1) lookup.
#[derive(Debug)]
pub struct OrderedGroups<K, V> {
    index: HashMap<K, usize>,
    groups: Vec<(K, Vec<V>)>,
}

impl<K: Eq + Hash + Clone, V> OrderedGroups<K, V> {
    pub fn new() -> Self {
        Self { index: HashMap::new(), groups: Vec::new() }
    }

    /// Appends `value` to the group for `key`, creating the group at the end
    /// of the order if `key` has not been seen before.
    pub fn insert(&mut self, key: K, value: V) {
        let position = match self.index.get(&key) {
            Some(&position) => position,
            None => {
                let position = self.groups.len();
                self.index.insert(key.clone(), position);
                self.groups.push((key, Vec::new()));
                position
            }
        };
        self.groups[position].1.push(value);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Iterates over `(key, values)` groups in first-seen key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.groups.iter().map(|(key, values)| (key, values.as_slice()))
    }
}

impl<K: Eq + Hash + Clone, V> Default for OrderedGroups<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
