use std::collections::{hash_map, HashMap};

use crate::algo::tabular::Hashable;

/// A table of estimated values where every absent key reads as `0.0`
///
/// Backs the state-action values of Q-learning, and the state values and
/// last-observed rewards of value iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueTable<K: Hashable> {
    values: HashMap<K, f32>,
}

impl<K: Hashable> Default for ValueTable<K> {
    fn default() -> Self {
        Self {
            values: HashMap::new(),
        }
    }
}

impl<K: Hashable> ValueTable<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the stored value, or `0.0` if the key has never been written
    pub fn get(&self, key: &K) -> f32 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// Overwrite the value for `key`
    ///
    /// **Returns** the previous value, or `0.0` if there was none
    pub fn set(&mut self, key: K, value: f32) -> f32 {
        self.values.insert(key, value).unwrap_or(0.0)
    }

    /// Number of keys that have been written
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the written entries in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &f32)> {
        self.values.iter()
    }
}

/// Occurrence counts of observed transitions, keyed by `(state, action)` and then by target state
///
/// Counts only ever grow. The empirical probability of reaching `s'` from `(s, a)` is
/// `count(s, a, s') / total(s, a)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable<S: Hashable, A: Hashable> {
    counts: HashMap<(S, A), HashMap<S, u32>>,
}

impl<S: Hashable, A: Hashable> Default for TransitionTable<S, A> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
        }
    }
}

impl<S: Hashable, A: Hashable> TransitionTable<S, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one occurrence of `state --action--> next_state`
    ///
    /// **Returns** the updated count for the triple
    pub fn record(&mut self, state: S, action: A, next_state: S) -> u32 {
        let count = self
            .counts
            .entry((state, action))
            .or_default()
            .entry(next_state)
            .or_insert(0);
        *count += 1;
        *count
    }

    /// Number of times `next_state` followed `(state, action)`
    pub fn count(&self, state: S, action: A, next_state: S) -> u32 {
        self.counts
            .get(&(state, action))
            .and_then(|targets| targets.get(&next_state))
            .copied()
            .unwrap_or(0)
    }

    /// Number of times `action` was executed in `state`
    pub fn total(&self, state: S, action: A) -> u32 {
        self.targets(state, action).map(|(_, count)| count).sum()
    }

    /// Iterate over the observed target states of `(state, action)` with their counts
    pub fn targets(&self, state: S, action: A) -> Targets<'_, S> {
        Targets {
            inner: self.counts.get(&(state, action)).map(|t| t.iter()),
        }
    }

    /// Empirical transition probabilities for `(state, action)`
    ///
    /// Empty if the pair has never been executed.
    pub fn probabilities(&self, state: S, action: A) -> Vec<(S, f32)> {
        let total = self.total(state, action) as f32;
        self.targets(state, action)
            .map(|(next_state, count)| (next_state, count as f32 / total))
            .collect()
    }

    /// Number of distinct `(state, action)` pairs observed
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Iterator over `(target_state, count)` pairs returned by [`TransitionTable::targets`]
pub struct Targets<'a, S> {
    inner: Option<hash_map::Iter<'a, S, u32>>,
}

impl<'a, S: Copy> Iterator for Targets<'a, S> {
    type Item = (S, u32);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .as_mut()
            .and_then(|it| it.next())
            .map(|(&s, &c)| (s, c))
    }
}
