pub mod q_learning;
pub mod value_iteration;

/// A trait for state and action types that can be used as keys in a [`HashMap`](std::collections::HashMap)
pub trait Hashable: Copy + Eq + std::hash::Hash {}

impl<T> Hashable for T where T: Copy + Eq + std::hash::Hash {}

/// Pick the action with the largest value
///
/// Ties go to the action that comes first in `actions`, so the choice is stable for a fixed
/// enumeration order. `None` only if `actions` is empty.
pub(crate) fn greedy<A: Copy>(actions: &[A], mut value: impl FnMut(A) -> f32) -> Option<(A, f32)> {
    let mut best: Option<(A, f32)> = None;
    for &action in actions {
        let v = value(action);
        let replace = match best {
            None => true,
            Some((_, best_value)) => best_value < v,
        };
        if replace {
            best = Some((action, v));
        }
    }
    best
}
