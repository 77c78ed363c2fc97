//! Depth-first component tracing with caller-owned visited state.

use std::collections::HashSet;

use crate::adjacency::Adjacency;

/// Collects every user reachable from `start` that is not yet in `visited`.
///
/// Users are returned in depth-first pre-order, exploring neighbours in
/// adjacency order. Each returned user is inserted into `visited`, so repeated
/// calls sharing one set never yield a user twice. When `start` is unknown or
/// already visited the result is empty and `visited` is left untouched.
///
/// The walk uses an explicit stack, so component size is not bounded by the
/// thread's stack depth.
///
/// # Examples
/// ```
/// use std::collections::HashSet;
///
/// use infection_core::{Adjacency, trace_component};
///
/// let adjacency = Adjacency::from_edges([("A", "B"), ("B", "C"), ("D", "E")]);
/// let mut visited = HashSet::new();
/// assert_eq!(trace_component(&adjacency, "A", &mut visited), ["A", "B", "C"]);
/// assert!(trace_component(&adjacency, "C", &mut visited).is_empty());
/// assert_eq!(trace_component(&adjacency, "E", &mut visited), ["E", "D"]);
/// assert_eq!(visited.len(), 5);
/// ```
pub fn trace_component<'a>(
    adjacency: &Adjacency<'a>,
    start: &str,
    visited: &mut HashSet<&'a str>,
) -> Vec<&'a str> {
    let Some(start) = adjacency.resolve(start) else {
        return Vec::new();
    };
    if visited.contains(start) {
        return Vec::new();
    }

    let mut component = Vec::new();
    let mut stack = vec![start];
    while let Some(user) = stack.pop() {
        if !visited.insert(user) {
            continue;
        }
        component.push(user);
        if let Some(neighbours) = adjacency.neighbours(user) {
            // Reverse so the first neighbour is popped first.
            stack.extend(
                neighbours
                    .iter()
                    .rev()
                    .copied()
                    .filter(|other| !visited.contains(other)),
            );
        }
    }
    component
}
