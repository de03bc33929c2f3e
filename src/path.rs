//! Uninformed graph search over the walkability relation.
//!
//! The frontier element expanded each iteration is chosen uniformly at
//! random, so the returned path is *a* valid path between the endpoints, not
//! necessarily a shortest one. Each cell enters the frontier at most once,
//! which bounds the search by the number of reachable cells.

use crate::map::Map;
use rand::Rng;
use std::collections::HashSet;

/// Source of walkable-neighbor queries for the pathfinder.
pub trait GridNav {
    /// The walkable cells adjacent to `(x, y)`.
    fn neighbors(&self, x: i32, y: i32) -> Vec<(i32, i32)>;
}

impl GridNav for Map {
    fn neighbors(&self, x: i32, y: i32) -> Vec<(i32, i32)> {
        Map::neighbors(self, x, y)
    }
}

/// One discovered cell; predecessor links form a tree rooted at the start.
struct PathNode {
    pos: (i32, i32),
    prev: Option<usize>,
}

fn build_path(nodes: &[PathNode], end: usize) -> Vec<(i32, i32)> {
    let mut path = Vec::new();
    let mut idx = end;
    loop {
        path.push(nodes[idx].pos);
        match nodes[idx].prev {
            Some(prev) => idx = prev,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Finds a path from `start` to `goal` inclusive, using thread-local
/// randomness for frontier selection.
///
/// Returns an empty vector when no path exists; `start == goal` yields the
/// single-element path `[start]`. Out-of-bounds endpoints are not rejected up
/// front, the search just exhausts.
pub fn find_path<N: GridNav + ?Sized>(
    nav: &N,
    start: (i32, i32),
    goal: (i32, i32),
) -> Vec<(i32, i32)> {
    find_path_with_rng(nav, start, goal, &mut rand::rng())
}

/// [`find_path`] with a caller-supplied RNG, for reproducible runs.
pub fn find_path_with_rng<N, R>(
    nav: &N,
    start: (i32, i32),
    goal: (i32, i32),
    rng: &mut R,
) -> Vec<(i32, i32)>
where
    N: GridNav + ?Sized,
    R: Rng + ?Sized,
{
    let mut nodes = vec![PathNode {
        pos: start,
        prev: None,
    }];
    // Arena indices of known-reachable, not yet expanded cells.
    let mut frontier: Vec<usize> = vec![0];
    // Cells that ever entered the frontier; nothing is discovered twice.
    let mut seen: HashSet<(i32, i32)> = HashSet::from([start]);

    while !frontier.is_empty() {
        // Choose some cell we know how to reach.
        let slot = rng.random_range(0..frontier.len());
        let current = frontier.swap_remove(slot);

        if nodes[current].pos == goal {
            return build_path(&nodes, current);
        }

        let (x, y) = nodes[current].pos;
        for next in nav.neighbors(x, y) {
            if seen.insert(next) {
                nodes.push(PathNode {
                    pos: next,
                    prev: Some(current),
                });
                frontier.push(nodes.len() - 1);
            }
        }
    }

    // Frontier exhausted without reaching the goal.
    Vec::new()
}
