//! # Depth-First Orders
//!
//! Pre-order and post-order of the nodes reachable from the entry of a
//! region, computed together in one iterative walk.

use rustc_hash::FxHashSet;

use super::cfg::{CfgNode, CfgRegion};

/// The depth-first orders of one region.
///
/// Successors are visited in branch order, so for `br %c, ^then, ^else` the
/// then arm comes first in both orders.
pub struct DfsOrder<N>
where
    N: CfgNode,
{
    pre_order: Vec<N>,
    post_order: Vec<N>,
}

impl<N> DfsOrder<N>
where
    N: CfgNode,
{
    pub fn new(arena: &N::A, region: N::Region) -> Self {
        let entry = region.entry_node(arena);

        let mut pre_order = Vec::new();
        let mut post_order = Vec::new();
        let mut visited = FxHashSet::default();

        // each frame is a node and its successors not explored yet
        let mut stack: Vec<(N, std::vec::IntoIter<N>)> = Vec::new();

        visited.insert(entry);
        pre_order.push(entry);
        stack.push((entry, entry.succs(arena).into_iter()));

        while let Some((node, succs)) = stack.last_mut() {
            match succs.find(|succ| !visited.contains(succ)) {
                Some(succ) => {
                    visited.insert(succ);
                    pre_order.push(succ);
                    let frame = (succ, succ.succs(arena).into_iter());
                    stack.push(frame);
                }
                None => {
                    post_order.push(*node);
                    stack.pop();
                }
            }
        }

        Self {
            pre_order,
            post_order,
        }
    }

    pub fn pre_order(&self) -> &[N] { &self.pre_order }

    pub fn post_order(&self) -> &[N] { &self.post_order }

    /// Reverse post-order, every node before its successors except along
    /// back edges.
    pub fn reverse_post_order(&self) -> Vec<N> {
        self.post_order.iter().rev().copied().collect()
    }
}
