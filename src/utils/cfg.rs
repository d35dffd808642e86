use std::hash::Hash;

use rustc_hash::{FxHashMap, FxHashSet};

use super::dfs::DfsOrder;
use crate::collections::storage::ArenaPtr;

/// A node in a control flow graph.
pub trait CfgNode: ArenaPtr + Hash {
    /// The region type associated with the node.
    type Region: CfgRegion<A = Self::A, Node = Self>;

    /// Get the successors of the node, in branch order.
    ///
    /// Predecessors are derived by [CfgInfo], which has to traverse the
    /// whole region.
    fn succs(self, arena: &Self::A) -> Vec<Self>;
}

/// A region that owns a control flow graph, e.g. a function.
pub trait CfgRegion: ArenaPtr {
    type Node: CfgNode<A = Self::A, Region = Self>;

    fn entry_node(self, arena: &Self::A) -> Self::Node;

    fn cfg_info(self, arena: &Self::A) -> CfgInfo<Self::Node, Self> { CfgInfo::new(arena, self) }
}

/// Edges of the subgraph reachable from the entry of a region.
pub struct CfgInfo<N, R>
where
    N: CfgNode<Region = R>,
    R: CfgRegion<A = N::A, Node = N>,
{
    region: R,
    succs: FxHashMap<N, Vec<N>>,
    preds: FxHashMap<N, Vec<N>>,
}

impl<N, R> CfgInfo<N, R>
where
    N: CfgNode<Region = R>,
    R: CfgRegion<A = N::A, Node = N>,
{
    pub fn new(arena: &N::A, region: R) -> Self {
        let order = DfsOrder::<N>::new(arena, region);

        // reachable nodes always get an entry, even without edges
        let mut succs: FxHashMap<N, Vec<N>> = FxHashMap::default();
        let mut preds: FxHashMap<N, Vec<N>> = order
            .pre_order()
            .iter()
            .map(|&node| (node, Vec::new()))
            .collect();

        for &node in order.pre_order() {
            let mut node_succs = node.succs(arena);
            // `br %c, ^bb1, ^bb1` is one edge
            let mut seen = FxHashSet::default();
            node_succs.retain(|succ| seen.insert(*succ));

            for &succ in node_succs.iter() {
                preds.entry(succ).or_default().push(node);
            }
            succs.insert(node, node_succs);
        }

        Self {
            region,
            succs,
            preds,
        }
    }

    /// The distinct successors of `node`, `None` if it is unreachable.
    pub fn succs(&self, node: N) -> Option<&[N]> { self.succs.get(&node).map(|v| v.as_slice()) }

    /// Predecessors in the order they were discovered.
    pub fn preds(&self, node: N) -> Option<&[N]> { self.preds.get(&node).map(|v| v.as_slice()) }

    pub fn region(&self) -> R { self.region }

    pub fn is_reachable(&self, node: N) -> bool { self.succs.contains_key(&node) }
}
