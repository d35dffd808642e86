//! # Dominance Analysis
//!
//! The algorithm described in "A Simple, Fast Dominance Algorithm" by Cooper,
//! Harvey and Kennedy. Only immediate dominators are kept, which is all the
//! use-before-def check needs.

use rustc_hash::FxHashMap;

use super::{
    cfg::{CfgInfo, CfgNode, CfgRegion},
    dfs::DfsOrder,
};

pub struct Dominance<N>
where
    N: CfgNode,
{
    /// The immediate dominator of each reachable node, `None` for the entry.
    idoms: FxHashMap<N, Option<N>>,
    /// Reverse postorder of the reachable nodes.
    rpo: Vec<N>,
}

impl<N> Dominance<N>
where
    N: CfgNode,
{
    /// Returns the immediate dominator of `node`.
    ///
    /// `None` for the entry node and for unreachable nodes.
    pub fn idom(&self, node: N) -> Option<N> { self.idoms.get(&node).copied().flatten() }

    /// Returns true if `n1` dominates `n2`.
    ///
    /// Every node dominates itself. Unreachable nodes are dominated by
    /// nothing but themselves.
    pub fn dominates(&self, n1: N, n2: N) -> bool {
        if n1 == n2 {
            return true;
        }
        let mut finger = n2;
        while let Some(idom) = self.idom(finger) {
            if idom == n1 {
                return true;
            }
            finger = idom;
        }
        false
    }

    pub fn rpo(&self) -> &[N] { &self.rpo }

    fn intersect(
        n1: N,
        n2: N,
        idoms: &FxHashMap<N, Option<N>>,
        postorder: &FxHashMap<N, usize>,
    ) -> N {
        let mut finger1 = n1;
        let mut finger2 = n2;
        while finger1 != finger2 {
            while postorder[&finger1] < postorder[&finger2] {
                finger1 = idoms[&finger1].expect("processed node without idom");
            }
            while postorder[&finger2] < postorder[&finger1] {
                finger2 = idoms[&finger2].expect("processed node without idom");
            }
        }
        finger1
    }

    pub fn new(arena: &N::A, cfg: &CfgInfo<N, N::Region>) -> Self {
        let region = cfg.region();
        let entry = region.entry_node(arena);

        let order = DfsOrder::<N>::new(arena, region);

        let postorder: FxHashMap<N, usize> = order
            .post_order()
            .iter()
            .enumerate()
            .map(|(i, &node)| (node, i))
            .collect();
        let mut idoms: FxHashMap<N, Option<N>> =
            order.post_order().iter().map(|&node| (node, None)).collect();
        let rpo = order.reverse_post_order();

        // temporarily, the entry is its own dominator
        idoms.insert(entry, Some(entry));

        let mut changed = true;
        while changed {
            changed = false;
            for node in rpo.iter().skip(1) {
                let preds = cfg.preds(*node).unwrap_or_default();

                let mut new_idom = None;
                for pred in preds {
                    if idoms.get(pred).copied().flatten().is_none() {
                        continue;
                    }
                    new_idom = Some(match new_idom {
                        None => *pred,
                        Some(curr) => Self::intersect(curr, *pred, &idoms, &postorder),
                    });
                }

                if idoms[node] != new_idom {
                    idoms.insert(*node, new_idom);
                    changed = true;
                }
            }
        }
        idoms.insert(entry, None);

        Self { idoms, rpo }
    }
}

#[cfg(test)]
mod tests {
    use super::Dominance;
    use crate::{
        collections::storage::{ArenaAlloc, ArenaPtr, BaseArena, BaseArenaPtr},
        impl_arena,
        utils::cfg::{CfgNode, CfgRegion},
    };

    #[derive(Default)]
    struct Graph {
        nodes: BaseArena<NodeData>,
        regions: BaseArena<RegionData>,
    }

    struct NodeData {
        succs: Vec<Node>,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Node(BaseArenaPtr<NodeData>);

    struct RegionData {
        entry: Node,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Region(BaseArenaPtr<RegionData>);

    impl_arena!(Graph, NodeData, Node, nodes);
    impl_arena!(Graph, RegionData, Region, regions);

    impl CfgNode for Node {
        type Region = Region;

        fn succs(self, arena: &Graph) -> Vec<Self> { self.deref(arena).succs.clone() }
    }

    impl CfgRegion for Region {
        type Node = Node;

        fn entry_node(self, arena: &Graph) -> Node { self.deref(arena).entry }
    }

    fn node(graph: &mut Graph, succs: Vec<Node>) -> Node { graph.alloc(NodeData { succs }) }

    #[test]
    fn test_dominance_diamond() {
        let mut graph = Graph::default();

        //      entry
        //      /   \
        //   then   else
        //      \   /
        //      merge
        let merge = node(&mut graph, vec![]);
        let then = node(&mut graph, vec![merge]);
        let else_ = node(&mut graph, vec![merge]);
        let entry = node(&mut graph, vec![then, else_]);
        let dangling = node(&mut graph, vec![merge]);

        let region = graph.alloc(RegionData { entry });
        let cfg = region.cfg_info(&graph);
        let dom = Dominance::new(&graph, &cfg);

        assert_eq!(dom.rpo()[0], entry);
        assert_eq!(dom.idom(entry), None);
        assert_eq!(dom.idom(then), Some(entry));
        assert_eq!(dom.idom(else_), Some(entry));
        assert_eq!(dom.idom(merge), Some(entry));

        assert!(dom.dominates(entry, merge));
        assert!(!dom.dominates(then, merge));
        assert!(!dom.dominates(else_, merge));
        assert!(dom.dominates(merge, merge));

        assert!(!cfg.is_reachable(dangling));
        assert!(!dom.dominates(entry, dangling));
        assert_eq!(cfg.preds(merge).unwrap().len(), 2);
    }
}
