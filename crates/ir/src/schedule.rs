//! This module contains the block schedule of a unit: the order of nodes inside
//! each basic block and the block-level control flow graph.
use cranelift_entity::{entity_impl, packed_option::PackedOption, PrimaryMap, SecondaryMap};
use smallvec::SmallVec;

use crate::{
    node::{NodeId, NodeKind},
    Graph,
};

/// An opaque reference to a scheduled basic block.
#[derive(Clone, PartialEq, Eq, Copy, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);
entity_impl!(BlockId, "block");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BlockNode {
    nodes: Vec<NodeId>,
    preds: SmallVec<[BlockId; 4]>,
    succs: SmallVec<[BlockId; 2]>,
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    blocks: PrimaryMap<BlockId, BlockNode>,
    node_to_block: SecondaryMap<NodeId, PackedOption<BlockId>>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append_block(&mut self) -> BlockId {
        self.blocks.push(BlockNode::default())
    }

    /// Appends `node` to the end of `block`.
    pub fn append_node(&mut self, block: BlockId, node: NodeId) {
        debug_assert!(
            self.node_to_block[node].is_none(),
            "{node} is already scheduled"
        );
        self.blocks[block].nodes.push(node);
        self.node_to_block[node] = block.into();
    }

    /// Adds a control flow edge. Predecessors keep insertion order.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        if !self.blocks[to].preds.contains(&from) {
            self.blocks[to].preds.push(from);
        }
        if !self.blocks[from].succs.contains(&to) {
            self.blocks[from].succs.push(to);
        }
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.blocks.keys().next()
    }

    pub fn block_num(&self) -> usize {
        self.blocks.len()
    }

    pub fn contains(&self, block: BlockId) -> bool {
        self.blocks.is_valid(block)
    }

    pub fn iter_block(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.keys()
    }

    /// Nodes of `block` in execution order.
    pub fn nodes_of(&self, block: BlockId) -> &[NodeId] {
        &self.blocks[block].nodes
    }

    pub fn block_of(&self, node: NodeId) -> Option<BlockId> {
        self.node_to_block.get(node).and_then(|b| b.expand())
    }

    pub fn first_node_of(&self, block: BlockId) -> Option<NodeId> {
        self.blocks[block].nodes.first().copied()
    }

    /// The last node of `block`; marks the block in rendered paths.
    pub fn end_node_of(&self, block: BlockId) -> Option<NodeId> {
        self.blocks[block].nodes.last().copied()
    }

    pub fn preds_of(&self, block: BlockId) -> &[BlockId] {
        &self.blocks[block].preds
    }

    pub fn succs_of(&self, block: BlockId) -> &[BlockId] {
        &self.blocks[block].succs
    }

    pub fn pred_num_of(&self, block: BlockId) -> usize {
        self.blocks[block].preds.len()
    }

    pub fn succ_num_of(&self, block: BlockId) -> usize {
        self.blocks[block].succs.len()
    }

    /// Returns the first loop header node scheduled in `block`, if any.
    pub fn loop_header_of(&self, graph: &Graph, block: BlockId) -> Option<NodeId> {
        self.nodes_of(block)
            .iter()
            .copied()
            .find(|&node| graph.is_loop_header(node))
    }

    pub fn is_loop_header_block(&self, graph: &Graph, block: BlockId) -> bool {
        self.loop_header_of(graph, block).is_some()
    }

    /// Returns the header targeted by the back edge that terminates `block`.
    pub fn loop_end_target(&self, graph: &Graph, block: BlockId) -> Option<NodeId> {
        self.end_node_of(block)
            .and_then(|node| match *graph.kind(node) {
                NodeKind::LoopEnd { header } => Some(header),
                _ => None,
            })
    }

    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder::new(self)
    }

    /// Blocks reachable from the entry in reverse post order.
    pub fn reverse_post_order(&self) -> Vec<BlockId> {
        let mut rpo: Vec<_> = self.post_order().collect();
        rpo.reverse();
        rpo
    }
}

pub struct PostOrder<'a> {
    schedule: &'a Schedule,
    node_state: SecondaryMap<BlockId, NodeState>,
    stack: Vec<BlockId>,
}

impl<'a> PostOrder<'a> {
    fn new(schedule: &'a Schedule) -> Self {
        let mut stack = Vec::new();

        if let Some(entry) = schedule.entry() {
            stack.push(entry);
        }

        Self {
            schedule,
            node_state: SecondaryMap::default(),
            stack,
        }
    }
}

impl Iterator for PostOrder<'_> {
    type Item = BlockId;

    fn next(&mut self) -> Option<BlockId> {
        while let Some(&block) = self.stack.last() {
            if self.node_state[block].is_unvisited() {
                self.node_state[block].set_visited();
                for &succ in self.schedule.succs_of(block) {
                    if self.node_state[succ].is_unvisited() {
                        self.stack.push(succ);
                    }
                }
            } else {
                self.stack.pop();
                if !self.node_state[block].has_finished() {
                    self.node_state[block].set_finished();
                    return Some(block);
                }
            }
        }

        None
    }
}

#[derive(Default, Debug, Clone, Copy)]
struct NodeState(u8);

impl NodeState {
    fn is_unvisited(self) -> bool {
        self.0 == 0
    }

    fn has_finished(self) -> bool {
        self.0 == 2
    }

    fn set_visited(&mut self) {
        self.0 = 1;
    }

    fn set_finished(&mut self) {
        self.0 = 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preds_keep_insertion_order() {
        let mut schedule = Schedule::new();
        let b0 = schedule.append_block();
        let b1 = schedule.append_block();
        let b2 = schedule.append_block();

        schedule.add_edge(b1, b0);
        schedule.add_edge(b2, b0);
        schedule.add_edge(b1, b0);

        assert_eq!(schedule.preds_of(b0), &[b1, b2]);
        assert_eq!(schedule.succ_num_of(b1), 1);
    }

    #[test]
    fn reverse_post_order_visits_entry_first() {
        let mut schedule = Schedule::new();
        let b0 = schedule.append_block();
        let b1 = schedule.append_block();
        let b2 = schedule.append_block();
        let b3 = schedule.append_block();
        let unreachable = schedule.append_block();

        schedule.add_edge(b0, b1);
        schedule.add_edge(b1, b2);
        schedule.add_edge(b2, b1);
        schedule.add_edge(b1, b3);
        schedule.add_edge(unreachable, b3);

        assert_eq!(schedule.reverse_post_order(), vec![b0, b1, b2, b3]);
    }
}
