//! Incremental construction of a [`Unit`].
//!
//! The builder keeps a cursor on one block; node helpers append to that block and wire the
//! control flow edges their terminators imply. Edges into loop headers are added by
//! [`UnitBuilder::finish`], forward entries first and back edges after, in the order the ends
//! were created.
use smallvec::SmallVec;

use crate::{
    node::{LoopHeaderData, MergeData, NodeId, NodeKind, SourcePosition},
    schedule::BlockId,
    Graph, Schedule, Unit,
};

/// An incoming value of a merge node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming {
    /// The merge node refers to itself: no new value flows on the edge.
    Itself,
    Value(NodeId),
}

pub struct UnitBuilder {
    graph: Graph,
    schedule: Schedule,
    current: Option<BlockId>,
}

impl UnitBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(name),
            schedule: Schedule::new(),
            current: None,
        }
    }

    pub fn finish(self) -> Unit {
        let Self {
            graph,
            mut schedule,
            ..
        } = self;

        for node in graph.iter_nodes() {
            let Some(data) = graph.header_data(node) else {
                continue;
            };
            let Some(header_block) = schedule.block_of(node) else {
                continue;
            };

            for &end in data.forward_ends.iter().chain(data.loop_ends.iter()) {
                if let Some(block) = schedule.block_of(end) {
                    schedule.add_edge(block, header_block);
                }
            }
        }

        Unit::new(graph, schedule)
    }

    pub fn append_block(&mut self) -> BlockId {
        self.schedule.append_block()
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.current = Some(block);
    }

    /// Direct access to the graph, for nodes the helpers do not cover.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Adds an explicit control flow edge.
    pub fn add_edge(&mut self, from: BlockId, to: BlockId) {
        self.schedule.add_edge(from, to);
    }

    /// Appends a node of `kind` to the current block.
    pub fn insert_node(&mut self, kind: NodeKind) -> NodeId {
        let node = self.graph.make_node(kind);
        self.insert_existing(node);
        node
    }

    pub fn start(&mut self) -> NodeId {
        self.insert_node(NodeKind::Start)
    }

    pub fn op(&mut self) -> NodeId {
        self.insert_node(NodeKind::Op)
    }

    pub fn mutation(&mut self) -> NodeId {
        self.insert_node(NodeKind::Mutation)
    }

    pub fn join(&mut self) -> NodeId {
        self.insert_node(NodeKind::Join)
    }

    pub fn ret(&mut self) -> NodeId {
        self.insert_node(NodeKind::Return)
    }

    pub fn jump(&mut self, dest: BlockId) -> NodeId {
        let node = self.insert_node(NodeKind::Jump);
        let block = self.cursor();
        self.schedule.add_edge(block, dest);
        node
    }

    pub fn branch(&mut self, then_block: BlockId, else_block: BlockId) -> NodeId {
        let node = self.insert_node(NodeKind::Branch);
        let block = self.cursor();
        self.schedule.add_edge(block, then_block);
        self.schedule.add_edge(block, else_block);
        node
    }

    /// Creates a loop header that is not scheduled yet; see [`Self::insert_loop_header`].
    pub fn make_loop_header(&mut self, bci: u32) -> NodeId {
        self.graph
            .make_node(NodeKind::LoopHeader(LoopHeaderData::new(SourcePosition::new(bci))))
    }

    /// Appends `header` to the current block. Loop headers are expected to open their block.
    pub fn insert_loop_header(&mut self, header: NodeId) {
        debug_assert!(self.graph.is_loop_header(header));
        self.insert_existing(header);
    }

    /// Ends the current block with a forward entry into `header`.
    pub fn jump_to_loop(&mut self, header: NodeId) -> NodeId {
        let end = self.insert_node(NodeKind::Jump);
        self.header_mut(header).forward_ends.push(end);
        end
    }

    /// Ends the current block with a back edge to `header`.
    pub fn loop_end(&mut self, header: NodeId) -> NodeId {
        let end = self.make_loop_end(header);
        self.insert_existing(end);
        end
    }

    /// Creates a back edge to `header` without placing it in a block.
    pub fn make_loop_end(&mut self, header: NodeId) -> NodeId {
        let end = self.graph.make_node(NodeKind::LoopEnd { header });
        self.header_mut(header).loop_ends.push(end);
        end
    }

    pub fn loop_exit(&mut self, header: NodeId) -> NodeId {
        self.insert_node(NodeKind::LoopExit { header })
    }

    /// Creates a merge node at `header` with one incoming value per header edge.
    /// Merge nodes float with their header and are not placed in a block.
    pub fn merge(&mut self, header: NodeId, incoming: &[Incoming]) -> NodeId {
        debug_assert!(self.graph.is_loop_header(header));
        let merge = self.graph.make_node(NodeKind::Merge(MergeData {
            header,
            operands: SmallVec::new(),
        }));

        let operands: SmallVec<[NodeId; 4]> = incoming
            .iter()
            .map(|incoming| match *incoming {
                Incoming::Itself => merge,
                Incoming::Value(value) => value,
            })
            .collect();
        if let Some(data) = self.graph.merge_data_mut(merge) {
            data.operands = operands;
        }
        self.header_mut(header).merges.push(merge);
        merge
    }

    fn insert_existing(&mut self, node: NodeId) {
        let block = self.cursor();
        self.schedule.append_node(block, node);
    }

    fn cursor(&self) -> BlockId {
        self.current.expect("no block selected, call `switch_to_block` first")
    }

    fn header_mut(&mut self, header: NodeId) -> &mut LoopHeaderData {
        self.graph
            .header_data_mut(header)
            .expect("`header` should be a loop header")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_edges_are_wired_on_finish() {
        let mut builder = UnitBuilder::new("wire");
        let b0 = builder.append_block();
        let b1 = builder.append_block();
        let b2 = builder.append_block();
        let b3 = builder.append_block();

        builder.switch_to_block(b0);
        builder.start();
        let header = builder.make_loop_header(2);
        let entry_end = builder.jump_to_loop(header);

        builder.switch_to_block(b1);
        builder.insert_loop_header(header);
        builder.branch(b2, b3);

        builder.switch_to_block(b2);
        let back = builder.loop_end(header);

        builder.switch_to_block(b3);
        builder.loop_exit(header);
        builder.ret();

        let init = builder.graph_mut().make_node(NodeKind::Op);
        let merge = builder.merge(header, &[Incoming::Value(init), Incoming::Itself]);

        let unit = builder.finish();
        assert_eq!(unit.schedule.preds_of(b1), &[b0, b2]);
        assert_eq!(unit.schedule.succs_of(b1), &[b2, b3]);
        assert_eq!(unit.schedule.end_node_of(b0), Some(entry_end));
        assert_eq!(unit.graph.merge_operand_at(merge, entry_end), Some(init));
        assert_eq!(unit.graph.merge_operand_at(merge, back), Some(merge));
        assert_eq!(unit.schedule.loop_end_target(&unit.graph, b2), Some(header));
        assert!(unit.schedule.is_loop_header_block(&unit.graph, b1));
    }
}
