//! Loop decomposition of a scheduled unit.
use cranelift_entity::{entity_impl, packed_option::PackedOption, PrimaryMap, SecondaryMap};
use smallvec::SmallVec;

use crate::{node::NodeId, schedule::BlockId, Graph, Schedule};

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoopId(u32);
entity_impl!(LoopId, "loop");

#[derive(Debug, Default)]
pub struct LoopForest {
    /// Stores loops.
    /// The index of an outer loop is guaranteed to be lower than its inner loops because loops
    /// are found in RPO.
    loops: PrimaryMap<LoopId, LoopData>,

    /// Maps blocks to their innermost containing loop.
    block_to_loop: SecondaryMap<BlockId, PackedOption<LoopId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LoopData {
    header: NodeId,
    header_block: BlockId,
    parent: PackedOption<LoopId>,
    children: SmallVec<[LoopId; 4]>,
}

impl LoopForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the loop forest of a scheduled unit.
    pub fn compute(&mut self, graph: &Graph, schedule: &Schedule) {
        self.clear();

        // Headers are collected in RPO, so outer loops are inserted before inner ones.
        for block in schedule.reverse_post_order() {
            for &header in schedule.nodes_of(block) {
                if !graph.is_loop_header(header) {
                    continue;
                }
                self.loops.push(LoopData {
                    header,
                    header_block: block,
                    parent: None.into(),
                    children: SmallVec::new(),
                });
            }
        }

        self.analyze_loops(graph, schedule);
    }

    /// Returns all loops. Outer loops are returned before their inner loops.
    pub fn loops(&self) -> impl DoubleEndedIterator<Item = LoopId> + '_ {
        self.loops.keys()
    }

    pub fn loop_num(&self) -> usize {
        self.loops.len()
    }

    pub fn header(&self, lp: LoopId) -> NodeId {
        self.loops[lp].header
    }

    pub fn header_block(&self, lp: LoopId) -> BlockId {
        self.loops[lp].header_block
    }

    /// Back-edge terminators of `lp`.
    pub fn loop_ends<'a>(&self, graph: &'a Graph, lp: LoopId) -> &'a [NodeId] {
        graph.loop_ends_of(self.header(lp))
    }

    /// Merge nodes resident at the header of `lp`.
    pub fn merges<'a>(&self, graph: &'a Graph, lp: LoopId) -> impl Iterator<Item = NodeId> + 'a {
        graph.merges_of(self.header(lp))
    }

    pub fn parent_loop(&self, lp: LoopId) -> Option<LoopId> {
        self.loops[lp].parent.expand()
    }

    pub fn children(&self, lp: LoopId) -> &[LoopId] {
        &self.loops[lp].children
    }

    /// Returns the innermost loop containing `block`.
    pub fn loop_of_block(&self, block: BlockId) -> Option<LoopId> {
        self.block_to_loop.get(block).and_then(|lp| lp.expand())
    }

    pub fn loop_of_header(&self, header: NodeId) -> Option<LoopId> {
        self.loops
            .iter()
            .find_map(|(lp, data)| (data.header == header).then_some(lp))
    }

    /// Returns `true` if `block` is in `lp` or one of its inner loops.
    pub fn is_in_loop(&self, block: BlockId, lp: LoopId) -> bool {
        let mut loop_of_block = self.loop_of_block(block);
        while let Some(cur_lp) = loop_of_block {
            if lp == cur_lp {
                return true;
            }
            loop_of_block = self.parent_loop(cur_lp);
        }
        false
    }

    /// Nesting depth, starting at 1 for outermost loops.
    pub fn depth(&self, lp: LoopId) -> usize {
        let mut depth = 1;
        let mut cur = lp;
        while let Some(parent) = self.parent_loop(cur) {
            depth += 1;
            cur = parent;
        }
        depth
    }

    pub fn clear(&mut self) {
        self.loops.clear();
        self.block_to_loop.clear();
    }

    /// Maps each block to its innermost loop and links parents and children.
    /// Loop bodies are found by walking backward from every loop-end block.
    fn analyze_loops(&mut self, graph: &Graph, schedule: &Schedule) {
        let mut worklist = vec![];

        // Iterate loops reversely to analyze inner loops first.
        for cur_lp in self.loops.keys().rev() {
            let header = self.header(cur_lp);
            let header_block = self.header_block(cur_lp);
            self.block_to_loop[header_block] = cur_lp.into();

            for &end in graph.loop_ends_of(header) {
                if let Some(block) = schedule.block_of(end) {
                    worklist.push(block);
                }
            }

            while let Some(block) = worklist.pop() {
                match self.block_to_loop[block].expand() {
                    Some(lp_of_block) => {
                        let outermost = self.outermost_parent(lp_of_block);
                        if outermost == cur_lp {
                            continue;
                        }

                        // An inner loop discovered from the body of `cur_lp`.
                        self.loops[cur_lp].children.push(outermost);
                        self.loops[outermost].parent = cur_lp.into();
                        let inner_header_block = self.header_block(outermost);
                        worklist.extend(schedule.preds_of(inner_header_block));
                    }

                    None => {
                        self.block_to_loop[block] = cur_lp.into();
                        worklist.extend(schedule.preds_of(block));
                    }
                }
            }
        }
    }

    fn outermost_parent(&self, mut lp: LoopId) -> LoopId {
        while let Some(parent) = self.parent_loop(lp) {
            lp = parent;
        }
        lp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::UnitBuilder;

    #[test]
    fn nested_loops_are_linked() {
        let mut builder = UnitBuilder::new("nested");
        let entry = builder.append_block();
        let outer_block = builder.append_block();
        let inner_block = builder.append_block();
        let inner_latch = builder.append_block();
        let outer_latch = builder.append_block();
        let outer_end = builder.append_block();
        let exit = builder.append_block();

        builder.switch_to_block(entry);
        builder.start();
        let outer = builder.make_loop_header(4);
        builder.jump_to_loop(outer);

        builder.switch_to_block(outer_block);
        builder.insert_loop_header(outer);
        let inner = builder.make_loop_header(9);
        builder.jump_to_loop(inner);

        builder.switch_to_block(inner_block);
        builder.insert_loop_header(inner);
        builder.branch(inner_latch, outer_latch);

        builder.switch_to_block(inner_latch);
        builder.loop_end(inner);

        builder.switch_to_block(outer_latch);
        builder.loop_exit(inner);
        builder.branch(outer_end, exit);

        builder.switch_to_block(outer_end);
        builder.loop_end(outer);

        builder.switch_to_block(exit);
        builder.loop_exit(outer);
        builder.ret();

        let unit = builder.finish();
        let mut forest = LoopForest::new();
        forest.compute(&unit.graph, &unit.schedule);

        assert_eq!(forest.loop_num(), 2);
        let lps: Vec<_> = forest.loops().collect();
        let (outer_lp, inner_lp) = (lps[0], lps[1]);

        assert_eq!(forest.header(outer_lp), outer);
        assert_eq!(forest.header(inner_lp), inner);
        assert_eq!(forest.parent_loop(inner_lp), Some(outer_lp));
        assert_eq!(forest.children(outer_lp), &[inner_lp]);
        assert_eq!(forest.depth(inner_lp), 2);

        assert_eq!(forest.loop_of_block(inner_latch), Some(inner_lp));
        assert_eq!(forest.loop_of_block(outer_latch), Some(outer_lp));
        assert_eq!(forest.loop_of_block(outer_end), Some(outer_lp));
        assert!(forest.is_in_loop(inner_latch, outer_lp));
        assert_eq!(forest.loop_of_block(exit), None);
        assert_eq!(forest.loop_of_block(entry), None);
        assert_eq!(forest.loop_of_header(inner), Some(inner_lp));
    }

    #[test]
    fn header_inside_block_is_found() {
        let mut builder = UnitBuilder::new("inside");
        let entry = builder.append_block();
        let body = builder.append_block();

        builder.switch_to_block(entry);
        builder.start();
        let header = builder.make_loop_header(3);
        builder.jump_to_loop(header);

        builder.switch_to_block(body);
        builder.op();
        builder.insert_loop_header(header);
        builder.loop_end(header);

        let unit = builder.finish();
        let mut forest = LoopForest::new();
        forest.compute(&unit.graph, &unit.schedule);

        assert_eq!(forest.loop_num(), 1);
        let lp = forest.loop_of_header(header).unwrap();
        assert_eq!(forest.header_block(lp), body);
        assert_eq!(forest.loop_of_block(body), Some(lp));
        assert_eq!(unit.schedule.loop_header_of(&unit.graph, body), Some(header));
    }
}
