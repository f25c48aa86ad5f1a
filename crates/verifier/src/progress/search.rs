//! Backward search from a back edge toward its loop header.
//!
//! The search walks predecessors depth first. Straight-line stretches are followed in place; at a
//! block with several predecessors every predecessor becomes an independent branch that owns its
//! own copy of the path. A branch ends as soon as it passes a state mutation or an exit of a loop
//! other than the one under analysis, or when it runs out of predecessors. A branch that reaches
//! the header first makes the loop endless.
//!
//! Branches are kept on an explicit work-list so deep schedules cannot exhaust the stack.
//! Predecessors are pushed in reverse, which makes the pop order equal to a recursive walk over
//! predecessors in their scheduled order.
use cranelift_entity::{entity_impl, packed_option::PackedOption, PrimaryMap};
use loopcheck_ir::{BlockId, Graph, NodeId, Schedule, Unit};
use smallvec::SmallVec;

use crate::error::Fault;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every branch met a side effect, a foreign loop exit or a dead end.
    Justified,
    /// A branch reached the header. Holds the blocks of that branch in visiting order; the last
    /// one is the header block.
    Endless(Vec<BlockId>),
}

/// Searches backward from `start`, the block holding `loop_end`, toward `header`.
pub fn walk_back(
    unit: &Unit,
    header: NodeId,
    loop_end: NodeId,
    start: BlockId,
) -> Result<SearchOutcome, Fault> {
    let graph = &unit.graph;
    let schedule = &unit.schedule;

    let mut paths = PathArena::default();
    let mut frames: SmallVec<[Frame; 8]> = SmallVec::new();
    frames.push(Frame {
        block: start,
        path: None.into(),
    });

    while let Some(Frame { block, path }) = frames.pop() {
        let mut cur = block;
        let mut tail = path;

        loop {
            if paths.contains(tail, cur) {
                return Err(Fault::BlockRevisited {
                    block: cur,
                    loop_end,
                    path: paths.blocks(tail),
                });
            }
            tail = paths.push(cur, tail).into();

            match scan_block(graph, schedule, cur, header) {
                Scan::Justified => break,
                Scan::ReachedHeader => return Ok(SearchOutcome::Endless(paths.blocks(tail))),
                Scan::Nothing => {}
            }

            match schedule.preds_of(cur) {
                [] => break,
                [pred] => cur = *pred,
                preds => {
                    let cur_header = schedule.loop_header_of(graph, cur);
                    for &pred in preds.iter().rev() {
                        // Never re-enter a loop through its own back edges.
                        if cur_header.is_some()
                            && schedule.loop_end_target(graph, pred) == cur_header
                        {
                            continue;
                        }
                        frames.push(Frame { block: pred, path: tail });
                    }
                    break;
                }
            }
        }
    }

    Ok(SearchOutcome::Justified)
}

enum Scan {
    Justified,
    ReachedHeader,
    Nothing,
}

/// Scans `block` last node first.
fn scan_block(graph: &Graph, schedule: &Schedule, block: BlockId, header: NodeId) -> Scan {
    for &node in schedule.nodes_of(block).iter().rev() {
        // An inner loop may leak values through its exits, so its exits count as side effects.
        let foreign_exit = graph
            .loop_exit_header(node)
            .is_some_and(|exit_header| exit_header != header);
        if graph.is_state_mutation(node) || foreign_exit {
            return Scan::Justified;
        }

        if node == header {
            return Scan::ReachedHeader;
        }
    }

    Scan::Nothing
}

#[derive(Clone, Copy)]
struct Frame {
    block: BlockId,
    path: PackedOption<PathLink>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
struct PathLink(u32);
entity_impl!(PathLink);

struct Link {
    block: BlockId,
    parent: PackedOption<PathLink>,
}

/// Append-only store of search paths. A path is named by its last link, so copying a path for a
/// new branch copies one index and sibling branches share their common prefix.
#[derive(Default)]
struct PathArena {
    links: PrimaryMap<PathLink, Link>,
}

impl PathArena {
    fn push(&mut self, block: BlockId, parent: PackedOption<PathLink>) -> PathLink {
        self.links.push(Link { block, parent })
    }

    fn contains(&self, tail: PackedOption<PathLink>, block: BlockId) -> bool {
        let mut cur = tail.expand();
        while let Some(link) = cur {
            if self.links[link].block == block {
                return true;
            }
            cur = self.links[link].parent.expand();
        }
        false
    }

    /// Blocks of the path ending at `tail`, first visited first.
    fn blocks(&self, tail: PackedOption<PathLink>) -> Vec<BlockId> {
        let mut blocks = Vec::new();
        let mut cur = tail.expand();
        while let Some(link) = cur {
            blocks.push(self.links[link].block);
            cur = self.links[link].parent.expand();
        }
        blocks.reverse();
        blocks
    }
}

#[cfg(test)]
mod tests {
    use loopcheck_ir::UnitBuilder;

    use super::*;

    #[test]
    fn sibling_paths_share_prefix() {
        let mut arena = PathArena::default();
        let root = arena.push(BlockId(4), None.into());
        let left = arena.push(BlockId(2), root.into());
        let right = arena.push(BlockId(3), root.into());

        assert_eq!(arena.blocks(left.into()), vec![BlockId(4), BlockId(2)]);
        assert_eq!(arena.blocks(right.into()), vec![BlockId(4), BlockId(3)]);
        assert!(!arena.contains(right.into(), BlockId(2)));
        assert!(arena.contains(right.into(), BlockId(4)));
    }

    #[test]
    fn last_node_is_scanned_first() {
        let mut builder = UnitBuilder::new("scan");
        let b0 = builder.append_block();
        let b1 = builder.append_block();

        builder.switch_to_block(b0);
        builder.start();
        let header = builder.make_loop_header(0);
        builder.jump_to_loop(header);

        // The mutation follows the header, so a backward scan meets it first.
        builder.switch_to_block(b1);
        builder.insert_loop_header(header);
        builder.mutation();
        let loop_end = builder.loop_end(header);
        let unit = builder.finish();

        let outcome = walk_back(&unit, header, loop_end, b1).unwrap();
        assert_eq!(outcome, SearchOutcome::Justified);
    }

    #[test]
    fn single_block_loop_reaches_header() {
        let mut builder = UnitBuilder::new("scan");
        let b0 = builder.append_block();
        let b1 = builder.append_block();

        builder.switch_to_block(b0);
        builder.start();
        let header = builder.make_loop_header(0);
        builder.jump_to_loop(header);

        builder.switch_to_block(b1);
        builder.insert_loop_header(header);
        builder.op();
        let loop_end = builder.loop_end(header);
        let unit = builder.finish();

        let outcome = walk_back(&unit, header, loop_end, b1).unwrap();
        assert_eq!(outcome, SearchOutcome::Endless(vec![b1]));
    }

    #[test]
    fn own_loop_exit_is_not_a_side_effect() {
        let mut builder = UnitBuilder::new("scan");
        let b0 = builder.append_block();
        let b1 = builder.append_block();
        let b2 = builder.append_block();
        let b3 = builder.append_block();

        builder.switch_to_block(b0);
        builder.start();
        let header = builder.make_loop_header(0);
        builder.jump_to_loop(header);

        builder.switch_to_block(b1);
        builder.insert_loop_header(header);
        builder.branch(b2, b3);

        // Malformed on purpose: an exit of the analysed loop inside its own body.
        builder.switch_to_block(b2);
        builder.loop_exit(header);
        let loop_end = builder.loop_end(header);

        builder.switch_to_block(b3);
        builder.ret();
        let unit = builder.finish();

        let outcome = walk_back(&unit, header, loop_end, b2).unwrap();
        assert_eq!(outcome, SearchOutcome::Endless(vec![b2, b1]));
    }
}
