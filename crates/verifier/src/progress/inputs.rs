//! Checks on the schedule and loop structure the progress search relies on.
use loopcheck_ir::{Graph, NodeId, Unit};

use crate::error::Fault;

/// Every merge at `header` must carry one operand per incoming edge.
pub(super) fn check_merge_arity(graph: &Graph, header: NodeId) -> Result<(), Fault> {
    let expected = graph.in_degree(header);
    for merge in graph.merges_of(header) {
        let found = graph
            .merge_data(merge)
            .map(|data| data.operands.len())
            .unwrap_or_default();
        if found != expected {
            return Err(Fault::MergeArityMismatch {
                merge,
                header,
                expected,
                found,
            });
        }
    }
    Ok(())
}

/// Every loop header must be scheduled at the top of a block and every loop end must be
/// scheduled somewhere.
pub(super) fn check_scheduling(unit: &Unit) -> Result<(), Fault> {
    let graph = &unit.graph;
    let schedule = &unit.schedule;

    for node in graph.iter_nodes() {
        if !graph.is_loop_header(node) {
            continue;
        }

        let Some(block) = schedule.block_of(node) else {
            return Err(Fault::UnscheduledNode { node });
        };
        if schedule.first_node_of(block) != Some(node) {
            return Err(Fault::MisplacedLoopHeader {
                header: node,
                block,
            });
        }

        for &end in graph.loop_ends_of(node) {
            if schedule.block_of(end).is_none() {
                return Err(Fault::UnscheduledNode { node: end });
            }
        }
    }
    Ok(())
}
