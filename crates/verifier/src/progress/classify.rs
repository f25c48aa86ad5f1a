use loopcheck_ir::{Graph, NodeId};

/// Returns `true` if some merge node at `header` takes a value other than itself when control
/// arrives through `loop_end`.
///
/// Only merge operand identity is consulted. A merge without an operand for `loop_end` does not
/// count as progress.
pub fn has_progress(graph: &Graph, header: NodeId, loop_end: NodeId) -> bool {
    graph
        .merges_of(header)
        .any(|merge| match graph.merge_operand_at(merge, loop_end) {
            Some(operand) => operand != merge,
            None => false,
        })
}

#[cfg(test)]
mod tests {
    use loopcheck_ir::{Incoming, UnitBuilder};

    use super::*;

    struct Fixture {
        builder: UnitBuilder,
        header: NodeId,
        loop_end: NodeId,
        init: NodeId,
    }

    fn single_block_loop() -> Fixture {
        let mut builder = UnitBuilder::new("classify");
        let b0 = builder.append_block();
        let b1 = builder.append_block();

        builder.switch_to_block(b0);
        let init = builder.start();
        let header = builder.make_loop_header(0);
        builder.jump_to_loop(header);

        builder.switch_to_block(b1);
        builder.insert_loop_header(header);
        let loop_end = builder.loop_end(header);

        Fixture {
            builder,
            header,
            loop_end,
            init,
        }
    }

    #[test]
    fn no_merges_means_no_progress() {
        let Fixture {
            builder,
            header,
            loop_end,
            ..
        } = single_block_loop();
        let unit = builder.finish();

        assert!(!has_progress(&unit.graph, header, loop_end));
    }

    #[test]
    fn self_references_make_no_progress() {
        let Fixture {
            mut builder,
            header,
            loop_end,
            init,
        } = single_block_loop();
        builder.merge(header, &[Incoming::Value(init), Incoming::Itself]);
        builder.merge(header, &[Incoming::Value(init), Incoming::Itself]);
        let unit = builder.finish();

        assert!(!has_progress(&unit.graph, header, loop_end));
    }

    #[test]
    fn one_changing_merge_is_enough() {
        let Fixture {
            mut builder,
            header,
            loop_end,
            init,
        } = single_block_loop();
        builder.merge(header, &[Incoming::Value(init), Incoming::Itself]);
        builder.merge(header, &[Incoming::Itself, Incoming::Value(init)]);
        let unit = builder.finish();

        assert!(has_progress(&unit.graph, header, loop_end));
    }

    #[test]
    fn missing_operand_is_no_progress() {
        let Fixture {
            mut builder,
            header,
            loop_end,
            init,
        } = single_block_loop();
        builder.merge(header, &[Incoming::Value(init)]);
        let unit = builder.finish();

        assert!(!has_progress(&unit.graph, header, loop_end));
    }
}
