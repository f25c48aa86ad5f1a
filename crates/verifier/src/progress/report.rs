use std::fmt;

use loopcheck_ir::{ir_writer::UnitWriter, BlockId, NodeId, SourcePosition, Unit};

use crate::diagnostic::{Diagnostic, DiagnosticCode, Location};

/// A loop with a back-edge path on which nothing changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndlessLoop {
    /// Identity of the owning unit.
    pub unit: String,
    pub header: NodeId,
    pub position: SourcePosition,
    /// The back edge the search started from.
    pub loop_end: NodeId,
    /// Blocks from the loop end back to the header block.
    pub path: Vec<BlockId>,
    /// `path` rendered as block end nodes joined by `->`, closed by the header.
    pub trace: String,
    header_text: String,
    loop_end_text: String,
    snippet: Option<String>,
}

impl EndlessLoop {
    pub fn new(unit: &Unit, header: NodeId, loop_end: NodeId, path: Vec<BlockId>) -> Self {
        let graph = &unit.graph;
        let schedule = &unit.schedule;

        let mut trace = String::new();
        for &block in &path {
            match schedule.end_node_of(block) {
                Some(end) => trace.push_str(&graph.display_node(end).to_string()),
                None => trace.push_str(&block.to_string()),
            }
            trace.push_str("->");
        }
        trace.push_str(&graph.display_node(header).to_string());

        let snippet = UnitWriter::new(unit).dump_blocks(&path).ok();

        Self {
            unit: graph.name.clone(),
            header,
            position: graph.position_of(header).unwrap_or_default(),
            loop_end,
            path,
            trace,
            header_text: graph.display_node(header).to_string(),
            loop_end_text: graph.display_node(loop_end).to_string(),
            snippet,
        }
    }

    /// Dump of the blocks on the path, in path order.
    pub fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(
            DiagnosticCode::EndlessLoop,
            "endless loop path, no side effect nor merge value update found",
            Location::Loop {
                header: self.header,
                position: self.position,
            },
        )
        .with_unit(self.unit.clone())
        .with_note(format!("starting at loop end {}", self.loop_end_text))
        .with_note(format!("path through the loop {}", self.trace))
        .with_snippet(self.snippet.clone())
    }
}

impl fmt::Display for EndlessLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loop {} at {} in {} starting at loop end {} is an endless path, \
             no side effect nor merge value update found. Path through the loop {}.",
            self.header_text, self.position, self.unit, self.loop_end_text, self.trace
        )
    }
}

#[cfg(test)]
mod tests {
    use loopcheck_ir::{Incoming, UnitBuilder};

    use super::*;
    use crate::progress::{walk_back, SearchOutcome};

    #[test]
    fn empty_block_is_rendered_by_id() {
        let mut builder = UnitBuilder::new("Gap.run()");
        let b0 = builder.append_block();
        let b1 = builder.append_block();
        let b2 = builder.append_block();
        let b3 = builder.append_block();

        builder.switch_to_block(b0);
        let start = builder.start();
        let header = builder.make_loop_header(7);
        builder.jump_to_loop(header);

        builder.switch_to_block(b1);
        builder.insert_loop_header(header);
        builder.op();
        builder.jump(b2);

        // Falls through to `b3` without holding any node.
        builder.add_edge(b2, b3);

        builder.switch_to_block(b3);
        let loop_end = builder.loop_end(header);
        builder.merge(header, &[Incoming::Value(start), Incoming::Itself]);
        let unit = builder.finish();

        let Ok(SearchOutcome::Endless(path)) = walk_back(&unit, header, loop_end, b3) else {
            panic!("expected the search to reach the header");
        };
        assert_eq!(path, vec![b3, b2, b1]);

        let endless = EndlessLoop::new(&unit, header, loop_end, path);
        assert_eq!(endless.trace, "n5|LoopEnd->block2->n4|Jump->n1|LoopHeader");
        assert_eq!(endless.position.bci, 7);
        assert_eq!(
            endless.snippet(),
            Some(
                "    block3: ; preds = block2
        n5|LoopEnd -> n1
    block2: ; preds = block1
    block1: ; preds = block0, block3
        n1|LoopHeader bci 7
        n6|Merge [n0, n6]
        n3|Op
        n4|Jump
"
            )
        );
    }
}
