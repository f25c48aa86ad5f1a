use std::io;

use crate::{node::NodeKind, schedule::BlockId, NodeId, Unit};

pub struct UnitWriter<'a> {
    unit: &'a Unit,
}

impl<'a> UnitWriter<'a> {
    pub fn new(unit: &'a Unit) -> Self {
        Self { unit }
    }

    pub fn write(&self, mut w: impl io::Write) -> io::Result<()> {
        writeln!(w, "unit {} {{", self.unit.graph.name)?;
        for block in self.unit.schedule.iter_block() {
            self.write_block(block, &mut w)?;
        }
        writeln!(w, "}}")
    }

    /// Writes only `blocks`, in the given order.
    pub fn write_blocks(&self, blocks: &[BlockId], mut w: impl io::Write) -> io::Result<()> {
        for &block in blocks {
            self.write_block(block, &mut w)?;
        }
        Ok(())
    }

    pub fn dump_string(&self) -> io::Result<String> {
        let mut s = Vec::new();
        self.write(&mut s)?;
        String::from_utf8(s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    pub fn dump_blocks(&self, blocks: &[BlockId]) -> io::Result<String> {
        let mut s = Vec::new();
        self.write_blocks(blocks, &mut s)?;
        String::from_utf8(s).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn write_block(&self, block: BlockId, mut w: impl io::Write) -> io::Result<()> {
        let schedule = &self.unit.schedule;
        write!(w, "    {block}:")?;
        let preds = schedule.preds_of(block);
        if !preds.is_empty() {
            write!(w, " ; preds =")?;
            for (i, pred) in preds.iter().enumerate() {
                let delim = if i == 0 { " " } else { ", " };
                write!(w, "{delim}{pred}")?;
            }
        }
        writeln!(w)?;

        for &node in schedule.nodes_of(block) {
            write!(w, "        ")?;
            self.write_node(node, &mut w)?;
            writeln!(w)?;

            if self.unit.graph.is_loop_header(node) {
                for merge in self.unit.graph.merges_of(node) {
                    write!(w, "        ")?;
                    self.write_node(merge, &mut w)?;
                    writeln!(w)?;
                }
            }
        }
        Ok(())
    }

    fn write_node(&self, node: NodeId, mut w: impl io::Write) -> io::Result<()> {
        let graph = &self.unit.graph;
        write!(w, "{}", graph.display_node(node))?;
        match graph.kind(node) {
            NodeKind::LoopHeader(data) => write!(w, " {}", data.position),
            NodeKind::LoopEnd { header } => write!(w, " -> {header}"),
            NodeKind::LoopExit { header } => write!(w, " of {header}"),
            NodeKind::Merge(data) => {
                write!(w, " [")?;
                for (i, operand) in data.operands.iter().enumerate() {
                    if i > 0 {
                        write!(w, ", ")?;
                    }
                    write!(w, "{operand}")?;
                }
                write!(w, "]")
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{Incoming, UnitBuilder};

    #[test]
    fn dump_unit() {
        let mut builder = UnitBuilder::new("Counter.spin(int)");
        let b0 = builder.append_block();
        let b1 = builder.append_block();
        let b2 = builder.append_block();

        builder.switch_to_block(b0);
        let init = builder.start();
        let header = builder.make_loop_header(4);
        builder.jump_to_loop(header);

        builder.switch_to_block(b1);
        builder.insert_loop_header(header);
        builder.mutation();
        builder.jump(b2);

        builder.switch_to_block(b2);
        builder.loop_end(header);

        builder.merge(header, &[Incoming::Value(init), Incoming::Itself]);
        let unit = builder.finish();

        let text = UnitWriter::new(&unit).dump_string().unwrap();
        assert_eq!(
            text,
            "unit Counter.spin(int) {
    block0:
        n0|Start
        n2|Jump
    block1: ; preds = block0, block2
        n1|LoopHeader bci 4
        n6|Merge [n0, n6]
        n3|Mutation
        n4|Jump
    block2: ; preds = block1
        n5|LoopEnd -> n1
}
"
        );
    }
}
