pub mod builder;
pub mod graph;
pub mod ir_writer;
pub mod loops;
pub mod node;
pub mod schedule;
pub mod unit;

pub use builder::{Incoming, UnitBuilder};
pub use graph::Graph;
pub use loops::{LoopForest, LoopId};
pub use node::{NodeId, NodeKind, SourcePosition};
pub use schedule::{BlockId, Schedule};
pub use unit::Unit;
