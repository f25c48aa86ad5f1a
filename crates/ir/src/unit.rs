use crate::{Graph, LoopForest, Schedule};

/// One compiled unit: its node graph together with the block schedule computed for it.
#[derive(Debug, Clone, Default)]
pub struct Unit {
    pub graph: Graph,
    pub schedule: Schedule,
}

impl Unit {
    pub fn new(graph: Graph, schedule: Schedule) -> Self {
        Self { graph, schedule }
    }

    pub fn name(&self) -> &str {
        &self.graph.name
    }

    /// Computes the loop decomposition of the scheduled unit.
    pub fn compute_loops(&self) -> LoopForest {
        let mut forest = LoopForest::new();
        forest.compute(&self.graph, &self.schedule);
        forest
    }
}
