#![allow(dead_code)]

use std::time::Duration;

use criterion::{Criterion, Throughput};
use texgraph::prelude::{ConnectorId, Graph, NodeId};

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn elements_throughput(elements: usize) -> Throughput {
    Throughput::Elements(elements.max(1) as u64)
}

/// `noise -> invert -> invert -> ...` with `len` nodes in total. Returns the ids
/// in chain order.
pub fn filter_chain(len: usize) -> (Graph, Vec<NodeId>) {
    let mut graph = Graph::with_builtins();
    let mut ids = vec![graph.create_node("noise")];
    for _ in 1..len.max(1) {
        let next = graph.create_node("invert");
        let prev = ids[ids.len() - 1];
        assert!(graph.connect(ConnectorId::output(prev, 0), ConnectorId::input(next, 0)));
        ids.push(next);
    }
    (graph, ids)
}
