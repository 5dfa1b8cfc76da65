//! Random "who knows whom" topology over a fixed list of names.
//!
//! Output layout is always
//!
//! ```text
//! [ResetGraph] ++ [CreateVertex(n) for n in names] ++ [CreateEdge(..) per source, in name order]
//! ```
//!
//! so every edge is scheduled after both of its endpoints exist.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::operation::Operation;

/// Upper bound on outgoing `knows` edges per person.
pub const MAX_EDGES_PER_ENTITY: usize = 8;

/// Which indices are eligible as edge targets before self-exclusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingRange {
    /// `[0, count)`: every name can be chosen.
    #[default]
    Full,
    /// `[0, count - 1)`: the last name is never chosen as a target.
    Legacy,
}

impl SamplingRange {
    fn candidate_count(self, count: usize) -> usize {
        match self {
            Self::Full => count,
            Self::Legacy => count.saturating_sub(1),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyGenerator {
    sampling: SamplingRange,
}

impl TopologyGenerator {
    pub fn new(sampling: SamplingRange) -> Self {
        Self { sampling }
    }

    pub fn sampling(&self) -> SamplingRange {
        self.sampling
    }

    /// Build the full operation sequence for `names`.
    ///
    /// Names are expected to be distinct; generation itself cannot fail.
    pub fn generate<S, R>(&self, names: &[S], rng: &mut R) -> Vec<Operation>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let count = names.len();
        let candidates = self.sampling.candidate_count(count);

        let mut vertices = Vec::with_capacity(count);
        let mut edges = Vec::new();

        for (source, name) in names.iter().enumerate() {
            let name = name.as_ref();
            vertices.push(Operation::create_vertex(name));

            for target in sample_targets(source, candidates, rng) {
                edges.push(Operation::create_edge(name, names[target].as_ref()));
            }
        }

        tracing::debug!(
            vertices = vertices.len(),
            edges = edges.len(),
            sampling = ?self.sampling,
            "generated sociogram"
        );

        let mut operations = Vec::with_capacity(1 + vertices.len() + edges.len());
        operations.push(Operation::reset_graph());
        operations.extend(vertices);
        operations.extend(edges);
        operations
    }
}

/// Shuffle `[0, candidates)`, keep the first [`MAX_EDGES_PER_ENTITY`], then drop
/// `source`. Exclusion happens after selection, so a source that samples
/// itself ends up with fewer edges.
fn sample_targets<R>(source: usize, candidates: usize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let mut indices: Vec<usize> = (0..candidates).collect();
    indices.shuffle(rng);
    indices.truncate(MAX_EDGES_PER_ENTITY);
    indices.retain(|&target| target != source);
    indices
}

/// [`TopologyGenerator`] with the default sampling range.
pub fn construct_sociogram<S, R>(names: &[S], rng: &mut R) -> Vec<Operation>
where
    S: AsRef<str>,
    R: Rng + ?Sized,
{
    TopologyGenerator::default().generate(names, rng)
}

/// Counts per operation kind, for plan headers and run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub resets: usize,
    pub vertices: usize,
    pub edges: usize,
}

impl PlanSummary {
    pub fn total(&self) -> usize {
        self.resets + self.vertices + self.edges
    }
}

pub fn summarize(operations: &[Operation]) -> PlanSummary {
    let mut summary = PlanSummary::default();
    for op in operations {
        if op.is_vertex() {
            summary.vertices += 1;
        } else if op.is_edge() {
            summary.edges += 1;
        } else {
            summary.resets += 1;
        }
    }
    summary
}
