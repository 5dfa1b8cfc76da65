//! Sociogram core: topology generation + fail-fast statement execution.
//!
//! ```text
//! ┌──────────────┐   Vec<Operation>   ┌──────────────────┐   statement   ┌──────────────────┐
//! │   Topology   │───────────────────►│ Statement Runner │──────────────►│ ExecutionChannel │
//! │  Generator   │                    │  (one in flight) │◄──────────────│  (remote store)  │
//! └──────────────┘                    └──────────────────┘   ok / error  └──────────────────┘
//!                                              │
//!                                              ▼
//!                                         RunObserver
//! ```
//!
//! The generator is pure (names + RNG in, operations out). The runner owns the
//! ordering guarantee: operation `N + 1` is only submitted after operation `N`
//! has been observed to succeed, and the first failure halts the run.
//!
//! The remote graph store is never visible here; everything goes through the
//! [`channel::ExecutionChannel`] trait.

pub mod channel;
pub mod generator;
pub mod operation;
pub mod runner;
pub mod statement;

pub use channel::{ChannelConnector, ChannelError, ExecutionChannel, RecordingChannel};
pub use generator::{
    construct_sociogram, summarize, PlanSummary, SamplingRange, TopologyGenerator,
    MAX_EDGES_PER_ENTITY,
};
pub use operation::{Operation, OperationKind};
pub use runner::{
    execute_scoped, NullObserver, OperationReport, RunObserver, RunReport, RunState,
    StatementRunner,
};
