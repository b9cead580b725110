//! Elementary cellular automaton simulation and aggregation.
//!
//! The crate simulates 1-D binary automata (8-bit Wolfram rules, toroidal
//! columns) over many independent initial configurations, fans the work
//! across a bounded worker pool, and reduces the finished boards into
//! per-cell statistical grids:
//!
//! - [`simulation`] - cells, boards, rule evaluation, seed generation
//! - [`dispatch`] - run batches and the parallel dispatcher
//! - [`query`] - the reduction engine and its result grids
//! - [`error`] - error taxonomy
//! - [`config`] - compile-time constants

pub mod config;
pub mod dispatch;
pub mod error;
pub mod query;
pub mod simulation;

pub use dispatch::{BoardSlot, DispatchHandle, DispatchStatus, Dispatcher, RunBatch};
pub use error::{BoardError, QueryError};
pub use query::{QueryBoard, QueryEngine, QueryHandle, QueryKind, QueryStatus};
pub use simulation::{Board, Cell, StreamFields};
