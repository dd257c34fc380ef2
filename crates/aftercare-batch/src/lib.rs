//! Batch layer: fans (row × flow) classification units out against the
//! oracle under a bounded admission gate, and reassembles completed units
//! into output rows with stable column identity.

pub mod coordinator;
pub mod single;
pub mod table;

pub use coordinator::{
    BatchError, BatchOutcome, DEFAULT_MAX_CONCURRENT, UnitFailure, classify_batch,
};
pub use single::{AllFlowsOutcome, ClassifyError, classify_all_flows, classify_one, to_logged};
pub use table::{Table, TableError, UNAVAILABLE};
