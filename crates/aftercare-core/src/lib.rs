//! Core types for post-operative risk triage: field and flow registries,
//! patient records and their canonical text serialisation, and projection of
//! classified records into durable-log rows.

pub mod error;
pub mod fields;
pub mod flows;
pub mod logbook;
pub mod record;

pub use error::ConfigError;
pub use fields::{FieldDef, FieldRegistry};
pub use flows::{Flow, FlowRegistry};
pub use record::{FieldValue, PatientRecord, serialize_record};
