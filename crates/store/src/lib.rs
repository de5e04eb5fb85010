pub mod store;

pub use store::{AnalysisRecord, RunParameters, RunSummary, SimStore, StoredDocument};
