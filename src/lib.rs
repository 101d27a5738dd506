#![forbid(unsafe_code)]

pub mod fixture;
pub mod store;

pub use fixture::key::{DataWindow, WindowKey};
pub use fixture::loader::{LoadError, LoadedFixtures, load_fixtures};
pub use fixture::{
    InsightRecord, MaterializedScenario, RecordingEntry, ScenarioDescriptor, ScenarioRef,
};
pub use store::metadata::MetadataCatalogs;
pub use store::{ContainmentViolation, RecordingStore, StoreError};
