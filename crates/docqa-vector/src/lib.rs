//! docqa-vector
//!
//! In-memory exact-search vector index, the ordered chunk registry that sits
//! beside it, and the three-file snapshot both are persisted to.

pub mod corpus;
pub mod index;
pub mod registry;
pub mod snapshot;

pub use corpus::Corpus;
pub use index::FlatIndex;
pub use registry::Registry;
pub use snapshot::SnapshotStore;
