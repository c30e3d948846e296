//! fincast-vector
//!
//! LanceDB-backed persistent chunk index. `build_or_load` is the only way to
//! obtain a `VectorIndex`; once built, the index is read-only.

pub mod schema;
pub mod search;
pub mod store;
pub mod table;
pub mod writer;

pub use search::VectorIndex;
pub use store::{build_or_load, IndexOptions};
pub use table::IndexManifest;
