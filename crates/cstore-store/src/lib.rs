//! cstore-store: the external collaborators consumed by the core
//!
//! This crate defines:
//! - `MetadataStore`, `ContentStore`, `KeyStore`: async interfaces over the
//!   underlying persistence, one trait per store
//! - `ContentBackends`: the fixed registry of physical content backends
//! - `router`: pure MIME-type to backend routing
//! - `compress`: the optional pre-encryption compression collaborator
//! - in-memory implementations of all three stores, used by tests and as a
//!   local/dev mode

pub mod backends;
pub mod compress;
pub mod memory;
pub mod router;
pub mod traits;

pub use backends::ContentBackends;
pub use compress::{should_compress, Compressor, ZstdCompressor};
pub use memory::{MemoryContentStore, MemoryKeyStore, MemoryMetadataStore};
pub use router::{backend_for, file_type_for};
pub use traits::{ContentStore, KeyRecord, KeyStore, MetadataStore};
