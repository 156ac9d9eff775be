//! Live DOM tree model for the pattern highlighter
//!
//! Arena-backed tree storage with the pieces the detection engine needs:
//! stable identities across time, blacklist-filtered snapshots, text and
//! visibility helpers.
//!
//! ## Core Design
//!
//! ```text
//! host JSON → DomArena (live) ──stamp──→ phid on every element
//!                 │
//!                 └──capture──→ Snapshot (detached copy, blacklist removed)
//! ```

pub mod arena;
pub mod error;
pub mod identity;
pub mod service;
pub mod snapshot;
pub mod types;
pub mod utils;

pub use arena::DomArena;
pub use error::{DomError, Result};
pub use identity::IdentityAssigner;
pub use service::{DomService, DomServiceConfig};
pub use snapshot::Snapshot;
pub use types::*;
