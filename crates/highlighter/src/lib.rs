//! Dark pattern highlighter
//!
//! Watches a live, mutating page tree and flags elements that use
//! manipulative interface patterns: fake countdowns, false urgency, forced
//! continuity pricing, disguised ads and subscription traps.
//!
//! # How a scan works
//!
//! 1. **Stamp**: every element gets a stable phid, mirrored into `data-phid`
//! 2. **Snapshot twice**: a comparison window apart, blacklist cut out
//! 3. **Match**: children before parents, a match removes the element from
//!    both snapshots so its text is claimed only once
//! 4. **Annotate**: matches become classes on the live tree
//! 5. **Report**: counts go out to every registered reporter
//!
//! Mutation bursts are debounced: the engine stops listening while it scans
//! and drops any request that arrives in the meantime.

pub mod catalog;
pub mod config;
pub mod countdown;
pub mod document;
pub mod error;
pub mod events;
pub mod matcher;
pub mod messages;
pub mod pattern;
pub mod reporter;
pub mod results;
pub mod scheduler;

#[cfg(test)]
mod test_support;

pub use config::{EngineConfig, Markers};
pub use document::LiveDocument;
pub use error::{HighlighterError, Result, ValidationError};
pub use events::{EventBus, MutationRecord};
pub use matcher::PatternMatch;
pub use messages::{ControlMessage, ControlResponse};
pub use pattern::{Detector, DetectorSpec, Pattern, PatternRegistry, PatternSpec};
pub use reporter::{ChannelReporter, LogReporter, ReporterManager, ResultReporter};
pub use results::{PatternResult, ScanResult};
pub use scheduler::{Engine, ScanState};
