//! Dataset retrieval and caching pipeline.
//!
//! The pull path resolves every file of a dataset version through three
//! tiers (destination-satisfied, cache-satisfied with re-verification,
//! network fetch), stages the obtained set in a scratch directory, and
//! commits it into the destination only when the whole set succeeded.
//! The update path enumerates cached datasets and drives the same
//! pipeline for any that are stale.

pub use self::client::{ClientError, ClientSettings};
pub use self::error::PullError;
pub use self::layout::{CacheEntry, CacheLayout, format_size};
pub use self::pull::{
    MAX_PARALLELISM, Provenance, PullOutcome, PullRequest, PulledFile, pull, target_filename,
};
pub use self::ui::{OutputMode, Reporter};
pub use self::update::{UpdateCheck, cached_dataset_ids, cached_versions, scan_updates};

pub mod runtime;

mod client;
mod error;
mod fetch;
mod layout;
mod pull;
mod ui;
mod update;
