//! Version ordering for dataset version strings.
//!
//! Registries carry free-form version strings, so ordering is layered:
//! strict semver parses first, then a numeric-tuple extraction
//! (`2024-01`, `1.0.10`, `v3`), then plain lexicographic. The raw
//! string is the final tie-break, which makes the order total over any
//! input. This comparator is the single definition of "newest": cache
//! baselines and registry `latest` resolution both go through it, never
//! file modification times.

pub use self::key::{VersionKey, compare, latest, sorted};

mod key;
