//! pomfix core library.
//!
//! Reads a Maven project descriptor (`pom.xml`) into a flat namespace of
//! dotted keys, caches it by content hash, and resolves `${key}`
//! placeholders in the build's configuration, build file and manifest.

pub mod cache;
pub mod config;
pub mod descriptor;
pub mod errors;
pub mod listing;
pub mod models;
pub mod pipeline;
pub mod rewrite;

pub use config::BuildConfig;
pub use errors::{PomfixError, PomfixResult};
pub use models::{FixOutcome, ProjectNamespace, RewriteStatus, TargetKind, TargetReport};
pub use pipeline::Pipeline;
