pub mod aggregator;
pub mod artwork;
pub mod config;
pub mod deadline;
pub mod metrics;
pub mod source;
pub mod testing;

pub use aggregator::{
    per_source_quota, Aggregator, CallOutcome, SourceSlot, SourceStatus, TierDecision,
    TieringPolicy,
};
pub use artwork::{Artwork, ArtworkBuilder, Rejected, SourceTag};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use deadline::{with_deadline, DeadlineError};
pub use source::{build_sources, ArtSource, SourceError, Tier};
