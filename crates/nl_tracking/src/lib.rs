pub mod cache;
pub mod clustering;
pub mod config;
pub mod coordinator;
mod locks;

pub use cache::SummaryCache;
pub use clustering::{AssignmentDisposition, StoryAssignment, StoryClusteringEngine};
pub use config::TrackingConfig;
pub use coordinator::{ContextUpdate, PartOutcome, ProcessOutcome, TrackingCoordinator};

pub mod prelude {
    pub use super::{
        StoryClusteringEngine, SummaryCache, TrackingConfig, TrackingCoordinator,
    };
    pub use nl_core::{Article, Error, Result, SummaryStyle, TrackingContext};
}
