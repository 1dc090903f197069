pub mod error;
pub mod fingerprint;
pub mod models;
pub mod storage;
pub mod types;

pub use error::Error;
pub use fingerprint::Fingerprint;
pub use models::{Similarity, Summarizer};
pub use storage::{ArticleStore, MembershipInsert, StoryStore, SummaryStore};
pub use types::{
    Article, StoryMembership, SummaryRecord, SummaryStyle, TrackedStory, TrackingContext,
};

pub type Result<T> = std::result::Result<T, Error>;
