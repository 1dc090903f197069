pub mod backends;

pub use backends::*;

pub mod prelude {
    pub use super::backends::memory::MemoryStorage;
    pub use nl_core::{ArticleStore, StoryStore, SummaryStore};
}
