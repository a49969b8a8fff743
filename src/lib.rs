pub mod catalog;
pub mod dedupe;
pub mod digest;
pub mod fetcher;
pub mod html;
pub mod parser;
pub mod reader;
pub mod researcher;
pub mod storage;
pub mod summarize;
pub mod types;

pub use catalog::{Catalog, JsonCatalog, MemoryCatalog};
pub use fetcher::{Fetch, FetchConfig, FetchedPage, HttpFetcher};
pub use reader::ReaderAgent;
pub use researcher::ResearcherAgent;
pub use storage::{FeedbackQueue, FeedbackStore};
pub use summarize::{ArticleExtract, SummaryExtractor};
pub use types::*;
