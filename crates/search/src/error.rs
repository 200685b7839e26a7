use thiserror::Error;
use wikipath_page_store::PageStoreError;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("All possibilities exhausted at '{at}' after {hops} hops")]
    Exhausted { at: String, hops: usize },

    #[error("Start page not found: {0}")]
    StartNotFound(String),

    #[error("Target page not found: {0}")]
    TargetNotFound(String),

    #[error("Hop limit of {0} reached without finding the target")]
    HopLimit(usize),

    #[error("Search cancelled")]
    Cancelled,

    #[error("Search has not been started")]
    NotStarted,

    #[error("Page store error: {0}")]
    PageStoreError(#[from] PageStoreError),
}
