pub mod url_filter;

pub use url_filter::{
    CacheStatus, CheckOutcome, UrlFilterError, UrlFilterService, UrlFilterSettings,
};
