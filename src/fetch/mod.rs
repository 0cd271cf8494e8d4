//! Source image retrieval: fetch with bounded retry, short-lived TTL cache

pub mod cache;
pub mod fetcher;

pub use fetcher::{FetchedImage, FetcherConfig, ImageFetcher};
