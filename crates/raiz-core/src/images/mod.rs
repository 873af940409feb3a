//! Plant image pipeline: URL normalization, preload cache, probing and
//! retrying loads.

pub mod cache;
pub mod error;
pub mod loader;
pub mod probe;
pub mod url;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::PreloadCache;
pub use error::{LoadError, LoadResult};
pub use loader::{ImageLoader, RetryPolicy};
pub use probe::{HttpImageProbe, ImageProbe};
pub use url::{UrlKind, UrlNormalizer};
