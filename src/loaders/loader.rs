//! Common loader types: progress, events, errors, and the decoder trait.

use super::{AssetSource, LoadTask};
use thiserror::Error;

/// Byte progress of a single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadProgress {
    /// Bytes received so far.
    pub loaded: u64,
    /// Total bytes, when the source knows it.
    pub total: Option<u64>,
}

impl LoadProgress {
    /// Create a progress report.
    pub fn new(loaded: u64, total: Option<u64>) -> Self {
        Self { loaded, total }
    }

    /// Fraction in `[0, 1]`, or `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(1.0),
            Some(total) => Some((self.loaded as f64 / total as f64).clamp(0.0, 1.0) as f32),
            None => None,
        }
    }

    /// Whole percentage in `[0, 100]`, or `None` when the total is unknown.
    pub fn percentage(&self) -> Option<u32> {
        self.fraction().map(|f| (f * 100.0).floor() as u32)
    }

    /// True once every byte of a known total has arrived.
    pub fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.loaded >= total)
    }
}

/// Event delivered by [`LoadTask::poll`].
#[derive(Debug)]
pub enum LoadEvent<T> {
    /// More bytes arrived.
    Progress(LoadProgress),
    /// The asset finished loading and decoding.
    Loaded(T),
    /// The load failed. No further events follow.
    Failed(LoadError),
}

impl<T> LoadEvent<T> {
    /// True for `Loaded` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Errors produced while fetching or decoding an asset.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source has no asset at this path.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Reading from the filesystem failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Resolved path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A network fetch failed.
    #[error("failed to fetch {path}: {message}")]
    Fetch {
        /// Resolved URL.
        path: String,
        /// Description from the host.
        message: String,
    },

    /// The bytes could not be decoded into the requested asset.
    #[error("failed to decode asset: {0}")]
    Decode(String),

    /// The task was cancelled before it finished.
    #[error("load cancelled")]
    Cancelled,
}

/// Turns fetched bytes into an asset.
pub trait Loader: Copy + Send + 'static {
    /// Decoded asset type.
    type Asset: Send + 'static;

    /// Decode a complete byte buffer.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Asset, LoadError>;

    /// Fetch `path` from `source` and decode it off the frame path.
    fn load(&self, source: &dyn AssetSource, path: &str) -> LoadTask<Self::Asset> {
        let loader = *self;
        LoadTask::spawn(source, path, move |bytes| loader.decode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_clamped() {
        assert_eq!(LoadProgress::new(50, Some(100)).fraction(), Some(0.5));
        assert_eq!(LoadProgress::new(150, Some(100)).fraction(), Some(1.0));
        assert_eq!(LoadProgress::new(0, Some(0)).fraction(), Some(1.0));
    }

    #[test]
    fn test_unknown_total_is_indeterminate() {
        let progress = LoadProgress::new(1024, None);
        assert_eq!(progress.fraction(), None);
        assert_eq!(progress.percentage(), None);
        assert!(!progress.is_complete());
    }

    #[test]
    fn test_percentage() {
        assert_eq!(LoadProgress::new(1, Some(3)).percentage(), Some(33));
        assert!(LoadProgress::new(3, Some(3)).is_complete());
    }
}
