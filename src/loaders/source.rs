//! Byte sources behind the loaders.

use super::{ByteSink, LoadError};
use std::collections::HashMap;
use std::sync::Arc;

/// Performs the raw byte fetch for a load.
///
/// Implementations must call [`ByteSink::finish`] exactly once, from any
/// thread, and may report progress before that.
pub trait AssetSource {
    /// Begin fetching `path`.
    fn fetch(&self, path: &str, sink: ByteSink);
}

/// Join a relative asset path onto a base directory or URL.
pub fn resolve_path(base: &str, path: &str) -> String {
    let is_absolute = path.starts_with('/') || path.contains("://");
    if base.is_empty() || is_absolute {
        return path.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches("./"))
}

/// Serves registered byte blobs synchronously.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    assets: HashMap<String, Arc<[u8]>>,
}

impl MemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under a path.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        self.assets.insert(path.into(), bytes.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetSource for MemorySource {
    fn fetch(&self, path: &str, mut sink: ByteSink) {
        match self.assets.get(path) {
            Some(bytes) => {
                let len = bytes.len() as u64;
                sink.progress(len, Some(len));
                sink.finish(Ok(bytes.to_vec()));
            }
            None => sink.finish(Err(LoadError::NotFound(path.to_string()))),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileSource;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use super::{resolve_path, AssetSource};
    use crate::loaders::{ByteSink, LoadError};
    use std::fs::File;
    use std::io::{ErrorKind, Read};

    const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

    /// Reads files on a worker thread, reporting progress per chunk.
    #[derive(Debug, Clone)]
    pub struct FileSource {
        base: String,
        chunk_size: usize,
    }

    impl FileSource {
        /// Resolve paths relative to `base`.
        pub fn new(base: impl Into<String>) -> Self {
            Self {
                base: base.into(),
                chunk_size: DEFAULT_CHUNK_SIZE,
            }
        }

        /// Override the read chunk size.
        pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
            self.chunk_size = chunk_size.max(1);
            self
        }

        fn read(path: &str, chunk_size: usize, sink: &mut ByteSink) -> Result<Vec<u8>, LoadError> {
            let io_err = |source: std::io::Error| match source.kind() {
                ErrorKind::NotFound => LoadError::NotFound(path.to_string()),
                _ => LoadError::Io {
                    path: path.to_string(),
                    source,
                },
            };

            let mut file = File::open(path).map_err(io_err)?;
            let total = file.metadata().map(|m| m.len()).ok();
            let mut bytes = Vec::with_capacity(total.unwrap_or(0) as usize);
            let mut chunk = vec![0u8; chunk_size];

            sink.progress(0, total);
            loop {
                if sink.is_cancelled() {
                    return Err(LoadError::Cancelled);
                }
                let n = file.read(&mut chunk).map_err(io_err)?;
                if n == 0 {
                    break;
                }
                bytes.extend_from_slice(&chunk[..n]);
                sink.progress(bytes.len() as u64, total);
            }
            Ok(bytes)
        }
    }

    impl AssetSource for FileSource {
        fn fetch(&self, path: &str, mut sink: ByteSink) {
            let resolved = resolve_path(&self.base, path);
            let chunk_size = self.chunk_size;
            let spawned = std::thread::Builder::new()
                .name(format!("load {path}"))
                .spawn(move || {
                    let result = Self::read(&resolved, chunk_size, &mut sink);
                    sink.finish(result);
                });
            if let Err(err) = spawned {
                log::error!("Failed to spawn loader thread for {}: {}", path, err);
            }
        }
    }
}

#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use fetch::FetchSource;

#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod fetch {
    use super::{resolve_path, AssetSource};
    use crate::loaders::{ByteSink, LoadError};
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    /// Fetches assets over HTTP with `window.fetch`.
    #[derive(Debug, Clone)]
    pub struct FetchSource {
        base_url: String,
    }

    impl FetchSource {
        /// Resolve paths relative to `base_url`.
        pub fn new(base_url: impl Into<String>) -> Self {
            Self {
                base_url: base_url.into(),
            }
        }
    }

    fn js_message(value: JsValue) -> String {
        value.as_string().unwrap_or_else(|| format!("{:?}", value))
    }

    async fn fetch_bytes(url: &str, sink: &mut ByteSink) -> Result<Vec<u8>, LoadError> {
        let fetch_err = |value: JsValue| LoadError::Fetch {
            path: url.to_string(),
            message: js_message(value),
        };

        let window = web_sys::window().ok_or_else(|| LoadError::Fetch {
            path: url.to_string(),
            message: "no window".to_string(),
        })?;
        let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(fetch_err)?
            .dyn_into()
            .map_err(fetch_err)?;

        if response.status() == 404 {
            return Err(LoadError::NotFound(url.to_string()));
        }
        if !response.ok() {
            return Err(LoadError::Fetch {
                path: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let total = response
            .headers()
            .get("Content-Length")
            .ok()
            .flatten()
            .and_then(|len| len.parse::<u64>().ok());
        sink.progress(0, total);

        if sink.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        let buffer = JsFuture::from(response.array_buffer().map_err(fetch_err)?)
            .await
            .map_err(fetch_err)?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        sink.progress(bytes.len() as u64, total.or(Some(bytes.len() as u64)));
        Ok(bytes)
    }

    impl AssetSource for FetchSource {
        fn fetch(&self, path: &str, mut sink: ByteSink) {
            let url = resolve_path(&self.base_url, path);
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_bytes(&url, &mut sink).await;
                sink.finish(result);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::{LoadEvent, LoadTask};

    #[test]
    fn test_resolve_path() {
        assert_eq!(resolve_path("", "a.glb"), "a.glb");
        assert_eq!(resolve_path("assets/", "3DModels/a.glb"), "assets/3DModels/a.glb");
        assert_eq!(resolve_path("assets", "./a.glb"), "assets/a.glb");
        assert_eq!(resolve_path("assets", "/abs/a.glb"), "/abs/a.glb");
        assert_eq!(resolve_path("assets", "https://x.y/a.glb"), "https://x.y/a.glb");
    }

    #[test]
    fn test_memory_missing_asset() {
        let source = MemorySource::new().with("present", vec![1u8]);
        let mut present = LoadTask::spawn(&source, "present", |bytes| Ok(bytes.to_vec()));
        let mut loaded = None;
        while let Some(event) = present.poll() {
            if let LoadEvent::Loaded(bytes) = event {
                loaded = Some(bytes);
            }
        }
        assert_eq!(loaded, Some(vec![1u8]));

        let mut task = LoadTask::spawn(&source, "absent", |bytes| Ok(bytes.to_vec()));
        assert!(matches!(task.poll(), Some(LoadEvent::Failed(LoadError::NotFound(_)))));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_source_reads_in_chunks() {
        let dir = std::env::temp_dir().join(format!("crt-scene-file-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("data.bin"), vec![7u8; 1000]).unwrap();

        let source = FileSource::new(dir.to_string_lossy().to_string()).with_chunk_size(100);
        let mut task = LoadTask::spawn(&source, "data.bin", |bytes| Ok(bytes.len()));

        let mut fractions = Vec::new();
        let mut loaded = None;
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        while loaded.is_none() && std::time::Instant::now() < deadline {
            match task.poll() {
                Some(LoadEvent::Progress(p)) => fractions.extend(p.fraction()),
                Some(LoadEvent::Loaded(n)) => loaded = Some(n),
                Some(LoadEvent::Failed(err)) => panic!("unexpected failure: {err}"),
                None => std::thread::yield_now(),
            }
        }

        assert_eq!(loaded, Some(1000));
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(fractions.last().copied(), Some(1.0));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_file_source_missing_file() {
        let source = FileSource::new("/nonexistent-crt-scene-dir");
        let mut task = LoadTask::spawn(&source, "missing.glb", |bytes| Ok(bytes.len()));

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        let mut event = None;
        while event.is_none() && std::time::Instant::now() < deadline {
            event = task.poll();
            std::thread::yield_now();
        }
        assert!(matches!(event, Some(LoadEvent::Failed(LoadError::NotFound(_)))));
    }
}
