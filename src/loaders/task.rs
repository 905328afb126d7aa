//! Cancellable load handles polled once per frame.

use super::{AssetSource, LoadError, LoadEvent, LoadProgress};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;

type ProgressFn = Box<dyn FnMut(LoadProgress) + Send>;
type CompleteFn = Box<dyn FnOnce(Result<Vec<u8>, LoadError>) + Send>;

/// Receiving end handed to an [`AssetSource`] for one fetch.
///
/// Progress reports are made monotonic here, so sources may report raw
/// byte counts. Nothing is delivered once the task is cancelled.
pub struct ByteSink {
    progress: ProgressFn,
    complete: CompleteFn,
    cancelled: Arc<AtomicBool>,
    loaded: u64,
}

impl ByteSink {
    /// True once the owning task was cancelled or dropped.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Report bytes received so far.
    pub fn progress(&mut self, loaded: u64, total: Option<u64>) {
        if self.is_cancelled() || loaded < self.loaded {
            return;
        }
        self.loaded = loaded;
        (self.progress)(LoadProgress::new(loaded, total));
    }

    /// Hand over the complete payload, or the reason there is none.
    pub fn finish(self, result: Result<Vec<u8>, LoadError>) {
        if self.is_cancelled() {
            return;
        }
        (self.complete)(result);
    }
}

/// Handle to an in-flight load.
///
/// Events travel over a channel and are picked up by [`poll`](Self::poll),
/// so a result always lands on a later frame than the request.
pub struct LoadTask<T> {
    path: String,
    receiver: Receiver<LoadEvent<T>>,
    cancelled: Arc<AtomicBool>,
    finished: bool,
}

impl<T: Send + 'static> LoadTask<T> {
    /// Start fetching `path` from `source`; `decode` runs wherever the
    /// source completes (a worker thread for files).
    pub fn spawn<D>(source: &dyn AssetSource, path: &str, decode: D) -> Self
    where
        D: FnOnce(&[u8]) -> Result<T, LoadError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let sink = Self::sink(sender, Arc::clone(&cancelled), decode);
        source.fetch(path, sink);

        Self {
            path: path.to_string(),
            receiver,
            cancelled,
            finished: false,
        }
    }

    fn sink<D>(sender: Sender<LoadEvent<T>>, cancelled: Arc<AtomicBool>, decode: D) -> ByteSink
    where
        D: FnOnce(&[u8]) -> Result<T, LoadError> + Send + 'static,
    {
        let progress_sender = sender.clone();
        let complete_flag = Arc::clone(&cancelled);
        ByteSink {
            progress: Box::new(move |progress| {
                let _ = progress_sender.send(LoadEvent::Progress(progress));
            }),
            complete: Box::new(move |result| {
                let event = match result.and_then(|bytes| decode(&bytes)) {
                    Ok(asset) => LoadEvent::Loaded(asset),
                    Err(err) => LoadEvent::Failed(err),
                };
                if !complete_flag.load(Ordering::Acquire) {
                    let _ = sender.send(event);
                }
            }),
            cancelled,
            loaded: 0,
        }
    }
}

impl<T> LoadTask<T> {
    /// Requested path.
    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next pending event, if any. Returns `None` forever after a terminal
    /// event or cancellation.
    pub fn poll(&mut self) -> Option<LoadEvent<T>> {
        if self.finished || self.is_cancelled() {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(event) => {
                self.finished = event.is_terminal();
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                Some(LoadEvent::Failed(LoadError::Fetch {
                    path: self.path.clone(),
                    message: "source dropped the request".to_string(),
                }))
            }
        }
    }

    /// Stop delivering events. The source stops early where it can.
    pub fn cancel(&mut self) {
        if !self.finished {
            log::debug!("{}: load cancelled", self.path);
        }
        self.cancelled.store(true, Ordering::Release);
    }

    /// True after `cancel`.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// True after a terminal event was delivered.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T> Drop for LoadTask<T> {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loaders::MemorySource;

    fn drain<T>(task: &mut LoadTask<T>) -> Vec<LoadEvent<T>> {
        std::iter::from_fn(|| task.poll()).collect()
    }

    #[test]
    fn test_memory_load_delivers_progress_then_asset() {
        let mut source = MemorySource::new();
        source.insert("a.bin", vec![1, 2, 3, 4]);

        let mut task = LoadTask::spawn(&source, "a.bin", |bytes| Ok(bytes.len()));
        let events = drain(&mut task);

        assert!(matches!(events.first(), Some(LoadEvent::Progress(p)) if p.fraction() == Some(1.0)));
        assert!(matches!(events.last(), Some(LoadEvent::Loaded(4))));
        assert!(task.is_finished());
        assert!(task.poll().is_none());
    }

    #[test]
    fn test_decode_error_is_failure() {
        let mut source = MemorySource::new();
        source.insert("bad", vec![0]);

        let mut task: LoadTask<()> =
            LoadTask::spawn(&source, "bad", |_| Err(LoadError::Decode("nope".into())));
        let events = drain(&mut task);
        assert!(matches!(events.last(), Some(LoadEvent::Failed(LoadError::Decode(_)))));
    }

    #[test]
    fn test_cancelled_task_delivers_nothing() {
        let mut source = MemorySource::new();
        source.insert("a.bin", vec![0; 16]);

        let mut task = LoadTask::spawn(&source, "a.bin", |bytes| Ok(bytes.to_vec()));
        task.cancel();
        assert!(task.is_cancelled());
        assert!(task.poll().is_none());
    }

    #[test]
    fn test_sink_progress_is_monotonic() {
        let (sender, receiver) = mpsc::channel::<LoadEvent<()>>();
        let flag = Arc::new(AtomicBool::new(false));
        let mut sink = LoadTask::sink(sender, Arc::clone(&flag), |_| Ok(()));

        sink.progress(10, Some(100));
        sink.progress(5, Some(100));
        sink.progress(60, Some(100));
        flag.store(true, Ordering::Release);
        sink.progress(90, Some(100));

        let loaded: Vec<u64> = receiver
            .try_iter()
            .filter_map(|e| match e {
                LoadEvent::Progress(p) => Some(p.loaded),
                _ => None,
            })
            .collect();
        assert_eq!(loaded, vec![10, 60]);
    }
}
