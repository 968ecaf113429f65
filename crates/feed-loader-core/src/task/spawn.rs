//! Runs blocking load work on a dedicated worker thread.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use anyhow::anyhow;
use tracing::{debug, warn};

use super::{Completer, TaskHandle, TaskRegistry};
use crate::ports::{Completion, FetchResult};

/// Registers `completion` and runs `work` on a named thread.
///
/// The worker skips `work` entirely when the load is cancelled before it
/// starts. If the thread cannot be spawned, the failure is delivered through
/// `completion` on the calling thread.
pub fn spawn_load<W>(
    registry: &Arc<TaskRegistry>,
    thread_name: &str,
    completion: Completion,
    work: W,
) -> TaskHandle
where
    W: FnOnce(&Completer) -> FetchResult + Send + 'static,
{
    let (handle, completer) = registry.register(completion);

    // Parked here so a failed spawn can still reach the completion.
    let pending = Arc::new(Mutex::new(Some(completer)));
    let worker = Arc::clone(&pending);

    let spawned = thread::Builder::new()
        .name(thread_name.to_string())
        .spawn(move || {
            let Some(completer) = worker.lock().unwrap_or_else(PoisonError::into_inner).take()
            else {
                return;
            };
            if completer.is_cancelled() {
                debug!("Load cancelled before it started");
                return;
            }
            let result = work(&completer);
            completer.complete(result);
        });

    if let Err(e) = spawned {
        warn!("Failed to spawn {thread_name} worker: {e}");
        let completer = pending.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(completer) = completer {
            completer.complete(Err(anyhow!(e).context("failed to start image load worker")));
        }
    }

    handle
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ports::FeedImageDataLoaderTask;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_spawn_load_delivers_on_worker_thread() {
        let registry = TaskRegistry::new();
        let (tx, rx) = mpsc::channel();

        let _handle = spawn_load(
            &registry,
            "feed-image-test",
            Box::new(move |result| {
                let name = thread::current().name().map(str::to_string);
                tx.send((name, result.unwrap())).unwrap();
            }),
            |_| Ok(vec![7, 7]),
        );

        let (name, data) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("feed-image-test"));
        assert_eq!(data, vec![7, 7]);
    }

    #[test]
    fn test_spawn_load_cancelled_while_working_never_delivers() {
        let registry = TaskRegistry::new();
        let (tx, rx) = mpsc::channel::<FetchResult>();
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let handle = spawn_load(
            &registry,
            "feed-image-test",
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
            move |completer| {
                started_tx.send(()).unwrap();
                release_rx.recv().unwrap();
                assert!(completer.is_cancelled());
                Ok(vec![1])
            },
        );

        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        handle.cancel();
        release_tx.send(()).unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(registry.in_flight(), 0);
    }
}
