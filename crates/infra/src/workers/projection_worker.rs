use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use unitrack_events::{EventBus, Subscription};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Counters shared between a worker thread and its handle.
#[derive(Debug, Default)]
pub struct WorkerStats {
    handled: AtomicU64,
    failed: AtomicU64,
}

impl WorkerStats {
    pub fn handled(&self) -> u64 {
        self.handled.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Handle to a running worker thread.
///
/// Dropping the handle also stops the worker, at the next poll tick.
#[derive(Debug)]
pub struct WorkerHandle {
    name: &'static str,
    stats: Arc<WorkerStats>,
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Request shutdown and wait for the worker thread to exit.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                warn!(worker = self.name, "worker thread panicked");
            }
        }
    }
}

/// Feeds every message published on a bus to a handler on a dedicated thread.
///
/// The subscription is taken inside `spawn`, so nothing published after it
/// returns is missed. Handler failures are logged and counted; the loop keeps
/// going, which requires handlers to tolerate redelivery.
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    pub fn spawn<M, B, H, E>(name: &'static str, bus: &B, mut handler: H) -> io::Result<WorkerHandle>
    where
        M: Send + 'static,
        B: EventBus<M>,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let subscription: Subscription<M> = bus.subscribe();
        let stats = Arc::new(WorkerStats::default());
        let worker_stats = stats.clone();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || run(name, subscription, shutdown_rx, &worker_stats, &mut handler))?;

        info!(worker = name, "projection worker started");
        Ok(WorkerHandle {
            name,
            stats,
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }
}

fn run<M, H, E>(
    name: &'static str,
    subscription: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    stats: &WorkerStats,
    handler: &mut H,
) where
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    loop {
        match shutdown_rx.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Disconnected) => break,
        }

        match subscription.recv_timeout(POLL_INTERVAL) {
            Ok(message) => match handler(message) {
                Ok(()) => {
                    stats.handled.fetch_add(1, Ordering::Relaxed);
                }
                Err(err) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(worker = name, error = ?err, "projection handler failed");
                }
            },
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    debug!(
        worker = name,
        handled = stats.handled(),
        failed = stats.failed(),
        "projection worker stopped"
    );
}
