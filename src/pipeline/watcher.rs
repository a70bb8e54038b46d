//! Clipboard change detection
//!
//! A background thread polls the clipboard at a fixed interval and sends the
//! new content over a bounded channel whenever it is non-empty and differs
//! from the baseline. The channel holds at most one pending trigger: a
//! change landing while a run is in flight is queued for the next cycle,
//! and further changes before that are dropped.
//!
//! Writing results back through [`Watcher::commit`] reseeds the baseline
//! under the same lock as the poll comparison, so the tool's own writes never
//! trigger it again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::clipboard::{Clipboard, ClipboardError};

/// Poll sleeps in chunks this long so stop requests are honored promptly.
const STOP_CHECK: Duration = Duration::from_millis(50);

/// State shared between the poll thread and the controller.
struct WatchState {
    baseline: Mutex<String>,
    active: AtomicBool,
    running: AtomicBool,
}

impl WatchState {
    /// Compares one observed clipboard value against the baseline. The
    /// baseline advances on every non-empty change, even while suspended; a
    /// trigger fires only when active.
    fn observe(&self, content: &str, tx: &SyncSender<String>) {
        // A cleared clipboard is not a change worth running on. It neither
        // triggers nor advances the baseline, so restoring the old content
        // later does not retrigger either.
        if content.is_empty() {
            return;
        }
        let Ok(mut baseline) = self.baseline.lock() else {
            return;
        };
        if *baseline == content {
            return;
        }
        *baseline = content.to_string();
        if !self.active.load(Ordering::SeqCst) {
            return;
        }
        match tx.try_send(content.to_string()) {
            Ok(()) | Err(TrySendError::Full(_)) => {}
            Err(TrySendError::Disconnected(_)) => {
                self.running.store(false, Ordering::SeqCst);
            }
        }
    }
}

/// Handle to a running clipboard watcher.
pub struct Watcher {
    state: Arc<WatchState>,
    clipboard: Arc<dyn Clipboard + Sync>,
    handle: Option<JoinHandle<()>>,
}

impl Watcher {
    /// Starts polling. The initial clipboard content becomes the baseline,
    /// so pre-existing content never triggers a run.
    pub fn spawn(
        clipboard: Arc<dyn Clipboard + Sync>,
        interval: Duration,
    ) -> std::io::Result<(Self, Receiver<String>)> {
        let (tx, rx) = sync_channel::<String>(1);
        let state = Arc::new(WatchState {
            baseline: Mutex::new(clipboard.read().unwrap_or_default()),
            active: AtomicBool::new(true),
            running: AtomicBool::new(true),
        });

        let thread_state = Arc::clone(&state);
        let thread_clip = Arc::clone(&clipboard);
        let handle = thread::Builder::new()
            .name("clip-watch".into())
            .spawn(move || {
                while thread_state.running.load(Ordering::SeqCst) {
                    if let Ok(content) = thread_clip.read() {
                        thread_state.observe(&content, &tx);
                    }
                    sleep_interruptibly(&thread_state, interval);
                }
            })?;

        Ok((
            Self {
                state,
                clipboard,
                handle: Some(handle),
            },
            rx,
        ))
    }

    /// Writes pipeline output to the clipboard and reseeds the baseline in
    /// one critical section, so the write is invisible to the poll.
    pub fn commit(&self, text: &str) -> Result<(), ClipboardError> {
        let mut baseline = self
            .state
            .baseline
            .lock()
            .map_err(|_| std::io::Error::other("watcher state poisoned"))?;
        self.clipboard.write(text)?;
        *baseline = text.to_string();
        Ok(())
    }

    /// Stops triggering without stopping the poll; the baseline keeps
    /// following the clipboard.
    pub fn suspend(&self) {
        self.state.active.store(false, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.state.active.store(true, Ordering::SeqCst);
    }

    pub fn is_active(&self) -> bool {
        self.state.active.load(Ordering::SeqCst)
    }

    /// Stops the poll thread and waits for it to exit.
    pub fn stop(&mut self) {
        self.state.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sleep_interruptibly(state: &WatchState, interval: Duration) {
    let mut remaining = interval;
    while !remaining.is_zero() && state.running.load(Ordering::SeqCst) {
        let chunk = remaining.min(STOP_CHECK);
        thread::sleep(chunk);
        remaining -= chunk;
    }
}
