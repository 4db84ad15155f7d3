#[cfg(test)]
#[path = "stream_control_test.rs"]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Mutex;
use std::sync::MutexGuard;

use tokio_util::sync::CancellationToken;

/// State shared between the session loop and the keypress listener.
///
/// Only the session loop ever marks a stream as started. The listener reads
/// the flag and, while a stream is in flight, fires the current cancellation
/// token. A fired token is swapped for a fresh one straight away so it can
/// never be triggered twice.
#[derive(Debug, Default)]
pub struct StreamControl {
    streaming: AtomicBool,
    token: Mutex<CancellationToken>,
}

impl StreamControl {
    fn token(&self) -> MutexGuard<'_, CancellationToken> {
        return self
            .token
            .lock()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());
    }

    pub fn is_streaming(&self) -> bool {
        return self.streaming.load(Ordering::SeqCst);
    }

    /// Installs a fresh cancellation token for a new provider call and
    /// returns it.
    pub fn begin(&self) -> CancellationToken {
        let mut token = self.token();
        *token = CancellationToken::new();
        self.streaming.store(true, Ordering::SeqCst);

        return token.clone();
    }

    pub fn finish(&self) {
        self.streaming.store(false, Ordering::SeqCst);
    }

    /// Cancels the in-flight stream. Returns false without doing anything
    /// when no stream is being drained.
    pub fn interrupt(&self) -> bool {
        let mut token = self.token();
        if !self.streaming.swap(false, Ordering::SeqCst) {
            return false;
        }

        token.cancel();
        *token = CancellationToken::new();
        tracing::debug!("Cancelled the in-flight completion");

        return true;
    }
}
