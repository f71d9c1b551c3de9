//! Keyed debouncing.
//!
//! Every call to [`Debouncer::settle`] for a key supersedes the previous one.
//! Only the call that sees a full quiet period without a newer call for the
//! same key fires.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Default quiet period before a typed query is answered.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Outcome of [`Debouncer::settle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// No newer call arrived during the quiet period.
    Fire,
    /// A newer call for the same key replaced this one.
    Superseded,
}

/// Per-key generation counters.
#[derive(Clone)]
pub struct Debouncer<K> {
    quiet: Duration,
    generations: Arc<Mutex<HashMap<K, u64>>>,
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}

impl<K> Debouncer<K> {
    #[must_use]
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            generations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        self.quiet
    }
}

impl<K: Hash + Eq + Clone> Debouncer<K> {
    /// Wait out the quiet period for `key`.
    ///
    /// Returns [`Settled::Fire`] if this is still the latest call for `key`
    /// afterwards. The key is forgotten once its latest call settles or is
    /// dropped mid-wait.
    pub async fn settle(&self, key: K) -> Settled {
        let generation = {
            let mut map = self.lock();
            let counter = map.entry(key.clone()).or_insert(0);
            *counter += 1;
            *counter
        };
        let pending = Pending {
            debouncer: self,
            key,
            generation,
        };

        tokio::time::sleep(self.quiet).await;

        if pending.is_latest() {
            Settled::Fire
        } else {
            Settled::Superseded
        }
    }

    /// Number of keys with a pending call.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, u64>> {
        // The map holds plain counters; a panic mid-update leaves it usable.
        self.generations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// One in-flight [`Debouncer::settle`] call. Removes its key on drop if no
/// newer call took over.
struct Pending<'a, K: Hash + Eq + Clone> {
    debouncer: &'a Debouncer<K>,
    key: K,
    generation: u64,
}

impl<K: Hash + Eq + Clone> Pending<'_, K> {
    fn is_latest(&self) -> bool {
        self.debouncer.lock().get(&self.key) == Some(&self.generation)
    }
}

impl<K: Hash + Eq + Clone> Drop for Pending<'_, K> {
    fn drop(&mut self) {
        let mut map = self.debouncer.lock();
        if map.get(&self.key) == Some(&self.generation) {
            map.remove(&self.key);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_single_call_fires_after_quiet_period() {
        let debouncer = Debouncer::<u8>::default();
        let start = tokio::time::Instant::now();
        assert_eq!(debouncer.settle(1).await, Settled::Fire);
        assert!(start.elapsed() >= DEFAULT_QUIET_PERIOD);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newer_call_supersedes_older() {
        let debouncer = Debouncer::<&str>::default();

        let first = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle("visitor").await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle("visitor").await }
        });

        assert_eq!(first.await.unwrap(), Settled::Superseded);
        assert_eq!(second.await.unwrap(), Settled::Fire);
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let debouncer = Debouncer::<u8>::default();
        let (a, b) = tokio::join!(debouncer.settle(1), debouncer.settle(2));
        assert_eq!(a, Settled::Fire);
        assert_eq!(b, Settled::Fire);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_after_quiet_period_both_fire() {
        let debouncer = Debouncer::<u8>::new(Duration::from_millis(50));
        assert_eq!(debouncer.settle(1).await, Settled::Fire);
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(debouncer.settle(1).await, Settled::Fire);
    }

    #[tokio::test]
    async fn test_zero_quiet_period() {
        let debouncer = Debouncer::<u8>::new(Duration::ZERO);
        assert_eq!(debouncer.quiet_period(), Duration::ZERO);
        assert_eq!(debouncer.settle(9).await, Settled::Fire);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_latest_call_forgets_key() {
        let debouncer = Debouncer::<u32>::default();

        let handles: Vec<_> = (0..100)
            .map(|visitor| {
                let debouncer = debouncer.clone();
                tokio::spawn(async move { debouncer.settle(visitor).await })
            })
            .collect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(debouncer.pending(), 100);

        for handle in &handles {
            handle.abort();
        }
        for handle in handles {
            assert!(handle.await.unwrap_err().is_cancelled());
        }
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(debouncer.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_older_call_keeps_newer_pending() {
        let debouncer = Debouncer::<u8>::default();

        let first = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle(1).await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        let second = tokio::spawn({
            let debouncer = debouncer.clone();
            async move { debouncer.settle(1).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());
        assert_eq!(debouncer.pending(), 1);
        assert_eq!(second.await.unwrap(), Settled::Fire);
        assert_eq!(debouncer.pending(), 0);
    }
}
