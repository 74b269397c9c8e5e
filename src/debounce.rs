use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Runs only the last of a burst of scheduled tasks, once `delay` has passed
/// without a newer one arriving.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task`, superseding anything still waiting.
    ///
    /// The handle resolves to `true` if the task ran, `false` if it was
    /// superseded or cancelled before its delay elapsed.
    pub fn schedule<F>(&self, task: F) -> JoinHandle<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) != ticket {
                tracing::debug!("Debounced task {} superseded", ticket);
                return false;
            }
            task.await;
            true
        })
    }

    /// Drop whatever is waiting
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }
}

/// A [`Debouncer`] per key. Bursts on one key never supersede another's.
#[derive(Debug)]
pub struct KeyedDebouncer<K> {
    delay: Duration,
    slots: Arc<Mutex<HashMap<K, Debouncer>>>,
}

impl<K> Clone for KeyedDebouncer<K> {
    fn clone(&self) -> Self {
        Self {
            delay: self.delay,
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<K: Eq + Hash> KeyedDebouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn slot(&self, key: K) -> Debouncer {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry(key)
            .or_insert_with(|| Debouncer::new(self.delay))
            .clone()
    }

    /// Schedule `task` under `key`, superseding only that key's pending task
    pub fn schedule<F>(&self, key: K, task: F) -> JoinHandle<bool>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.slot(key).schedule(task)
    }

    pub fn cancel(&self, key: K) {
        self.slot(key).cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[tokio::test(start_paused = true)]
    async fn only_last_of_a_burst_runs() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let hits = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 1..=3 {
            let hits = hits.clone();
            let last = last.clone();
            handles.push(debouncer.schedule(async move {
                hits.fetch_add(1, Ordering::SeqCst);
                last.store(i, Ordering::SeqCst);
            }));
            tokio::time::advance(Duration::from_millis(100)).await;
        }

        let ran: Vec<bool> = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(ran, vec![false, false, true]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(last.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn spaced_calls_each_run() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let first = debouncer.schedule(async {});
        assert!(first.await.unwrap());
        let second = debouncer.schedule(async {});
        assert!(second.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_task() {
        let debouncer = Debouncer::new(Duration::from_millis(500));
        let handle = debouncer.schedule(async {});
        debouncer.cancel();
        assert!(!handle.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn keys_debounce_independently() {
        let debouncer = KeyedDebouncer::new(Duration::from_millis(500));
        let first = debouncer.schedule("all", async {});
        tokio::time::advance(Duration::from_millis(100)).await;
        let other = debouncer.schedule("mine", async {});
        tokio::time::advance(Duration::from_millis(100)).await;
        let second = debouncer.schedule("mine", async {});

        assert!(first.await.unwrap());
        assert!(!other.await.unwrap());
        assert!(second.await.unwrap());
    }
}
