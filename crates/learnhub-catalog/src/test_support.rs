//! Key-value store double with injectable failures.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use learnhub_kv::{KeyValueStore, KvError, KvResult, MemoryKv};

type DeleteHook = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct FlakyKv {
    inner: MemoryKv,
    unavailable: AtomicBool,
    failing_deletes: AtomicUsize,
    delete_calls: AtomicUsize,
    after_delete: Mutex<Option<DeleteHook>>,
}

impl FlakyKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// The next `n` deletes fail.
    pub fn fail_next_deletes(&self, n: usize) {
        self.failing_deletes.store(n, Ordering::SeqCst);
    }

    /// Runs `hook` after every successful delete, before the caller sees the
    /// result.
    pub fn after_delete(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.after_delete.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> KvResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(KvError::unavailable("injected outage"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyKv {
    async fn get(&self, key: &str) -> KvResult<Option<Vec<u8>>> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> KvResult<()> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> KvResult<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let injected = self
            .failing_deletes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(KvError::unavailable("injected delete failure"));
        }
        let deleted = self.inner.delete(key).await?;
        if let Some(hook) = self.after_delete.lock().unwrap().as_ref() {
            hook(key);
        }
        Ok(deleted)
    }

    async fn ping(&self) -> KvResult<()> {
        self.check()
    }

    fn mode(&self) -> &'static str {
        "flaky"
    }
}
