//! In-memory store backend with failure injection, for tests.

use crate::error::{StoreError, StoreResult};
use crate::ObjectStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Failure kind to inject on subsequent operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    Transient,
    Access,
    Timeout,
}

impl FailKind {
    fn to_error(self, path: &str) -> StoreError {
        match self {
            FailKind::Transient => StoreError::TransientIo(format!("injected: {path}")),
            FailKind::Access => StoreError::Access(format!("injected: {path}")),
            FailKind::Timeout => StoreError::Timeout { path: path.to_string(), budget_ms: 0 },
        }
    }
}

/// An injected failure: `remaining = None` fails every call until cleared;
/// `Some(n)` fails the next n calls, then clears itself.
#[derive(Debug, Clone, Copy)]
struct Injected {
    kind: FailKind,
    remaining: Option<usize>,
}

fn take_error(slot: &Mutex<Option<Injected>>, path: &str) -> Option<StoreError> {
    let mut guard = slot.lock().unwrap();
    let mut clear = false;
    let mut kind = None;
    if let Some(inj) = guard.as_mut() {
        match inj.remaining {
            None => kind = Some(inj.kind),
            Some(0) => clear = true,
            Some(n) => {
                inj.remaining = Some(n - 1);
                kind = Some(inj.kind);
            }
        }
    }
    if clear {
        *guard = None;
    }
    kind.map(|k| k.to_error(path))
}

/// In-memory blob store. A failed write never mutates the previous blob,
/// matching the atomic-replace semantics of the durable backends.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: Mutex<Option<Injected>>,
    fail_reads: Mutex<Option<Injected>>,
    write_attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `write` fail with `kind`; `None` restores.
    pub fn set_write_failure(&self, kind: Option<FailKind>) {
        *self.fail_writes.lock().unwrap() = kind.map(|kind| Injected { kind, remaining: None });
    }

    /// Makes every subsequent `read` fail with `kind`; `None` restores.
    pub fn set_read_failure(&self, kind: Option<FailKind>) {
        *self.fail_reads.lock().unwrap() = kind.map(|kind| Injected { kind, remaining: None });
    }

    /// Fails exactly the next `count` reads, then recovers.
    pub fn fail_next_reads(&self, kind: FailKind, count: usize) {
        *self.fail_reads.lock().unwrap() = Some(Injected { kind, remaining: Some(count) });
    }

    /// Fails exactly the next `count` writes, then recovers.
    pub fn fail_next_writes(&self, kind: FailKind, count: usize) {
        *self.fail_writes.lock().unwrap() = Some(Injected { kind, remaining: Some(count) });
    }

    /// Number of write calls attempted, including failed ones.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Seeds a blob directly, bypassing failure injection.
    pub fn put(&self, path: &str, bytes: &[u8]) {
        self.blobs.lock().unwrap().insert(path.to_string(), bytes.to_vec());
    }
}

impl ObjectStore for MemoryStore {
    fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        if let Some(err) = take_error(&self.fail_reads, path) {
            return Err(err);
        }
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn write(&self, path: &str, bytes: &[u8]) -> StoreResult<()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = take_error(&self.fail_writes, path) {
            return Err(err);
        }
        self.blobs.lock().unwrap().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.blobs.lock().unwrap().contains_key(path))
    }
}
