//! In-memory object client for testing.

use super::ObjectClient;
use crate::error::{StoreError, StoreResult, StoreStatus};
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

/// An object-client operation, used to target injected faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOp {
    /// [`ObjectClient::head`].
    Head,
    /// [`ObjectClient::get_range`].
    GetRange,
    /// [`ObjectClient::put`].
    Put,
    /// [`ObjectClient::delete`].
    Delete,
    /// [`ObjectClient::list`].
    List,
}

#[derive(Debug)]
struct Fault {
    op: ObjectOp,
    remaining: u32,
    status: StoreStatus,
}

/// An object store held in memory.
///
/// Suitable for:
/// - Unit and integration tests of the object-store driver
/// - Ephemeral storage that doesn't need persistence
///
/// Faults can be injected per operation to exercise transient-failure paths.
///
/// # Thread Safety
///
/// This client is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use storehouse::{InMemoryObjectClient, ObjectClient};
///
/// let client = InMemoryObjectClient::new();
/// client.put("logs/1", b"test data").unwrap();
/// assert_eq!(client.head("logs/1").unwrap(), Some(9));
/// assert_eq!(client.list("logs/").unwrap(), vec!["logs/1".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryObjectClient {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
    faults: Mutex<Vec<Fault>>,
}

impl InMemoryObjectClient {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` calls of `op` fail with `status`.
    ///
    /// `Success` is not a failure and is ignored.
    pub fn fail_next(&self, op: ObjectOp, count: u32, status: StoreStatus) {
        if status.is_success() || count == 0 {
            return;
        }
        self.faults.lock().push(Fault {
            op,
            remaining: count,
            status,
        });
    }

    /// Returns a copy of the object at `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.read().get(key).cloned()
    }

    /// Returns every key in the store.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.objects.read().keys().cloned().collect()
    }

    /// Returns the number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    /// Removes every object.
    pub fn clear(&self) {
        self.objects.write().clear();
    }

    fn check_fault(&self, op: ObjectOp, key: &str) -> StoreResult<()> {
        let mut faults = self.faults.lock();
        let Some(index) = faults.iter().position(|f| f.op == op) else {
            return Ok(());
        };

        let status = faults[index].status;
        faults[index].remaining -= 1;
        if faults[index].remaining == 0 {
            faults.remove(index);
        }
        Err(injected(status, key))
    }
}

fn injected(status: StoreStatus, key: &str) -> StoreError {
    let path = key.to_string();
    match status {
        StoreStatus::FileExists => StoreError::FileExists { path },
        StoreStatus::FileDoesNotExist => StoreError::FileDoesNotExist { path },
        StoreStatus::FileCorrupted => StoreError::FileCorrupted {
            path,
            reason: "injected fault".into(),
        },
        StoreStatus::EndOfFile => StoreError::EndOfFile {
            offset: 0,
            len: 0,
            size: 0,
            partial: Vec::new(),
        },
        StoreStatus::OutOfSpace => StoreError::OutOfSpace { path },
        StoreStatus::PermissionsError => StoreError::PermissionsError {
            path,
            reason: "injected fault".into(),
        },
        StoreStatus::InvalidArgument => StoreError::invalid(format!("{key}: injected fault")),
        StoreStatus::DomainMismatch
        | StoreStatus::ConnectionFailed
        | StoreStatus::Success => StoreError::connection(format!("{key}: injected fault")),
    }
}

impl ObjectClient for InMemoryObjectClient {
    fn head(&self, key: &str) -> StoreResult<Option<u64>> {
        self.check_fault(ObjectOp::Head, key)?;
        Ok(self.objects.read().get(key).map(|data| data.len() as u64))
    }

    fn get_range(&self, key: &str, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        self.check_fault(ObjectOp::GetRange, key)?;
        let objects = self.objects.read();
        let data = objects.get(key).ok_or_else(|| StoreError::not_found(key))?;

        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(data.len());
        let end = start.saturating_add(len).min(data.len());
        Ok(data[start..end].to_vec())
    }

    fn put(&self, key: &str, data: &[u8]) -> StoreResult<()> {
        self.check_fault(ObjectOp::Put, key)?;
        self.objects.write().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.check_fault(ObjectOp::Delete, key)?;
        match self.objects.write().remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found(key)),
        }
    }

    fn list(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.check_fault(ObjectOp::List, prefix)?;
        Ok(self
            .objects
            .read()
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_new_is_empty() {
        let client = InMemoryObjectClient::new();
        assert!(client.is_empty());
        assert_eq!(client.len(), 0);
        assert!(client.head("x").unwrap().is_none());
    }

    #[test]
    fn memory_put_replaces() {
        let client = InMemoryObjectClient::new();
        client.put("k", b"first").unwrap();
        client.put("k", b"2nd").unwrap();
        assert_eq!(client.get("k").unwrap(), b"2nd");
        assert_eq!(client.len(), 1);
    }

    #[test]
    fn memory_get_range_clamps_to_object() {
        let client = InMemoryObjectClient::new();
        client.put("k", b"hello world").unwrap();

        assert_eq!(client.get_range("k", 6, 5).unwrap(), b"world");
        assert_eq!(client.get_range("k", 6, 50).unwrap(), b"world");
        assert!(client.get_range("k", 40, 5).unwrap().is_empty());
        assert!(client.get_range("missing", 0, 1).is_err());
    }

    #[test]
    fn memory_list_is_prefix_scoped() {
        let client = InMemoryObjectClient::new();
        for key in ["a/1", "a/2", "a/b/3", "ab", "b/1"] {
            client.put(key, b"").unwrap();
        }
        assert_eq!(client.list("a/").unwrap(), vec!["a/1", "a/2", "a/b/3"]);
        assert_eq!(client.list("").unwrap().len(), 5);
        assert!(client.list("z").unwrap().is_empty());
    }

    #[test]
    fn memory_delete_missing_fails() {
        let client = InMemoryObjectClient::new();
        let err = client.delete("nope").unwrap_err();
        assert_eq!(err.status(), StoreStatus::FileDoesNotExist);
    }

    #[test]
    fn memory_faults_fire_then_clear() {
        let client = InMemoryObjectClient::new();
        client.fail_next(ObjectOp::Put, 2, StoreStatus::ConnectionFailed);

        assert_eq!(
            client.put("k", b"v").unwrap_err().status(),
            StoreStatus::ConnectionFailed
        );
        assert_eq!(
            client.put("k", b"v").unwrap_err().status(),
            StoreStatus::ConnectionFailed
        );
        client.put("k", b"v").unwrap();
        // Other operations were never affected.
        assert_eq!(client.head("k").unwrap(), Some(1));
    }

    #[test]
    fn memory_fault_status_is_preserved() {
        let client = InMemoryObjectClient::new();
        client.fail_next(ObjectOp::Put, 1, StoreStatus::OutOfSpace);
        assert_eq!(
            client.put("k", b"v").unwrap_err().status(),
            StoreStatus::OutOfSpace
        );
    }

    #[test]
    fn memory_clear() {
        let client = InMemoryObjectClient::new();
        client.put("k", b"v").unwrap();
        client.clear();
        assert!(client.is_empty());
    }
}
