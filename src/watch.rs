//! [`WatchService`]: periodic polling of registered directories for
//! entries created, modified, or removed since the last poll cycle
//! (spec.md 4.7, 4.7a).
//!
//! There is no OS-level inotify/ReadDirectoryChangesW equivalent for an
//! in-memory tree, so this polls: each cycle it snapshots a watched
//! directory's entries (name, file id, last-modified time) and diffs
//! against the previous snapshot. One event is emitted per name per cycle
//! (spec.md 4.7a) — several mutations to the same name between two polls
//! coalesce into a single `Modify`, matching the coalescing behavior
//! callers of a real OS watch API already have to tolerate.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::name::Name;
use crate::tree::FileTree;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Create,
    Modify,
    Delete,
}

#[derive(Debug, Clone)]
pub struct WatchEvent {
    pub kind: EventKind,
    pub name: Name,
}

struct Snapshot {
    entries: HashMap<Name, (u64, SystemTime)>,
}

struct WatchedDir {
    directory_id: u64,
    last: Snapshot,
    sender: async_channel::Sender<WatchEvent>,
}

/// A single registration returned by [`WatchService::register`]. Dropping
/// or calling [`WatchKey::cancel`] unregisters it; either way outstanding
/// calls to [`WatchKey::take`] then fail with [`Error::Closed`].
pub struct WatchKey {
    id: u64,
    receiver: async_channel::Receiver<WatchEvent>,
    registry: Weak<Mutex<HashMap<u64, WatchedDir>>>,
    cancelled: AtomicBool,
}

impl WatchKey {
    /// Blocks until an event arrives or the key is cancelled.
    pub fn take(&self) -> Result<WatchEvent> {
        self.receiver.recv_blocking().map_err(|_| Error::Closed)
    }

    /// Blocks until an event arrives, the key is cancelled, or `timeout`
    /// elapses, whichever comes first. Implemented as a short-interval
    /// poll since `async-channel` has no blocking-with-timeout primitive;
    /// fine here given polls only ever happen at most once per
    /// `poll_period`.
    pub fn poll(&self, timeout: Duration) -> Result<Option<WatchEvent>> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Ok(Some(event)),
                Err(async_channel::TryRecvError::Closed) => return Err(Error::Closed),
                Err(async_channel::TryRecvError::Empty) => {}
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            thread::sleep(Duration::from_millis(10).min(timeout));
        }
    }

    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            if let Some(registry) = self.registry.upgrade() {
                registry.lock().remove(&self.id);
            }
        }
    }
}

impl Drop for WatchKey {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Background poller plus the registry of directories currently watched.
pub struct WatchService {
    registry: Arc<Mutex<HashMap<u64, WatchedDir>>>,
    next_id: AtomicU64,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl WatchService {
    pub fn new(tree: Arc<FileTree>, poll_period: Duration) -> WatchService {
        let registry: Arc<Mutex<HashMap<u64, WatchedDir>>> = Arc::new(Mutex::new(HashMap::new()));
        let shutdown = Arc::new(AtomicBool::new(false));

        let thread_registry = registry.clone();
        let thread_shutdown = shutdown.clone();
        let thread = thread::Builder::new()
            .name("vfsmem-watch".to_owned())
            .spawn(move || {
                while !thread_shutdown.load(Ordering::Relaxed) {
                    thread::sleep(poll_period);
                    poll_once(&tree, &thread_registry);
                }
            })
            .expect("failed to spawn watch polling thread");

        WatchService { registry, next_id: AtomicU64::new(0), shutdown, thread: Some(thread) }
    }

    /// Registers `directory_id` for watching, returning a key whose
    /// [`WatchKey::take`]/[`WatchKey::poll`] report subsequent changes.
    pub fn register(&self, tree: &FileTree, directory_id: u64) -> Result<WatchKey> {
        {
            let state = tree.lock();
            let file = state.require(directory_id, "<watched directory>")?;
            if !file.is_directory() {
                return Err(Error::not_directory(format!("file {directory_id}")));
            }
        }
        let initial = snapshot(tree, directory_id).expect("directory existence just checked above");
        let (sender, receiver) = async_channel::unbounded();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.lock().insert(id, WatchedDir { directory_id, last: initial, sender });
        Ok(WatchKey { id, receiver, registry: Arc::downgrade(&self.registry), cancelled: AtomicBool::new(false) })
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for WatchService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn snapshot(tree: &FileTree, directory_id: u64) -> Option<Snapshot> {
    let state = tree.lock();
    let directory = state.get(directory_id)?;
    let table = directory.as_directory()?.read();
    let mut entries = HashMap::new();
    for (name, id) in table.iter() {
        if let Some(file) = state.get(id) {
            entries.insert(name.clone(), (id, file.last_modified()));
        }
    }
    Some(Snapshot { entries })
}

fn poll_once(tree: &FileTree, registry: &Mutex<HashMap<u64, WatchedDir>>) {
    let mut registry = registry.lock();
    let mut gone = Vec::new();
    for (key_id, watched) in registry.iter_mut() {
        let Some(current) = snapshot(tree, watched.directory_id) else {
            gone.push(*key_id);
            continue;
        };

        for (name, &(id, mtime)) in &current.entries {
            match watched.last.entries.get(name) {
                None => {
                    let _ = watched.sender.try_send(WatchEvent { kind: EventKind::Create, name: name.clone() });
                }
                Some(&(prev_id, prev_mtime)) if prev_id != id || prev_mtime != mtime => {
                    let _ = watched.sender.try_send(WatchEvent { kind: EventKind::Modify, name: name.clone() });
                }
                _ => {}
            }
        }
        for name in watched.last.entries.keys() {
            if !current.entries.contains_key(name) {
                let _ = watched.sender.try_send(WatchEvent { kind: EventKind::Delete, name: name.clone() });
            }
        }

        watched.last = current;
    }
    for key_id in gone {
        registry.remove(&key_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockPool;
    use crate::file::File;
    use crate::name::CaseSensitivity;
    use crate::path_type::UnixPathType;

    fn name(s: &str) -> Name {
        Name::new(s, CaseSensitivity::Sensitive)
    }

    fn tree() -> Arc<FileTree> {
        Arc::new(
            FileTree::new(Arc::new(UnixPathType), &["/".to_owned()], Arc::new(BlockPool::new(64, 4096))).unwrap(),
        )
    }

    #[test]
    fn register_snapshots_current_contents_without_emitting_events() {
        let tree = tree();
        let root_id = tree.lock().root_id("/").unwrap();
        let mut service = WatchService::new(tree.clone(), Duration::from_millis(20));
        let key = service.register(&tree, root_id).unwrap();
        assert!(key.poll(Duration::from_millis(5)).unwrap().is_none());
        service.shutdown();
    }

    #[test]
    fn create_after_registration_is_reported() {
        let tree = tree();
        let root_id = tree.lock().root_id("/").unwrap();
        let mut service = WatchService::new(tree.clone(), Duration::from_millis(20));
        let key = service.register(&tree, root_id).unwrap();

        let new_id = tree.next_id();
        {
            let mut state = tree.lock();
            let file = File::new_regular(new_id, tree.block_pool().clone());
            state.table.insert(new_id, Arc::new(file));
            state.get(root_id).unwrap().as_directory().unwrap().write().insert(name("new.txt"), new_id).unwrap();
        }

        let event = key.take().unwrap();
        assert_eq!(event.kind, EventKind::Create);
        assert_eq!(event.name.display(), "new.txt");
        service.shutdown();
    }

    #[test]
    fn cancelled_key_closes_take() {
        let tree = tree();
        let root_id = tree.lock().root_id("/").unwrap();
        let mut service = WatchService::new(tree.clone(), Duration::from_millis(20));
        let key = service.register(&tree, root_id).unwrap();
        key.cancel();
        assert!(key.take().is_err());
        service.shutdown();
    }
}
