//! File-event subscriber: wakes the runner loop's sleep early on changes to
//! the `tasks`, `workflow`, or `state` categories (§4.6, §6). Built on the
//! `notify` crate the same way the teacher's `agent::watcher::create_file_watcher`
//! watches a session log — a `recommended_watcher` whose callback forwards a
//! unit signal over an mpsc channel rather than the raw notify event, since
//! callers only care that *something* changed, not what.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventCategory {
    Tasks,
    Workflow,
    State,
    Registry,
    Phases,
    Heartbeat,
    Session,
}

impl FileEventCategory {
    /// Only these categories wake a runner (§4.6).
    pub fn wakes_runner(self) -> bool {
        matches!(
            self,
            FileEventCategory::Tasks | FileEventCategory::Workflow | FileEventCategory::State
        )
    }
}

#[derive(Debug, Clone)]
pub struct FileEvent {
    pub category: FileEventCategory,
    pub project_id: String,
}

/// Registers callbacks and fires them once per matching event. Each
/// subscription is one-shot — the runner loop re-subscribes every time it
/// goes back to sleep (§4.6: "each sleep registers a one-shot callback that
/// is removed on resolve").
pub trait FileEventSubscriber: Send + Sync + 'static {
    /// Watch `path` for changes, tagging resulting events with `category`
    /// and `project_id`.
    fn watch(&self, project_id: &str, category: FileEventCategory, path: &Path) -> std::io::Result<()>;

    /// Block until any watched path under `project_id` changes, or the
    /// subscriber is dropped.
    fn subscribe(&self, project_id: &str) -> mpsc::Receiver<FileEvent>;
}

/// Real implementation: one `notify::RecommendedWatcher` per watched path,
/// fanning out to every project subscriber registered at the time of the
/// event.
pub struct RealFileEventSubscriber {
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    watchers: Vec<RecommendedWatcher>,
    subscribers: HashMap<String, Vec<mpsc::Sender<FileEvent>>>,
}

impl Default for RealFileEventSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl RealFileEventSubscriber {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                watchers: Vec::new(),
                subscribers: HashMap::new(),
            })),
        }
    }

    fn dispatch(inner: &Arc<Mutex<Inner>>, project_id: &str, category: FileEventCategory) {
        if !category.wakes_runner() {
            return;
        }
        let event = FileEvent {
            category,
            project_id: project_id.to_string(),
        };
        let mut guard = inner.lock();
        if let Some(senders) = guard.subscribers.get_mut(project_id) {
            senders.retain(|tx| tx.try_send(event.clone()).is_ok() || !tx.is_closed());
        }
    }
}

impl FileEventSubscriber for RealFileEventSubscriber {
    fn watch(&self, project_id: &str, category: FileEventCategory, path: &Path) -> std::io::Result<()> {
        let inner = Arc::clone(&self.inner);
        let project_id = project_id.to_string();
        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if res.is_ok() {
                Self::dispatch(&inner, &project_id, category);
            }
        })
        .map_err(|e| std::io::Error::other(e.to_string()))?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        self.inner.lock().watchers.push(watcher);
        Ok(())
    }

    fn subscribe(&self, project_id: &str) -> mpsc::Receiver<FileEvent> {
        let (tx, rx) = mpsc::channel(16);
        self.inner
            .lock()
            .subscribers
            .entry(project_id.to_string())
            .or_default()
            .push(tx);
        rx
    }
}

/// Convenience: watch every path the runner loop cares about for one
/// project (`dashboard-state.json`, `step-state.json`, and the project's
/// task document), tagged with the right category each.
pub fn watch_project_paths(
    subscriber: &dyn FileEventSubscriber,
    project_id: &str,
    state_path: &Path,
    step_path: &Path,
    tasks_path: Option<&PathBuf>,
) -> std::io::Result<()> {
    subscriber.watch(project_id, FileEventCategory::State, state_path)?;
    subscriber.watch(project_id, FileEventCategory::Workflow, step_path)?;
    if let Some(tasks_path) = tasks_path {
        if tasks_path.exists() {
            subscriber.watch(project_id, FileEventCategory::Tasks, tasks_path)?;
        }
    }
    Ok(())
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFileEventSubscriber;

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{FileEvent, FileEventCategory, FileEventSubscriber};
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    /// Test double: `fire()` pushes an event to every subscriber of a
    /// project without touching the filesystem at all.
    #[derive(Clone)]
    pub struct FakeFileEventSubscriber {
        inner: Arc<Mutex<HashMap<String, Vec<mpsc::Sender<FileEvent>>>>>,
    }

    impl Default for FakeFileEventSubscriber {
        fn default() -> Self {
            Self::new()
        }
    }

    impl FakeFileEventSubscriber {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        pub fn fire(&self, project_id: &str, category: FileEventCategory) {
            if !category.wakes_runner() {
                return;
            }
            let event = FileEvent {
                category,
                project_id: project_id.to_string(),
            };
            let mut guard = self.inner.lock();
            if let Some(senders) = guard.get_mut(project_id) {
                senders.retain(|tx| tx.try_send(event.clone()).is_ok() || !tx.is_closed());
            }
        }
    }

    impl FileEventSubscriber for FakeFileEventSubscriber {
        fn watch(&self, _project_id: &str, _category: FileEventCategory, _path: &Path) -> std::io::Result<()> {
            Ok(())
        }

        fn subscribe(&self, project_id: &str) -> mpsc::Receiver<FileEvent> {
            let (tx, rx) = mpsc::channel(16);
            self.inner
                .lock()
                .entry(project_id.to_string())
                .or_default()
                .push(tx);
            rx
        }
    }
}

#[cfg(test)]
#[path = "notify_watch_tests.rs"]
mod tests;
