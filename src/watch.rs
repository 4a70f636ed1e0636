//! Watch the datasets directory and rebuild the index on changes.
//! Single-flight with a trailing queue: at most one build runs at any instant,
//! and every event burst that lands during a build collapses into exactly one
//! follow-up rebuild.

use std::fmt;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use notify::{EventKind, RecursiveMode, Watcher};

use crate::data::index::build_index;
use crate::data::merge::{PipelineConfig, SCHEMA_FILE_NAME};

/// Quiet period after the first qualifying event before a build starts, so an
/// editor save storm becomes one rebuild.
const SETTLE_WINDOW: Duration = Duration::from_millis(200);

/// Build scheduling state. Events never stack more than one rebuild deep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Building,
    BuildingWithPending,
}

impl WatchState {
    /// A qualifying change arrived. Returns whether a build should start now;
    /// otherwise the change is folded into the single pending flag.
    pub fn on_event(&mut self) -> bool {
        match self {
            WatchState::Idle => {
                *self = WatchState::Building;
                true
            }
            WatchState::Building | WatchState::BuildingWithPending => {
                *self = WatchState::BuildingWithPending;
                false
            }
        }
    }

    /// The in-flight build finished. Returns whether exactly one queued rebuild
    /// should start now.
    pub fn on_build_finished(&mut self) -> bool {
        match self {
            WatchState::BuildingWithPending => {
                *self = WatchState::Building;
                true
            }
            WatchState::Idle | WatchState::Building => {
                *self = WatchState::Idle;
                false
            }
        }
    }
}

enum WatchSignal {
    Fs(notify::Result<notify::Event>),
    Shutdown,
}

#[derive(Debug)]
pub enum WatchError {
    Watcher(notify::Error),
    Signal(ctrlc::Error),
}

impl fmt::Display for WatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Watcher(err) => write!(f, "unable to watch datasets directory: {err}"),
            Self::Signal(err) => write!(f, "unable to install interrupt handler: {err}"),
        }
    }
}

impl std::error::Error for WatchError {}

enum Drained {
    Quiet,
    Pending,
    Shutdown,
}

/// Run an initial build, then observe the datasets directory until interrupted.
/// Build failures are logged and never terminate the loop.
pub fn run_watch(config: &PipelineConfig) -> Result<(), WatchError> {
    let (sender, receiver) = mpsc::channel();

    let fs_sender = sender.clone();
    let mut watcher = notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
        let _ = fs_sender.send(WatchSignal::Fs(event));
    })
    .map_err(WatchError::Watcher)?;
    watcher
        .watch(&config.datasets_dir, RecursiveMode::NonRecursive)
        .map_err(WatchError::Watcher)?;

    ctrlc::set_handler(move || {
        let _ = sender.send(WatchSignal::Shutdown);
    })
    .map_err(WatchError::Signal)?;

    println!("[data:watch] Watching {}", config.datasets_dir.display());
    run_build(config, "initial build");

    let mut state = WatchState::Idle;
    'watch: loop {
        let signal = match receiver.recv() {
            Ok(signal) => signal,
            Err(_) => break,
        };
        let first_reason = match signal {
            WatchSignal::Shutdown => break,
            WatchSignal::Fs(Err(err)) => {
                eprintln!("[data:watch] watch error: {err}");
                continue;
            }
            WatchSignal::Fs(Ok(event)) => match qualifying_reason(&event) {
                Some(reason) => reason,
                None => continue,
            },
        };

        if matches!(settle(&receiver), Drained::Shutdown) {
            break;
        }

        if state.on_event() {
            let mut reason = first_reason;
            loop {
                run_build(config, &reason);
                match drain_pending(&receiver) {
                    Drained::Shutdown => break 'watch,
                    Drained::Pending => {
                        state.on_event();
                    }
                    Drained::Quiet => {}
                }
                if state.on_build_finished() {
                    reason = "queued change".to_string();
                } else {
                    break;
                }
            }
        }
    }

    // Dropping the watcher closes the directory watch; a pending rebuild is
    // not forced to completion.
    drop(watcher);
    println!("[data:watch] watcher closed");
    Ok(())
}

fn run_build(config: &PipelineConfig, reason: &str) {
    match build_index(config) {
        Ok(summary) => println!(
            "[data:watch] {reason} -> wrote {} project(s) from {} dataset(s)",
            summary.project_count, summary.dataset_count
        ),
        Err(err) => eprintln!("[data:watch] build failed:\n{err}"),
    }
}

/// A change qualifies when it creates, modifies, or removes a `.json` file other
/// than the schema document. Returns the rebuild reason label.
fn qualifying_reason(event: &notify::Event) -> Option<String> {
    let label = match event.kind {
        EventKind::Create(_) => "create",
        EventKind::Modify(_) => "modify",
        EventKind::Remove(_) => "remove",
        _ => return None,
    };
    let name = event.paths.iter().find_map(|path| {
        let name = path.file_name()?.to_str()?;
        if name.to_lowercase().ends_with(".json") && name != SCHEMA_FILE_NAME {
            Some(name.to_string())
        } else {
            None
        }
    })?;
    Some(format!("{label}: {name}"))
}

/// Swallow the rest of an event burst until the channel stays quiet for the
/// settle window.
fn settle(receiver: &Receiver<WatchSignal>) -> Drained {
    loop {
        match receiver.recv_timeout(SETTLE_WINDOW) {
            Ok(WatchSignal::Shutdown) => return Drained::Shutdown,
            Ok(WatchSignal::Fs(_)) => continue,
            Err(mpsc::RecvTimeoutError::Timeout) => return Drained::Quiet,
            Err(mpsc::RecvTimeoutError::Disconnected) => return Drained::Shutdown,
        }
    }
}

/// Collapse everything that arrived during a build into a single pending flag.
fn drain_pending(receiver: &Receiver<WatchSignal>) -> Drained {
    let mut pending = false;
    loop {
        match receiver.try_recv() {
            Ok(WatchSignal::Shutdown) => return Drained::Shutdown,
            Ok(WatchSignal::Fs(Ok(event))) => {
                if qualifying_reason(&event).is_some() {
                    pending = true;
                }
            }
            Ok(WatchSignal::Fs(Err(err))) => eprintln!("[data:watch] watch error: {err}"),
            Err(mpsc::TryRecvError::Empty) => {
                return if pending {
                    Drained::Pending
                } else {
                    Drained::Quiet
                };
            }
            Err(mpsc::TryRecvError::Disconnected) => return Drained::Shutdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};
    use notify::{Event, EventKind};

    use super::{qualifying_reason, WatchState};

    #[test]
    fn burst_during_build_queues_exactly_one_rebuild() {
        let mut state = WatchState::Idle;
        assert!(state.on_event(), "idle event starts a build");
        assert!(!state.on_event(), "event during build does not start another");
        assert!(!state.on_event(), "second event folds into the same flag");
        assert!(
            state.on_build_finished(),
            "finishing with pending starts one queued rebuild"
        );
        assert!(
            !state.on_build_finished(),
            "finishing without pending returns to idle"
        );
        assert_eq!(state, WatchState::Idle);
    }

    #[test]
    fn quiet_build_returns_to_idle() {
        let mut state = WatchState::Idle;
        assert!(state.on_event());
        assert!(!state.on_build_finished());
        assert_eq!(state, WatchState::Idle);
    }

    fn event_for(kind: EventKind, file_name: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from("data/datasets").join(file_name))
    }

    #[test]
    fn dataset_changes_qualify_with_kind_label() {
        let created = event_for(EventKind::Create(CreateKind::File), "works.core.json");
        assert_eq!(
            qualifying_reason(&created).as_deref(),
            Some("create: works.core.json")
        );
        let modified = event_for(EventKind::Modify(ModifyKind::Any), "works.core.json");
        assert_eq!(
            qualifying_reason(&modified).as_deref(),
            Some("modify: works.core.json")
        );
        let removed = event_for(EventKind::Remove(RemoveKind::Any), "works.core.json");
        assert_eq!(
            qualifying_reason(&removed).as_deref(),
            Some("remove: works.core.json")
        );
    }

    #[test]
    fn schema_document_and_non_json_files_do_not_qualify() {
        let schema = event_for(EventKind::Modify(ModifyKind::Any), "projects.schema.json");
        assert!(qualifying_reason(&schema).is_none());
        let notes = event_for(EventKind::Modify(ModifyKind::Any), "notes.txt");
        assert!(qualifying_reason(&notes).is_none());
    }

    #[test]
    fn access_events_do_not_qualify() {
        let accessed = event_for(EventKind::Access(AccessKind::Any), "works.core.json");
        assert!(qualifying_reason(&accessed).is_none());
    }
}
