//! Utilities for loading RON files and watching directories for changes.
//!
//! Settings live as `.ron` files on disk. This module reads them with
//! `serde` and keeps a small filesystem watcher around so tuning values can
//! be edited while the game is running.

use bevy::log::{debug, warn};
use bevy::prelude::Resource;
use notify::{Config, RecommendedWatcher, RecursiveMode, Watcher};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Failure to turn a file on disk into a typed value.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Resource)]
/// File-watcher resource for RON hot-reload.
pub struct RonWatcher {
    pub changed: Arc<Mutex<bool>>, // Set to `true` by the watcher thread when a watched file is modified.
    _watcher: Option<RecommendedWatcher>, // Keeps the OS watcher alive for as long as the resource lives.
}

impl RonWatcher {
    /// A watcher with no OS backing. `changed` never flips on its own.
    #[must_use]
    pub fn stub() -> Self {
        RonWatcher {
            changed: Arc::new(Mutex::new(false)),
            _watcher: None,
        }
    }

    /// Read and reset the change flag.
    ///
    /// A poisoned flag is recovered rather than propagated, since the only
    /// writer is the watcher callback setting a bool.
    pub fn take_changed(&self) -> bool {
        let mut flag = match self.changed.lock() {
            Ok(flag) => flag,
            Err(poisoned) => {
                warn!("ron watcher flag poisoned, recovering");
                poisoned.into_inner()
            }
        };
        std::mem::replace(&mut *flag, false)
    }
}

/// Parse a single `.ron` file into `T`.
///
/// # Errors
/// Returns [`LoadError::Io`] when the file cannot be read and
/// [`LoadError::Parse`] when its contents do not deserialize into `T`.
pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str::<T>(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load all `.ron` files from a directory, sorted by file name.
///
/// Files that fail to load are skipped with a warning; an unreadable
/// directory yields an empty list.
#[must_use]
pub fn load_ron_files<T: DeserializeOwned>(path: &str) -> Vec<T> {
    let Ok(entries) = std::fs::read_dir(path) else {
        debug!("ron directory {path} not readable, nothing loaded");
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "ron"))
        .collect();
    files.sort();

    let mut items = Vec::with_capacity(files.len());
    for file in files {
        match load_ron_file::<T>(&file) {
            Ok(item) => items.push(item),
            Err(e) => warn!("{e}"),
        }
    }
    items
}

/// Create a `RonWatcher` that flags modifications under `path`.
///
/// # Arguments
/// * `path` - Directory to watch. Subdirectories are not watched.
///
/// # Return
/// A `RonWatcher` whose flag is raised on every modify event under `path`
/// and cleared by `take_changed`.
///
/// # Errors
/// Returns a `notify::Error` if the OS watcher cannot be created or cannot
/// be registered for `path`.
pub fn setup_ron_watcher(path: &str) -> Result<RonWatcher, notify::Error> {
    let changed = Arc::new(Mutex::new(false));
    let changed_clone = Arc::clone(&changed);
    let watched_path: PathBuf = std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));

    let mut watcher: RecommendedWatcher = Watcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if !matches!(event.kind, notify::EventKind::Modify(_)) {
                    return;
                }
                let relevant = event.paths.iter().any(|p| {
                    std::fs::canonicalize(p)
                        .unwrap_or_else(|_| p.clone())
                        .starts_with(&watched_path)
                });
                if relevant {
                    match changed_clone.lock() {
                        Ok(mut flag) => *flag = true,
                        Err(poisoned) => *poisoned.into_inner() = true,
                    }
                }
            }
            Err(e) => warn!("watch error: {e:?}"),
        },
        Config::default(),
    )?;

    watcher.watch(Path::new(path), RecursiveMode::NonRecursive)?;
    Ok(RonWatcher {
        changed,
        _watcher: Some(watcher),
    })
}
