use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, error, info};

use crate::config::{format_entry, load_config, save_config, Entries};
use crate::error::{ConfigError, Result};

#[derive(Debug, Default)]
struct State {
    entries: Entries,
    loaded: bool,
}

/// A `key = value` file loaded lazily into memory and shared between threads.
///
/// The first `get`, `set`, `line_count`, `entries` or dump reads the file.
/// After that every read is served from memory and every `set` rewrites the
/// whole file while holding the write lock. Wrap in an `Arc` to share.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl ConfigStore {
    /// Binds the store to `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(State::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reports whether the file has been read, without triggering a load.
    pub fn is_loaded(&self) -> bool {
        self.read_state().loaded
    }

    /// Returns the value for `key`, or `default` when the key is absent.
    pub fn get(&self, key: &str, default: &str) -> Result<String> {
        let state = self.read_loaded()?;
        Ok(state.entries.get(key).unwrap_or(default).to_string())
    }

    /// Upserts `key` and persists every entry to the file.
    ///
    /// The in-memory update is not rolled back if the write fails.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let mut state = self.write_loaded()?;
        state.entries.join(key.into(), value.into());
        debug!(
            "Persisting {} entries to {}",
            state.entries.len(),
            self.path.display()
        );
        save_config(&self.path, &state.entries)
    }

    pub fn line_count(&self) -> Result<usize> {
        Ok(self.read_loaded()?.entries.len())
    }

    /// Snapshot of all entries in insertion order.
    pub fn entries(&self) -> Result<Vec<(String, String)>> {
        Ok(self.read_loaded()?.entries.to_vec())
    }

    /// Writes every entry as `key = value` to `out`.
    pub fn dump_to<W: Write>(&self, out: &mut W) -> Result<()> {
        for (key, value) in self.entries()? {
            writeln!(out, "{}", format_entry(&key, &value))
                .map_err(|source| ConfigError::Dump { source })?;
        }
        Ok(())
    }

    /// Prints every entry to stdout. Failures are logged, not returned.
    pub fn dump_all(&self) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        if let Err(e) = self.dump_to(&mut out) {
            error!("Failed to dump {}: {}", self.path.display(), e);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // `loaded` never goes back to false, so once the write path has loaded
    // the file a fresh read guard is guaranteed to see it.
    fn read_loaded(&self) -> Result<RwLockReadGuard<'_, State>> {
        {
            let state = self.read_state();
            if state.loaded {
                return Ok(state);
            }
        }
        drop(self.write_loaded()?);
        Ok(self.read_state())
    }

    fn write_loaded(&self) -> Result<RwLockWriteGuard<'_, State>> {
        let mut state = self.write_state();
        if !state.loaded {
            self.load_into(&mut state)?;
        }
        Ok(state)
    }

    fn load_into(&self, state: &mut State) -> Result<()> {
        debug!("Loading config from {}", self.path.display());
        state.entries = load_config(&self.path)?;
        state.loaded = true;
        info!(
            "Loaded {} entries from {}",
            state.entries.len(),
            self.path.display()
        );
        Ok(())
    }
}
