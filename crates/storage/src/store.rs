// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic on-disk persistence for [`State`].
//!
//! Every write goes through a temp file in the same directory, an `fsync`,
//! and a `rename` over the live path, so a reader never observes a partial
//! write. The previous generation is rotated into `.bak`/`.bak.2`/`.bak.3`
//! before being overwritten, mirroring the snapshot rotation scheme used
//! elsewhere in this codebase for crash-recovery artifacts.

use crate::state::State;
use agent_hub_core::HubError;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<StoreError> for HubError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io(e) => HubError::Internal(e.to_string()),
            StoreError::Json(e) => HubError::from(e),
        }
    }
}

const MAX_BAK_FILES: u32 = 3;

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

/// Single-writer, file-backed store. The in-process `Mutex` serializes
/// concurrent callers within this daemon; the advisory file lock guards
/// against a second daemon process pointed at the same data directory.
pub struct StateStore {
    path: PathBuf,
    lock_path: PathBuf,
    state: Arc<Mutex<State>>,
}

impl StateStore {
    /// Load `path` if it exists (normalizing and rewriting it if
    /// normalization changed anything), or start from a fresh default state.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let lock_path = path.with_extension("lock");

        let mut state = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str::<State>(&raw)?
        } else {
            State::default()
        };

        let needs_write = state.normalize() || !path.exists();
        let store = Self { path: path.clone(), lock_path, state: Arc::new(Mutex::new(State::default())) };
        if needs_write {
            store.write_locked(&state)?;
        }
        *store.state.lock() = state;
        Ok(store)
    }

    /// Take a read-only clone of the current state.
    pub fn snapshot(&self) -> State {
        self.state.lock().clone()
    }

    /// Atomically mutate the state and persist the result. `f` returning
    /// `Err` aborts the write entirely — the in-memory state and on-disk
    /// file are left exactly as they were before the call.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut State) -> Result<T, HubError>) -> Result<T, HubError> {
        let mut guard = self.state.lock();
        let mut candidate = guard.clone();
        let result = f(&mut candidate)?;
        self.write_locked(&candidate).map_err(HubError::from)?;
        *guard = candidate;
        Ok(result)
    }

    fn write_locked(&self, state: &State) -> Result<(), StoreError> {
        let _guard = self.acquire_file_lock()?;

        if self.path.exists() {
            let bak = rotate_bak_path(&self.path);
            let _ = fs::copy(&self.path, bak);
        }

        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;
        let tmp_path = dir.join(format!(
            ".{}.tmp",
            self.path.file_name().and_then(|n| n.to_str()).unwrap_or("state")
        ));

        let serialized = serde_json::to_vec_pretty(state)?;
        {
            let mut tmp = File::create(&tmp_path)?;
            tmp.write_all(&serialized)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn acquire_file_lock(&self) -> Result<File, StoreError> {
        if let Some(dir) = self.lock_path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = fs::OpenOptions::new().create(true).write(true).open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
