//! Single-slot cache of the last successful run.
//!
//! The slot sits behind a mutex so concurrent requests serialize their
//! writes. Reads clone the stored run and never hold the lock past the copy.
//! Solvers never see this cache.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::MatchConfig;
use crate::loader::DataSignature;
use crate::model::ResultEnvelope;

pub const LAST_RUN_FILE: &str = "last_run.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRun {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub signature: DataSignature,
    pub config: MatchConfig,
    pub result: ResultEnvelope,
}

#[derive(Debug, Default)]
pub struct RunCache {
    slot: Mutex<Option<MatchRun>>,
    path: Option<PathBuf>,
}

impl RunCache {
    /// In-memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache mirrored to `<dir>/last_run.json`.
    ///
    /// An unreadable or corrupt file starts the cache empty.
    pub fn persistent(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(LAST_RUN_FILE);
        let restored = read_run(&path);
        Self {
            slot: Mutex::new(restored),
            path: Some(path),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<MatchRun>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a successful run and return it with its fresh id.
    pub fn set_last_run(&self, config: MatchConfig, result: ResultEnvelope, signature: DataSignature) -> MatchRun {
        let run = MatchRun {
            run_id: Uuid::new_v4(),
            created_at: Utc::now(),
            signature,
            config,
            result,
        };

        let mut slot = self.lock();
        *slot = Some(run.clone());
        if let Some(path) = &self.path {
            write_run(path, &run);
        }
        debug!(run_id = %run.run_id, "cached last run");
        run
    }

    pub fn last_run(&self) -> Option<MatchRun> {
        self.lock().clone()
    }

    /// Whether the cached run was computed from data with this signature.
    pub fn is_valid_for(&self, signature: &DataSignature) -> bool {
        self.lock().as_ref().is_some_and(|run| &run.signature == signature)
    }

    pub fn clear(&self) {
        let mut slot = self.lock();
        *slot = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => warn!(path = %path.display(), error = %err, "failed to remove cached run"),
            }
        }
    }
}

fn read_run(path: &Path) -> Option<MatchRun> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "cannot read cached run");
            return None;
        }
    };
    serde_json::from_str(&text)
        .inspect_err(|err| warn!(path = %path.display(), error = %err, "ignoring corrupt cached run"))
        .ok()
}

fn write_run(path: &Path, run: &MatchRun) {
    let result = serde_json::to_string_pretty(run)
        .map_err(std::io::Error::from)
        .and_then(|json| fs::write(path, json));
    if let Err(err) = result {
        warn!(path = %path.display(), error = %err, "failed to persist cached run");
    }
}
