//! File-backed inputs: facility and patient tables plus the JSON config.

use std::env;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use csv::{ReaderBuilder, Trim};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::MatchConfig;
use crate::error::LoadError;
use crate::input::{normalize_facilities, normalize_patients, FacilityRecord, PatientRecord, SourceRecord};
use crate::model::{Facility, Patient};

pub const DEFAULT_FACILITIES_PATH: &str = "data/facilities.csv";
pub const DEFAULT_PATIENTS_PATH: &str = "data/patients_batch.csv";
pub const DEFAULT_CONFIG_PATH: &str = "data/config.json";
/// Overrides [`DEFAULT_CONFIG_PATH`].
pub const CONFIG_PATH_ENV: &str = "CONFIG_PATH";

/// Input-freshness key: `name:mtime:size` per file joined by `|`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataSignature(String);

impl DataSignature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything one run needs, loaded and validated.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub patients: Vec<Patient>,
    pub facilities: Vec<Facility>,
    pub config: MatchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub facilities_path: PathBuf,
    pub patients_path: PathBuf,
    pub config_path: PathBuf,
}

impl Default for DataSource {
    fn default() -> Self {
        Self {
            facilities_path: DEFAULT_FACILITIES_PATH.into(),
            patients_path: DEFAULT_PATIENTS_PATH.into(),
            config_path: env::var_os(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into()),
        }
    }
}

impl DataSource {
    /// The default file names under `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            facilities_path: dir.join("facilities.csv"),
            patients_path: dir.join("patients_batch.csv"),
            config_path: dir.join("config.json"),
        }
    }

    #[instrument(skip(self), fields(path = %self.facilities_path.display()))]
    pub fn load_facilities(&self) -> Result<Vec<Facility>, LoadError> {
        let rows: Vec<FacilityRecord> = read_records(&self.facilities_path)?;
        debug!(rows = rows.len(), "facility rows read");
        Ok(normalize_facilities(rows)?)
    }

    #[instrument(skip(self), fields(path = %self.patients_path.display()))]
    pub fn load_patients(&self) -> Result<Vec<Patient>, LoadError> {
        let rows: Vec<PatientRecord> = read_records(&self.patients_path)?;
        debug!(rows = rows.len(), "patient rows read");
        Ok(normalize_patients(rows)?)
    }

    /// A missing config file means all defaults; a malformed one is an error.
    pub fn load_config(&self) -> Result<MatchConfig, LoadError> {
        let path = &self.config_path;
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(MatchConfig::default());
        }
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.clone(),
            source,
        })?;
        let config = MatchConfig::from_json_str(&text).map_err(|source| LoadError::Json {
            path: path.clone(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(&self) -> Result<Dataset, LoadError> {
        Ok(Dataset {
            patients: self.load_patients()?,
            facilities: self.load_facilities()?,
            config: self.load_config()?,
        })
    }

    /// Changes whenever any of the three files is touched, added or removed.
    pub fn signature(&self) -> DataSignature {
        let parts: Vec<String> = [&self.facilities_path, &self.patients_path, &self.config_path]
            .into_iter()
            .map(|path| file_signature(path))
            .collect();
        DataSignature(parts.join("|"))
    }
}

fn file_signature(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    match fs::metadata(path) {
        Ok(meta) => {
            let mtime = meta
                .modified()
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map_or(0, |d| d.as_nanos());
            format!("{name}:{mtime}:{}", meta.len())
        }
        Err(_) => format!("{name}:missing"),
    }
}

/// Rows from a `.json` array or, for any other extension, a headed CSV file.
///
/// CSV ids keep their exact text, leading zeros included.
pub fn read_records<T>(path: &Path) -> Result<Vec<T>, LoadError>
where
    T: DeserializeOwned + SourceRecord,
{
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        let text = fs::read_to_string(path).map_err(io_err)?;
        return serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        });
    }

    let file = File::open(path).map_err(io_err)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(file);

    let headers = reader.headers().map_err(csv_err)?.clone();
    let id_column = T::ID_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|header| header == *name));

    reader
        .records()
        .map(|record| {
            let record = record.map_err(csv_err)?;
            let mut row: T = record.deserialize(Some(&headers)).map_err(csv_err)?;
            if let Some(raw) = id_column.and_then(|column| record.get(column)) {
                row.set_raw_id(raw);
            }
            Ok(row)
        })
        .collect()
}
