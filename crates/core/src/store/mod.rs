//! The snapshot ledger: an append-only two-column CSV with a degraded-mode
//! backup path, plus the read-only helpers the inspection tool uses.

use crate::model::{HotItem, Snapshot};
use chrono::Local;
use log::{error, info, warn};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

pub const CAPTURE_TIME_COLUMN: &str = "capture_time";
pub const PAYLOAD_COLUMN: &str = "json_payload";

/// Payload cap for backup rows, matching common spreadsheet cell limits.
pub const MAX_BACKUP_CELL_CHARS: usize = 32_767;

pub const DEFAULT_LEDGER_NAME: &str = "hot_history.csv";
const BACKUP_PREFIX: &str = "hot_history_backup_";

/// Where an append actually landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// The primary ledger took the row.
    Primary(PathBuf),
    /// The primary write failed; the row lives in a fresh backup ledger.
    Backup(PathBuf),
}

impl AppendOutcome {
    pub fn path(&self) -> &Path {
        match self {
            AppendOutcome::Primary(p) | AppendOutcome::Backup(p) => p,
        }
    }
}

/// One decoded ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerRow {
    pub capture_time: String,
    pub json_payload: String,
}

impl LedgerRow {
    pub fn items(&self) -> Result<Vec<HotItem>, serde_json::Error> {
        Snapshot::items_from_payload(&self.json_payload)
    }
}

/// Owns all mutation of the ledger file. Snapshots only ever append;
/// rows are never reordered or rewritten.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot. The ledger is created lazily with its header
    /// on the first successful capture. A primary write failure routes the
    /// row to a timestamped backup ledger instead of losing it; only a
    /// backup failure is an error.
    pub fn append(&self, snapshot: &Snapshot) -> Result<AppendOutcome, StoreError> {
        let capture_time = snapshot.capture_time();
        let payload = snapshot.payload();

        match self.append_row(&self.path, &capture_time, &payload) {
            Ok(()) => {
                info!(
                    "appended {} items to {}",
                    snapshot.items.len(),
                    self.path.display()
                );
                Ok(AppendOutcome::Primary(self.path.clone()))
            }
            Err(e) => {
                error!("primary ledger write failed: {}", e);
                let backup = self.backup_path();
                let truncated: String = payload.chars().take(MAX_BACKUP_CELL_CHARS).collect();
                self.append_row(&backup, &capture_time, &truncated)?;
                warn!("row preserved in backup ledger {}", backup.display());
                Ok(AppendOutcome::Backup(backup))
            }
        }
    }

    fn append_row(&self, path: &Path, capture_time: &str, payload: &str) -> Result<(), StoreError> {
        let fresh = !path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(StoreError::Io)?;

        let mut writer = csv::Writer::from_writer(file);
        if fresh {
            writer
                .write_record([CAPTURE_TIME_COLUMN, PAYLOAD_COLUMN])
                .map_err(StoreError::Csv)?;
        }
        writer
            .write_record([capture_time, payload])
            .map_err(StoreError::Csv)?;
        writer.flush().map_err(StoreError::Io)?;
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d%H%M%S");
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(format!("{}{}.csv", BACKUP_PREFIX, stamp))
    }
}

/// Read every row of a ledger file. Header is validated: both required
/// columns must be present.
pub fn read_ledger(path: &Path) -> Result<Vec<LedgerRow>, StoreError> {
    let mut reader = csv::Reader::from_path(path).map_err(StoreError::Csv)?;

    let headers = reader.headers().map_err(StoreError::Csv)?.clone();
    let time_col = headers.iter().position(|h| h == CAPTURE_TIME_COLUMN);
    let payload_col = headers.iter().position(|h| h == PAYLOAD_COLUMN);
    let (time_col, payload_col) = match (time_col, payload_col) {
        (Some(t), Some(p)) => (t, p),
        _ => return Err(StoreError::MissingColumns),
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(StoreError::Csv)?;
        rows.push(LedgerRow {
            capture_time: record.get(time_col).unwrap_or("").to_string(),
            json_payload: record.get(payload_col).unwrap_or("").to_string(),
        });
    }
    Ok(rows)
}

/// Locate the ledger to inspect: the primary file when present, otherwise
/// the newest backup in the directory.
pub fn discover_ledger(dir: &Path) -> Option<PathBuf> {
    let primary = dir.join(DEFAULT_LEDGER_NAME);
    if primary.exists() {
        return Some(primary);
    }
    let mut backups = list_backups(dir);
    backups.pop()
}

/// Backup ledgers in the directory, sorted by name (the timestamped names
/// sort chronologically).
pub fn list_backups(dir: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut backups: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(BACKUP_PREFIX) && n.ends_with(".csv"))
                .unwrap_or(false)
        })
        .collect();
    backups.sort();
    backups
}

#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Csv(csv::Error),
    /// Header row lacks one of the required columns.
    MissingColumns,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Io(e) => write!(f, "ledger I/O error: {}", e),
            StoreError::Csv(e) => write!(f, "ledger encoding error: {}", e),
            StoreError::MissingColumns => {
                write!(f, "ledger is missing a required column")
            }
        }
    }
}

impl std::error::Error for StoreError {}
