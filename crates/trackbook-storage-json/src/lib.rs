//! File-backed persistence for a trackbook: one JSON document per collection,
//! written atomically, with rolling backups of the previous contents.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{NaiveDateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};
use trackbook_core::{CoreError, CoreResult, LedgerStorage};
use trackbook_domain::{Account, Transaction};

pub const SCHEMA_VERSION: u32 = 1;
pub const ACCOUNTS_STEM: &str = "accounts";
pub const TRANSACTIONS_STEM: &str = "transactions";
pub const DEFAULT_RETENTION: usize = 5;

const EXTENSION: &str = "json";
const BACKUP_DIR: &str = "backups";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";

#[derive(Serialize)]
struct DocumentRef<'a, T> {
    schema_version: u32,
    records: &'a [T],
}

#[derive(Deserialize)]
struct Document<T> {
    #[serde(default = "Vec::new")]
    records: Vec<T>,
}

/// A previous version of a collection file kept under `backups/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub stem: String,
    pub file_name: String,
    pub created_at: Option<NaiveDateTime>,
    pub path: PathBuf,
}

/// Stores accounts and transactions as `accounts.json` and `transactions.json` under a root directory.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: impl Into<PathBuf>) -> CoreResult<Self> {
        Self::with_retention(root, DEFAULT_RETENTION)
    }

    /// Keeps at most `retention` backups per collection; at least one is always kept.
    pub fn with_retention(root: impl Into<PathBuf>, retention: usize) -> CoreResult<Self> {
        let root = root.into();
        let backups_dir = root.join(BACKUP_DIR);
        fs::create_dir_all(&backups_dir)?;
        Ok(Self {
            root,
            backups_dir,
            retention: retention.max(1),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn collection_path(&self, stem: &str) -> PathBuf {
        self.root.join(format!("{stem}.{EXTENSION}"))
    }

    /// Backups of one collection, newest first.
    pub fn list_backups(&self, stem: &str) -> CoreResult<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = format!("{stem}_");
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(key) = backup_key(file_name, &prefix) else {
                continue;
            };
            entries.push((
                key,
                BackupInfo {
                    stem: stem.to_string(),
                    file_name: file_name.to_string(),
                    created_at: Some(key.0),
                    path: path.clone(),
                },
            ));
        }
        entries.sort_by_key(|(key, _)| Reverse(*key));
        Ok(entries.into_iter().map(|(_, info)| info).collect())
    }

    /// Puts a backup back in place of the live collection file.
    ///
    /// The backup is parsed first so a damaged file never replaces good data.
    pub fn restore_backup(&self, backup: &BackupInfo) -> CoreResult<()> {
        if !backup.path.exists() {
            return Err(CoreError::Storage(format!(
                "backup `{}` not found",
                backup.file_name
            )));
        }
        let data = fs::read_to_string(&backup.path)?;
        check_schema(&data, &backup.path)?;
        let target = self.collection_path(&backup.stem);
        self.backup_existing_file(&backup.stem, &target)?;
        let tmp = tmp_path(&target);
        write_file(&tmp, &data)?;
        fs::rename(&tmp, &target)?;
        debug!(backup = %backup.file_name, "backup restored");
        Ok(())
    }

    fn load_records<T: DeserializeOwned>(&self, stem: &str) -> CoreResult<Vec<T>> {
        let path = self.collection_path(stem);
        if !path.exists() {
            debug!(path = %path.display(), "no collection file, starting empty");
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        check_schema(&data, &path)?;
        let document: Document<T> =
            serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
        debug!(path = %path.display(), records = document.records.len(), "collection loaded");
        Ok(document.records)
    }

    fn save_records<T: Serialize>(&self, stem: &str, records: &[T]) -> CoreResult<()> {
        let path = self.collection_path(stem);
        let json = serde_json::to_string_pretty(&DocumentRef {
            schema_version: SCHEMA_VERSION,
            records,
        })
        .map_err(|err| CoreError::Serde(err.to_string()))?;
        self.backup_existing_file(stem, &path)?;
        let tmp = tmp_path(&path);
        write_file(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), records = records.len(), "collection saved");
        Ok(())
    }

    fn backup_existing_file(&self, stem: &str, path: &Path) -> CoreResult<()> {
        if !path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut backup_path = self
            .backups_dir
            .join(format!("{stem}_{timestamp}.{EXTENSION}"));
        let mut sequence = 1;
        while backup_path.exists() {
            backup_path = self
                .backups_dir
                .join(format!("{stem}_{timestamp}_{sequence}.{EXTENSION}"));
            sequence += 1;
        }
        fs::copy(path, &backup_path)?;
        self.prune_backups(stem)
    }

    fn prune_backups(&self, stem: &str) -> CoreResult<()> {
        for entry in self.list_backups(stem)?.into_iter().skip(self.retention) {
            debug!(backup = %entry.file_name, "pruning backup");
            if let Err(err) = fs::remove_file(&entry.path) {
                warn!(backup = %entry.file_name, error = %err, "could not prune backup");
            }
        }
        Ok(())
    }
}

impl LedgerStorage for JsonStorage {
    fn load_accounts(&self) -> CoreResult<Vec<Account>> {
        self.load_records(ACCOUNTS_STEM)
    }

    fn save_accounts(&self, accounts: &[Account]) -> CoreResult<()> {
        self.save_records(ACCOUNTS_STEM, accounts)
    }

    fn load_transactions(&self) -> CoreResult<Vec<Transaction>> {
        self.load_records(TRANSACTIONS_STEM)
    }

    fn save_transactions(&self, transactions: &[Transaction]) -> CoreResult<()> {
        self.save_records(TRANSACTIONS_STEM, transactions)
    }
}

#[derive(Deserialize)]
struct VersionProbe {
    schema_version: u32,
}

fn check_schema(data: &str, path: &Path) -> CoreResult<()> {
    let probe: VersionProbe =
        serde_json::from_str(data).map_err(|err| CoreError::Serde(err.to_string()))?;
    if probe.schema_version > SCHEMA_VERSION {
        return Err(CoreError::Storage(format!(
            "{} uses schema version {} but only {} is supported",
            path.display(),
            probe.schema_version,
            SCHEMA_VERSION
        )));
    }
    Ok(())
}

/// Orders backups of one collection: `<stem>_<date>_<time>[_<seq>].json`.
fn backup_key(file_name: &str, prefix: &str) -> Option<(NaiveDateTime, u32)> {
    let body = file_name
        .strip_prefix(prefix)?
        .strip_suffix(&format!(".{EXTENSION}"))?;
    let mut segments = body.split('_');
    let date = segments.next()?;
    let time = segments.next()?;
    let sequence = match segments.next() {
        Some(raw) => raw.parse().ok()?,
        None => 0,
    };
    if segments.next().is_some() || !is_digits(date, 8) || !is_digits(time, 6) {
        return None;
    }
    let stamp = NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S").ok()?;
    Some((stamp, sequence))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{existing}.{TMP_SUFFIX}"),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_file(path: &Path, data: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
