//! JSONL audit sink - append-only writer, one file per day

use async_trait::async_trait;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AuditError;
use crate::record::AuditRecord;
use crate::sink::AuditSink;

/// Append-only JSONL audit trail
pub struct JsonlAuditSink {
    inner: Mutex<Inner>,
}

struct Inner {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
}

impl JsonlAuditSink {
    /// Create a sink writing under the given directory
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            inner: Mutex::new(Inner {
                base_path,
                current_file: None,
                current_date: None,
            }),
        })
    }

    /// List all JSONL files in the trail, oldest first
    pub fn list_files(&self) -> Result<Vec<PathBuf>, AuditError> {
        let inner = self.inner.lock().unwrap();
        let mut files = Vec::new();

        for entry in fs::read_dir(&inner.base_path)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some("jsonl") {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

impl Inner {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditError> {
        let date = record.timestamp.format("%Y-%m-%d").to_string();

        // Rotate file if date changed
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(record)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        Ok(())
    }

    fn rotate_file(&mut self, date: &str) -> Result<(), AuditError> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let file = OpenOptions::new().create(true).append(true).open(&file_path)?;

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    async fn record(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.inner.lock().unwrap().append(&record)
    }
}
