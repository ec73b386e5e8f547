//! Audit trail for mutations
//!
//! Every create/update/delete attempt, successful or not, produces one
//! [`AuditRecord`]. Sinks are append-only. A failing sink is logged and
//! otherwise ignored: it never changes the outcome of the operation that
//! produced the record.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Whether the audited operation succeeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditStatus {
    Success,
    Fault,
}

/// Kind of change attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

/// One entry in the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub class_name: String,
    pub method_name: String,
    pub created_at: DateTime<Utc>,
    pub actor: String,
    pub status: AuditStatus,
    pub change_type: ChangeType,
    /// Serialized snapshot of the entity (or of the arguments when no
    /// entity was available)
    pub entity: serde_json::Value,
}

impl AuditRecord {
    pub fn new(
        class_name: &str,
        method_name: &str,
        actor: &str,
        status: AuditStatus,
        change_type: ChangeType,
        entity: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            class_name: class_name.to_string(),
            method_name: method_name.to_string(),
            created_at: Utc::now(),
            actor: actor.to_string(),
            status,
            change_type,
            entity,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to write audit record: {0}")]
    Write(#[from] std::io::Error),
}

/// Destination for audit records
pub trait AuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError>;
}

/// Discards everything
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _record: &AuditRecord) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Appends records as JSON lines, one file per entity class
/// (`{dir}/{class_name}.jsonl`)
#[derive(Debug)]
pub struct JsonlAuditSink {
    dir: PathBuf,
}

impl JsonlAuditSink {
    /// Create the sink, creating `dir` when missing
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the trail file for a class
    pub fn path_for(&self, class_name: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", class_name))
    }

    /// Read back every record for a class, oldest first
    pub fn read_class(&self, class_name: &str) -> Result<Vec<AuditRecord>, AuditError> {
        let path = self.path_for(class_name);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let records = serde_jsonlines::json_lines(&path)?.collect::<std::io::Result<Vec<_>>>()?;
        Ok(records)
    }
}

impl AuditSink for JsonlAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        serde_jsonlines::append_json_lines(self.path_for(&record.class_name), [record])?;
        Ok(())
    }
}

/// Keeps records in memory
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: RefCell<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        self.records.borrow_mut().push(record.clone());
        Ok(())
    }
}

/// Shares one sink between a provider and the code that inspects it
impl<S: AuditSink + ?Sized> AuditSink for std::rc::Rc<S> {
    fn record(&self, record: &AuditRecord) -> Result<(), AuditError> {
        (**self).record(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(class_name: &str, status: AuditStatus) -> AuditRecord {
        AuditRecord::new(
            class_name,
            "create_task",
            "tester",
            status,
            ChangeType::Create,
            serde_json::json!({"name": "Ship it"}),
        )
    }

    #[test]
    fn test_jsonl_sink_appends_per_class() {
        let dir = tempdir().unwrap();
        let sink = JsonlAuditSink::new(dir.path().join("audit")).unwrap();

        sink.record(&sample("Task", AuditStatus::Success)).unwrap();
        sink.record(&sample("Task", AuditStatus::Fault)).unwrap();
        sink.record(&sample("Event", AuditStatus::Success)).unwrap();

        let tasks = sink.read_class("Task").unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].status, AuditStatus::Fault);
        assert_eq!(sink.read_class("Event").unwrap().len(), 1);
        assert!(sink.read_class("Project").unwrap().is_empty());
    }

    #[test]
    fn test_record_serializes_enum_names() {
        let json = serde_json::to_value(sample("Task", AuditStatus::Fault)).unwrap();
        assert_eq!(json["status"], "FAULT");
        assert_eq!(json["change_type"], "CREATE");
    }
}
