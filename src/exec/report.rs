// src/exec/report.rs

//! Unit identity, outcomes, failure reporting and join handles.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tracing::error;

use crate::errors::ErrorKind;

static NEXT_UNIT: AtomicU64 = AtomicU64::new(1);

/// Human-readable unit identifier, used in logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(Arc<str>);

impl UnitId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// A fresh `unit-N` identifier.
    pub fn generate() -> Self {
        let n = NEXT_UNIT.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("unit-{n}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        UnitId::new(s)
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        UnitId::new(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStatus {
    Succeeded,
    Failed { kind: ErrorKind, message: String },
}

/// How a unit's run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub unit: UnitId,
    pub status: UnitStatus,
}

impl UnitReport {
    pub fn succeeded(unit: UnitId) -> Self {
        Self {
            unit,
            status: UnitStatus::Succeeded,
        }
    }

    pub fn failed(unit: UnitId, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            unit,
            status: UnitStatus::Failed {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, UnitStatus::Succeeded)
    }

    /// The failure kind, if the unit failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.status {
            UnitStatus::Succeeded => None,
            UnitStatus::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn into_result(self) -> anyhow::Result<()> {
        match self.status {
            UnitStatus::Succeeded => Ok(()),
            UnitStatus::Failed { kind, message } => {
                Err(anyhow!("unit '{}' failed ({kind}): {message}", self.unit))
            }
        }
    }
}

/// Receives every failure that escapes a unit body.
pub trait DiagnosticSink: Send + Sync + fmt::Debug {
    fn report(&self, unit: &UnitId, kind: ErrorKind, error: &anyhow::Error);

    /// Whether reports already end up on the process stderr. When they do,
    /// a unit whose error stream is that same stderr does not repeat the
    /// failure line.
    fn reaches_stderr(&self) -> bool {
        false
    }
}

/// Default sink: one `error!` event per failure, which the subscriber from
/// `logging::init_logging` writes to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, unit: &UnitId, kind: ErrorKind, error: &anyhow::Error) {
        error!(unit = %unit, kind = %kind, error = %format!("{error:#}"), "unit failed");
    }

    fn reaches_stderr(&self) -> bool {
        true
    }
}

/// Join handle for a started unit and, transitively, its predecessors.
#[derive(Debug)]
pub struct UnitHandle {
    unit: UnitId,
    task: JoinHandle<UnitReport>,
    upstream: Option<Box<UnitHandle>>,
}

impl UnitHandle {
    pub(crate) fn new(
        unit: UnitId,
        task: JoinHandle<UnitReport>,
        upstream: Option<Box<UnitHandle>>,
    ) -> Self {
        Self {
            unit,
            task,
            upstream,
        }
    }

    pub fn id(&self) -> &UnitId {
        &self.unit
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for this unit only. Predecessors keep running detached; they
    /// finish on their own once the pipe they write into is closed or drained.
    pub async fn wait(self) -> UnitReport {
        join(self.unit, self.task).await
    }

    /// Wait for this unit and every predecessor. Reports are ordered from
    /// the head of the pipeline to this unit.
    pub async fn wait_all(self) -> Vec<UnitReport> {
        let mut handles = Vec::new();
        let mut next = Some(Box::new(self));
        while let Some(handle) = next {
            let UnitHandle {
                unit,
                task,
                upstream,
            } = *handle;
            handles.push((unit, task));
            next = upstream;
        }

        let mut reports = Vec::with_capacity(handles.len());
        // Tail first, so the consumer is not stalled behind its producers.
        for (unit, task) in handles {
            reports.push(join(unit, task).await);
        }
        reports.reverse();
        reports
    }
}

async fn join(unit: UnitId, task: JoinHandle<UnitReport>) -> UnitReport {
    match task.await {
        Ok(report) => report,
        Err(err) if err.is_panic() => {
            error!(unit = %unit, "unit task panicked outside its body");
            UnitReport::failed(unit, ErrorKind::Panic, "task panicked")
        }
        Err(err) => UnitReport::failed(unit, ErrorKind::Other, err.to_string()),
    }
}
