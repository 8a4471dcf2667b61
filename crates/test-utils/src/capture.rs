use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use pipeshell::errors::ErrorKind;
use pipeshell::exec::{DiagnosticSink, OutputBinding, UnitId};
use tokio::io::AsyncWrite;

/// In-memory writer whose contents stay readable after the unit that wrote
/// them has finished.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    writes: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// An owned output binding writing into this capture.
    pub fn binding(&self) -> OutputBinding {
        OutputBinding::writer(self.clone())
    }

    pub fn contents(&self) -> String {
        let bytes: Vec<u8> = self.writes.lock().unwrap().concat();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Each `poll_write` call as it arrived.
    pub fn writes(&self) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .map(|w| String::from_utf8_lossy(w).into_owned())
            .collect()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl AsyncWrite for Capture {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        data: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.writes.lock().unwrap().push(data.to_vec());
        Poll::Ready(Ok(data.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Diagnostic sink that keeps every report.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    reports: Mutex<Vec<(UnitId, ErrorKind, String)>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reports(&self) -> Vec<(UnitId, ErrorKind, String)> {
        self.reports.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.reports.lock().unwrap().len()
    }
}

impl DiagnosticSink for CollectingDiagnostics {
    fn report(&self, unit: &UnitId, kind: ErrorKind, error: &anyhow::Error) {
        self.reports
            .lock()
            .unwrap()
            .push((unit.clone(), kind, format!("{error:#}")));
    }
}
