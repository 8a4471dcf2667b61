// src/exec/io.rs

//! Stream bindings and the handle a body uses to talk to them.
//!
//! Before a unit starts, its streams are described by [`InputBinding`] and
//! [`OutputBinding`]. Starting the unit opens them into the live [`UnitIo`]
//! passed to the body. Bindings that wrap process devices (stdin, stdout,
//! stderr) or the null device are *inherited*: they are flushed at the end of
//! a run but never shut down. Everything else (files, pipe ends, custom
//! writers) is *owned* and gets shut down when the unit terminates, which is
//! what lets end-of-stream travel down a pipeline.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::warn;

use crate::context::ExecutionContext;
use crate::exec::report::UnitId;
use crate::types::WriteMode;

pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Buffered line reader over a unit's input.
pub type LineReader = BufReader<BoxReader>;

/// Where a unit reads from.
pub enum InputBinding {
    /// The process stdin.
    Stdin,
    /// Always at end-of-stream.
    Null,
    /// A file, pipe end or host-supplied reader.
    Owned(BoxReader),
}

/// Where a unit writes output or errors to.
pub enum OutputBinding {
    Stdout,
    Stderr,
    /// Discards everything.
    Null,
    /// A file, pipe end or host-supplied writer; shut down when the unit ends.
    Owned(BoxWriter),
}

impl InputBinding {
    pub fn reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        InputBinding::Owned(Box::new(reader))
    }

    /// Open `path` for reading.
    pub fn file(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        Ok(InputBinding::reader(tokio::fs::File::from_std(file)))
    }

    pub(crate) fn open(self) -> LineReader {
        let reader: BoxReader = match self {
            InputBinding::Stdin => Box::new(tokio::io::stdin()),
            InputBinding::Null => Box::new(tokio::io::empty()),
            InputBinding::Owned(reader) => reader,
        };
        BufReader::new(reader)
    }
}

impl OutputBinding {
    pub fn writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        OutputBinding::Owned(Box::new(writer))
    }

    /// Open `path` for writing, creating it if needed.
    pub fn file(path: &Path, mode: WriteMode) -> io::Result<Self> {
        let mut options = std::fs::OpenOptions::new();
        options.create(true);
        match mode {
            WriteMode::Truncate => options.write(true).truncate(true),
            WriteMode::Append => options.append(true),
        };
        let file = options.open(path)?;
        Ok(OutputBinding::writer(tokio::fs::File::from_std(file)))
    }

    pub(crate) fn open(self) -> Output {
        match self {
            OutputBinding::Stdout => Output::inherited(Box::new(tokio::io::stdout())),
            OutputBinding::Stderr => Output {
                process_stderr: true,
                ..Output::inherited(Box::new(tokio::io::stderr()))
            },
            OutputBinding::Null => Output::inherited(Box::new(tokio::io::sink())),
            OutputBinding::Owned(writer) => Output {
                writer,
                owned: true,
                process_stderr: false,
            },
        }
    }
}

impl fmt::Debug for InputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InputBinding::Stdin => "Stdin",
            InputBinding::Null => "Null",
            InputBinding::Owned(_) => "Owned",
        })
    }
}

impl fmt::Debug for OutputBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputBinding::Stdout => "Stdout",
            OutputBinding::Stderr => "Stderr",
            OutputBinding::Null => "Null",
            OutputBinding::Owned(_) => "Owned",
        })
    }
}

/// An opened output stream and whether the unit owns it.
pub(crate) struct Output {
    writer: BoxWriter,
    owned: bool,
    process_stderr: bool,
}

impl Output {
    fn inherited(writer: BoxWriter) -> Self {
        Self {
            writer,
            owned: false,
            process_stderr: false,
        }
    }

    /// Flush, and shut down if owned.
    async fn release(&mut self) -> io::Result<()> {
        self.writer.flush().await?;
        if self.owned {
            self.writer.shutdown().await?;
        }
        Ok(())
    }
}

/// Everything a running body can touch: its arguments, its three streams and
/// the execution context it was created in.
pub struct UnitIo {
    id: UnitId,
    args: Vec<String>,
    expanded: Option<Vec<String>>,
    input: LineReader,
    output: Output,
    error: Output,
    context: Arc<ExecutionContext>,
}

impl UnitIo {
    pub(crate) fn new(
        id: UnitId,
        args: Vec<String>,
        input: LineReader,
        output: Output,
        error: Output,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            id,
            args,
            expanded: None,
            input,
            output,
            error,
            context,
        }
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    /// Raw argument list, as given.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Arguments after glob expansion against the context's current folder.
    ///
    /// Computed on first call and cached for the rest of the run.
    pub fn expanded_args(&mut self) -> Result<Vec<String>> {
        if let Some(expanded) = &self.expanded {
            return Ok(expanded.clone());
        }
        let expanded = self.context.expand(&self.args)?;
        self.expanded = Some(expanded.clone());
        Ok(expanded)
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    /// Read one line without its terminator; `None` at end-of-stream.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Read every remaining line.
    pub async fn read_lines(&mut self) -> io::Result<Vec<String>> {
        let mut lines = Vec::new();
        while let Some(line) = self.read_line().await? {
            lines.push(line);
        }
        Ok(lines)
    }

    /// Raw buffered input.
    pub fn input(&mut self) -> &mut LineReader {
        &mut self.input
    }

    pub async fn print(&mut self, text: &str) -> io::Result<()> {
        self.output.writer.write_all(text.as_bytes()).await
    }

    /// Write `line` and its newline in one call, so lines from units sharing
    /// a device do not interleave.
    pub async fn println(&mut self, line: &str) -> io::Result<()> {
        self.output.writer.write_all(format!("{line}\n").as_bytes()).await
    }

    pub async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.writer.write_all(bytes).await
    }

    pub async fn eprintln(&mut self, line: &str) -> io::Result<()> {
        self.error.writer.write_all(format!("{line}\n").as_bytes()).await
    }

    pub async fn flush(&mut self) -> io::Result<()> {
        self.output.writer.flush().await
    }

    /// Raw output writer.
    pub fn output(&mut self) -> &mut (dyn AsyncWrite + Send + Unpin) {
        self.output.writer.as_mut()
    }

    /// True when the error stream is the process stderr.
    pub fn error_is_stderr(&self) -> bool {
        self.error.process_stderr
    }

    /// Raw error writer.
    pub fn error(&mut self) -> &mut (dyn AsyncWrite + Send + Unpin) {
        self.error.writer.as_mut()
    }

    /// Replace the raw argument list, returning the previous one. Clears the
    /// expansion cache so the next body sees its own arguments.
    pub(crate) fn swap_args(&mut self, args: Vec<String>) -> Vec<String> {
        self.expanded = None;
        std::mem::replace(&mut self.args, args)
    }

    /// Flush both output streams and shut down the owned ones.
    pub(crate) async fn release(&mut self) {
        if let Err(err) = self.output.release().await {
            warn!(unit = %self.id, error = %err, "failed to release output stream");
        }
        if let Err(err) = self.error.release().await {
            warn!(unit = %self.id, error = %err, "failed to release error stream");
        }
    }
}

impl fmt::Debug for UnitIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitIo")
            .field("id", &self.id)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
