// src/exec/unit.rs

//! `ExecutionUnit`: a body plus its stream bindings, and the composers that
//! wire units together.
//!
//! Lifecycle:
//!
//! 1. build: `ExecutionUnit::new(body)`, then rebinding calls
//!    (`redirect`, `set_output`, ...) and composers (`pipe`, `and`, `or`);
//! 2. `start()`: predecessors are started first, then this unit is spawned
//!    as its own tokio task;
//! 3. the body runs inside the run boundary, which catches its error or
//!    panic exactly once, reports it and releases owned streams.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::context::{ContextRegistry, ExecutionContext};
use crate::errors::{ErrorKind, Result};
use crate::exec::body::{Body, BodyFuture, body};
use crate::exec::io::{InputBinding, OutputBinding, UnitIo};
use crate::exec::pipe;
use crate::exec::report::{DiagnosticSink, TracingDiagnostics, UnitHandle, UnitId, UnitReport};
use crate::types::WriteMode;

pub struct ExecutionUnit {
    id: UnitId,
    body: Body,
    args: Vec<String>,
    input: InputBinding,
    output: OutputBinding,
    error: OutputBinding,
    predecessor: Option<Box<ExecutionUnit>>,
    context: Arc<ExecutionContext>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl ExecutionUnit {
    /// A unit bound to the current task's context from the global registry,
    /// reading stdin and writing stdout / stderr.
    pub fn new<F>(f: F) -> Self
    where
        F: for<'a> FnOnce(&'a mut UnitIo) -> BodyFuture<'a> + Send + 'static,
    {
        Self::from_body(ContextRegistry::global().current(), body(f))
    }

    /// Like [`ExecutionUnit::new`] with an explicit context.
    pub fn with_context<F>(context: Arc<ExecutionContext>, f: F) -> Self
    where
        F: for<'a> FnOnce(&'a mut UnitIo) -> BodyFuture<'a> + Send + 'static,
    {
        Self::from_body(context, body(f))
    }

    pub fn from_body(context: Arc<ExecutionContext>, body: Body) -> Self {
        Self {
            id: UnitId::generate(),
            body,
            args: Vec::new(),
            input: InputBinding::Stdin,
            output: OutputBinding::Stdout,
            error: OutputBinding::Stderr,
            predecessor: None,
            context,
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    pub fn named(mut self, id: impl Into<UnitId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn id(&self) -> &UnitId {
        &self.id
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn context(&self) -> &Arc<ExecutionContext> {
        &self.context
    }

    pub fn has_predecessor(&self) -> bool {
        self.predecessor.is_some()
    }

    /// Expand this unit's arguments without running it.
    pub fn expanded_args(&self) -> Result<Vec<String>> {
        self.context.expand(&self.args)
    }

    // ---------------------------------------------------------------------
    // Stream binding. Each call replaces the previous binding.
    // ---------------------------------------------------------------------

    pub fn set_input(mut self, input: InputBinding) -> Self {
        self.input = input;
        self
    }

    pub fn set_output(mut self, output: OutputBinding) -> Self {
        self.output = output;
        self
    }

    pub fn set_error(mut self, error: OutputBinding) -> Self {
        self.error = error;
        self
    }

    /// Discard output.
    pub fn to_null(self) -> Self {
        self.set_output(OutputBinding::Null)
    }

    /// Write output to `path`, truncating it.
    pub fn redirect(self, path: &str) -> Result<Self> {
        let target = self.context.absolute_path(path)?;
        self.redirect_output(&target, WriteMode::Truncate)
    }

    /// Append output to `path`.
    pub fn append(self, path: &str) -> Result<Self> {
        let target = self.context.absolute_path(path)?;
        self.redirect_output(&target, WriteMode::Append)
    }

    /// Read input from `path`.
    pub fn redirect_from(self, path: &str) -> Result<Self> {
        let source = self.context.absolute_path(path)?;
        debug!(unit = %self.id, path = %source.display(), "redirecting input");
        let input = InputBinding::file(&source)?;
        Ok(self.set_input(input))
    }

    /// Write the error stream to `path`, truncating it.
    pub fn redirect_err(self, path: &str) -> Result<Self> {
        let target = self.context.absolute_path(path)?;
        debug!(unit = %self.id, path = %target.display(), "redirecting errors");
        let error = OutputBinding::file(&target, WriteMode::Truncate)?;
        Ok(self.set_error(error))
    }

    fn redirect_output(self, target: &Path, mode: WriteMode) -> Result<Self> {
        debug!(unit = %self.id, path = %target.display(), ?mode, "redirecting output");
        let output = OutputBinding::file(target, mode)?;
        Ok(self.set_output(output))
    }

    // ---------------------------------------------------------------------
    // Composition
    // ---------------------------------------------------------------------

    /// Connect this unit's output to `next`'s input and return `next`, which
    /// now owns this unit as its predecessor.
    pub fn pipe(self, next: ExecutionUnit) -> ExecutionUnit {
        let capacity = self.context.pipe_capacity();
        self.pipe_with_capacity(next, capacity)
    }

    pub fn pipe_with_capacity(mut self, mut next: ExecutionUnit, capacity: usize) -> ExecutionUnit {
        let (writer, reader) = pipe::channel(capacity);
        debug!(from = %self.id, to = %next.id, capacity, "connecting pipe");
        self.output = OutputBinding::writer(writer);
        next.input = InputBinding::reader(reader);
        if next.predecessor.is_some() {
            warn!(unit = %next.id, "pipe target already had a predecessor; replacing it");
        }
        next.predecessor = Some(Box::new(self));
        next
    }

    /// Run `next` after this unit's body, only if it succeeded.
    pub fn and(self, next: ExecutionUnit) -> ExecutionUnit {
        self.combine(next, Gate::And)
    }

    /// Run `next` after this unit's body, only if it failed.
    pub fn or(self, next: ExecutionUnit) -> ExecutionUnit {
        self.combine(next, Gate::Or)
    }

    fn combine(self, next: ExecutionUnit, gate: Gate) -> ExecutionUnit {
        let ExecutionUnit {
            id: first_id,
            body: first_body,
            args: first_args,
            input,
            output: _,
            error: _,
            predecessor,
            context,
            diagnostics,
        } = self;
        let ExecutionUnit {
            id: second_id,
            body: second_body,
            args: second_args,
            input: _,
            output,
            error,
            predecessor: second_predecessor,
            ..
        } = next;

        if second_predecessor.is_some() {
            warn!(
                unit = %second_id,
                "predecessor of the second operand is discarded by {}",
                gate.symbol()
            );
        }

        let id = UnitId::new(format!("({first_id} {} {second_id})", gate.symbol()));
        let first = Part {
            id: first_id,
            body: first_body,
            args: first_args,
        };
        let second = Part {
            id: second_id,
            body: second_body,
            args: second_args,
        };

        let composite = body(move |io| {
            Box::pin(async move {
                match gate {
                    Gate::And => {
                        first.run(io).await?;
                        second.run(io).await
                    }
                    Gate::Or => {
                        let first_id = first.id.clone();
                        match first.run(io).await {
                            Ok(()) => Ok(()),
                            Err(err) => {
                                debug!(
                                    unit = %first_id,
                                    error = %format!("{err:#}"),
                                    "first operand failed, running alternative"
                                );
                                second.run(io).await
                            }
                        }
                    }
                }
            })
        });

        ExecutionUnit {
            id,
            body: composite,
            args: Vec::new(),
            input,
            output,
            error,
            predecessor,
            context,
            diagnostics,
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Start predecessors, then spawn this unit. Must be called inside a
    /// tokio runtime.
    pub fn start(self) -> UnitHandle {
        let ExecutionUnit {
            id,
            body,
            args,
            input,
            output,
            error,
            predecessor,
            context,
            diagnostics,
        } = self;

        let upstream = predecessor.map(|p| Box::new(p.start()));
        let io = UnitIo::new(
            id.clone(),
            args,
            input.open(),
            output.open(),
            error.open(),
            context,
        );
        let task = tokio::spawn(run_unit(io, body, diagnostics));
        UnitHandle::new(id, task, upstream)
    }

    /// Start and wait for this unit (not its predecessors).
    pub async fn sh(self) -> UnitReport {
        self.start().wait().await
    }
}

impl fmt::Debug for ExecutionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionUnit")
            .field("id", &self.id)
            .field("args", &self.args)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("error", &self.error)
            .field("predecessor", &self.predecessor.as_ref().map(|p| &p.id))
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy)]
enum Gate {
    And,
    Or,
}

impl Gate {
    fn symbol(self) -> &'static str {
        match self {
            Gate::And => "&&",
            Gate::Or => "||",
        }
    }
}

/// One operand of an `and` / `or` composite.
struct Part {
    id: UnitId,
    body: Body,
    args: Vec<String>,
}

impl Part {
    async fn run(self, io: &mut UnitIo) -> anyhow::Result<()> {
        let saved = io.swap_args(self.args);
        let result = (self.body)(io).await;
        io.swap_args(saved);
        result
    }
}

/// The run boundary.
async fn run_unit(mut io: UnitIo, body: Body, diagnostics: Arc<dyn DiagnosticSink>) -> UnitReport {
    let id = io.id().clone();
    debug!(unit = %id, "unit started");

    let outcome = match CatchPanic(body(&mut io)).await {
        Ok(result) => result.map_err(|err| (ErrorKind::of(&err), err)),
        Err(message) => Err((ErrorKind::Panic, anyhow!("panicked: {message}"))),
    };

    let report = match outcome {
        Ok(()) => UnitReport::succeeded(id.clone()),
        Err((kind, err)) => {
            diagnostics.report(&id, kind, &err);
            if echo_failure(io.error_is_stderr(), diagnostics.as_ref()) {
                let line = format!("{id}: {err:#}");
                if let Err(write_err) = io.eprintln(&line).await {
                    debug!(unit = %id, error = %write_err, "could not write to error stream");
                }
            }
            UnitReport::failed(id.clone(), kind, format!("{err:#}"))
        }
    };

    io.release().await;
    debug!(unit = %id, success = report.is_success(), "unit finished");
    report
}

/// Whether the failure line goes to the unit's error stream. Skipped only
/// when that stream is the process stderr and the sink already reported there.
fn echo_failure(error_is_stderr: bool, diagnostics: &dyn DiagnosticSink) -> bool {
    !(error_is_stderr && diagnostics.reaches_stderr())
}

/// Turns a panic while polling a body into an error value.
struct CatchPanic<'a>(BodyFuture<'a>);

impl Future for CatchPanic<'_> {
    type Output = std::result::Result<anyhow::Result<()>, String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let fut = &mut self.get_mut().0;
        match panic::catch_unwind(AssertUnwindSafe(|| fut.as_mut().poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(result)) => Poll::Ready(Ok(result)),
            Err(payload) => Poll::Ready(Err(panic_message(payload.as_ref()))),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
