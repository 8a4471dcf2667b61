// src/exec/mod.rs

//! Execution layer: units, their streams, and how they are wired.
//!
//! - [`unit`] holds `ExecutionUnit`, its composers (`pipe`, `and`, `or`),
//!   redirection and the run boundary.
//! - [`body`] defines the function type a unit runs.
//! - [`io`] provides stream bindings and the `UnitIo` handle given to bodies.
//! - [`pipe`] is the bounded byte channel between pipeline stages.
//! - [`report`] has unit ids, run reports, join handles and the diagnostic
//!   sink trait.

pub mod body;
pub mod io;
pub mod pipe;
pub mod report;
pub mod unit;

pub use body::{Body, BodyFuture, body};
pub use io::{InputBinding, OutputBinding, UnitIo};
pub use pipe::PIPE_BUFFER_SIZE;
pub use report::{DiagnosticSink, TracingDiagnostics, UnitHandle, UnitId, UnitReport, UnitStatus};
pub use unit::ExecutionUnit;
