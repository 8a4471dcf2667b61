use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipeshell::context::ExecutionContext;
use pipeshell::errors::ShellError;
use pipeshell::exec::ExecutionUnit;

/// Shared log of which test units ran and what they saw.
///
/// Units push their id when they start, and `"<id>:<line>"` for every input
/// line they consume.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Ids of the units that ran, in start order.
    pub fn ran(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| !e.contains(':'))
            .collect()
    }

    /// Lines consumed by unit `id`.
    pub fn lines_of(&self, id: &str) -> Vec<String> {
        let prefix = format!("{id}:");
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// Records its id, then copies input to output line by line, recording
    /// each line.
    pub fn tester(&self, ctx: &Arc<ExecutionContext>, id: &str) -> ExecutionUnit {
        self.slow_tester(ctx, id, Duration::ZERO)
    }

    /// Like [`Recorder::tester`], sleeping for `delay` before reading.
    pub fn slow_tester(
        &self,
        ctx: &Arc<ExecutionContext>,
        id: &str,
        delay: Duration,
    ) -> ExecutionUnit {
        let recorder = self.clone();
        let name = id.to_string();
        ExecutionUnit::with_context(Arc::clone(ctx), move |io| {
            Box::pin(async move {
                recorder.record(name.clone());
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                while let Some(line) = io.read_line().await? {
                    recorder.record(format!("{name}:{line}"));
                    io.println(&line).await?;
                }
                Ok(())
            })
        })
        .named(id)
    }

    /// Records its id, then writes `lines`, pausing `gap` after the first.
    pub fn emitter(
        &self,
        ctx: &Arc<ExecutionContext>,
        id: &str,
        lines: &[&str],
        gap: Duration,
    ) -> ExecutionUnit {
        let recorder = self.clone();
        let name = id.to_string();
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        ExecutionUnit::with_context(Arc::clone(ctx), move |io| {
            Box::pin(async move {
                recorder.record(name);
                for (i, line) in lines.iter().enumerate() {
                    io.println(line).await?;
                    if i == 0 && !gap.is_zero() {
                        tokio::time::sleep(gap).await;
                    }
                }
                Ok(())
            })
        })
        .named(id)
    }

    /// Records its id, then fails with a state error.
    pub fn failing(&self, ctx: &Arc<ExecutionContext>, id: &str) -> ExecutionUnit {
        let recorder = self.clone();
        let name = id.to_string();
        ExecutionUnit::with_context(Arc::clone(ctx), move |_io| {
            Box::pin(async move {
                recorder.record(name.clone());
                Err(anyhow::Error::new(ShellError::state(format!("{name} failed"))))
            })
        })
        .named(id)
    }

    /// Records its id and its raw arguments as `"<id>:<arg>"`.
    pub fn arg_logger(&self, ctx: &Arc<ExecutionContext>, id: &str, args: &[&str]) -> ExecutionUnit {
        let recorder = self.clone();
        let name = id.to_string();
        ExecutionUnit::with_context(Arc::clone(ctx), move |io| {
            Box::pin(async move {
                recorder.record(name.clone());
                for arg in io.args() {
                    recorder.record(format!("{name}:{arg}"));
                }
                Ok(())
            })
        })
        .named(id)
        .with_args(args.iter().copied())
    }
}
