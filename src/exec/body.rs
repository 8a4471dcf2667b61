// src/exec/body.rs

//! The function type a unit runs.
//!
//! A body borrows the unit's [`UnitIo`] for as long as its future lives, so
//! it can read, write and inspect arguments without owning any stream.
//! Build one with [`body`] (or pass the closure straight to
//! [`ExecutionUnit::new`](crate::exec::ExecutionUnit::new)):
//!
//! ```ignore
//! let upper = ExecutionUnit::new(|io| Box::pin(async move {
//!     while let Some(line) = io.read_line().await? {
//!         io.println(&line.to_uppercase()).await?;
//!     }
//!     Ok(())
//! }));
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::exec::io::UnitIo;

/// Future returned by a body, borrowing the unit's streams for `'a`.
pub type BodyFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// A boxed, run-once unit body.
pub type Body = Box<dyn for<'a> FnOnce(&'a mut UnitIo) -> BodyFuture<'a> + Send + 'static>;

/// Box a closure as a [`Body`].
///
/// Going through a generic bound lets the compiler infer the higher-ranked
/// signature for the closure.
pub fn body<F>(f: F) -> Body
where
    F: for<'a> FnOnce(&'a mut UnitIo) -> BodyFuture<'a> + Send + 'static,
{
    Box::new(f)
}

