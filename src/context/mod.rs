// src/context/mod.rs

//! Per-task execution state.
//!
//! An [`ExecutionContext`] carries what a real shell keeps per process: the
//! current folder, environment variables and the `pushd`/`popd` history.
//! Every unit holds an `Arc` to the context it was created in; path
//! resolution and glob expansion read the current folder from it.
//!
//! Contexts are looked up through a [`ContextRegistry`] keyed by
//! [`TaskKey`]. A context is meant to be mutated only by units running on
//! behalf of its own task. The internal lock keeps that memory-safe but does
//! not order concurrent writers.

pub mod registry;

pub use registry::{ContextRegistry, TaskKey};

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::config::ShellConfig;
use crate::errors::{Result, ShellError};
use crate::exec::pipe::PIPE_BUFFER_SIZE;
use crate::fs::FileSystem;
use crate::glob::Expander;
use crate::paths;
use crate::types::ZeroMatchPolicy;

#[derive(Debug)]
struct ContextState {
    current_folder: PathBuf,
    env: HashMap<String, String>,
    history: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct ExecutionContext {
    state: RwLock<ContextState>,
    expander: Expander,
    pipe_capacity: usize,
}

impl ExecutionContext {
    /// A context rooted at `current_folder`, with the real filesystem,
    /// default pipe capacity and the `Drop` zero-match policy.
    pub fn new(current_folder: impl Into<PathBuf>) -> Self {
        Self {
            state: RwLock::new(ContextState {
                current_folder: current_folder.into(),
                env: HashMap::new(),
                history: Vec::new(),
            }),
            expander: Expander::default(),
            pipe_capacity: PIPE_BUFFER_SIZE,
        }
    }

    pub fn from_config(cfg: &ShellConfig) -> Self {
        let env = cfg
            .env()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Self::new(cfg.initial_dir())
            .with_env(env)
            .with_zero_match(cfg.zero_match())
            .with_pipe_capacity(cfg.pipe_capacity())
    }

    pub fn with_env(self, env: HashMap<String, String>) -> Self {
        self.write().env = env;
        self
    }

    pub fn with_zero_match(mut self, policy: ZeroMatchPolicy) -> Self {
        self.expander = Expander::new(self.expander.filesystem(), policy);
        self
    }

    /// Swap the filesystem used for glob expansion (tests use a mock).
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.expander = Expander::new(fs, self.expander.policy());
        self
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    fn read(&self) -> RwLockReadGuard<'_, ContextState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ContextState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn current_folder(&self) -> PathBuf {
        self.read().current_folder.clone()
    }

    pub fn set_current_folder(&self, folder: impl Into<PathBuf>) {
        let folder = folder.into();
        debug!(folder = ?folder, "current folder changed");
        self.write().current_folder = folder;
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.read().env.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.write().env.insert(key.into(), value.into());
    }

    pub fn unset(&self, key: &str) -> Option<String> {
        self.write().env.remove(key)
    }

    /// Snapshot of the environment.
    pub fn env(&self) -> HashMap<String, String> {
        self.read().env.clone()
    }

    /// Save the current folder in the history, then move to `folder`.
    pub fn push_folder(&self, folder: impl Into<PathBuf>) {
        let mut state = self.write();
        let previous = std::mem::replace(&mut state.current_folder, folder.into());
        state.history.push(previous);
    }

    /// Return to the most recently saved folder.
    pub fn pop_folder(&self) -> Result<PathBuf> {
        let mut state = self.write();
        let folder = state
            .history
            .pop()
            .ok_or_else(|| ShellError::state("directory history is empty"))?;
        state.current_folder = folder.clone();
        Ok(folder)
    }

    pub fn history_len(&self) -> usize {
        self.read().history.len()
    }

    /// Resolve `path` against the current folder (see [`paths::absolute_path`]).
    pub fn absolute_path(&self, path: &str) -> Result<PathBuf> {
        paths::absolute_path(&self.current_folder(), path)
    }

    /// Glob-expand `args` against the current folder.
    pub fn expand<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<String>> {
        self.expander.expand(args, &self.current_folder())
    }

    pub fn expander(&self) -> &Expander {
        &self.expander
    }

    pub fn zero_match(&self) -> ZeroMatchPolicy {
        self.expander.policy()
    }

    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::from_config(&ShellConfig::default())
    }
}
