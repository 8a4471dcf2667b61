// src/context/registry.rs

//! Lookup of execution contexts by logical task.
//!
//! A "logical task" is whatever the host says it is: the key travels in a
//! tokio task-local set by [`ContextRegistry::scope`]. Code running outside
//! any scope shares the [`TaskKey::root`] context.
//!
//! Contexts are created on first lookup and live until they are disposed,
//! either explicitly or when the scope that introduced their key ends.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::debug;

use crate::config::ShellConfig;
use crate::context::ExecutionContext;

tokio::task_local! {
    static CURRENT_TASK: TaskKey;
}

static NEXT_UNIQUE: AtomicU64 = AtomicU64::new(1);
static GLOBAL: OnceLock<ContextRegistry> = OnceLock::new();

/// Identity of a logical task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey(Arc<str>);

impl TaskKey {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Key used when no scope is active.
    pub fn root() -> Self {
        Self::new("root")
    }

    /// A key no other caller will produce.
    pub fn unique() -> Self {
        let n = NEXT_UNIQUE.fetch_add(1, Ordering::Relaxed);
        Self::new(format!("task-{n}"))
    }

    /// Key of the enclosing scope, or the root key.
    pub fn current() -> Self {
        CURRENT_TASK
            .try_with(|key| key.clone())
            .unwrap_or_else(|_| Self::root())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: Mutex<HashMap<TaskKey, Arc<ExecutionContext>>>,
    config: ShellConfig,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// New contexts are seeded from `config`.
    pub fn with_config(config: ShellConfig) -> Self {
        Self {
            contexts: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Process-wide registry used by [`crate::exec::ExecutionUnit::new`].
    pub fn global() -> &'static ContextRegistry {
        GLOBAL.get_or_init(ContextRegistry::new)
    }

    /// Configure the process-wide registry.
    ///
    /// Returns `false` if it was already initialised (explicitly or by a
    /// previous lookup), in which case `config` is ignored.
    pub fn install_global(config: ShellConfig) -> bool {
        GLOBAL.set(ContextRegistry::with_config(config)).is_ok()
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskKey, Arc<ExecutionContext>>> {
        self.contexts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The context for `key`, created on first lookup.
    pub fn context_for(&self, key: &TaskKey) -> Arc<ExecutionContext> {
        let mut contexts = self.lock();
        if let Some(ctx) = contexts.get(key) {
            return Arc::clone(ctx);
        }
        debug!(task = %key, "creating execution context");
        let ctx = Arc::new(ExecutionContext::from_config(&self.config));
        contexts.insert(key.clone(), Arc::clone(&ctx));
        ctx
    }

    /// The context of the enclosing scope.
    pub fn current(&self) -> Arc<ExecutionContext> {
        self.context_for(&TaskKey::current())
    }

    /// Register a pre-built context for `key`, replacing any existing one.
    pub fn insert(&self, key: TaskKey, ctx: Arc<ExecutionContext>) -> Option<Arc<ExecutionContext>> {
        self.lock().insert(key, ctx)
    }

    /// Forget the context of `key`. Units still holding it keep it alive.
    pub fn dispose(&self, key: &TaskKey) -> bool {
        let removed = self.lock().remove(key).is_some();
        if removed {
            debug!(task = %key, "disposed execution context");
        }
        removed
    }

    pub fn contains(&self, key: &TaskKey) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Run `fut` as logical task `key`, then dispose of its context.
    ///
    /// Units created inside `fut` through the current-task lookup share one
    /// context; once `fut` completes the registry no longer holds it.
    pub async fn scope<F>(&self, key: TaskKey, fut: F) -> F::Output
    where
        F: Future,
    {
        let out = CURRENT_TASK.scope(key.clone(), fut).await;
        self.dispose(&key);
        out
    }
}
