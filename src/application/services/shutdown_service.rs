//! Shutdown coordinator - runs every plugin's exit hook

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::application::errors::{PluginError, PluginResult};

/// Shutdown hook function type
pub type ShutdownHook = Box<dyn Fn() -> PluginResult<()> + Send + Sync>;

struct RegisteredHook {
    plugin: String,
    hook: ShutdownHook,
}

/// Outcome of one `shutdown_all` run
#[derive(Debug, Default)]
pub struct ShutdownReport {
    pub invoked: usize,
    /// Plugin alias and failure of each hook that did not finish cleanly
    pub failures: Vec<(String, PluginError)>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered collection of exit hooks. Hooks are never removed.
#[derive(Default)]
pub struct ShutdownCoordinator {
    hooks: Vec<RegisteredHook>,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hook<F>(&mut self, plugin: impl Into<String>, hook: F)
    where
        F: Fn() -> PluginResult<()> + Send + Sync + 'static,
    {
        self.hooks.push(RegisteredHook {
            plugin: plugin.into(),
            hook: Box::new(hook),
        });
    }

    /// Invoke every hook in registration order.
    ///
    /// A hook that fails or panics is logged and recorded; the remaining hooks
    /// still run. Safe to call more than once, hooks run again each time.
    pub fn shutdown_all(&self) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        for registered in &self.hooks {
            report.invoked += 1;
            let outcome = catch_unwind(AssertUnwindSafe(|| (registered.hook)()));
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic) => PluginError::Hook(panic_message(panic.as_ref())),
            };
            tracing::error!("Error while exiting the module {}: {}", registered.plugin, failure);
            report.failures.push((registered.plugin.clone(), failure));
        }

        tracing::info!(
            "Shutdown hooks finished: {} run, {} failed",
            report.invoked,
            report.failures.len()
        );
        report
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.hooks.iter().map(|h| &h.plugin)).finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}
