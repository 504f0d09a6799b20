//! Ordered undo actions for multi-step provisioning.

use futures_util::future::BoxFuture;

use crate::error::Result;

type UndoAction<'a> = Box<dyn FnOnce() -> BoxFuture<'a, Result<()>> + Send + 'a>;

/// A stack of undo actions, one per completed side effect.
///
/// Actions are pushed as side effects complete and run in reverse on
/// [`unwind`](Self::unwind). A failing action does not stop the others.
#[derive(Default)]
pub struct CompensationStack<'a> {
    actions: Vec<(String, UndoAction<'a>)>,
}

/// What happened while unwinding a [`CompensationStack`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
    /// Labels of actions that succeeded, in execution order.
    pub completed: Vec<String>,
    /// `label: error` for every action that failed, in execution order.
    pub failed: Vec<String>,
}

impl CompensationReport {
    /// Returns true if every undo action succeeded.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<'a> CompensationStack<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an undo action.
    pub fn push<F>(&mut self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> BoxFuture<'a, Result<()>> + Send + 'a,
    {
        self.actions.push((label.into(), Box::new(action)));
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Returns the labels in the order they will run.
    pub fn labels(&self) -> Vec<&str> {
        self.actions
            .iter()
            .rev()
            .map(|(label, _)| label.as_str())
            .collect()
    }

    /// Runs every action, last pushed first.
    pub async fn unwind(self) -> CompensationReport {
        let mut report = CompensationReport::default();

        for (label, action) in self.actions.into_iter().rev() {
            match action().await {
                Ok(()) => {
                    tracing::debug!(step = %label, "compensation step completed");
                    report.completed.push(label);
                }
                Err(e) => {
                    tracing::warn!(step = %label, error = %e, "compensation step failed");
                    report.failed.push(format!("{label}: {e}"));
                }
            }
        }

        report
    }
}
