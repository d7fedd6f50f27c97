//! Dependent actions run after a record is persisted.
//!
//! Actions are side effects such as downloading the audio of a completed
//! recording. They are best-effort: a failing action is logged and counted,
//! never retried, and never undoes the persistence that triggered it.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use sync_types::{PersistedRecord, ResourceType};
use thiserror::Error;
use tracing::{debug, warn};

/// Dependent action errors.
#[derive(Debug, Error)]
pub enum ActionError {
    /// I/O failure (file system).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Remote failure while fetching an attachment.
    #[error("remote error: {0}")]
    Remote(String),
}

/// Side effect invoked once per freshly persisted record of a type.
#[async_trait]
pub trait DependentAction: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run the action for `record`.
    async fn on_persisted(&self, record: &PersistedRecord) -> Result<(), ActionError>;
}

/// Outcome of dispatching one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Actions invoked.
    pub invoked: usize,
    /// Actions that returned an error.
    pub failed: usize,
}

/// Registry of dependent actions keyed by resource type.
#[derive(Default, Clone)]
pub struct ActionDispatcher {
    actions: HashMap<ResourceType, Vec<Arc<dyn DependentAction>>>,
}

impl ActionDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `action` for records of `resource_type`.
    pub fn register(&mut self, resource_type: ResourceType, action: Arc<dyn DependentAction>) {
        self.actions.entry(resource_type).or_default().push(action);
    }

    /// Whether any action is registered for `resource_type`.
    pub fn has_actions(&self, resource_type: ResourceType) -> bool {
        self.actions
            .get(&resource_type)
            .is_some_and(|a| !a.is_empty())
    }

    /// Invoke every action registered for the record's type.
    pub async fn dispatch(&self, record: &PersistedRecord) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let Some(actions) = self.actions.get(&record.resource_type()) else {
            return summary;
        };

        for action in actions {
            summary.invoked += 1;
            match action.on_persisted(record).await {
                Ok(()) => debug!(
                    action = action.name(),
                    sid = %record.sid(),
                    "Dependent action completed"
                ),
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        action = action.name(),
                        sid = %record.sid(),
                        error = %e,
                        "Dependent action failed"
                    );
                }
            }
        }
        summary
    }
}

impl std::fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (resource_type, actions) in &self.actions {
            let names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
            map.entry(resource_type, &names);
        }
        map.finish()
    }
}
