//! Command synchronizer - converges the platform's registered commands
//! with the composed descriptor set, scope by scope

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::application::errors::RegistryError;
use crate::domain::entities::{CommandDescriptor, RegisteredCommand, Scope};
use crate::domain::traits::CommandRegistry;

/// One step needed to bring a scope in line with the desired set
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    Create(CommandDescriptor),
    Update { id: String, descriptor: CommandDescriptor },
    Delete { id: String, name: String },
    Unchanged { name: String },
}

impl SyncAction {
    pub fn name(&self) -> &str {
        match self {
            SyncAction::Create(descriptor) | SyncAction::Update { descriptor, .. } => &descriptor.name,
            SyncAction::Delete { name, .. } | SyncAction::Unchanged { name } => name,
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            SyncAction::Create(_) => "create",
            SyncAction::Update { .. } => "update",
            SyncAction::Delete { .. } => "delete",
            SyncAction::Unchanged { .. } => "unchanged",
        }
    }

    pub fn is_mutation(&self) -> bool {
        !matches!(self, SyncAction::Unchanged { .. })
    }
}

/// Diff remote state against the desired descriptors of one scope.
///
/// Names are the join key. Desired entries come first in their declared
/// order, followed by deletions in remote order. When the remote holds the
/// same name more than once, the first entry is reconciled and the rest
/// are deleted.
pub fn plan(existing: &[RegisteredCommand], desired: &[CommandDescriptor]) -> Vec<SyncAction> {
    let mut actions = Vec::with_capacity(desired.len() + existing.len());

    for descriptor in desired {
        let action = match existing.iter().find(|e| e.name == descriptor.name) {
            None => SyncAction::Create(descriptor.clone()),
            Some(found) if !found.matches(descriptor) => SyncAction::Update {
                id: found.id.clone(),
                descriptor: descriptor.clone(),
            },
            Some(_) => SyncAction::Unchanged { name: descriptor.name.clone() },
        };
        actions.push(action);
    }

    for (i, entry) in existing.iter().enumerate() {
        let wanted = desired.iter().any(|d| d.name == entry.name);
        let duplicate = existing[..i].iter().any(|e| e.name == entry.name);
        if !wanted || duplicate {
            actions.push(SyncAction::Delete {
                id: entry.id.clone(),
                name: entry.name.clone(),
            });
        }
    }

    actions
}

/// A registry call that failed during a pass
#[derive(Debug, Clone, Serialize)]
pub struct ActionFailure {
    pub action: &'static str,
    pub name: String,
    pub error: String,
}

/// Outcome of one scope's pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScopeReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub unchanged: usize,
    pub failures: Vec<ActionFailure>,
    /// Set when the remote listing failed and the scope was skipped
    pub aborted: Option<String>,
}

impl ScopeReport {
    pub fn mutations(&self) -> usize {
        self.created + self.updated + self.deleted
    }

    pub fn is_clean(&self) -> bool {
        self.aborted.is_none() && self.failures.is_empty()
    }

    fn record(&mut self, action: &SyncAction) {
        match action {
            SyncAction::Create(_) => self.created += 1,
            SyncAction::Update { .. } => self.updated += 1,
            SyncAction::Delete { .. } => self.deleted += 1,
            SyncAction::Unchanged { .. } => self.unchanged += 1,
        }
    }
}

/// Aggregated outcome of a synchronization pass over every scope
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub scopes: BTreeMap<String, ScopeReport>,
}

impl SyncReport {
    pub fn scope(&self, scope: Scope) -> Option<&ScopeReport> {
        self.scopes.get(&scope.to_string())
    }

    pub fn mutations(&self) -> usize {
        self.scopes.values().map(ScopeReport::mutations).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.scopes.values().all(ScopeReport::is_clean)
    }
}

/// Runs synchronization passes against a command registry.
/// At most one pass per scope is in flight at any time.
pub struct Synchronizer {
    registry: Arc<dyn CommandRegistry>,
    locks: Mutex<HashMap<Scope, Arc<tokio::sync::Mutex<()>>>>,
}

impl Synchronizer {
    pub fn new(registry: Arc<dyn CommandRegistry>) -> Self {
        Self {
            registry,
            locks: Mutex::new(HashMap::new()),
        }
    }

    fn scope_lock(&self, scope: Scope) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(scope).or_default().clone()
    }

    /// Compute the actions a pass would take for one scope, without applying them
    pub async fn preview(
        &self,
        scope: Scope,
        desired: &[CommandDescriptor],
    ) -> Result<Vec<SyncAction>, RegistryError> {
        let existing = self.registry.list_commands(scope).await?;
        Ok(plan(&existing, desired))
    }

    /// Reconcile one scope. Calls within the scope are applied one at a time.
    pub async fn sync_scope(&self, scope: Scope, desired: &[CommandDescriptor]) -> ScopeReport {
        let lock = self.scope_lock(scope);
        let _guard = lock.lock().await;
        let mut report = ScopeReport::default();

        let existing = match self.registry.list_commands(scope).await {
            Ok(existing) => existing,
            Err(e) => {
                error!("[{}] Failed to list registered commands, skipping scope: {}", scope, e);
                report.aborted = Some(e.to_string());
                return report;
            }
        };

        for action in plan(&existing, desired) {
            let result = match &action {
                SyncAction::Create(descriptor) => {
                    self.registry.create_command(scope, descriptor).await.map(|_| ())
                }
                SyncAction::Update { id, descriptor } => {
                    self.registry.update_command(scope, id, descriptor).await.map(|_| ())
                }
                SyncAction::Delete { id, .. } => self.registry.delete_command(scope, id).await,
                SyncAction::Unchanged { .. } => Ok(()),
            };

            match result {
                Ok(()) => {
                    if action.is_mutation() {
                        debug!("[{}] {} /{}", scope, action.verb(), action.name());
                    }
                    report.record(&action);
                }
                Err(e) => {
                    let unauthorized = e == RegistryError::Unauthorized;
                    report.failures.push(ActionFailure {
                        action: action.verb(),
                        name: action.name().to_string(),
                        error: e.to_string(),
                    });
                    // the registry refused the bot; nothing else in this scope can succeed
                    if unauthorized {
                        error!("[{}] Unauthorized to {} /{}, aborting scope", scope, action.verb(), action.name());
                        report.aborted = Some(e.to_string());
                        break;
                    }
                    warn!("[{}] Failed to {} /{}: {}", scope, action.verb(), action.name(), e);
                }
            }
        }

        info!(
            "[{}] Sync done: {} created, {} updated, {} deleted, {} unchanged, {} failed",
            scope,
            report.created,
            report.updated,
            report.deleted,
            report.unchanged,
            report.failures.len()
        );
        report
    }

    /// Run one pass over every scope. Scopes are reconciled concurrently.
    pub async fn synchronize(
        self: &Arc<Self>,
        desired: &BTreeMap<Scope, Vec<CommandDescriptor>>,
    ) -> SyncReport {
        let started_at = Utc::now();
        let mut tasks = JoinSet::new();

        for (scope, descriptors) in desired {
            let this = Arc::clone(self);
            let scope = *scope;
            let descriptors = descriptors.clone();
            tasks.spawn(async move {
                let report = this.sync_scope(scope, &descriptors).await;
                (scope, report)
            });
        }

        let mut scopes = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((scope, report)) => {
                    scopes.insert(scope.to_string(), report);
                }
                Err(e) => error!("Sync task failed: {}", e),
            }
        }

        SyncReport {
            started_at,
            finished_at: Utc::now(),
            scopes,
        }
    }

    /// Re-run passes on a fixed interval. Failures are logged and retried on
    /// the next tick. The first tick fires after one full interval.
    pub fn spawn_periodic(
        self: Arc<Self>,
        desired: BTreeMap<Scope, Vec<CommandDescriptor>>,
        every: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let report = self.synchronize(&desired).await;
                if !report.is_clean() {
                    warn!("Periodic sync finished with errors, will retry in {:?}", every);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered(id: &str, name: &str, description: &str) -> RegisteredCommand {
        RegisteredCommand::from_descriptor(id, &CommandDescriptor::new(name, description))
    }

    fn names<'a>(actions: &'a [SyncAction], verb: &str) -> Vec<&'a str> {
        actions.iter().filter(|a| a.verb() == verb).map(SyncAction::name).collect()
    }

    #[test]
    fn test_plan_partitions_by_name() {
        let existing = vec![
            registered("1", "keep", "Same"),
            registered("2", "change", "Old"),
            registered("3", "stale", "Gone"),
        ];
        let desired = vec![
            CommandDescriptor::new("keep", "Same"),
            CommandDescriptor::new("change", "New"),
            CommandDescriptor::new("fresh", "Brand new"),
        ];

        let actions = plan(&existing, &desired);
        assert_eq!(names(&actions, "create"), vec!["fresh"]);
        assert_eq!(names(&actions, "update"), vec!["change"]);
        assert_eq!(names(&actions, "delete"), vec!["stale"]);
        assert_eq!(names(&actions, "unchanged"), vec!["keep"]);
        assert!(actions.contains(&SyncAction::Update {
            id: "2".to_string(),
            descriptor: CommandDescriptor::new("change", "New"),
        }));
    }

    #[test]
    fn test_plan_is_empty_when_converged() {
        let desired = vec![CommandDescriptor::new("ping", "Pong!")];
        let existing = vec![RegisteredCommand::from_descriptor("77", &desired[0])];
        assert!(plan(&existing, &desired).iter().all(|a| !a.is_mutation()));
    }

    #[test]
    fn test_plan_deletes_remote_duplicates() {
        let existing = vec![registered("1", "ping", "Pong!"), registered("2", "ping", "Pong!")];
        let desired = vec![CommandDescriptor::new("ping", "Pong!")];
        let actions = plan(&existing, &desired);
        assert_eq!(
            actions,
            vec![
                SyncAction::Unchanged { name: "ping".to_string() },
                SyncAction::Delete { id: "2".to_string(), name: "ping".to_string() },
            ]
        );
    }

    #[test]
    fn test_empty_desired_deletes_everything() {
        let existing = vec![registered("1", "a", "A"), registered("2", "b", "B")];
        let actions = plan(&existing, &[]);
        assert_eq!(names(&actions, "delete"), vec!["a", "b"]);
    }
}
