//! Build lifecycle coordination.
//!
//! [`EventHub`] fans build events out to subscribed handlers.
//! [`LifecycleCoordinator`] subscribes on attach and reacts per event:
//!
//! | event          | action                                             |
//! |----------------|----------------------------------------------------|
//! | `config_begin` | regenerate that configuration's profile            |
//! | `config_done`  | re-confirm wiring for that configuration, save once |
//! | `build_done`   | nothing                                            |
//!
//! All project-model work runs on the [`OwnerThread`]. Handler failures stop
//! at the hub and are only logged.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rigging_core::{ConfigurationId, ProjectHost, ProjectModel, Settings};
use rigging_sync::{injector, profiles, InjectionReport, SyncError, WriteResult};

use crate::affinity::OwnerThread;
use crate::error::DaemonError;
use crate::protocol::BuildEvent;

type Handler = Arc<dyn Fn(&BuildEvent) -> Result<(), DaemonError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

// ---------------------------------------------------------------------------
// Event hub
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct EventHub {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler)>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn handlers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Handler)>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&BuildEvent) -> Result<(), DaemonError> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers().push((id, Arc::new(handler)));
        id
    }

    /// Returns `false` when `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers();
        let before = handlers.len();
        handlers.retain(|(sub, _)| *sub != id);
        handlers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.handlers().len()
    }

    /// Deliver `event` to every handler in subscription order.
    ///
    /// Returns how many handlers completed without error. Errors and panics
    /// are logged and never reach the caller.
    pub fn publish(&self, event: &BuildEvent) -> usize {
        let snapshot: Vec<Handler> = self.handlers().iter().map(|(_, h)| h.clone()).collect();
        let mut succeeded = 0;
        for handler in snapshot {
            match catch_unwind(AssertUnwindSafe(|| handler(event))) {
                Ok(Ok(())) => succeeded += 1,
                Ok(Err(err)) => {
                    tracing::error!(event = event.kind(), error = %err, "lifecycle handler failed");
                }
                Err(panic) => {
                    let message = panic
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| panic.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    let err = DaemonError::HandlerPanicked(message);
                    tracing::error!(event = event.kind(), error = %err, "lifecycle handler panicked");
                }
            }
        }
        succeeded
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Subscribes to an [`EventHub`] for as long as it is attached.
pub struct LifecycleCoordinator {
    hub: Arc<EventHub>,
    subscriptions: Vec<SubscriptionId>,
}

impl LifecycleCoordinator {
    pub fn attach<H>(hub: Arc<EventHub>, owner: Arc<OwnerThread<H>>, settings: Settings) -> Self
    where
        H: ProjectHost + 'static,
    {
        let id = hub.subscribe(move |event| dispatch(&owner, &settings, event));
        Self {
            hub,
            subscriptions: vec![id],
        }
    }

    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Remove every handler this coordinator registered.
    pub fn shutdown(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.hub.unsubscribe(id);
        }
    }
}

impl Drop for LifecycleCoordinator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn dispatch<H: ProjectHost + 'static>(
    owner: &OwnerThread<H>,
    settings: &Settings,
    event: &BuildEvent,
) -> Result<(), DaemonError> {
    match event {
        BuildEvent::ConfigBegin {
            project,
            configuration,
            platform,
        } => {
            let id = ConfigurationId::new(configuration, platform);
            on_configuration_build_begin(owner, project, &id).map(|_| ())
        }
        BuildEvent::ConfigDone {
            project,
            configuration,
            platform,
            success,
        } => {
            let id = ConfigurationId::new(configuration, platform);
            on_configuration_build_done(owner, settings, project, &id, *success).map(|_| ())
        }
        BuildEvent::BuildDone => {
            on_build_done();
            Ok(())
        }
    }
}

fn unavailable(project: &str, err: impl ToString) -> SyncError {
    SyncError::ProjectModelUnavailable {
        project: project.to_string(),
        detail: err.to_string(),
    }
}

/// Regenerate the profile of the configuration about to build.
///
/// `Ok(None)` when the project has not opted in.
pub fn on_configuration_build_begin<H: ProjectHost + 'static>(
    owner: &OwnerThread<H>,
    project: &str,
    id: &ConfigurationId,
) -> Result<Option<WriteResult>, DaemonError> {
    let name = project.to_string();
    let id = id.clone();
    owner.call(move |host| -> Result<Option<WriteResult>, DaemonError> {
        let model = host
            .open_project(&name)
            .map_err(|err| unavailable(&name, err))?;
        let result = profiles::regenerate_configuration(&model, &id, false)?;
        if let Some(result) = &result {
            tracing::info!(project = %name, configuration = %id, path = %result.path().display(), "profile checked");
        }
        Ok(result)
    })?
}

/// Re-confirm wiring of the configuration that just built.
///
/// `Ok(None)` when the project has not opted in.
pub fn on_configuration_build_done<H: ProjectHost + 'static>(
    owner: &OwnerThread<H>,
    settings: &Settings,
    project: &str,
    id: &ConfigurationId,
    success: bool,
) -> Result<Option<InjectionReport>, DaemonError> {
    let name = project.to_string();
    let id = id.clone();
    let executable = settings.conan_executable.clone();
    owner.call(move |host| -> Result<Option<InjectionReport>, DaemonError> {
        let mut model = host
            .open_project(&name)
            .map_err(|err| unavailable(&name, err))?;
        if !profiles::is_opted_in(model.directory()) {
            return Ok(None);
        }
        if !model.has_configuration(&id) {
            return Err(unavailable(&name, format!("no configuration {id}")).into());
        }
        let report = injector::ensure_wired(&mut model, std::slice::from_ref(&id), &executable, false)?;
        if let Some((_, Err(err))) = report.outcomes.first() {
            return Err(unavailable(&name, err).into());
        }
        tracing::info!(project = %name, configuration = %id, success, saved = report.saved, "wiring checked");
        Ok(Some(report))
    })?
}

pub fn on_build_done() {
    tracing::debug!("build done");
}
