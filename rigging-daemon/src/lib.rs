//! Build lifecycle daemon: owner thread + event hub + socket server.

pub mod affinity;
mod error;
pub mod lifecycle;
pub mod paths;
pub mod protocol;
mod runtime;

pub use affinity::OwnerThread;
pub use error::DaemonError;
pub use lifecycle::{EventHub, LifecycleCoordinator, SubscriptionId};
pub use protocol::{
    request_status, request_stop, request_sync, send_event, send_request, BuildEvent,
    DaemonRequest, DaemonResponse,
};
pub use runtime::{run, start_blocking, DaemonStats, ProjectSummary, SyncSummary};
