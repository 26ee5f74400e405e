/// Calendar backend process management module - Gateway
mod handle;
mod readiness;
mod supervisor;

pub use handle::{ProcessState, SessionHandle};
pub use readiness::{is_healthy, probe_client, Readiness};
pub use supervisor::{ProcessSupervisor, Supervisor};

#[cfg(test)]
pub use supervisor::MockSupervisor;
