//! Backend worker wiring for the sidebar.
//!
//! This module exposes the command/event protocol plus the worker spawn helper
//! used by [`crate::MetadataSidebar`].

mod protocol;
mod worker;

pub use protocol::{CoreCmd, CoreEvent, RequestId, SidebarOp};
pub use worker::{spawn_backend, BackendHandle};
