//! rollbookd: the attendance console core behind the school administration
//! UI. The UI shell drives it over line-delimited JSON IPC; the platform's
//! REST service sits behind the [`backend::AcademicBackend`] port.

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod ipc;
pub mod logging;
pub mod month;
pub mod reconcile;
pub mod session;
pub mod status;
pub mod store;
pub mod sync;
