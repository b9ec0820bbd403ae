use std::sync::Arc;

use serde::Deserialize;

use crate::backend::memory::MemoryBackend;
use crate::backend::AcademicBackend;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::session::AttendanceSession;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<dyn Clock>,
    pub session: Option<AttendanceSession>,
}

impl AppState {
    pub fn new(config: Config) -> AppState {
        AppState {
            config,
            backend: Arc::new(MemoryBackend::new()),
            clock: Arc::new(SystemClock),
            session: None,
        }
    }

    /// The backend as the port the session consumes.
    pub fn academic_backend(&self) -> Arc<dyn AcademicBackend> {
        self.backend.clone()
    }
}
