//! Batch submission of a change set: one upsert per entry, all in flight at
//! once, reported all-or-nothing. Some entries may have committed on the
//! backend when the batch fails; there is no rollback, the overlay is simply
//! kept so the operator can retry the whole batch.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::warn;

use crate::backend::{AcademicBackend, AttendanceUpsert};
use crate::error::{Error, Result};
use crate::reconcile::ChangeSet;
use crate::session::SelectionScope;

pub async fn submit(
    backend: Arc<dyn AcademicBackend>,
    scope: &SelectionScope,
    changes: &ChangeSet,
    timeout: Duration,
) -> Result<()> {
    let total = changes.len();
    if total == 0 {
        return Ok(());
    }

    let mut inflight = JoinSet::new();
    for (date, status) in changes.iter().copied() {
        let backend = Arc::clone(&backend);
        let rec = AttendanceUpsert {
            student_id: scope.student_id,
            course_id: scope.course_id,
            date,
            status,
        };
        inflight.spawn(async move {
            match tokio::time::timeout(timeout, backend.upsert_attendance(&rec)).await {
                Ok(result) => result,
                Err(_) => Err(Error::Timeout(timeout.as_millis() as u64)),
            }
        });
    }

    let mut failed = 0usize;
    while let Some(joined) = inflight.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(%err, "attendance upsert failed");
                failed += 1;
            }
            Err(err) => {
                warn!(%err, "attendance upsert task aborted");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        Err(Error::Sync { failed, total })
    } else {
        Ok(())
    }
}
