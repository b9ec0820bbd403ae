use serde_json::json;

use super::{get_required_date, get_required_i64, with_timeout, HandlerErr};
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::session::{AttendanceSession, ClickOutcome, SaveOutcome, SelectionScope};

fn grid_json(session: &AttendanceSession) -> serde_json::Value {
    let cells: Vec<serde_json::Value> = session
        .cells()
        .iter()
        .map(|cell| match cell.date {
            None => json!({ "blank": true }),
            Some(date) => json!({
                "date": date.format("%Y-%m-%d").to_string(),
                "status": cell.state.status().map(|s| s.as_str()),
                "editable": cell.editable,
                "dirty": cell.dirty,
                "today": cell.today,
            }),
        })
        .collect();

    json!({
        "year": session.visible().year,
        "month": session.visible().month,
        "canPrevMonth": session.can_prev(),
        "canNextMonth": session.can_next(),
        "cells": cells,
        "pendingEdits": session.pending_edits(),
        "lastError": session.last_error(),
    })
}

async fn attendance_open(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_i64(params, "studentId")?;
    let course_id = get_required_i64(params, "courseId")?;

    let backend = state.academic_backend();
    let lookup = state.academic_backend();
    let enrollments = with_timeout(state.config.request_timeout(), async move {
        lookup.enrollments_for_student(student_id).await
    })
    .await
    .map_err(HandlerErr::from_core)?;

    let enrollment = enrollments
        .iter()
        .find(|e| e.course_id == course_id && e.status.selectable())
        .ok_or_else(|| {
            HandlerErr::not_found("student has no active or completed enrollment in this course")
        })?;

    let scope = SelectionScope {
        student_id,
        course_id,
        enrollment_start: Some(enrollment.enrollment_date),
    };
    // Replacing the scope tears down any previous snapshot and overlay.
    let session = AttendanceSession::open(
        backend,
        state.clock.clone(),
        state.config.request_timeout(),
        scope,
    )
    .await;
    let grid = grid_json(&session);
    state.session = Some(session);
    Ok(grid)
}

async fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    match attendance_open(state, &req.params).await {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_grid(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_scope", "select a student and course first", None);
    };
    ok(&req.id, grid_json(session))
}

enum Move {
    Prev,
    Next,
}

async fn handle_month_move(state: &mut AppState, req: &Request, dir: Move) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_scope", "select a student and course first", None);
    };
    let moved = match dir {
        Move::Prev => session.month_prev().await,
        Move::Next => session.month_next().await,
    };
    let mut result = grid_json(session);
    result["moved"] = json!(moved);
    ok(&req.id, result)
}

fn handle_cell_click(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_scope", "select a student and course first", None);
    };
    let date = match get_required_date(&req.params, "date") {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let date_str = date.format("%Y-%m-%d").to_string();
    match session.click(date) {
        ClickOutcome::Applied(state_after) => ok(
            &req.id,
            json!({
                "applied": true,
                "date": date_str,
                "status": state_after.status().map(|s| s.as_str()),
            }),
        ),
        // Outside the editing window: an affordance, not a failure.
        ClickOutcome::Rejected => ok(
            &req.id,
            json!({
                "applied": false,
                "date": date_str,
            }),
        ),
    }
}

fn handle_summary(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_ref() else {
        return err(&req.id, "no_scope", "select a student and course first", None);
    };
    let summary = session.summary();
    ok(
        &req.id,
        json!({
            "present": summary.present,
            "absent": summary.absent,
            "late": summary.late,
            "excused": summary.excused,
            "total": summary.total(),
            "presenceRate": summary.presence_rate(),
        }),
    )
}

async fn handle_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(session) = state.session.as_mut() else {
        return err(&req.id, "no_scope", "select a student and course first", None);
    };
    match session.save().await {
        Ok(SaveOutcome::Saved { count }) => ok(
            &req.id,
            json!({
                "outcome": "saved",
                "savedCount": count,
            }),
        ),
        Ok(SaveOutcome::NoChanges { edits_attempted }) => ok(
            &req.id,
            json!({
                "outcome": "noChanges",
                "editsAttempted": edits_attempted,
            }),
        ),
        Err(error) => HandlerErr::from_core(error).response(&req.id),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.open" => Some(handle_open(state, req).await),
        "attendance.grid" => Some(handle_grid(state, req)),
        "attendance.monthPrev" => Some(handle_month_move(state, req, Move::Prev).await),
        "attendance.monthNext" => Some(handle_month_move(state, req, Move::Next).await),
        "attendance.cellClick" => Some(handle_cell_click(state, req)),
        "attendance.summary" => Some(handle_summary(state, req)),
        "attendance.save" => Some(handle_save(state, req).await),
        _ => None,
    }
}
