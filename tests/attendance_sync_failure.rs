use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_rollbookd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn rollbookd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn seed_params() -> serde_json::Value {
    json!({
        "today": "2024-03-15",
        "students": [
            { "id": 1, "student_id": "S-1001", "full_name": "Avery Chen" }
        ],
        "enrollments": [
            {
                "student_id": 1,
                "course_id": 7,
                "course_code": "MATH101",
                "course_name": "Algebra I",
                "enrollment_date": "2024-02-01",
                "status": "active"
            }
        ],
        "attendance": []
    })
}

#[test]
fn failed_save_keeps_edits_and_retry_succeeds() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(&mut stdin, &mut reader, "1", "fixture.seed", seed_params());
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.open",
        json!({ "studentId": 1, "courseId": 7 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.cellClick",
        json!({ "date": "2024-03-11" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.cellClick",
        json!({ "date": "2024-03-12" }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "fixture.failUpsert",
        json!({ "date": "2024-03-12" }),
    );

    // One upsert in the batch fails: the whole save is reported failed.
    let resp = request(&mut stdin, &mut reader, "6", "attendance.save", json!({}));
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("sync_failed")
    );

    // No data loss: both edits still pending.
    let grid = request_ok(&mut stdin, &mut reader, "7", "attendance.grid", json!({}));
    assert_eq!(grid.get("pendingEdits").and_then(|v| v.as_i64()), Some(2));

    // The fault was one-shot; retrying the whole batch drains the overlay.
    let saved = request_ok(&mut stdin, &mut reader, "8", "attendance.save", json!({}));
    assert_eq!(saved.get("outcome").and_then(|v| v.as_str()), Some("saved"));
    // The first attempt already committed 2024-03-11, so the retry may
    // submit fewer entries; what matters is that nothing stays pending.
    let grid = request_ok(&mut stdin, &mut reader, "9", "attendance.grid", json!({}));
    assert_eq!(grid.get("pendingEdits").and_then(|v| v.as_i64()), Some(0));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn failed_load_keeps_previous_snapshot() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let mut params = seed_params();
    params["attendance"] = json!([
        { "student_id": 1, "course_id": 7, "date": "2024-03-01", "status": "present" }
    ]);
    let _ = request_ok(&mut stdin, &mut reader, "1", "fixture.seed", params);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.open",
        json!({ "studentId": 1, "courseId": 7 }),
    );

    let _ = request_ok(&mut stdin, &mut reader, "3", "fixture.failNextFetch", json!({}));

    // The move happens, the reload fails, the stale data stays visible and
    // the error is surfaced inline rather than as a request failure.
    let moved = request_ok(&mut stdin, &mut reader, "4", "attendance.monthPrev", json!({}));
    assert_eq!(moved.get("moved").and_then(|v| v.as_bool()), Some(true));
    assert!(moved
        .get("lastError")
        .and_then(|v| v.as_str())
        .is_some());

    // Editing is still possible while the banner is up.
    let click = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "attendance.cellClick",
        json!({ "date": "2024-02-14" }),
    );
    assert_eq!(click.get("applied").and_then(|v| v.as_bool()), Some(true));

    // The next successful load clears the error.
    let moved = request_ok(&mut stdin, &mut reader, "6", "attendance.monthNext", json!({}));
    assert_eq!(moved.get("moved").and_then(|v| v.as_bool()), Some(true));
    assert!(moved.get("lastError").map(|v| v.is_null()).unwrap_or(false));

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn enrollment_lookup_failure_fails_open_cleanly() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(&mut stdin, &mut reader, "1", "fixture.seed", seed_params());
    let _ = request_ok(&mut stdin, &mut reader, "2", "fixture.failNextFetch", json!({}));

    // The armed fault hits the enrollment lookup, which is a hard failure
    // for open (no scope can be established without the enrollment date).
    let resp = request(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.open",
        json!({ "studentId": 1, "courseId": 7 }),
    );
    assert_eq!(resp.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("fetch_failed")
    );

    // Selector failure does not wedge the daemon; a clean open works.
    let grid = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.open",
        json!({ "studentId": 1, "courseId": 7 }),
    );
    assert!(grid.get("lastError").map(|v| v.is_null()).unwrap_or(false));

    drop(stdin);
    let _ = child.wait();
}
