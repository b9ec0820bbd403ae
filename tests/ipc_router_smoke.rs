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

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("ok").and_then(|v| v.as_bool()), Some(true));
    assert!(health
        .get("result")
        .and_then(|r| r.get("activeScope"))
        .map(|v| v.is_null())
        .unwrap_or(false));

    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "fixture.seed",
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
                },
                {
                    "student_id": 1,
                    "course_id": 8,
                    "course_code": "HIST200",
                    "course_name": "World History",
                    "enrollment_date": "2024-01-10",
                    "status": "dropped"
                }
            ],
            "attendance": []
        }),
    );

    let students = request(&mut stdin, &mut reader, "3", "students.list", json!({}));
    let rows = students
        .get("result")
        .and_then(|r| r.get("students"))
        .and_then(|v| v.as_array())
        .expect("students array");
    assert_eq!(rows.len(), 1);
    assert_eq!(
        rows[0].get("fullName").and_then(|v| v.as_str()),
        Some("Avery Chen")
    );

    // Dropped enrollments are filtered from the selector.
    let enrollments = request(
        &mut stdin,
        &mut reader,
        "4",
        "enrollments.listForStudent",
        json!({ "studentId": 1 }),
    );
    let rows = enrollments
        .get("result")
        .and_then(|r| r.get("enrollments"))
        .and_then(|v| v.as_array())
        .expect("enrollments array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("courseId").and_then(|v| v.as_i64()), Some(7));

    // Attendance methods require a scope first.
    let resp = request(&mut stdin, &mut reader, "5", "attendance.grid", json!({}));
    assert_eq!(
        resp.get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("no_scope")
    );

    let opened = request(
        &mut stdin,
        &mut reader,
        "6",
        "attendance.open",
        json!({ "studentId": 1, "courseId": 7 }),
    );
    assert_eq!(opened.get("ok").and_then(|v| v.as_bool()), Some(true));

    let health = request(&mut stdin, &mut reader, "7", "health", json!({}));
    assert_eq!(
        health
            .get("result")
            .and_then(|r| r.get("activeScope"))
            .and_then(|s| s.get("courseId"))
            .and_then(|v| v.as_i64()),
        Some(7)
    );

    for (id, method) in [
        ("8", "attendance.grid"),
        ("9", "attendance.summary"),
        ("10", "attendance.monthPrev"),
        ("11", "attendance.monthNext"),
        ("12", "attendance.save"),
    ] {
        let value = request(&mut stdin, &mut reader, id, method, json!({}));
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(true),
            "{} failed: {}",
            method,
            value
        );
    }

    let unknown = request(&mut stdin, &mut reader, "13", "grades.list", json!({}));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    let missing = request(
        &mut stdin,
        &mut reader,
        "14",
        "attendance.cellClick",
        json!({}),
    );
    assert_eq!(
        missing
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_params")
    );

    drop(stdin);
    let _ = child.wait();
}

#[test]
fn malformed_lines_get_a_bare_protocol_error() {
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    assert_eq!(
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("bad_json")
    );

    // The daemon keeps serving after a bad line.
    let health = request(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(health.get("ok").and_then(|v| v.as_bool()), Some(true));

    drop(stdin);
    let _ = child.wait();
}
