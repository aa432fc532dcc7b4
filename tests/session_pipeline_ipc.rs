mod test_support;

use serde_json::json;
use test_support::{request, request_ok, select_workspace, spawn_sidecar, temp_dir};

#[test]
fn call_lifecycle_produces_one_persisted_report() {
    let workspace = temp_dir("tutord-session-lifecycle");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let begun = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        Some("student_1"),
        "session.begin",
        json!({
            "callId": "call-1",
            "companionId": "tutor_alex",
            "tutorType": "conversation",
            "topic": "ordering food"
        }),
    );
    assert_eq!(begun.get("status"), Some(&json!("connecting")));

    let started = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        Some("student_1"),
        "session.callStart",
        json!({ "callId": "call-1" }),
    );
    assert_eq!(started.get("status"), Some(&json!("active")));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        Some("student_1"),
        "session.message",
        json!({ "callId": "call-1", "role": "user", "content": "I would like a large pizza please" }),
    );
    let second = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        Some("student_1"),
        "session.message",
        json!({ "callId": "call-1", "role": "assistant", "content": "Great choice, anything to drink?" }),
    );
    assert_eq!(second.get("lines"), Some(&json!(2)));

    let ended = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        Some("student_1"),
        "session.end",
        json!({ "callId": "call-1" }),
    );
    assert_eq!(ended.get("status"), Some(&json!("finished")));
    assert_eq!(ended.get("saveStatus"), Some(&json!("saved")));
    let report = ended.get("report").expect("report");
    let report_id = report
        .get("reportId")
        .and_then(|v| v.as_str())
        .expect("report id")
        .to_string();
    assert!(report
        .get("transcript")
        .and_then(|v| v.as_str())
        .expect("transcript")
        .starts_with("user: I would like"));

    // A repeated end replays the same save outcome.
    let replayed = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        Some("student_1"),
        "session.end",
        json!({ "callId": "call-1" }),
    );
    assert_eq!(replayed.get("saveStatus"), Some(&json!("saved")));
    assert_eq!(
        replayed.pointer("/report/reportId").and_then(|v| v.as_str()),
        Some(report_id.as_str())
    );

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        Some("student_1"),
        "reports.list",
        json!({}),
    );
    assert_eq!(
        listed.get("reports").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(1)
    );
}

#[test]
fn ending_a_connecting_call_skips_the_save() {
    let workspace = temp_dir("tutord-session-abandon");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        Some("student_1"),
        "session.begin",
        json!({
            "callId": "call-x",
            "companionId": "tutor_alex",
            "tutorType": "beginner",
            "topic": "introductions"
        }),
    );
    let ended = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        Some("student_1"),
        "session.end",
        json!({ "callId": "call-x" }),
    );
    assert_eq!(ended.get("status"), Some(&json!("abandoned")));
    assert_eq!(ended.get("saveStatus"), Some(&json!("skipped")));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        Some("student_1"),
        "reports.list",
        json!({}),
    );
    assert_eq!(
        listed.get("reports").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(0)
    );
}

#[test]
fn messages_require_an_active_call() {
    let workspace = temp_dir("tutord-session-states");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        Some("student_1"),
        "session.begin",
        json!({
            "callId": "call-s",
            "companionId": "tutor_alex",
            "tutorType": "grammar",
            "topic": "past tense"
        }),
    );
    let early = request(
        &mut stdin,
        &mut reader,
        "2",
        Some("student_1"),
        "session.message",
        json!({ "callId": "call-s", "role": "user", "content": "hello" }),
    );
    assert_eq!(early.get("ok"), Some(&json!(false)));
    assert_eq!(early.pointer("/error/code"), Some(&json!("bad_state")));

    // A duplicate begin on a live call id is also rejected.
    let dup = request(
        &mut stdin,
        &mut reader,
        "3",
        Some("student_1"),
        "session.begin",
        json!({
            "callId": "call-s",
            "companionId": "tutor_alex",
            "tutorType": "grammar",
            "topic": "past tense"
        }),
    );
    assert_eq!(dup.pointer("/error/code"), Some(&json!("bad_state")));

    // Another student is free to use the same client-chosen call id.
    let other = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        Some("student_2"),
        "session.begin",
        json!({
            "callId": "call-s",
            "companionId": "tutor_alex",
            "tutorType": "grammar",
            "topic": "past tense"
        }),
    );
    assert_eq!(other.get("status"), Some(&json!("connecting")));
}

#[test]
fn reports_are_not_readable_across_students() {
    let workspace = temp_dir("tutord-session-isolation");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        Some("student_1"),
        "reports.save",
        json!({
            "companionId": "tutor_alex",
            "transcript": "user: I visited the museum yesterday",
            "tutorType": "conversation",
            "topic": "weekend",
            "sessionDuration": 300
        }),
    );
    let report_id = saved
        .pointer("/report/reportId")
        .and_then(|v| v.as_str())
        .expect("report id")
        .to_string();

    let own = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        Some("student_1"),
        "reports.get",
        json!({ "reportId": &report_id }),
    );
    assert_eq!(
        own.pointer("/report/studentId"),
        Some(&json!("student_1"))
    );

    let foreign = request(
        &mut stdin,
        &mut reader,
        "3",
        Some("student_2"),
        "reports.get",
        json!({ "reportId": &report_id }),
    );
    assert_eq!(foreign.get("ok"), Some(&json!(false)));
    assert_eq!(foreign.pointer("/error/code"), Some(&json!("not_found")));
}

#[test]
fn sdk_error_drops_the_call() {
    let workspace = temp_dir("tutord-session-error");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    select_workspace(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        Some("student_1"),
        "session.begin",
        json!({
            "callId": "call-e",
            "companionId": "tutor_alex",
            "tutorType": "pronunciation",
            "topic": "th sounds"
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        Some("student_1"),
        "session.error",
        json!({ "callId": "call-e" }),
    );

    let after = request(
        &mut stdin,
        &mut reader,
        "3",
        Some("student_1"),
        "session.end",
        json!({ "callId": "call-e" }),
    );
    assert_eq!(after.get("ok"), Some(&json!(false)));
    assert_eq!(after.pointer("/error/code"), Some(&json!("not_found")));
}
