mod test_support;

use serde_json::json;
use test_support::{error_code, request, request_ok, spawn_sidecar, temp_dir};

#[test]
fn webhook_seeds_then_resolve_returns_same_profile() {
    let workspace = temp_dir("tutord-profile-webhook");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        None,
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let seeded = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        None,
        "identity.webhook",
        json!({
            "type": "user.created",
            "data": { "id": "user_lea", "first_name": "Lea", "last_name": "Martin" }
        }),
    );
    assert_eq!(seeded.get("profileCreated"), Some(&json!(true)));

    // Redelivery does not create a second profile.
    let redelivered = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        None,
        "identity.webhook",
        json!({
            "type": "user.created",
            "data": { "id": "user_lea", "first_name": "Lea" }
        }),
    );
    assert_eq!(redelivered.get("profileCreated"), Some(&json!(false)));

    let resolved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        Some("user_lea"),
        "profile.resolve",
        json!({}),
    );
    let profile = resolved.get("profile").expect("profile");
    assert_eq!(profile.get("role"), Some(&json!("student")));
    assert_eq!(profile.get("firstName"), Some(&json!("Lea")));
}

#[test]
fn resolve_creates_default_student_without_webhook() {
    let workspace = temp_dir("tutord-profile-lazy");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        None,
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let resolved = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        Some("user_fresh"),
        "profile.resolve",
        json!({}),
    );
    let profile = resolved.get("profile").expect("profile");
    assert_eq!(profile.get("role"), Some(&json!("student")));
    assert_eq!(profile.get("firstName"), Some(&json!(null)));

    let role = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        Some("user_fresh"),
        "profile.role",
        json!({}),
    );
    assert_eq!(role.get("role"), Some(&json!("student")));
}

#[test]
fn partial_update_keeps_unmentioned_fields() {
    let workspace = temp_dir("tutord-profile-partial-update");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        None,
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        None,
        "identity.webhook",
        json!({
            "type": "user.created",
            "data": { "id": "user_lea", "first_name": "Lea", "last_name": "Martin" }
        }),
    );

    let updated = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        Some("user_lea"),
        "profile.update",
        json!({ "firstName": "Leah" }),
    );
    assert_eq!(updated.get("updated"), Some(&json!(true)));

    let resolved = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        Some("user_lea"),
        "profile.resolve",
        json!({}),
    );
    assert_eq!(resolved.pointer("/profile/firstName"), Some(&json!("Leah")));
    // The patch never mentioned lastName; it must survive the update.
    assert_eq!(resolved.pointer("/profile/lastName"), Some(&json!("Martin")));
}

#[test]
fn unauthenticated_requests_are_rejected_not_emptied() {
    let workspace = temp_dir("tutord-profile-unauth");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        None,
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        None,
        "profile.resolve",
        json!({}),
    );
    assert_eq!(resp.get("ok"), Some(&json!(false)));
    assert_eq!(error_code(&resp), "unauthenticated");
}

#[test]
fn set_role_requires_workspace_opt_in() {
    let workspace = temp_dir("tutord-profile-role-gate");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        None,
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let denied = request(
        &mut stdin,
        &mut reader,
        "2",
        Some("user_t"),
        "profile.setRole",
        json!({ "role": "teacher" }),
    );
    assert_eq!(denied.get("ok"), Some(&json!(false)));
    assert_eq!(error_code(&denied), "bad_params");

    // Re-select with the development affordance enabled.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        None,
        "workspace.select",
        json!({ "path": workspace.to_string_lossy(), "allowRoleChange": true }),
    );
    let switched = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        Some("user_t"),
        "profile.setRole",
        json!({ "role": "teacher" }),
    );
    assert_eq!(
        switched.pointer("/profile/role"),
        Some(&json!("teacher"))
    );
}

#[test]
fn sync_overwrites_display_fields_but_never_role() {
    let workspace = temp_dir("tutord-profile-sync");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        None,
        "workspace.select",
        json!({ "path": workspace.to_string_lossy(), "allowRoleChange": true }),
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        None,
        "identity.webhook",
        json!({
            "type": "user.created",
            "data": { "id": "user_s", "first_name": "Sam" }
        }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        Some("user_s"),
        "profile.setRole",
        json!({ "role": "teacher" }),
    );

    // Provider pushes a rename; the mirror updates, then sync applies it.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        None,
        "identity.webhook",
        json!({
            "type": "user.updated",
            "data": { "id": "user_s", "first_name": "Samuel" }
        }),
    );
    let synced = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        Some("user_s"),
        "profile.sync",
        json!({}),
    );
    assert_eq!(synced.get("synced"), Some(&json!(true)));

    let resolved = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        Some("user_s"),
        "profile.resolve",
        json!({}),
    );
    assert_eq!(resolved.pointer("/profile/firstName"), Some(&json!("Samuel")));
    assert_eq!(resolved.pointer("/profile/role"), Some(&json!("teacher")));
}
