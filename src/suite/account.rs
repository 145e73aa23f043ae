//! Health, authentication, business profile and notes

use serde_json::json;

use super::Suite;
use crate::check::Check;
use crate::step::Step;

pub fn health() -> Suite {
    Suite::new("health", "Service liveness").with_steps(vec![
        Step::get("service reports healthy", "/health")
            .anonymous()
            .with_check(Check::equals("status", json!("healthy"))),
    ])
}

pub fn auth() -> Suite {
    Suite::new("auth", "Login, token use and rejection of bad credentials").with_steps(vec![
        Step::post("login returns a bearer token", "${login_path}")
            .anonymous()
            .with_body(json!({"email": "${email}", "password": "${password}"}))
            .capturing("token", &["access_token", "token"]),
        Step::post("login rejects a wrong password", "${login_path}")
            .anonymous()
            .with_body(json!({"email": "${email}", "password": "${password}-invalid"}))
            .expecting(&[400, 401]),
        Step::get("current user matches the login email", "/auth/me")
            .with_check(Check::body_contains("${email}")),
        Step::get("protected endpoint rejects anonymous calls", "/business-profile")
            .anonymous()
            .expecting(&[401, 403]),
    ])
}

/// Reads the profile and writes the same name back, so the account is left unchanged
pub fn business_profile() -> Suite {
    Suite::new("business-profile", "Profile read and idempotent update").with_steps(vec![
        Step::get("profile is readable", "/business-profile")
            .with_check(Check::present("business_name"))
            .capturing("business_name", &["business_name"]),
        Step::put("profile update is accepted", "/business-profile")
            .with_body(json!({"business_name": "${business_name}"})),
        Step::get("profile keeps the written name", "/business-profile")
            .with_check(Check::equals("business_name", json!("${business_name}"))),
    ])
}

pub fn notes() -> Suite {
    Suite::new("notes", "Create, list and delete a note").with_steps(vec![
        Step::post("create note", "/notes")
            .with_body(json!({
                "title": "cmprobe ${run_id}",
                "content": "Created by cmprobe run ${run_id}; safe to delete.",
                "priority": "normal"
            }))
            .capturing("note_id", &["note.note_id", "note.id", "note_id", "id"]),
        Step::get("note appears in the list", "/notes")
            .with_check(Check::body_contains("${note_id}")),
        Step::delete("delete note", "/notes/${note_id}").expecting(&[200, 204]),
        Step::get("deleted note is gone", "/notes")
            .with_check(Check::body_excludes("${note_id}")),
    ])
}
