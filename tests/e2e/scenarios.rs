use httpmock::MockServer;
use serde_json::json;

use super::harness::{TestContext, parse_json, write_file};

pub struct Scenario {
    pub name: &'static str,
    pub run: fn(&TestContext) -> Result<(), String>,
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "help_output",
            run: scenario_help,
        },
        Scenario {
            name: "no_args_error",
            run: scenario_no_args,
        },
        Scenario {
            name: "missing_base_url",
            run: scenario_missing_base_url,
        },
        Scenario {
            name: "half_credentials_rejected",
            run: scenario_half_credentials,
        },
        Scenario {
            name: "unknown_suite",
            run: scenario_unknown_suite,
        },
        Scenario {
            name: "health_run_passes",
            run: scenario_health_passes,
        },
        Scenario {
            name: "health_run_fails_with_hint",
            run: scenario_health_fails,
        },
        Scenario {
            name: "run_json_output",
            run: scenario_run_json,
        },
        Scenario {
            name: "suites_listing",
            run: scenario_suites_listing,
        },
        Scenario {
            name: "suites_json",
            run: scenario_suites_json,
        },
        Scenario {
            name: "login_with_config_file",
            run: scenario_login_config_file,
        },
        Scenario {
            name: "login_rejected",
            run: scenario_login_rejected,
        },
        Scenario {
            name: "login_without_credentials",
            run: scenario_login_no_credentials,
        },
        Scenario {
            name: "probe_authenticated",
            run: scenario_probe_authenticated,
        },
        Scenario {
            name: "probe_anonymous_expected_status",
            run: scenario_probe_anonymous,
        },
        Scenario {
            name: "probe_failed_check",
            run: scenario_probe_failed_check,
        },
        Scenario {
            name: "suite_file_with_capture",
            run: scenario_suite_file_capture,
        },
        Scenario {
            name: "threshold_allows_partial_pass",
            run: scenario_threshold,
        },
        Scenario {
            name: "stop_on_failure_skips_rest",
            run: scenario_stop_on_failure,
        },
        Scenario {
            name: "config_redacts_password",
            run: scenario_config_redacts_password,
        },
    ]
}

fn scenario_help(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("help")?;
    let output = ctx.run_cmprobe(&env, &["--help"])?;
    output.assert_success()?;
    output.assert_stdout_contains("run")?;
    output.assert_stdout_contains("probe")?;
    output.assert_stdout_contains("--base-url")?;
    Ok(())
}

fn scenario_no_args(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("no-args")?;
    let output = ctx.run_cmprobe(&env, &[])?;
    output.assert_failure()?;
    output.assert_stderr_contains("No command specified")?;
    Ok(())
}

fn scenario_missing_base_url(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("missing-base-url")?;
    let output = ctx.run_cmprobe(&env, &["run", "health"])?;
    output.assert_failure()?;
    output.assert_stderr_contains("Error: Base URL is required")?;
    Ok(())
}

fn scenario_half_credentials(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("half-credentials")?;
    let output = ctx.run_cmprobe_with(
        &env,
        &["run", "health"],
        &[
            ("CMPROBE_BASE_URL", "http://127.0.0.1:1"),
            ("CMPROBE_EMAIL", "ops@example.com"),
        ],
    )?;
    output.assert_failure()?;
    output.assert_stderr_contains("only one was provided")?;
    Ok(())
}

fn scenario_unknown_suite(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("unknown-suite")?;
    let output = ctx.run_cmprobe(
        &env,
        &["--base-url", "http://127.0.0.1:1", "run", "carousel"],
    )?;
    output.assert_failure()?;
    output.assert_stderr_contains("Unknown suite 'carousel'")?;
    Ok(())
}

fn scenario_health_passes(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("health-pass")?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET").path("/health");
        then.status(200).json_body(json!({"status": "healthy"}));
    });

    let base_url = server.base_url();
    let output = ctx.run_cmprobe(&env, &["--base-url", &base_url, "run", "health"])?;
    output.assert_success()?;
    output.assert_stdout_contains("✅ health: service reports healthy")?;
    output.assert_stdout_contains("Verdict: EXCELLENT")?;
    mock.assert();
    Ok(())
}

fn scenario_health_fails(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("health-fail")?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/health");
        then.status(503).body("upstream unavailable");
    });

    let base_url = server.base_url();
    let output = ctx.run_cmprobe(&env, &["--base-url", &base_url, "run", "health"])?;
    output.assert_failure()?;
    output.assert_stdout_contains("❌ health: service reports healthy")?;
    output.assert_stdout_contains("upstream unavailable")?;
    output.assert_stdout_contains("hint:")?;
    output.assert_stdout_contains("Verdict: CRITICAL")?;
    Ok(())
}

fn scenario_run_json(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("run-json")?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/health");
        then.status(200).json_body(json!({"status": "healthy"}));
    });

    let base_url = server.base_url();
    let output = ctx.run_cmprobe(
        &env,
        &["--base-url", &base_url, "--json", "run", "health"],
    )?;
    output.assert_success()?;
    output.assert_stdout_not_contains("🔍")?;

    let json = parse_json(&output.stdout)?;
    if json["passed"] != json!(true) {
        return Err(format!("Expected passed=true, got {}", json));
    }
    if json["summary"]["total"] != json!(1) || json["summary"]["verdict"] != json!("EXCELLENT") {
        return Err(format!("Unexpected summary: {}", json["summary"]));
    }
    let records = json["records"]
        .as_array()
        .ok_or_else(|| "records should be an array".to_string())?;
    if records[0]["status"] != json!(200) || records[0]["success"] != json!(true) {
        return Err(format!("Unexpected record: {}", records[0]));
    }
    Ok(())
}

fn scenario_suites_listing(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("suites")?;
    let output = ctx.run_cmprobe(&env, &["suites"])?;
    output.assert_success()?;
    output.assert_stdout_contains("health")?;
    output.assert_stdout_contains("business-profile")?;
    output.assert_stdout_contains("(opt-in)")?;
    Ok(())
}

fn scenario_suites_json(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("suites-json")?;
    let output = ctx.run_cmprobe(&env, &["suites", "--json"])?;
    output.assert_success()?;

    let json = parse_json(&output.stdout)?;
    let suites = json["suites"]
        .as_array()
        .ok_or_else(|| "suites should be an array".to_string())?;
    let posts = suites
        .iter()
        .find(|s| s["name"] == json!("posts"))
        .ok_or_else(|| "posts suite missing".to_string())?;
    if posts["default"] != json!(false) {
        return Err(format!("posts should be opt-in: {}", posts));
    }
    Ok(())
}

fn scenario_login_config_file(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("login-config")?;
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path("/auth/login")
            .json_body(json!({"email": "ops@example.com", "password": "hunter2"}));
        then.status(200)
            .json_body(json!({"access_token": "tok-1", "user": {"id": "u-42"}}));
    });

    write_file(
        &env.config_file(),
        &json!({
            "base_url": server.base_url(),
            "email": "ops@example.com",
            "password": "hunter2",
        })
        .to_string(),
    )?;

    let output = ctx.run_cmprobe(&env, &["login", "--json"])?;
    output.assert_success()?;
    let json = parse_json(&output.stdout)?;
    if json["authenticated"] != json!(true) || json["user_id"] != json!("u-42") {
        return Err(format!("Unexpected login output: {}", json));
    }
    mock.assert();
    Ok(())
}

fn scenario_login_rejected(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("login-rejected")?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path("/api/session");
        then.status(401).json_body(json!({"detail": "Invalid credentials"}));
    });

    let base_url = server.base_url();
    let output = ctx.run_cmprobe_with(
        &env,
        &["login", "--login-path", "/api/session"],
        &[
            ("CMPROBE_BASE_URL", base_url.as_str()),
            ("CMPROBE_EMAIL", "ops@example.com"),
            ("CMPROBE_PASSWORD", "wrong"),
        ],
    )?;
    output.assert_failure()?;
    output.assert_stdout_contains("❌ Login to")?;
    output.assert_stdout_contains("401")?;
    output.assert_stdout_contains("hint:")?;
    Ok(())
}

fn scenario_login_no_credentials(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("login-no-credentials")?;
    let output = ctx.run_cmprobe(&env, &["--base-url", "http://127.0.0.1:1", "login"])?;
    output.assert_failure()?;
    output.assert_stderr_contains("No credentials configured")?;
    Ok(())
}

fn scenario_probe_authenticated(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("probe-auth")?;
    let server = MockServer::start();
    let login = server.mock(|when, then| {
        when.method("POST").path("/auth/login");
        then.status(200).json_body(json!({"access_token": "tok-1"}));
    });
    let notes = server.mock(|when, then| {
        when.method("GET")
            .path("/notes")
            .header("Authorization", "Bearer tok-1");
        then.status(200)
            .json_body(json!({"notes": [{"note_id": "n-1", "title": "hello"}]}));
    });

    let base_url = server.base_url();
    let output = ctx.run_cmprobe_with(
        &env,
        &["probe", "get", "/notes", "--check", "notes", "--check", "notes.0.title=hello"],
        &[
            ("CMPROBE_BASE_URL", base_url.as_str()),
            ("CMPROBE_EMAIL", "ops@example.com"),
            ("CMPROBE_PASSWORD", "hunter2"),
        ],
    )?;
    output.assert_success()?;
    output.assert_stdout_contains("✅ authentication")?;
    output.assert_stdout_contains("✅ probe: GET /notes")?;
    login.assert();
    notes.assert();
    Ok(())
}

fn scenario_probe_anonymous(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("probe-anonymous")?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("DELETE").path("/notes/missing");
        then.status(404).json_body(json!({"detail": "Note not found"}));
    });

    let base_url = server.base_url();
    let output = ctx.run_cmprobe(
        &env,
        &[
            "--base-url",
            &base_url,
            "probe",
            "DELETE",
            "/notes/missing",
            "--expect",
            "404",
            "--check",
            "detail~not found",
            "--no-auth",
        ],
    )?;
    output.assert_success()?;
    output.assert_stdout_not_contains("authentication")?;
    Ok(())
}

fn scenario_probe_failed_check(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("probe-failed-check")?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/health");
        then.status(200).json_body(json!({"status": "degraded"}));
    });

    let base_url = server.base_url();
    let output = ctx.run_cmprobe(
        &env,
        &[
            "--base-url",
            &base_url,
            "--json",
            "probe",
            "GET",
            "/health",
            "--check",
            "status=healthy",
            "--no-auth",
        ],
    )?;
    output.assert_failure()?;

    let json = parse_json(&output.stdout)?;
    let record = &json["records"][0];
    if record["success"] != json!(false) || record["kind"] != json!("check") {
        return Err(format!("Expected a check failure, got {}", record));
    }
    Ok(())
}

fn scenario_suite_file_capture(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("suite-file")?;
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method("POST").path("/items");
        then.status(201).json_body(json!({"item": {"id": "it-7"}}));
    });
    let fetch = server.mock(|when, then| {
        when.method("GET").path("/items/it-7");
        then.status(200).json_body(json!({"id": "it-7", "name": "widget"}));
    });

    let suite_path = env.root.join("items.yaml");
    write_file(
        &suite_path,
        r#"
description: Item lifecycle
steps:
  - name: create item
    method: POST
    path: /items
    auth: false
    expect: [200, 201]
    body:
      name: widget
    capture:
      - name: item_id
        from: [item.id, id]
  - name: fetch item
    path: /items/${item_id}
    auth: false
    checks:
      - op: equals
        field: name
        value: widget
"#,
    )?;

    let base_url = server.base_url();
    let suite_arg = suite_path.display().to_string();
    let output = ctx.run_cmprobe(
        &env,
        &["--base-url", &base_url, "run", "--file", &suite_arg],
    )?;
    output.assert_success()?;
    output.assert_stdout_contains("🔍 items: Item lifecycle")?;
    output.assert_stdout_contains("✅ items: fetch item")?;
    output.assert_stdout_not_contains("health")?;
    create.assert();
    fetch.assert();
    Ok(())
}

fn scenario_threshold(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("threshold")?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/up");
        then.status(200).body("ok");
    });
    server.mock(|when, then| {
        when.method("GET").path("/down");
        then.status(500).body("boom");
    });

    let suite_path = env.root.join("mixed.toml");
    write_file(
        &suite_path,
        r#"
[[steps]]
name = "up"
path = "/up"
auth = false

[[steps]]
name = "down"
path = "/down"
auth = false
"#,
    )?;

    let base_url = server.base_url();
    let suite_arg = suite_path.display().to_string();

    let strict = ctx.run_cmprobe(
        &env,
        &["--base-url", &base_url, "run", "--file", &suite_arg],
    )?;
    strict.assert_failure()?;
    strict.assert_stdout_contains("Verdict: NEEDS WORK")?;

    let lenient = ctx.run_cmprobe(
        &env,
        &[
            "--base-url",
            &base_url,
            "run",
            "--file",
            &suite_arg,
            "--threshold",
            "50",
        ],
    )?;
    lenient.assert_success()?;
    Ok(())
}

fn scenario_stop_on_failure(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("stop-on-failure")?;
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("GET").path("/health");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method("GET").path("/later");
        then.status(200);
    });

    let suite_path = env.root.join("halt.json");
    write_file(
        &suite_path,
        &json!({
            "name": "halt",
            "steps": [
                {"name": "broken", "path": "/health", "auth": false},
                {"name": "never sent", "path": "/later", "auth": false}
            ]
        })
        .to_string(),
    )?;

    let base_url = server.base_url();
    let suite_arg = suite_path.display().to_string();
    let output = ctx.run_cmprobe(
        &env,
        &[
            "--base-url",
            &base_url,
            "--json",
            "run",
            "--file",
            &suite_arg,
            "--stop-on-failure",
        ],
    )?;
    output.assert_failure()?;

    let json = parse_json(&output.stdout)?;
    if json["summary"]["skipped"] != json!(1) || json["summary"]["failed"] != json!(1) {
        return Err(format!("Unexpected summary: {}", json["summary"]));
    }
    if json["skipped"][0]["reason"] != json!("halted after failure") {
        return Err(format!("Unexpected skip: {}", json["skipped"]));
    }
    Ok(())
}

fn scenario_config_redacts_password(ctx: &TestContext) -> Result<(), String> {
    let env = ctx.create_env("config-redacts")?;
    let output = ctx.run_cmprobe_with(
        &env,
        &["config"],
        &[
            ("CMPROBE_BASE_URL", "https://staging.example.com/api"),
            ("CMPROBE_EMAIL", "ops@example.com"),
            ("CMPROBE_PASSWORD", "s3cret-value"),
        ],
    )?;
    output.assert_success()?;
    output.assert_stdout_contains("(not found)")?;
    output.assert_stdout_contains("https://staging.example.com/api")?;
    output.assert_stdout_contains("Password:    (set)")?;
    output.assert_stdout_not_contains("s3cret-value")?;

    let json_output = ctx.run_cmprobe_with(
        &env,
        &["config", "--json"],
        &[("CMPROBE_PASSWORD", "s3cret-value")],
    )?;
    json_output.assert_success()?;
    json_output.assert_stdout_not_contains("s3cret-value")?;
    let json = parse_json(&json_output.stdout)?;
    if json["password_set"] != json!(true) || json["timeout_secs"] != json!(30) {
        return Err(format!("Unexpected config output: {}", json));
    }
    Ok(())
}
