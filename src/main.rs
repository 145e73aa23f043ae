mod auth;
mod check;
mod cli;
mod client;
mod config;
mod diagnose;
mod error;
mod logging;
mod output;
mod report;
mod runner;
mod step;
mod suite;
mod vars;

use clap::Parser;
use cli::{CheckSpec, Cli, Command, GlobalArgs};
use client::{ApiClient, Method};
use config::{Config, Settings};
use output::{ConfigResult, LoginResult, SuiteEntry, SuiteListResult};
use report::{OutputMode, Reporter};
use runner::{RunOptions, Runner};
use serde_json::Value;
use std::path::PathBuf;
use step::Step;
use suite::Suite;

fn main() {
    let cli = Cli::parse();
    let json_output = cli.json;

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    let result = match cli.command {
        Some(Command::Run {
            suites,
            files,
            stop_on_failure,
            threshold,
        }) => run_suites(
            &cli.global,
            &suites,
            &files,
            stop_on_failure,
            threshold,
            json_output,
        ),
        Some(Command::Probe {
            method,
            path,
            expect,
            body,
            checks,
            no_auth,
        }) => run_probe(
            &cli.global,
            ProbeArgs {
                method,
                path,
                expect,
                body,
                checks,
                no_auth,
            },
            json_output,
        ),
        Some(Command::Login) => run_login(&cli.global, json_output),
        Some(Command::Suites) => run_list_suites(json_output),
        Some(Command::Config) => run_show_config(&cli.global, json_output),
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Config file, then environment and flags
fn load_settings(global: &GlobalArgs) -> Result<Settings, Box<dyn std::error::Error>> {
    let config = Config::load(global.config_path.as_deref())?.with_overrides(global);
    Ok(Settings::from_config(&config)?)
}

fn output_mode(json_output: bool) -> OutputMode {
    if json_output {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}

fn run_suites(
    global: &GlobalArgs,
    names: &[String],
    files: &[PathBuf],
    stop_on_failure: bool,
    threshold: Option<f64>,
    json_output: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut settings = load_settings(global)?;
    if let Some(threshold) = threshold {
        settings = settings.with_threshold(threshold)?;
    }

    // Files alone replace the default selection
    let mut suites = if names.is_empty() && !files.is_empty() {
        Vec::new()
    } else {
        suite::select(names)?
    };
    for path in files {
        suites.push(suite::load_file(path)?);
    }

    if !json_output {
        println!(
            "Probing {} ({} suite{})",
            settings.base_url,
            suites.len(),
            if suites.len() == 1 { "" } else { "s" }
        );
    }

    let mut reporter = Reporter::new(output_mode(json_output));
    {
        let mut runner = Runner::new(&settings, &mut reporter, RunOptions { stop_on_failure });
        for suite in &suites {
            runner.run_suite(suite);
        }
    }

    Ok(reporter.finish(settings.pass_threshold))
}

struct ProbeArgs {
    method: Method,
    path: String,
    expect: Vec<u16>,
    body: Option<Value>,
    checks: Vec<CheckSpec>,
    no_auth: bool,
}

fn run_probe(
    global: &GlobalArgs,
    args: ProbeArgs,
    json_output: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;

    let name = format!("{} {}", args.method, args.path);
    let mut step = Step::new(args.method, &name, &args.path).expecting(&args.expect);
    if let Some(body) = args.body {
        step = step.with_body(body);
    }
    for CheckSpec(check) in args.checks {
        step = step.with_check(check);
    }
    if args.no_auth {
        step = step.anonymous();
    }

    let probe = Suite::new("probe", "").with_steps(vec![step]);

    let mut reporter = Reporter::new(output_mode(json_output));
    {
        let mut runner = Runner::new(&settings, &mut reporter, RunOptions::default());
        runner.run_suite(&probe);
    }

    Ok(reporter.finish(settings.pass_threshold))
}

fn run_login(global: &GlobalArgs, json_output: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let settings = load_settings(global)?;
    let credentials = settings.credentials.as_ref().ok_or(
        "No credentials configured. Set --email and --password (or CMPROBE_EMAIL and CMPROBE_PASSWORD)",
    )?;

    let client = ApiClient::new(&settings.base_url, settings.timeout);
    let result = auth::login(&client, &settings.login_path, credentials);

    if json_output {
        let output = match &result {
            Ok(session) => LoginResult {
                authenticated: true,
                user_id: session.user_id.clone(),
                error: None,
                hint: None,
            },
            Err(e) => LoginResult {
                authenticated: false,
                user_id: None,
                error: Some(e.to_string()),
                hint: diagnose::hint(e).map(str::to_string),
            },
        };
        output::print_json(&output);
    } else {
        match &result {
            Ok(session) => {
                println!("✅ Logged in to {} as {}", client.base_url(), credentials.email);
                if let Some(user_id) = &session.user_id {
                    println!("   user id: {}", user_id);
                }
            }
            Err(e) => {
                println!("❌ Login to {} failed: {}", client.base_url(), e);
                if let Some(hint) = diagnose::hint(e) {
                    println!("   hint: {}", hint);
                }
            }
        }
    }

    Ok(result.is_ok())
}

fn run_list_suites(json_output: bool) -> Result<bool, Box<dyn std::error::Error>> {
    let suites = suite::builtin();

    if json_output {
        output::print_json(&SuiteListResult {
            suites: suites.iter().map(SuiteEntry::from_suite).collect(),
        });
        return Ok(true);
    }

    let width = suites.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for suite in &suites {
        let marker = if suite.default { "" } else { " (opt-in)" };
        println!(
            "{:<width$}  {}{}",
            suite.name,
            suite.description,
            marker,
            width = width
        );
    }

    Ok(true)
}

fn run_show_config(
    global: &GlobalArgs,
    json_output: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let path = match &global.config_path {
        Some(path) => Some(path.clone()),
        None => config::config_path().ok(),
    };
    let exists = path.as_ref().is_some_and(|p| p.exists());

    let config = Config::load(global.config_path.as_deref())?.with_overrides(global);
    let result = ConfigResult {
        config_path: path.as_ref().map(|p| p.display().to_string()),
        config_exists: exists,
        base_url: config.base_url.clone(),
        email: config.email.clone(),
        password_set: config.password.as_deref().is_some_and(|p| !p.is_empty()),
        login_path: config
            .login_path
            .clone()
            .unwrap_or_else(|| auth::DEFAULT_LOGIN_PATH.to_string()),
        timeout_secs: config.timeout_secs.unwrap_or(config::DEFAULT_TIMEOUT_SECS),
        pass_threshold: config
            .pass_threshold
            .unwrap_or(config::DEFAULT_PASS_THRESHOLD),
    };

    if json_output {
        output::print_json(&result);
        return Ok(true);
    }

    match &result.config_path {
        Some(path) if result.config_exists => println!("Config file: {}", path),
        Some(path) => println!("Config file: {} (not found)", path),
        None => println!("Config file: (no config directory)"),
    }
    println!(
        "Base URL:    {}",
        result.base_url.as_deref().unwrap_or("(not set)")
    );
    println!(
        "Email:       {}",
        result.email.as_deref().unwrap_or("(not set)")
    );
    println!(
        "Password:    {}",
        if result.password_set { "(set)" } else { "(not set)" }
    );
    println!("Login path:  {}", result.login_path);
    println!("Timeout:     {}s", result.timeout_secs);
    println!("Threshold:   {:.0}%", result.pass_threshold);

    Ok(true)
}
