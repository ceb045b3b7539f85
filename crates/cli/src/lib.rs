//! Check environment variables and configuration health for geoapi-server.
//!
//! The doctor reports, one line per check:
//!
//! - whether a `.env` file was loaded
//! - whether each of `GEOAPI_CONFIG`, `GEOAPI_OPENAPI`, and `GEOAPI_HOME` is set
//! - whether the two file-path variables name files that exist
//! - whether the configuration file and the OpenAPI document parse
//!
//! The process exits nonzero when any required check fails, so the report is
//! usable from scripts as well as by humans.

#![deny(unused_crate_dependencies)]

use clap::Parser;
use geoapi_server::{Config, GEOAPI_CONFIG, GEOAPI_HOME, GEOAPI_OPENAPI, openapi_from_path};
use serde_json::Value;
use std::{
    env,
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
};

/// geoapi-doctor: check environment variables and configuration health.
#[derive(Debug, Parser)]
pub struct Doctor {
    /// Load environment variables from this file instead of the default `.env`.
    #[arg(long = "env-file")]
    env_file: Option<PathBuf>,
}

/// The outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The check passed.
    Pass,

    /// The check failed.
    Fail,

    /// The check could not run, usually because an earlier one failed.
    Skip,
}

/// One line of the report.
#[derive(Debug)]
pub struct Check {
    /// What was checked.
    pub name: String,

    /// The outcome.
    pub status: Status,

    /// A human-readable detail line.
    pub detail: String,
}

/// A diagnostic report.
#[derive(Debug, Default)]
pub struct Report {
    /// The checks, in the order they ran.
    pub checks: Vec<Check>,
}

impl Doctor {
    /// Runs every check and returns the report.
    pub fn run(&self) -> Report {
        let mut report = Report::default();
        self.load_env(&mut report);
        let config_path = check_var(&mut report, GEOAPI_CONFIG);
        let openapi_path = check_var(&mut report, GEOAPI_OPENAPI);
        let _ = check_var(&mut report, GEOAPI_HOME);
        let config_path = config_path.and_then(|path| check_file(&mut report, GEOAPI_CONFIG, path));
        let openapi_path =
            openapi_path.and_then(|path| check_file(&mut report, GEOAPI_OPENAPI, path));
        check_config(&mut report, config_path.as_deref());
        check_openapi(&mut report, openapi_path.as_deref());
        tracing::debug!("ran {} checks", report.checks.len());
        report
    }

    fn load_env(&self, report: &mut Report) {
        if let Some(path) = &self.env_file {
            match dotenv::from_path(path) {
                Ok(()) => report.pass(".env", format!("loaded {}", path.display())),
                Err(error) => report.fail(".env", error.to_string()),
            }
        } else {
            match dotenv::dotenv() {
                Ok(path) => report.pass(".env", format!("loaded {}", path.display())),
                Err(dotenv::Error::Io(error))
                    if error.kind() == std::io::ErrorKind::NotFound =>
                {
                    report.skip(".env", "no .env file, using the process environment")
                }
                Err(error) => report.fail(".env", error.to_string()),
            }
        }
    }
}

impl Report {
    /// Returns false if any check failed.
    pub fn ok(&self) -> bool {
        self.checks
            .iter()
            .all(|check| check.status != Status::Fail)
    }

    /// Prints the report, one line per check, then a summary line.
    pub fn print(&self) {
        for check in &self.checks {
            println!("{} {}: {}", check.status, check.name, check.detail);
        }
        let failed = self
            .checks
            .iter()
            .filter(|check| check.status == Status::Fail)
            .count();
        if failed == 0 {
            println!("all checks passed");
        } else {
            println!("{failed} check(s) failed");
        }
    }

    fn pass(&mut self, name: &str, detail: impl Into<String>) {
        self.record(Status::Pass, name, detail);
    }

    fn fail(&mut self, name: &str, detail: impl Into<String>) {
        self.record(Status::Fail, name, detail);
    }

    fn skip(&mut self, name: &str, detail: impl Into<String>) {
        self.record(Status::Skip, name, detail);
    }

    fn record(&mut self, status: Status, name: &str, detail: impl Into<String>) {
        self.checks.push(Check {
            name: name.to_string(),
            status,
            detail: detail.into(),
        });
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => write!(f, "ok  "),
            Status::Fail => write!(f, "FAIL"),
            Status::Skip => write!(f, "skip"),
        }
    }
}

/// Initializes a tracing subscriber that logs to stderr.
///
/// Filtering comes from `RUST_LOG`.
pub fn init_tracing_subscriber() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

fn check_var(report: &mut Report, var: &str) -> Option<PathBuf> {
    match env::var(var) {
        Ok(value) => {
            report.pass(var, &value);
            Some(PathBuf::from(value))
        }
        Err(_) => {
            report.fail(var, "not set");
            None
        }
    }
}

fn check_file(report: &mut Report, var: &str, path: PathBuf) -> Option<PathBuf> {
    let name = format!("{var} file");
    if path.is_file() {
        report.pass(&name, format!("{} exists", path.display()));
        Some(path)
    } else {
        report.fail(&name, format!("{} not found", path.display()));
        None
    }
}

fn check_config(report: &mut Report, path: Option<&Path>) {
    let Some(path) = path else {
        report.skip("configuration", "no configuration file to load");
        return;
    };
    match Config::from_path(path) {
        Ok(config) => report.pass(
            "configuration",
            format!("loaded, {} sections", config.extra.len() + 1),
        ),
        Err(error) => report.fail("configuration", error.to_string()),
    }
}

fn check_openapi(report: &mut Report, path: Option<&Path>) {
    let Some(path) = path else {
        report.skip("openapi", "no openapi document to load");
        return;
    };
    match openapi_from_path(path) {
        Ok(document) => {
            let paths = document
                .get("paths")
                .and_then(Value::as_object)
                .map(|paths| paths.len())
                .unwrap_or(0);
            report.pass("openapi", format!("openapi document with {paths} paths"));
        }
        Err(error) => report.fail("openapi", error.to_string()),
    }
}


#[cfg(test)]
use {assert_cmd as _, rstest as _};
