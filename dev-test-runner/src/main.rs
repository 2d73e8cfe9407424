//! Fixture conformance runner.
//!
//! Every `fixtures/*.json` file holds a list of cases:
//!
//! ```json
//! {"name": "...", "schema": {...}, "input": ..., "expect": {"ok": ...}}
//! {"name": "...", "schema": {...}, "input": ..., "expect": {"error": {"message": "...", "path": [...]}}}
//! {"name": "...", "schema": {...}, "expect": {"schemaError": "substring"}}
//! ```
//!
//! Usage: `dev-test-runner [NAME_REGEX]`.
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::Deserialize;

use json_shape::{Schema, Value};

#[derive(Debug, Deserialize)]
struct Case {
    name: String,
    schema: serde_json::Value,
    #[serde(default)]
    input: serde_json::Value,
    expect: Expect,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Expect {
    Ok(serde_json::Value),
    Error(ExpectedError),
    SchemaError(String),
}

#[derive(Debug, Deserialize)]
struct ExpectedError {
    message: String,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> Result<bool> {
    let filter = std::env::args()
        .nth(1)
        .map(|pattern| Regex::new(&pattern).with_context(|| format!("invalid name filter: {pattern}")))
        .transpose()?;
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");

    let mut passed = 0usize;
    let mut failed = 0usize;
    for path in fixture_files(&fixtures)? {
        for case in load_cases(&path)? {
            if filter.as_ref().is_some_and(|re| !re.is_match(&case.name)) {
                continue;
            }
            match run_case(&case) {
                Ok(()) => {
                    passed += 1;
                    println!("PASS {}", case.name);
                }
                Err(reason) => {
                    failed += 1;
                    println!("FAIL {}: {reason}", case.name);
                }
            }
        }
    }
    println!("{passed} passed, {failed} failed");
    Ok(failed == 0)
}

fn fixture_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = std::fs::read_dir(dir)
        .with_context(|| format!("failed to list {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    files.retain(|p| p.extension().is_some_and(|ext| ext == "json"));
    files.sort();
    Ok(files)
}

fn load_cases(path: &Path) -> Result<Vec<Case>> {
    let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let de = &mut serde_json::Deserializer::from_str(&source);
    serde_path_to_error::deserialize(de).map_err(|err| {
        let at = err.path().to_string();
        anyhow!("{}: at JSON path {at} → {}", path.display(), err.into_inner())
    })
}

fn run_case(case: &Case) -> Result<(), String> {
    let loaded = Schema::from_json_value(case.schema.clone()).and_then(|schema| schema.check().map(|()| schema));
    let schema = match (&case.expect, loaded) {
        (Expect::SchemaError(needle), Err(err)) if err.to_string().contains(needle.as_str()) => return Ok(()),
        (Expect::SchemaError(needle), Err(err)) => return Err(format!("schema error `{err}` lacks `{needle}`")),
        (Expect::SchemaError(_), Ok(_)) => return Err("schema loaded, expected a schema error".to_string()),
        (_, Err(err)) => return Err(format!("schema failed to load: {err}")),
        (_, Ok(schema)) => schema,
    };
    let input = Value::from(&case.input);
    let outcome = schema.validate(&input);
    if outcome.is_ok() != schema.is_valid(&input) {
        return Err("validate and is_valid disagree".to_string());
    }

    match (&case.expect, outcome) {
        (Expect::Ok(expected), Ok(actual)) => {
            let actual = actual.to_json().map_err(|e| e.to_string())?;
            if &actual == expected { Ok(()) } else { Err(format!("expected {expected}, got {actual}")) }
        }
        (Expect::Ok(_), Err(err)) => Err(format!("expected success, got `{err}`")),
        (Expect::Error(expected), Err(err)) => {
            let path = serde_json::to_value(&err.path).map_err(|e| e.to_string())?;
            if err.message != expected.message {
                Err(format!("expected message `{}`, got `{}`", expected.message, err.message))
            } else if path != serde_json::Value::Array(expected.path.clone()) {
                Err(format!("expected path {:?}, got {path}", expected.path))
            } else {
                Ok(())
            }
        }
        (Expect::Error(expected), Ok(actual)) => {
            Err(format!("expected failure `{}`, got {actual:?}", expected.message))
        }
        (Expect::SchemaError(_), _) => unreachable!("handled above"),
    }
}
