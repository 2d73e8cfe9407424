//! CLI: check documents against a schema, or describe a schema.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::json;

use json_shape::{Schema, ValidationError, Value};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against a json-shape schema document
#[derive(Parser, Debug)]
#[command(name = "json-shape", version)]
pub struct CommandLineInterface {
    /// log validation internals to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input document; exits with status 1 if any fails
    Check(CheckCmd),
    /// load, statically check and pretty-print a schema document
    Describe(DescribeCmd),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document; every output is validated
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(clap::Parser, Debug)]
struct CheckCmd {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    /// per-document report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// stop at the first failing document (validates sequentially)
    #[arg(long)]
    fail_fast: bool,
}

#[derive(clap::Parser, Debug)]
struct DescribeCmd {
    /// schema document (.json)
    #[arg(long, short)]
    schema: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One document to validate, labelled `file#n`.
#[derive(Debug)]
struct Document {
    label: String,
    value: serde_json::Value,
}

struct Outcome {
    label: String,
    result: Result<Value, ValidationError>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        let mut documents = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file ({source_path_str})"))?;
            let mut index = 0usize;
            for json_value in self.parse_source(&source, &source_path_str)? {
                let json_value = self.select(json_value, &source_path_str)?;
                for json_value in self.preprocess(json_value, &source_path_str)? {
                    documents.push(Document { label: format!("{source_path_str}#{index}"), value: json_value });
                    index += 1;
                }
            }
        }
        Ok(documents)
    }

    fn parse_source(&self, source: &str, source_path_str: &str) -> Result<Vec<serde_json::Value>> {
        if !self.ndjson {
            let json_value = serde_json::from_str(source)
                .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
            return Ok(vec![json_value]);
        }
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(line_no, line)| {
                serde_json::from_str(line).with_context(|| {
                    format!("failed to parse NDJSON line {} ({source_path_str})", line_no + 1)
                })
            })
            .collect()
    }

    fn select(&self, json_value: serde_json::Value, source_path_str: &str) -> Result<serde_json::Value> {
        let Some(pointer) = self.json_pointer.as_deref() else {
            return Ok(json_value);
        };
        json_value
            .pointer(pointer)
            .cloned()
            .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing in {source_path_str}"))
    }

    fn preprocess(&self, json_value: serde_json::Value, source_path_str: &str) -> Result<Vec<serde_json::Value>> {
        match self.jq_expr.as_ref() {
            None => Ok(vec![json_value]),
            Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &json_value).with_context(|| {
                format!("failed to apply jq expression to source file ({source_path_str})")
            }),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// `Ok(false)` when some document failed validation.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Describe(target) => target.run().map(|()| true),
        }
    }
}

impl CheckCmd {
    fn run(&self) -> Result<bool> {
        let schema = load_schema(&self.schema)?;
        let documents = self.input_settings.load()?;
        if documents.is_empty() {
            bail!("no input documents");
        }

        let outcomes: Vec<Outcome> = if self.fail_fast {
            let mut outcomes = Vec::new();
            for document in documents {
                let outcome = validate_document(&schema, document);
                let failed = outcome.result.is_err();
                outcomes.push(outcome);
                if failed {
                    break;
                }
            }
            outcomes
        } else {
            documents.into_par_iter().map(|document| validate_document(&schema, document)).collect()
        };

        let mut failed = 0usize;
        for outcome in &outcomes {
            failed += usize::from(outcome.result.is_err());
            match self.format {
                Format::Text => print_text(outcome),
                Format::Json => print_json(outcome)?,
            }
        }
        let passed = outcomes.len() - failed;
        if failed == 0 {
            eprintln!("{}", format!("{passed} passed").green());
        } else {
            eprintln!("{}, {}", format!("{passed} passed").green(), format!("{failed} failed").red().bold());
        }
        Ok(failed == 0)
    }
}

impl DescribeCmd {
    fn run(&self) -> Result<()> {
        let schema = load_schema(&self.schema)?;
        let schema_src = serde_json::to_string_pretty(&schema).context("failed to serialize schema")?;
        if let Some(out) = self.out.as_ref() {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            std::fs::write(out, &schema_src).with_context(|| format!("failed to write {}", out.display()))?;
        } else {
            println!("{schema_src}");
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_schema(path: &Path) -> Result<Schema> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schema file ({})", path.display()))?;
    let schema = Schema::from_json_str(&source)
        .with_context(|| format!("failed to load schema ({})", path.display()))?;
    schema
        .check()
        .with_context(|| format!("schema failed static check ({})", path.display()))?;
    Ok(schema)
}

fn validate_document(schema: &Schema, document: Document) -> Outcome {
    let result = schema.validate_owned(Value::from(document.value));
    Outcome { label: document.label, result }
}

fn print_text(outcome: &Outcome) {
    match &outcome.result {
        Ok(_) => println!("{} {}", "✓".green(), outcome.label),
        Err(error) => println!("{} {}: {error}", "✗".red().bold(), outcome.label),
    }
}

fn print_json(outcome: &Outcome) -> Result<()> {
    let line = match &outcome.result {
        Ok(value) => {
            let value = value
                .to_json()
                .with_context(|| format!("validated value of {} is not JSON", outcome.label))?;
            json!({"input": outcome.label, "ok": value})
        }
        Err(error) => json!({"input": outcome.label, "error": error}),
    };
    println!("{line}");
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // explicit glob that matched nothing is an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
