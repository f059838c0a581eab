//! CLI: schema documents → codec → (plan | encode | decode)
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use json_prebake::{
    Codec, Generation, GeneratorOptions, SchemaModel, Session, Severity, TypeShape, load_documents, value,
};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// generate JSON codecs from schema documents and run them
#[derive(Parser, Debug)]
#[command(name = "json-prebake", version)]
pub struct CommandLineInterface {
    /// log generation details (RUST_LOG wins when set)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate and print the routine listing
    Plan(PlanOut),
    /// convert plain JSON documents and write them with the generated codec
    Encode(EncodeOut),
    /// read documents with the generated codec and print them as pretty JSON
    Decode(DecodeOut),
}

#[derive(Args, Debug, Clone)]
struct SchemaSettings {
    /// One or more schema documents. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    schema: Vec<String>,

    /// give declared types that no call site uses stub entries
    #[arg(long, default_value_t = false)]
    emit_unused_stubs: bool,
}

#[derive(clap::Parser, Debug)]
struct PlanOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// output listing file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct EncodeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// type expression of each document, e.g. `Book` or `list<Person>!`
    #[arg(long = "type", short)]
    ty: String,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct DecodeOut {
    #[command(flatten)]
    schema_settings: SchemaSettings,

    /// type expression of each document
    #[arg(long = "type", short)]
    ty: String,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl SchemaSettings {
    /// Loads every document, runs one session and reports its diagnostics.
    fn generate(&self) -> Result<(SchemaModel, Generation)> {
        let paths = resolve_file_path_patterns(&self.schema)?;
        let (model, options) = load_documents(&paths)?;
        let options = options.merge(&GeneratorOptions { emit_unused_stubs: self.emit_unused_stubs });
        tracing::info!(documents = paths.len(), types = model.types().count(), "schema loaded");

        let generation = Session::new(&model, options).run();
        for diagnostic in &generation.diagnostics {
            let label = match diagnostic.severity {
                Severity::Error => "error".red().bold(),
                Severity::Warning => "warning".yellow().bold(),
            };
            eprintln!("{label}: {}: {}", diagnostic.subject, diagnostic.error);
        }
        Ok((model, generation))
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn init_logging(&self) {
        let fallback = if self.verbose { "json_prebake=debug" } else { "warn" };
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));
        tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Plan(target) => {
                let (_, generation) = target.schema_settings.generate()?;
                let listing = generation.codec.listing().to_string();
                emit_output(target.out.as_deref(), &listing)?;
                Ok(exit_code(!generation.has_errors()))
            }
            Command::Encode(target) => {
                let (model, generation) = target.schema_settings.generate()?;
                let shape = entry_shape(&generation.codec, &target.ty)?;
                let mut rendered = Vec::new();
                for source_path in resolve_file_path_patterns(&target.input)? {
                    for document in load_documents_from(&source_path, target.jq_expr.as_deref())? {
                        let value = value::from_json(&document, &shape, &model)
                            .with_context(|| format!("{} does not fit `{shape}`", source_path.display()))?;
                        rendered.push(generation.codec.serialize(&shape, &value)?);
                    }
                }
                emit_output(target.out.as_deref(), &rendered.join("\n"))?;
                Ok(ExitCode::SUCCESS)
            }
            Command::Decode(target) => {
                let (model, generation) = target.schema_settings.generate()?;
                let codec = &generation.codec;
                let shape = entry_shape(codec, &target.ty)?;
                let source_paths = resolve_file_path_patterns(&target.input)?;

                let results = source_paths
                    .par_iter()
                    .map(|source_path| -> Result<serde_json::Value> {
                        let source = std::fs::read_to_string(source_path)
                            .with_context(|| format!("failed to read {}", source_path.display()))?;
                        let value = codec.deserialize(&shape, &source)?;
                        Ok(value::to_json(&value, &model))
                    })
                    .collect::<Vec<_>>();

                let mut all_ok = true;
                for (source_path, result) in source_paths.iter().zip(results) {
                    match result {
                        Ok(json) => {
                            eprintln!("{} {}", "✅".green(), source_path.display());
                            println!("{}", serde_json::to_string_pretty(&json)?);
                        }
                        Err(error) => {
                            all_ok = false;
                            eprintln!("{} {}: {error:#}", "❌".red(), source_path.display());
                        }
                    }
                }
                Ok(exit_code(all_ok))
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn exit_code(ok: bool) -> ExitCode {
    if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
}

fn entry_shape(codec: &Codec, expr: &str) -> Result<TypeShape> {
    let shape = json_prebake::schema::expr::parse(expr);
    if codec.entry(&shape).is_none() {
        bail!("no call site for `{shape}` in the schema; add it to `calls`");
    }
    Ok(shape)
}

fn load_documents_from(source_path: &Path, jq_expr: Option<&str>) -> Result<Vec<serde_json::Value>> {
    let source_path_str = source_path.to_string_lossy();
    let source = std::fs::read_to_string(source_path)
        .with_context(|| format!("failed to read source file {source_path_str}"))?;
    let json_value = serde_json::from_str::<serde_json::Value>(&source)
        .with_context(|| format!("failed to parse JSON source file ({source_path_str})"))?;
    match jq_expr {
        None => Ok(vec![json_value]),
        Some(jq_expr) => crate::jq_exec::run_jaq(jq_expr, &json_value)
            .with_context(|| format!("failed to apply jq expression to source file ({source_path_str})")),
    }
}

fn emit_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(out) => {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))
        }
        None => {
            println!("{text}");
            Ok(())
        }
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
