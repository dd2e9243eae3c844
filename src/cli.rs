//! CLI: infer → (proto | schema)
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::codegen::{RenderOptions, TypeNames};
use crate::inference::{self, InferOptions, NamingPolicy};
use crate::ir::{ScalarType, SchemaSet};
use crate::Options;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// infer a proto3 schema from JSON documents
#[derive(Parser, Debug)]
#[command(name = "jsonbuf", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// infer and print proto3 message definitions
    Proto(ProtoOut),
    /// infer and print the inferred message set as JSON (debug view)
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// JSON Pointer to select a subnode in each document (e.g. /data/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// jq filter applied to each document; must yield exactly one value
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths, quoted glob patterns, or '-' for stdin
    #[arg(long, short, num_args = 1.., default_value = "-")]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct InferSettings {
    /// name of the top-level message
    #[arg(long, default_value = inference::DEFAULT_ROOT_MESSAGE)]
    root_message: String,

    /// number given to the first key of every message [default: 1, or 0 with --legacy]
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=i64::from(inference::MAX_FIELD_NUMBER)))]
    first_field_number: Option<u32>,

    /// how nested messages are named
    #[arg(long, value_enum, default_value_t = NamingPolicy::Key)]
    naming: NamingPolicy,

    /// type for integers beyond the signed 64-bit range (skipped when omitted)
    #[arg(long, value_enum)]
    untyped_integer: Option<WideInteger>,

    /// legacy output: numbering from 0, float32/float64 names
    #[arg(long, default_value_t = false)]
    legacy: bool,
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// output file (stdout if omitted); single input only
    #[arg(short, long, conflicts_with = "out_dir")]
    out: Option<PathBuf>,

    /// write one file per input, named after the input's stem
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// do not report skipped entries and name collisions on stderr
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
}

#[derive(clap::Parser, Debug)]
struct ProtoOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    infer_settings: InferSettings,

    #[command(flatten)]
    output_settings: OutputSettings,

    /// proto package name
    #[arg(long, default_value = crate::codegen::DEFAULT_PACKAGE)]
    package: String,

    /// spelling of floating-point types [default: proto3, or legacy with --legacy]
    #[arg(long, value_enum)]
    type_names: Option<TypeNames>,

    /// fail when any entry could not be mapped to a field
    #[arg(long, default_value_t = false)]
    strict: bool,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    infer_settings: InferSettings,

    #[command(flatten)]
    output_settings: OutputSettings,
}

/// Integer widths that can stand in for values beyond `i64`.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum WideInteger {
    Int64,
    Uint64,
}

/// One loaded input document.
#[derive(Debug)]
struct Source {
    label: String,
    stem: String,
    text: String,
}

/// Output text for one source.
struct Rendered<'a> {
    source: &'a Source,
    text: String,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load(&self) -> Result<Vec<Source>> {
        let mut sources = Vec::new();
        for source_path in resolve_file_path_patterns(&self.input)? {
            let source = if source_path == Path::new("-") {
                let mut text = String::new();
                std::io::stdin()
                    .lock()
                    .read_to_string(&mut text)
                    .context("failed to read stdin")?;
                Source { label: "<stdin>".to_string(), stem: "stdin".to_string(), text }
            } else {
                let label = source_path.to_string_lossy().to_string();
                let text = std::fs::read_to_string(&source_path)
                    .with_context(|| format!("failed to read source file ({label})"))?;
                let stem = source_path
                    .file_stem()
                    .map(|s| s.to_string_lossy().to_string())
                    .unwrap_or_else(|| label.clone());
                Source { label, stem, text }
            };
            sources.push(source);
        }
        Ok(sources)
    }

    /// Decode, apply pointer/jq pre-selection, and require an object root.
    fn select(&self, text: &str) -> Result<Map<String, Value>> {
        let mut value = crate::decode::decode_value(text)?;
        if let Some(pointer) = self.json_pointer.as_ref() {
            value = value
                .pointer(pointer)
                .cloned()
                .with_context(|| format!("JSON pointer {pointer} matched nothing"))?;
        }
        if let Some(jq_expr) = self.jq_expr.as_ref() {
            let mut outputs = crate::jq_exec::select(jq_expr, &value)?;
            if outputs.len() != 1 {
                bail!("jq `{jq_expr}` produced {} values, expected exactly one", outputs.len());
            }
            value = outputs.remove(0);
        }
        Ok(crate::decode::require_object(value)?)
    }
}

impl InferSettings {
    fn options(&self) -> InferOptions {
        let first_field_number = self.first_field_number.unwrap_or(if self.legacy {
            inference::LEGACY_FIRST_FIELD_NUMBER
        } else {
            inference::DEFAULT_FIRST_FIELD_NUMBER
        });
        InferOptions {
            first_field_number,
            naming: self.naming,
            untyped_integer: self.untyped_integer.map(ScalarType::from),
        }
    }
}

impl From<WideInteger> for ScalarType {
    fn from(width: WideInteger) -> Self {
        match width {
            WideInteger::Int64 => ScalarType::Int64,
            WideInteger::Uint64 => ScalarType::Uint64,
        }
    }
}

impl ProtoOut {
    fn options(&self) -> Options {
        let default_names = if self.infer_settings.legacy { TypeNames::Legacy } else { TypeNames::Proto3 };
        Options {
            root_message: self.infer_settings.root_message.clone(),
            infer: self.infer_settings.options(),
            render: RenderOptions {
                package: self.package.clone(),
                type_names: self.type_names.unwrap_or(default_names),
            },
        }
    }
}

impl OutputSettings {
    /// Write one rendered document per source. `ext` names batch outputs.
    fn write(&self, rendered: &[Rendered<'_>], ext: &str) -> Result<()> {
        if let Some(out_dir) = self.out_dir.as_ref() {
            let mut claimed = HashMap::<&str, &str>::new();
            for r in rendered {
                if let Some(first) = claimed.insert(r.source.stem.as_str(), r.source.label.as_str()) {
                    bail!(
                        "{first} and {} would both be written to {}; rename one of them",
                        r.source.label,
                        out_dir.join(format!("{}.{ext}", r.source.stem)).display(),
                    );
                }
            }
            std::fs::create_dir_all(out_dir)
                .with_context(|| format!("failed to create {}", out_dir.display()))?;
            for r in rendered {
                let path = out_dir.join(format!("{}.{ext}", r.source.stem));
                std::fs::write(&path, &r.text)
                    .with_context(|| format!("failed to write {}", path.display()))?;
            }
            return Ok(());
        }
        let [Rendered { text, .. }] = rendered else {
            bail!("{} inputs resolved; use --out-dir to convert more than one", rendered.len());
        };
        match self.out.as_ref() {
            Some(out) => {
                if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                std::fs::write(out, text).with_context(|| format!("failed to write {}", out.display()))?;
            }
            None => print!("{text}"),
        }
        Ok(())
    }

    fn report(&self, label: &str, schema: &SchemaSet) {
        if self.quiet {
            return
        }
        for o in &schema.omissions {
            let number = o.number.map_or_else(|| "-".to_string(), |n| n.to_string());
            eprintln!(
                "{} {label}: {}.{} (field {number}): {}",
                "skipped".yellow().bold(),
                o.message,
                o.key,
                o.reason,
            );
        }
        for name in &schema.collisions {
            eprintln!(
                "{} {label}: message `{name}` defined more than once, last definition kept",
                "collision".yellow().bold(),
            );
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Proto(target) => {
                let options = target.options();
                let sources = target.input_settings.load()?;
                let conversions = convert_all(&target.input_settings, &sources, &options)?;

                let mut rendered = Vec::with_capacity(conversions.len());
                let mut omitted = 0usize;
                for (source, conversion) in sources.iter().zip(conversions) {
                    target.output_settings.report(&source.label, &conversion.schema);
                    omitted += conversion.schema.omissions.len();
                    rendered.push(Rendered { source, text: conversion.proto });
                }
                if target.strict && omitted > 0 {
                    bail!("{omitted} entries could not be mapped to fields (--strict)");
                }
                target.output_settings.write(&rendered, "proto")
            }
            Command::Schema(target) => {
                let options = Options {
                    root_message: target.infer_settings.root_message.clone(),
                    infer: target.infer_settings.options(),
                    ..Options::default()
                };
                let sources = target.input_settings.load()?;
                let conversions = convert_all(&target.input_settings, &sources, &options)?;

                let mut rendered = Vec::with_capacity(conversions.len());
                for (source, conversion) in sources.iter().zip(conversions) {
                    target.output_settings.report(&source.label, &conversion.schema);
                    let mut json = serde_json::to_string_pretty(&conversion.schema)?;
                    json.push('\n');
                    rendered.push(Rendered { source, text: json });
                }
                target.output_settings.write(&rendered, "json")
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

/// Convert every source independently, in parallel. Order of results matches `sources`.
fn convert_all(
    input: &InputSettings,
    sources: &[Source],
    options: &Options,
) -> Result<Vec<crate::Conversion>> {
    sources
        .par_iter()
        .map(|source| -> Result<crate::Conversion> {
            let object = input
                .select(&source.text)
                .with_context(|| format!("failed to convert {}", source.label))?;
            Ok(crate::convert_object(&object, options))
        })
        .collect()
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{' ))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if pattern != "-" && has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern: {pattern}"))? {
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

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
