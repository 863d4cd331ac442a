//! CLI: shapes source → (schema | rust | check)
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indexmap::IndexMap;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;

use crate::codec::{Codec, CodecOptions, DEFAULT_MAX_DEPTH};
use crate::frontend::{module_header, parse_module};
use crate::module::Module;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// compile JSON shape declarations into JSON Schema or Rust, or check a JSON
/// document against a declared type
#[derive(Parser, Debug)]
#[command(name = "json-shapes", version)]
pub struct CommandLineInterface {
    /// more logging on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// deepest nesting a decode will follow
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// write one `<module>_schema.json` per module
    Schema(SchemaOut),
    /// write one `<module>.rs` per module
    Rust(RustOut),
    /// decode a JSON document, re-encode it and report whether the round trip is exact
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more shape sources. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct RustOut {
    #[command(flatten)]
    input_settings: InputSettings,

    /// output directory (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,

    /// module declaring the type
    #[arg(long)]
    module: String,

    /// declaration name (`Name` or `module.Name`)
    #[arg(long = "type")]
    type_name: String,

    /// JSON document to check
    #[arg(long)]
    json: PathBuf,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    /// Every input compiled, imports before importers.
    fn load_modules(&self) -> anyhow::Result<IndexMap<String, Arc<Module>>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut sources = IndexMap::<String, (PathBuf, String, Vec<String>)>::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {}", source_path.display()))?;
            let (name, imports) = module_header(&source)
                .with_context(|| format!("bad module header in {}", source_path.display()))?;
            if let Some((first, _, _)) = sources.get(&name) {
                bail!("module `{name}` is defined by both {} and {}", first.display(), source_path.display());
            }
            sources.insert(name, (source_path, source, imports));
        }

        let mut order = Vec::with_capacity(sources.len());
        let mut done = HashSet::new();
        let mut visiting = Vec::new();
        for name in sources.keys() {
            visit(name, &sources, &mut done, &mut visiting, &mut order)?;
        }

        let mut modules = IndexMap::new();
        for name in order {
            let (path, source, _) = &sources[name.as_str()];
            let module = parse_module(source, &modules)
                .with_context(|| format!("failed to compile {}", path.display()))?;
            info!(module = %name, decls = module.len(), "compiled");
            modules.insert(name, Arc::new(module));
        }
        Ok(modules)
    }
}

/// Depth-first import order; an import cycle is an error.
fn visit(
    name: &str,
    sources: &IndexMap<String, (PathBuf, String, Vec<String>)>,
    done: &mut HashSet<String>,
    visiting: &mut Vec<String>,
    order: &mut Vec<String>,
) -> anyhow::Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if visiting.iter().any(|v| v == name) {
        bail!("import cycle: {} -> {name}", visiting.join(" -> "));
    }
    let Some((path, _, imports)) = sources.get(name) else {
        bail!("module `{name}` is imported but not among the inputs");
    };
    visiting.push(name.to_owned());
    for import in imports {
        visit(import, sources, done, visiting, order)
            .with_context(|| format!("imported by {}", path.display()))?;
    }
    visiting.pop();
    done.insert(name.to_owned());
    order.push(name.to_owned());
    Ok(())
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let level = match self.verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        };
        // a subscriber may already be installed when embedded
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .try_init();

        match &self.cmd {
            Command::Schema(target) => {
                let modules = target.input_settings.load_modules()?;
                for module in modules.values() {
                    let schema = crate::schema::module_schema(module);
                    let schema_src = serde_json::to_string_pretty(&schema)?;
                    let file_name = crate::schema::schema_file_name(module);
                    write_output(target.out.as_deref(), &file_name, &schema_src)?;
                }
            }
            Command::Rust(target) => {
                let modules = target.input_settings.load_modules()?;
                for module in modules.values() {
                    let mut cg = crate::codegen::Codegen::new(module);
                    cg.emit_module();
                    let rust_src = cg.into_string();
                    let file_name = crate::codegen::rust_file_name(module);
                    write_output(target.out.as_deref(), &file_name, &rust_src)?;
                }
            }
            Command::Check(target) => {
                let options = CodecOptions { max_depth: self.max_depth };
                target.check(options)?;
            }
        }
        Ok(())
    }
}

impl CheckArgs {
    fn check(&self, options: CodecOptions) -> anyhow::Result<()> {
        let modules = self.input_settings.load_modules()?;
        let module = modules.get(&self.module)
            .ok_or_else(|| anyhow!("module `{}` is not among the inputs", self.module))?;
        let source = std::fs::read_to_string(&self.json)
            .with_context(|| format!("failed to read {}", self.json.display()))?;
        let document: serde_json::Value = serde_json::from_str(&source)
            .with_context(|| format!("failed to parse JSON file {}", self.json.display()))?;

        let codec = Codec::with_options(module, options);
        let ty = codec.named(&self.type_name)?;
        let value = match codec.decode(&ty, &document) {
            Ok(value) => value,
            Err(error) => {
                eprintln!("{} {}: {error}", "✗".red(), self.json.display());
                return Err(error).context("decode failed");
            }
        };
        let encoded = codec.encode_as(&ty, &value)?;
        debug!(path = %self.json.display(), "re-encoded");

        if encoded == document {
            eprintln!("{} {} is a `{}`", "✓".green(), self.json.display(), self.type_name);
            return Ok(());
        }
        eprintln!("{} {} decodes as `{}` but re-encodes differently", "✗".yellow(), self.json.display(), self.type_name);
        eprintln!("{}", serde_json::to_string_pretty(&encoded)?.dimmed());
        bail!("round trip of {} is not exact", self.json.display())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn write_output(dir: Option<&Path>, file_name: &str, contents: &str) -> anyhow::Result<()> {
    let Some(dir) = dir else {
        println!("{contents}");
        return Ok(());
    };
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(file_name);
    std::fs::write(&path, contents)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), "wrote");
    Ok(())
}

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
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
                // an explicit glob that matches nothing is a mistake
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
