//! Runs the decode / round-trip manifest against the fixture modules.
//!
//! `cargo run -p dev-test-runner [manifest.json]`
mod path_de;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use colored::Colorize;
use json_shapes::indexmap::IndexMap;
use json_shapes::{Codec, CodecOptions, Decl, MemTables, Module, parse_module};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// MANIFEST
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default)]
    options: CodecOptions,
    /// Shape sources relative to the manifest, imports first.
    modules: Vec<PathBuf>,
    #[serde(default)]
    cases: Vec<Case>,
    #[serde(default)]
    tables: Vec<TableCase>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Case {
    name: String,
    module: String,
    #[serde(rename = "type")]
    type_name: String,
    json: Value,
    expect: Expect,
    /// Overrides the manifest's depth limit.
    max_depth: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Expect {
    /// Re-encoding yields the input exactly.
    RoundTrip,
    /// Re-encoding yields this document.
    Canonical(Value),
    /// Decoding fails with a message matching this pattern.
    Error(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TableCase {
    name: String,
    module: String,
    table: String,
    json: Value,
}

// ————————————————————————————————————————————————————————————————————————————
// RUNNER
// ————————————————————————————————————————————————————————————————————————————

fn load_modules(base: &Path, paths: &[PathBuf]) -> anyhow::Result<IndexMap<String, Arc<Module>>> {
    let mut modules = IndexMap::new();
    for rel in paths {
        let path = base.join(rel);
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let module = parse_module(&source, &modules)
            .with_context(|| format!("failed to compile {}", path.display()))?;
        modules.insert(module.name.clone(), Arc::new(module));
    }
    Ok(modules)
}

fn module<'a>(modules: &'a IndexMap<String, Arc<Module>>, name: &str) -> anyhow::Result<&'a Module> {
    modules.get(name)
        .map(Arc::as_ref)
        .ok_or_else(|| anyhow!("no fixture module `{name}`"))
}

fn run_case(modules: &IndexMap<String, Arc<Module>>, defaults: CodecOptions, case: &Case) -> anyhow::Result<()> {
    let options = CodecOptions { max_depth: case.max_depth.unwrap_or(defaults.max_depth) };
    let codec = Codec::with_options(module(modules, &case.module)?, options);
    let ty = codec.named(&case.type_name)?;
    let decoded = codec.decode(&ty, &case.json);

    match (&case.expect, decoded) {
        (Expect::Error(pattern), Err(error)) => {
            let re = Regex::new(pattern).with_context(|| format!("bad pattern {pattern:?}"))?;
            if !re.is_match(&error.to_string()) {
                bail!("error `{error}` does not match /{pattern}/");
            }
            Ok(())
        }
        (Expect::Error(pattern), Ok(value)) => bail!("expected an error matching /{pattern}/, decoded {value:?}"),
        (_, Err(error)) => Err(error).context("decode failed"),
        (expect, Ok(value)) => {
            let wanted = match expect {
                Expect::Canonical(json) => json,
                _ => &case.json,
            };
            let encoded = codec.encode_as(&ty, &value)?;
            if &encoded != wanted {
                bail!("re-encoded as {encoded}, wanted {wanted}");
            }
            let again = codec.decode(&ty, &encoded)?;
            if !codec.equals(&ty, &value, &again) {
                bail!("second decode differs from the first");
            }
            Ok(())
        }
    }
}

fn run_table(modules: &IndexMap<String, Arc<Module>>, case: &TableCase) -> anyhow::Result<()> {
    let module = module(modules, &case.module)?;
    let Some(Decl::TableSchema(spec)) = module.get(&case.table) else {
        bail!("`{}` is not a table of `{}`", case.table, case.module);
    };
    let codec = Codec::new(module);
    let mut store = MemTables::new(spec);
    codec.read_tables(&mut store, &case.json)?;
    let written = codec.write_tables(&store)?;
    if written != case.json {
        bail!("re-written as {written}");
    }
    Ok(())
}

fn report(name: &str, result: anyhow::Result<()>, failures: &mut usize) {
    match result {
        Ok(()) => eprintln!("{} {name}", "✓".green()),
        Err(error) => {
            *failures += 1;
            eprintln!("{} {name}: {}", "✗".red(), format!("{error:#}").red());
        }
    }
}

fn main() -> anyhow::Result<()> {
    let manifest_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/cases.json"));
    let source = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    let manifest: Manifest = path_de::from_str_with_path(&source)
        .with_context(|| format!("bad manifest {}", manifest_path.display()))?;
    let base = manifest_path.parent().unwrap_or(Path::new("."));
    let modules = load_modules(base, &manifest.modules)?;

    let mut failures = 0;
    eprintln!("{}", "—— values ——".bold());
    for case in &manifest.cases {
        report(&case.name, run_case(&modules, manifest.options, case), &mut failures);
    }
    eprintln!("{}", "—— tables ——".bold());
    for case in &manifest.tables {
        report(&case.name, run_table(&modules, case), &mut failures);
    }

    let total = manifest.cases.len() + manifest.tables.len();
    if failures > 0 {
        bail!("{failures} of {total} cases failed");
    }
    eprintln!("{}", format!("all {total} cases passed").green().bold());
    Ok(())
}
