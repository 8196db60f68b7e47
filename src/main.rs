/*!
# fmtast CLI

Command-line front for the AST core: checks front end payloads, dumps and
summarizes the reconstructed graph.
*/

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::WalkDir;

use fmtast::ast_core::{Ast, Node, NodeId};
use fmtast::cli_common::{self, CommonArgs, OutputFormat, OutputWriter, Statistics};
use fmtast::core::{is_payload_file, read_payload_file, ErrorCollector, ErrorLevel, Loc};
use fmtast::query::{find_child_cycle, formats_in_dependency_order, node_type_histogram};
use fmtast::walk::{walk, VisitControl, Visitor};
use fmtast::{decode_token_file, load_ast, ToolConfig};

#[derive(Parser)]
#[command(
    name = "fmtast",
    version = env!("CARGO_PKG_VERSION"),
    about = "Decode, check and inspect binary-format description ASTs"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode and reconstruct every payload, report failures
    Check {
        /// Payload files or directories (searched for *.json)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Reject payloads with absent body keys
        #[arg(long)]
        strict: bool,
    },

    /// Print the node tree of a payload
    Dump {
        file: PathBuf,

        /// Stop descending below this depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Node-kind histogram of a payload
    Stats { file: PathBuf },

    /// Print a token payload
    Tokens { file: PathBuf },

    /// Formats in dependency order
    Order { file: PathBuf },

    /// Write a config file with default settings
    InitConfig {
        /// Target path (.toml, .yaml or .yml)
        #[arg(default_value = "fmtast.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli_common::init_logging(cli.common.log_level())?;

    let config = ToolConfig::load_or_default(&cli.common.config)?;
    let format = cli.common.format.unwrap_or(config.output.format);
    let mut out = OutputWriter::stdout(format).with_pretty(config.output.pretty);

    match cli.command {
        Commands::Check { paths, strict } => {
            let mut config = config;
            config.decode.strict_fields |= strict;
            if !check_command(&paths, &config, &cli.common, &mut out)? {
                std::process::exit(1);
            }
        }
        Commands::Dump { file, max_depth } => dump_command(&file, &config, max_depth, &mut out)?,
        Commands::Stats { file } => stats_command(&file, &config, &mut out)?,
        Commands::Tokens { file } => tokens_command(&file, &mut out)?,
        Commands::Order { file } => order_command(&file, &config, &mut out)?,
        Commands::InitConfig { path, force } => init_config_command(&path, force, &cli.common)?,
    }

    out.flush()
}

/// Load a payload and make sure its child relation can be walked.
fn load(file: &Path, config: &ToolConfig) -> Result<Ast> {
    let (_, ast) = load_ast(file, config.decode)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    if let Some(id) = find_child_cycle(&ast, ast.root()) {
        bail!(
            "Failed to load {}: {} {} is its own descendant",
            file.display(),
            ast.node_type(id),
            id
        );
    }
    Ok(ast)
}

/// Payload files under `paths`; explicit file arguments are kept as given.
fn collect_payloads(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        cli_common::validate_path(path, "Input")?;
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() && is_payload_file(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    Ok(files)
}

fn check_command(
    paths: &[PathBuf],
    config: &ToolConfig,
    common: &CommonArgs,
    out: &mut OutputWriter,
) -> Result<bool> {
    let start = Instant::now();
    let files = collect_payloads(paths)?;
    tracing::info!("checking {} payload(s)", files.len());

    let check_one = |file: &PathBuf| -> ErrorCollector {
        let mut collector = ErrorCollector::new();
        if let Err(err) = load(file, config) {
            collector.add(file.display().to_string(), format!("{:#}", err), ErrorLevel::Error);
        }
        collector
    };
    let results: Vec<ErrorCollector> = if config.check.parallel {
        files.par_iter().map(check_one).collect()
    } else {
        files.iter().map(check_one).collect()
    };

    let mut collector = ErrorCollector::new();
    for result in results {
        collector.merge(result);
    }

    match out.format() {
        OutputFormat::Json => out.write_object(&collector)?,
        OutputFormat::Table => {
            let rows = collector
                .diagnostics
                .iter()
                .map(|d| vec![d.file.clone(), d.level.to_string(), d.message.replace('\n', " ")])
                .collect();
            out.write_table(&["file", "level", "message"], rows)?;
        }
        OutputFormat::Text => {
            if !collector.diagnostics.is_empty() {
                out.write_line(&collector.to_string())?;
            }
        }
    }

    let failed = collector.error_count();
    if common.should_print() {
        let summary = format!(
            "{} of {} payload(s) ok in {}",
            files.len() - failed,
            files.len(),
            cli_common::format_duration(start.elapsed())
        );
        if failed == 0 {
            cli_common::print_success(&summary);
        } else {
            cli_common::print_error(&summary);
        }
    }
    Ok(failed == 0)
}

#[derive(Serialize)]
struct DumpEntry {
    id: NodeId,
    depth: usize,
    kind: &'static str,
    loc: Loc,
    #[serde(skip_serializing_if = "Option::is_none")]
    ident: Option<String>,
}

/// Collects one entry per visited node with its depth.
struct Dumper {
    depth: usize,
    max_depth: Option<usize>,
    entries: Vec<DumpEntry>,
}

impl Visitor for Dumper {
    fn enter(&mut self, ast: &Ast, id: NodeId, node: &Node) -> VisitControl {
        self.entries.push(DumpEntry {
            id,
            depth: self.depth,
            kind: node.node_type().name(),
            loc: node.loc,
            ident: ast.ident_name(id).map(str::to_string),
        });
        let depth = self.depth;
        // leave() runs for skipped nodes too
        self.depth += 1;
        if self.max_depth.is_some_and(|max| depth >= max) {
            VisitControl::SkipChildren
        } else {
            VisitControl::Continue
        }
    }

    fn leave(&mut self, _ast: &Ast, _id: NodeId, _node: &Node) {
        self.depth -= 1;
    }
}

fn dump_command(file: &Path, config: &ToolConfig, max_depth: Option<usize>, out: &mut OutputWriter) -> Result<()> {
    let ast = load(file, config)?;
    let mut dumper = Dumper { depth: 0, max_depth, entries: Vec::new() };
    walk(&ast, ast.root(), &mut dumper);

    match out.format() {
        OutputFormat::Json => out.write_object(&dumper.entries),
        OutputFormat::Table => {
            let rows = dumper
                .entries
                .iter()
                .map(|e| {
                    vec![
                        e.id.to_string(),
                        e.depth.to_string(),
                        e.kind.to_string(),
                        e.loc.to_string(),
                        e.ident.clone().unwrap_or_default(),
                    ]
                })
                .collect();
            out.write_table(&["id", "depth", "kind", "loc", "ident"], rows)
        }
        OutputFormat::Text => {
            for e in &dumper.entries {
                let mut line = format!("{}{} {} @{}", "  ".repeat(e.depth), e.kind, e.id, e.loc);
                if let Some(ident) = &e.ident {
                    line.push_str(&format!(" `{}`", ident));
                }
                out.write_line(&line)?;
            }
            Ok(())
        }
    }
}

fn stats_command(file: &Path, config: &ToolConfig, out: &mut OutputWriter) -> Result<()> {
    let start = Instant::now();
    let ast = load(file, config)?;
    let histogram = node_type_histogram(&ast);
    let stats = Statistics {
        total: histogram.values().sum(),
        categories: histogram.iter().map(|(ty, n)| (ty.name().to_string(), *n)).collect(),
        duration: Some(cli_common::format_duration(start.elapsed())),
    };
    stats.write(out)?;
    if out.format() == OutputFormat::Text {
        out.write_line(&format!("Nodes in arena: {}", ast.node_count()))?;
        out.write_line(&format!("Scopes: {}", ast.scope_count()))?;
    }
    Ok(())
}

fn tokens_command(file: &Path, out: &mut OutputWriter) -> Result<()> {
    let text = read_payload_file(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let payload = decode_token_file(&text, &file.display().to_string())?;
    if let Some(error) = &payload.error {
        if !payload.success {
            bail!("front end reported errors\n{}", error);
        }
        cli_common::print_warning(&error.to_string());
    }
    let tokens = payload.tokens.unwrap_or_default();

    match out.format() {
        OutputFormat::Json => out.write_object(&tokens),
        _ => {
            let rows = tokens
                .iter()
                .map(|t| vec![t.loc.to_string(), t.tag.as_str().to_string(), format!("{:?}", t.token)])
                .collect();
            out.write_table(&["loc", "tag", "token"], rows)
        }
    }
}

fn order_command(file: &Path, config: &ToolConfig, out: &mut OutputWriter) -> Result<()> {
    let ast = load(file, config)?;
    let names: Vec<String> = formats_in_dependency_order(&ast)
        .into_iter()
        .map(|id| ast.ident_name(id).map_or_else(|| format!("<anonymous {}>", id), str::to_string))
        .collect();

    match out.format() {
        OutputFormat::Json => out.write_object(&names),
        _ => {
            for name in &names {
                out.write_line(name)?;
            }
            Ok(())
        }
    }
}

fn init_config_command(path: &Path, force: bool, common: &CommonArgs) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    ToolConfig::default().save_to_file(path)?;
    if common.should_print() {
        cli_common::print_success(&format!("Config written to {}", path.display()));
    }
    Ok(())
}
