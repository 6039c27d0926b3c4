//! visualcalc CLI - evaluate a canvas of formula elements

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use visualcalc::prelude::*;
use visualcalc::dependencies;

#[derive(Parser)]
#[command(name = "vcalc")]
#[command(author, version, about = "Evaluate named formula elements and their dependencies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recalculate every element and print its result
    Eval {
        #[command(flatten)]
        canvas: CanvasArgs,

        /// Display mode: plain, fixed or scientific
        #[arg(short, long, default_value = "plain")]
        mode: FormatMode,

        /// Digits after the point for fixed and scientific modes
        #[arg(short, long, default_value = "2")]
        decimals: usize,

        /// Print the elements as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the dependency arrows between elements
    Deps {
        #[command(flatten)]
        canvas: CanvasArgs,
    },

    /// Print the element names a formula references
    Check {
        /// Formula text
        expr: String,
    },
}

/// Where the elements come from
#[derive(Args)]
struct CanvasArgs {
    /// Element definition, repeatable (applied after --input)
    #[arg(short, long = "cell", value_name = "NAME=CONTENT", value_parser = parse_cell)]
    cells: Vec<(String, String)>,

    /// JSON file holding an array of {"name", "content"} objects
    #[arg(short, long)]
    input: Option<PathBuf>,
}

#[derive(Deserialize)]
struct CellEntry {
    name: String,
    #[serde(default = "default_content")]
    content: String,
}

fn default_content() -> String {
    Element::DEFAULT_CONTENT.to_string()
}

fn parse_cell(arg: &str) -> std::result::Result<(String, String), String> {
    match arg.split_once('=') {
        Some((name, content)) => Ok((name.trim().to_string(), content.to_string())),
        None => Err(format!("expected NAME=CONTENT, got '{}'", arg)),
    }
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Eval {
            canvas,
            mode,
            decimals,
            json,
        } => eval(&canvas, FormatSetting::new(mode, decimals), json),
        Commands::Deps { canvas } => show_deps(&canvas),
        Commands::Check { expr } => check(&expr),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_canvas(args: &CanvasArgs) -> Result<ElementRegistry> {
    let mut registry = ElementRegistry::new();

    if let Some(path) = &args.input {
        for cell in read_cells(path)? {
            registry
                .insert(cell.name.as_str(), cell.content)
                .with_context(|| format!("Invalid element '{}' in '{}'", cell.name, path.display()))?;
        }
    }

    for (name, content) in &args.cells {
        if registry.contains(name) {
            registry.set_content(name, content.as_str())?;
        } else {
            registry
                .insert(name.as_str(), content.as_str())
                .with_context(|| format!("Invalid element '{}'", name))?;
        }
    }

    if registry.is_empty() {
        bail!("No elements given; use --cell NAME=CONTENT or --input FILE");
    }

    tracing::debug!(elements = registry.len(), "canvas loaded");
    Ok(registry)
}

fn read_cells(path: &Path) -> Result<Vec<CellEntry>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

fn eval(args: &CanvasArgs, setting: FormatSetting, json: bool) -> Result<()> {
    let mut registry = load_canvas(args)?;
    let stats = registry.recalculate(&setting);

    let mut stdout = io::stdout().lock();
    if json {
        let elements: Vec<&Element> = registry.iter().collect();
        serde_json::to_writer_pretty(&mut stdout, &elements)
            .context("Failed to write JSON")?;
        writeln!(stdout)?;
    } else {
        for element in registry.iter() {
            writeln!(
                stdout,
                "{} = {} -> {}",
                element.name(),
                element.content(),
                element.display_result()
            )
            .context("Failed to write to stdout")?;
        }
    }

    eprintln!(
        "Calculated {} of {} elements ({} errors, {} circular)",
        stats.calculated, stats.elements, stats.errors, stats.circular_references
    );

    Ok(())
}

fn show_deps(args: &CanvasArgs) -> Result<()> {
    let registry = load_canvas(args)?;
    let graph = registry.dependency_graph();

    let mut stdout = io::stdout().lock();
    for connection in registry.connections() {
        let marker = if graph.share_cycle(&connection.source, &connection.target) {
            " (circular)"
        } else {
            ""
        };
        writeln!(stdout, "{} -> {}{}", connection.source, connection.target, marker)
            .context("Failed to write to stdout")?;
    }

    Ok(())
}

fn check(expr: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    for name in dependencies(expr) {
        writeln!(stdout, "{}", name).context("Failed to write to stdout")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cell() {
        assert_eq!(
            parse_cell("E3=E1 == 2").unwrap(),
            ("E3".to_string(), "E1 == 2".to_string())
        );
        assert_eq!(
            parse_cell(" E1 =5").unwrap(),
            ("E1".to_string(), "5".to_string())
        );
        assert!(parse_cell("E1").is_err());
    }

    #[test]
    fn test_load_canvas_overrides_input() {
        let args = CanvasArgs {
            cells: vec![
                ("E1".to_string(), "4".to_string()),
                ("E1".to_string(), "9".to_string()),
                ("E2".to_string(), "math.sqrt(E1)".to_string()),
            ],
            input: None,
        };
        let mut registry = load_canvas(&args).unwrap();
        assert_eq!(registry.len(), 2);

        registry.recalculate(&FormatSetting::default());
        assert_eq!(registry.get("E2").unwrap().display_result(), "3.0");
    }

    #[test]
    fn test_load_canvas_rejects_bad_input() {
        let empty = CanvasArgs {
            cells: Vec::new(),
            input: None,
        };
        assert!(load_canvas(&empty).is_err());

        let reserved = CanvasArgs {
            cells: vec![("math".to_string(), "1".to_string())],
            input: None,
        };
        assert!(load_canvas(&reserved).is_err());
    }

    #[test]
    fn test_cell_spec_defaults_content() {
        let cells: Vec<CellEntry> =
            serde_json::from_str(r#"[{"name": "E1"}, {"name": "E2", "content": "E1 + 1"}]"#)
                .unwrap();
        assert_eq!(cells[0].content, "0");
        assert_eq!(cells[1].content, "E1 + 1");
    }
}
