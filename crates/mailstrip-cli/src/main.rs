use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mailstrip::{RenderMode, Unquote};

#[derive(Parser, Debug)]
#[command(name = "mailstrip")]
#[command(about = "Strip quoted replies from email HTML or text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the de-quoted plain text of a message.
    Text(InputCmd),
    /// Print the de-quoted HTML of a message.
    Html(InputCmd),
    /// Print the de-quoted Markdown of a message.
    Markdown(InputCmd),
    /// Print the removed quote as HTML (empty when none was found).
    Quote(InputCmd),
    /// Print every output as one JSON envelope.
    All(InputCmd),
    /// Print version info.
    Version,
}

#[derive(clap::Args, Debug)]
struct InputCmd {
    /// Input file; reads stdin when absent or "-".
    file: Option<PathBuf>,
    /// Input kind. Allowed: auto, html, text
    ///
    /// "auto" trusts the file extension (.txt/.md are text, .html/.htm are
    /// HTML) and otherwise sniffs for a leading tag.
    #[arg(long, default_value = "auto")]
    kind: String,
    /// If true, return raw (pruned but unsanitized) output instead of cleaned.
    #[arg(long, action = clap::ArgAction::Set, default_value_t = false)]
    raw: bool,
    /// Output format. Allowed: text, json
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(serde::Serialize)]
struct AllOutputs {
    html: Option<String>,
    text: Option<String>,
    markdown: Option<String>,
    quote: Option<String>,
    quote_removed: bool,
}

fn read_input(cmd: &InputCmd) -> Result<String> {
    match &cmd.file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display())),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("read stdin")?;
            Ok(buf)
        }
    }
}

fn looks_like_html(content: &str) -> bool {
    content.trim_start().starts_with('<')
}

fn input_is_html(cmd: &InputCmd, content: &str) -> Result<bool> {
    match cmd.kind.as_str() {
        "html" => Ok(true),
        "text" => Ok(false),
        "auto" => {
            if let Some(ext) = cmd
                .file
                .as_ref()
                .and_then(|p| p.extension())
                .and_then(|e| e.to_str())
            {
                if ext.eq_ignore_ascii_case("txt") || ext.eq_ignore_ascii_case("md") {
                    return Ok(false);
                }
                if ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm") {
                    return Ok(true);
                }
            }
            Ok(looks_like_html(content))
        }
        other => anyhow::bail!("unknown --kind {other:?} (allowed: auto, html, text)"),
    }
}

fn build_engine(cmd: &InputCmd, content: &str) -> Result<Unquote> {
    let engine = if input_is_html(cmd, content)? {
        Unquote::new(Some(content), None)?
    } else {
        Unquote::new(None, Some(content))?
    };
    Ok(engine)
}

fn emit(cmd: &InputCmd, key: &str, value: &str) -> Result<()> {
    match cmd.output.as_str() {
        "text" => {
            println!("{value}");
            Ok(())
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ key: value }))?);
            Ok(())
        }
        other => anyhow::bail!("unknown --output {other:?} (allowed: text, json)"),
    }
}

fn run_field(cmd: InputCmd, key: &str) -> Result<()> {
    let content = read_input(&cmd)?;
    let mut engine = build_engine(&cmd, &content)?;
    let mode = if cmd.raw { RenderMode::Raw } else { RenderMode::Clean };
    let value = match key {
        "text" => engine.text(mode),
        "html" => engine.html(mode),
        "markdown" => engine.markdown(),
        "quote" => engine.quote(mode),
        _ => unreachable!("field keys are fixed by the subcommand table"),
    }
    .unwrap_or_default()
    .to_string();
    emit(&cmd, key, &value)
}

fn run_all(cmd: InputCmd) -> Result<()> {
    let content = read_input(&cmd)?;
    let mut engine = build_engine(&cmd, &content)?;
    let mode = if cmd.raw { RenderMode::Raw } else { RenderMode::Clean };
    let outputs = AllOutputs {
        html: engine.html(mode).map(str::to_string),
        text: engine.text(mode).map(str::to_string),
        markdown: engine.markdown().map(str::to_string),
        quote: engine.quote(mode).map(str::to_string),
        quote_removed: engine.quote_removed(),
    };
    println!("{}", serde_json::to_string_pretty(&outputs)?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Text(cmd) => run_field(cmd, "text"),
        Commands::Html(cmd) => run_field(cmd, "html"),
        Commands::Markdown(cmd) => run_field(cmd, "markdown"),
        Commands::Quote(cmd) => run_field(cmd, "quote"),
        Commands::All(cmd) => run_all(cmd),
        Commands::Version => {
            println!("mailstrip {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
