//! flowdown CLI — streams Markdown from files, URLs, or stdin to the
//! terminal as styled ANSI.

mod input;

use std::io::{self, IsTerminal, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use flowdown_render::{detect_osc8_support, render, RenderOptions};
use flowdown_theme::{available_themes, theme_by_name, Theme};

const DEFAULT_WIDTH: usize = 80;
const DEFAULT_SIM_CHUNK: usize = 3;
const DEFAULT_SIM_DELAY_MS: u64 = 20;

#[derive(Parser)]
#[command(
    name = "flowdown",
    version,
    about = "Stream Markdown to your terminal as styled ANSI",
    after_help = "If no input is provided, Markdown is read from stdin."
)]
struct Cli {
    /// Files or http(s):// URLs, concatenated in order
    inputs: Vec<String>,

    /// Output width override (0 uses terminal width if available)
    #[arg(short, long, default_value_t = 0)]
    width: usize,

    /// Theme name
    #[arg(short, long, default_value = "default")]
    theme: String,

    /// OSC 8 hyperlinks: auto|on|off
    #[arg(short = '8', long, default_value = "auto")]
    osc8: String,

    /// List available themes
    #[arg(long)]
    list_themes: bool,

    /// Output file instead of stdout
    #[arg(short, long)]
    output: Option<String>,

    /// Generate non-ANSI output
    #[arg(short, long)]
    boring: bool,

    /// Chop overlong words at the width instead of hyphenating
    #[arg(long)]
    soft_wrap: bool,

    /// Throttle input to simulate inference-speed streaming
    #[arg(long)]
    simulate: bool,

    /// Max bytes per simulated stream chunk
    #[arg(long, default_value_t = DEFAULT_SIM_CHUNK)]
    simulate_chunk: usize,

    /// Delay per simulated stream chunk, in milliseconds
    #[arg(long, default_value_t = DEFAULT_SIM_DELAY_MS)]
    simulate_delay: u64,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("flowdown: {err:#}");
            let code = if err.downcast_ref::<UsageError>().is_some() {
                2
            } else {
                1
            };
            std::process::exit(code);
        }
    }
}

/// A bad flag value or unknown theme; exits with status 2 like a parse
/// error from clap itself.
#[derive(Debug)]
struct UsageError(String);

impl std::fmt::Display for UsageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for UsageError {}

fn run(cli: Cli) -> Result<()> {
    if cli.list_themes {
        let mut stdout = io::stdout().lock();
        for name in available_themes() {
            writeln!(stdout, "{name}")?;
        }
        return Ok(());
    }

    let theme = resolve_theme(&cli.theme, cli.boring)?;
    let osc8 = resolve_osc8(&cli.osc8)?;
    let options = RenderOptions {
        osc8,
        soft_wrap: cli.soft_wrap,
    };

    let reader = input::open_inputs(&cli.inputs)?;
    let width = resolve_width(cli.width);

    let writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(create_output(path)?),
        None => Box::new(io::stdout().lock()),
    };

    if cli.simulate {
        // throttle delivery; the document still renders as Markdown
        let reader = input::SlowReader::new(
            reader,
            cli.simulate_chunk,
            Duration::from_millis(cli.simulate_delay),
        );
        render(reader, writer, width, &theme, options).context("render")?;
        return Ok(());
    }

    render(reader, writer, width, &theme, options).context("render")?;
    Ok(())
}

fn resolve_theme(name: &str, boring: bool) -> Result<Theme> {
    if boring {
        return theme_by_name("boring").context("boring theme missing");
    }
    match theme_by_name(name) {
        Some(theme) => Ok(theme),
        None => Err(UsageError(format!(
            "unknown theme {name:?}; available: {}",
            available_themes().join(", ")
        ))
        .into()),
    }
}

fn resolve_osc8(mode: &str) -> Result<bool> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "" | "auto" => Ok(detect_osc8_support()),
        "on" | "true" | "1" | "yes" => Ok(true),
        "off" | "false" | "0" | "no" => Ok(false),
        other => Err(UsageError(format!("invalid --osc8 {other:?}: expected auto|on|off")).into()),
    }
}

fn resolve_width(flag: usize) -> usize {
    if flag > 0 {
        return flag;
    }
    if io::stdout().is_terminal() {
        if let Ok((w, _)) = crossterm::terminal::size() {
            if w > 0 {
                return w as usize;
            }
        }
    }
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(w) = columns.parse::<usize>() {
            if w > 0 {
                return w;
            }
        }
    }
    DEFAULT_WIDTH
}

fn create_output(path: &str) -> Result<std::fs::File> {
    let path = Path::new(path);
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create output directory {}", dir.display()))?;
        }
    }
    std::fs::File::create(path).with_context(|| format!("create output {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc8_mode_parsing() {
        assert!(resolve_osc8("on").unwrap());
        assert!(resolve_osc8("YES").unwrap());
        assert!(!resolve_osc8("off").unwrap());
        assert!(!resolve_osc8("0").unwrap());
        assert!(resolve_osc8("sometimes").is_err());
    }

    #[test]
    fn explicit_width_wins() {
        assert_eq!(resolve_width(42), 42);
    }

    #[test]
    fn unknown_theme_is_an_error() {
        assert!(resolve_theme("definitely-not-a-theme", false).is_err());
    }

    #[test]
    fn boring_flag_overrides_theme() {
        let theme = resolve_theme("dracula", true).unwrap();
        assert_eq!(theme.name(), "boring");
        assert!(theme.styles().text.is_empty());
    }
}
