use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the casebook binary.
#[derive(Debug, Parser)]
#[command(
    name = "casebook",
    version,
    about = "Render case-study documents with typed content blocks"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CASEBOOK_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Render a document to JSON or HTML on stdout.
    Render(RenderArgs),
    /// Print the prose and block segments of a document.
    Scan(ScanArgs),
    /// Print the table of contents and, optionally, the active section.
    Toc(TocArgs),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Html,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    /// Document to render.
    #[arg(value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub path: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Override the heading slug policy (shared|suffixed).
    #[arg(long = "heading-slugs", value_name = "POLICY")]
    pub heading_slugs: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ScanArgs {
    /// Document to scan.
    #[arg(value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub path: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct TocArgs {
    /// Document whose headings are matched against the catalog.
    #[arg(value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub path: PathBuf,

    /// Scroll position, in pixels, used to compute the active entry.
    #[arg(long, value_name = "Y")]
    pub scroll: Option<f64>,

    /// Resolve the scroll target for a section anchor.
    #[arg(long, value_name = "ID")]
    pub jump: Option<String>,

    /// Override the active-section offset in pixels.
    #[arg(long = "scroll-offset", value_name = "PIXELS")]
    pub scroll_offset: Option<f64>,
}
