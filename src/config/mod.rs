//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::domain::slug::SlugPolicy;
use crate::domain::toc::DEFAULT_SCROLL_OFFSET;

pub use cli::{CliArgs, Command, GlobalOverrides, OutputFormat, RenderArgs, ScanArgs, TocArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "casebook";
const ENV_PREFIX: &str = "CASEBOOK";
pub(crate) const DEFAULT_LEGACY_HEADING_PREFIX: &str = "user-content-";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub render: RenderSettings,
    pub toc: TocSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub legacy_heading_prefix: String,
    pub heading_slugs: SlugPolicy,
    pub sanitize: bool,
}

#[derive(Debug, Clone)]
pub struct TocSettings {
    pub scroll_offset: f64,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_global_overrides(&cli.overrides);
    match &cli.command {
        Command::Render(args) => raw.apply_render_overrides(args),
        Command::Toc(args) => raw.apply_toc_overrides(args),
        Command::Scan(_) => {}
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    render: RawRenderSettings,
    toc: RawTocSettings,
}

impl RawSettings {
    fn apply_global_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
    }

    fn apply_render_overrides(&mut self, args: &RenderArgs) {
        if let Some(policy) = args.heading_slugs.as_ref() {
            self.render.heading_slugs = Some(policy.clone());
        }
    }

    fn apply_toc_overrides(&mut self, args: &TocArgs) {
        if let Some(offset) = args.scroll_offset {
            self.toc.scroll_offset = Some(offset);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            render,
            toc,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let render = build_render_settings(render)?;
        let toc = build_toc_settings(toc)?;

        Ok(Self {
            logging,
            render,
            toc,
        })
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: LevelFilter::INFO,
                format: LogFormat::Compact,
            },
            render: RenderSettings {
                legacy_heading_prefix: DEFAULT_LEGACY_HEADING_PREFIX.to_string(),
                heading_slugs: SlugPolicy::default(),
                sanitize: true,
            },
            toc: TocSettings {
                scroll_offset: DEFAULT_SCROLL_OFFSET,
            },
        }
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let legacy_heading_prefix = render
        .legacy_heading_prefix
        .map(|prefix| prefix.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LEGACY_HEADING_PREFIX.to_string());
    if legacy_heading_prefix.chars().any(char::is_whitespace) {
        return Err(LoadError::invalid(
            "render.legacy_heading_prefix",
            "prefix must not contain whitespace",
        ));
    }

    let heading_slugs = match render.heading_slugs.as_deref().map(str::trim) {
        None | Some("") => SlugPolicy::default(),
        Some(value) => parse_slug_policy(value)?,
    };

    Ok(RenderSettings {
        legacy_heading_prefix,
        heading_slugs,
        sanitize: render.sanitize.unwrap_or(true),
    })
}

fn parse_slug_policy(value: &str) -> Result<SlugPolicy, LoadError> {
    match value.to_ascii_lowercase().as_str() {
        "shared" => Ok(SlugPolicy::Shared),
        "suffixed" => Ok(SlugPolicy::Suffixed),
        other => Err(LoadError::invalid(
            "render.heading_slugs",
            format!("expected `shared` or `suffixed`, got `{other}`"),
        )),
    }
}

fn build_toc_settings(toc: RawTocSettings) -> Result<TocSettings, LoadError> {
    let scroll_offset = toc.scroll_offset.unwrap_or(DEFAULT_SCROLL_OFFSET);
    if !scroll_offset.is_finite() || scroll_offset < 0.0 {
        return Err(LoadError::invalid(
            "toc.scroll_offset",
            "must be a finite, non-negative number of pixels",
        ));
    }

    Ok(TocSettings { scroll_offset })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    legacy_heading_prefix: Option<String>,
    heading_slugs: Option<String>,
    sanitize: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawTocSettings {
    scroll_offset: Option<f64>,
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
