use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::Path,
    process::ExitCode,
};

use casebook::{
    application::{
        error::{AppError, ErrorReport},
        render::{
            Diagnostic, RenderPipelineConfig, RenderRequest, RenderService, RenderedDocument,
            Segment, configure_render_service, render_service, scan_document,
        },
    },
    config::{self, Command, OutputFormat, RenderArgs, ScanArgs, Settings, TocArgs},
    domain::toc::{ScrollTarget, TocSynchronizer},
    infra::{error::InfraError, telemetry},
    presentation::views::render_article,
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

/// Vertical distance between consecutive headings in the synthetic layout
/// used by `casebook toc --scroll`.
const SYNTHETIC_SECTION_HEIGHT: f64 = 600.0;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            report_application_error(&error);
            ExitCode::from(error.exit_code())
        }
    }
}

fn report_application_error(error: &AppError) {
    let report = ErrorReport::from_error("casebook::main", error);
    let chain = report.messages.join(": ");

    if dispatcher::has_been_set() {
        error!(source = report.source, error = %chain, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(source = report.source, error = %chain, "application error");
    });
}

fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;
    configure_render_service(RenderPipelineConfig::from(&settings.render))?;

    match cli_args.command {
        Command::Render(args) => run_render(&args),
        Command::Scan(args) => run_scan(&args),
        Command::Toc(args) => run_toc(&settings, &args),
    }
}

fn run_render(args: &RenderArgs) -> Result<(), AppError> {
    let rendered = render_path(&args.path)?;

    match args.format {
        OutputFormat::Json => write_json(&rendered),
        OutputFormat::Html => {
            let html = render_article(&rendered)?;
            write_stdout(&html)
        }
    }
}

fn run_scan(args: &ScanArgs) -> Result<(), AppError> {
    let document = read_document(&args.path)?;
    let (segments, diagnostics) = scan_document(&document);
    log_diagnostics(&args.path, &diagnostics);

    info!(
        target = "casebook::scan",
        segments = segments.len(),
        blocks = segments.iter().filter(|segment| segment.is_block()).count(),
        "scanned document"
    );

    #[derive(Serialize)]
    struct ScanOutput<'a> {
        segments: &'a [Segment],
        diagnostics: &'a [Diagnostic],
    }

    write_json(&ScanOutput {
        segments: &segments,
        diagnostics: &diagnostics,
    })
}

fn run_toc(settings: &Settings, args: &TocArgs) -> Result<(), AppError> {
    let rendered = render_path(&args.path)?;
    let unresolved: Vec<String> = rendered
        .toc
        .unresolved(rendered.heading_slugs())
        .into_iter()
        .map(|entry| entry.id.clone())
        .collect();
    for id in &unresolved {
        warn!(target = "casebook::toc", anchor = %id, "no heading for table of contents entry");
    }

    let layout = heading_layout(&rendered);
    let mut synchronizer = TocSynchronizer::mount(rendered.toc.clone(), settings.toc.scroll_offset);

    let active_id = match args.scroll {
        Some(scroll_y) => synchronizer.on_scroll(scroll_y, &layout).map(str::to_string),
        None => None,
    };
    let jump = args
        .jump
        .as_deref()
        .map(|id| synchronizer.jump_to(id, &layout))
        .transpose()?;
    synchronizer.unmount();

    #[derive(Serialize)]
    struct TocEntryOutput<'a> {
        id: &'a str,
        title: &'a str,
        level: u8,
        resolved: bool,
    }

    #[derive(Serialize)]
    struct TocOutput<'a> {
        entries: Vec<TocEntryOutput<'a>>,
        active_id: Option<String>,
        jump: Option<ScrollTarget>,
    }

    let entries = rendered
        .toc
        .entries()
        .iter()
        .map(|entry| TocEntryOutput {
            id: &entry.id,
            title: &entry.title,
            level: entry.level,
            resolved: !unresolved.contains(&entry.id),
        })
        .collect();

    write_json(&TocOutput {
        entries,
        active_id,
        jump,
    })
}

fn render_path(path: &Path) -> Result<RenderedDocument, AppError> {
    let document = read_document(path)?;
    let rendered = render_service().render(&RenderRequest::new(document))?;
    log_diagnostics(path, &rendered.diagnostics);

    info!(
        target = "casebook::render",
        path = %path.display(),
        items = rendered.items.len(),
        headings = rendered.headings.len(),
        diagnostics = rendered.diagnostics.len(),
        "rendered document"
    );

    Ok(rendered)
}

fn read_document(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(AppError::from)
}

fn log_diagnostics(path: &Path, diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        warn!(
            target = "casebook::diagnostics",
            path = %path.display(),
            "{diagnostic}"
        );
    }
}

/// Places each anchored heading one section height below the previous one,
/// keeping the first position of repeated slugs.
fn heading_layout(rendered: &RenderedDocument) -> BTreeMap<String, f64> {
    let mut layout = BTreeMap::new();
    for (index, slug) in rendered.heading_slugs().enumerate() {
        layout
            .entry(slug.to_string())
            .or_insert(index as f64 * SYNTHETIC_SECTION_HEIGHT);
    }
    layout
}

fn write_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value).map_err(InfraError::from)?;
    write_stdout(&json)
}

fn write_stdout(output: &str) -> Result<(), AppError> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()?;
    Ok(())
}
