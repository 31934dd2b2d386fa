use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use thumbdate::{
    BatchRequest, FrontendSettings, OutputFormat, Settings, ThumbnailRenderer, WeekdaySet,
    parse_iso_date, run_batch,
};

#[derive(Parser, Debug)]
#[command(name = "thumbdate", version)]
struct Cli {
    /// Settings file (defaults to the user config directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log per-date progress.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render thumbnails for a date range plus custom dates.
    Generate(GenerateArgs),
    /// Print the template with a date substituted (today by default).
    Preview(PreviewArgs),
    /// Show the effective settings.
    Settings(SettingsArgs),
}

#[derive(Args, Debug)]
struct TemplateOverrides {
    /// SVG template to use (remembered for later runs).
    #[arg(long)]
    template: Option<PathBuf>,

    /// Locale for month and weekday names (`en`, `de`).
    #[arg(long)]
    locale: Option<String>,

    /// Date format, e.g. "{{day}}. {{month}} {{year}}".
    #[arg(long)]
    date_format: Option<String>,

    /// Placeholder token in the SVG.
    #[arg(long)]
    placeholder: Option<String>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Batch request as JSON (`from`, `to`, `time`, `customDates`, `type`).
    #[arg(long, conflicts_with_all = ["from", "to", "time", "custom", "format"])]
    request: Option<PathBuf>,

    /// First date of the range (YYYY-MM-DD).
    #[arg(long, required_unless_present = "request")]
    from: Option<String>,

    /// Last date of the range (YYYY-MM-DD).
    #[arg(long, required_unless_present = "request")]
    to: Option<String>,

    /// Time of day used in file names (HH:MM).
    #[arg(long, required_unless_present = "request")]
    time: Option<String>,

    /// Extra date rendered regardless of weekday (repeatable).
    #[arg(long = "custom")]
    custom: Vec<String>,

    /// Output format (png, jpg, webp, bmp).
    #[arg(long)]
    format: Option<OutputFormat>,

    /// Weekdays to keep from the range, comma separated (e.g. Sunday,Wednesday).
    #[arg(long, value_delimiter = ',')]
    days: Option<Vec<String>>,

    /// Output directory (defaults to the last one used).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    #[command(flatten)]
    overrides: TemplateOverrides,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// Date to substitute (YYYY-MM-DD, default today).
    #[arg(long)]
    date: Option<String>,

    /// Write the SVG here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    overrides: TemplateOverrides,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    /// Also check that the rasterizer can be executed.
    #[arg(long)]
    check: bool,
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings_path = match &cli.settings {
        Some(path) => path.clone(),
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load_or_init(&settings_path)?;

    match cli.cmd {
        Command::Generate(args) => cmd_generate(args, &mut settings, &settings_path),
        Command::Preview(args) => cmd_preview(args, &mut settings, &settings_path),
        Command::Settings(args) => cmd_settings(args, &settings, &settings_path),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_overrides(
    settings: &mut Settings,
    overrides: TemplateOverrides,
    days: Option<Vec<String>>,
) -> anyhow::Result<()> {
    if let Some(template) = overrides.template {
        settings.paths.svg = Some(template);
    }

    let mut frontend: FrontendSettings = settings.frontend.clone();
    if let Some(locale) = overrides.locale {
        frontend.locale = locale;
    }
    if let Some(format) = overrides.date_format {
        frontend.date_format = format;
    }
    if let Some(placeholder) = overrides.placeholder {
        frontend.replacement_key = placeholder;
    }
    if let Some(days) = days {
        frontend.days = days
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty())
            .collect::<WeekdaySet>();
    }
    settings
        .apply_frontend(frontend)
        .context("apply settings overrides")?;
    Ok(())
}

fn read_request(path: &Path) -> anyhow::Result<BatchRequest> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read batch request '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse batch request '{}'", path.display()))
}

fn cmd_generate(
    args: GenerateArgs,
    settings: &mut Settings,
    settings_path: &Path,
) -> anyhow::Result<ExitCode> {
    apply_overrides(settings, args.overrides, args.days)?;

    let request = match &args.request {
        Some(path) => read_request(path)?,
        None => BatchRequest {
            from: args.from.unwrap_or_default(),
            to: args.to.unwrap_or_default(),
            time: args.time.unwrap_or_default(),
            custom_dates: args.custom,
            format: args.format.unwrap_or_default(),
        },
    };

    let out_dir = args
        .out_dir
        .or_else(|| settings.paths.export.clone())
        .context("no output directory given (use --out-dir)")?;

    let document = settings.load_document()?;
    let config = settings.batch_config(document)?;
    let renderer = ThumbnailRenderer::with_opts(settings.rasterizer(), settings.render_opts());

    let report = run_batch(&request, &config, &renderer, &out_dir)?;

    settings.paths.export = Some(out_dir.clone());
    settings.save(settings_path)?;

    for path in &report.outputs {
        println!("{}", path.display());
    }
    eprintln!("{report}");
    for failure in &report.failures {
        eprintln!("  {failure}");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_preview(
    args: PreviewArgs,
    settings: &mut Settings,
    settings_path: &Path,
) -> anyhow::Result<ExitCode> {
    apply_overrides(settings, args.overrides, None)?;

    let date = match &args.date {
        Some(raw) => parse_iso_date(raw)?,
        None => chrono::Local::now().date_naive(),
    };

    let document = settings.load_document()?;
    let config = settings.batch_config(document)?;
    let svg = config.document_for(date);
    eprintln!("date text: {}", config.date_text(date));

    match &args.out {
        Some(out) => {
            thumbdate::ensure_parent_dir(out)?;
            std::fs::write(out, svg).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{svg}"),
    }

    settings.save(settings_path)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_settings(
    args: SettingsArgs,
    settings: &Settings,
    settings_path: &Path,
) -> anyhow::Result<ExitCode> {
    eprintln!("settings: {}", settings_path.display());
    println!("{}", serde_json::to_string_pretty(settings)?);

    if args.check {
        let rasterizer = settings.rasterizer();
        match rasterizer.probe() {
            Ok(version) => eprintln!("rasterizer: {version}"),
            Err(e) => {
                eprintln!("rasterizer unavailable: {e}");
                return Ok(ExitCode::FAILURE);
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}
