use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::Result;
use l10n_config::L10nConfig;
use l10n_core::{Clock, ManualClock, SystemClock};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod ui;

const DEFAULT_DATA: &str = "l10n.json";

#[derive(Parser)]
#[command(name = "l10n", version, about = "Translation packaging and PO export")]
struct Cli {
    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Only log warnings and errors
    #[arg(long, short)]
    quiet: bool,

    /// Config file to use instead of the default search
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot data file (overrides `data` from config)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Fixed "now" (RFC 3339) for reproducible output
    #[arg(long, hide = true, env = "L10N_NOW", value_parser = parse_now)]
    now: Option<DateTime<Utc>>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Export a PO file, or a POT template, for a project
    Export {
        #[arg(long)]
        project: String,
        /// Release title; all releases when omitted
        #[arg(long)]
        release: Option<String>,
        #[arg(long)]
        lang: Option<String>,
        #[arg(long)]
        template: bool,
        /// Only translated strings, no comments or blank lines
        #[arg(long)]
        compact: bool,
        #[arg(long)]
        installer_only: bool,
        /// Add suggestions as comments and promote them as fuzzy
        #[arg(long)]
        suggestions: bool,
        /// File or directory; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Regenerate stale packages of one release, or of the release queue
    Package {
        #[arg(long, requires = "release")]
        project: Option<String>,
        #[arg(long, requires = "project")]
        release: Option<String>,
        #[arg(long, requires = "release")]
        lang: Option<String>,
        #[arg(long)]
        force: bool,
        /// Files per run, 0 = unlimited
        #[arg(long)]
        file_limit: Option<usize>,
        /// Releases per queue run, 0 = unlimited
        #[arg(long)]
        release_limit: Option<usize>,
        /// Seconds between two checks of the same release
        #[arg(long)]
        interval_secs: Option<u64>,
        /// Root directory for packaged files
        #[arg(long)]
        directory: Option<PathBuf>,
        /// Path pattern below the directory
        #[arg(long)]
        filepath: Option<String>,
        /// Do not maintain per-branch latest links
        #[arg(long)]
        no_link: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Import translations from a PO file
    ImportPo {
        #[arg(long)]
        project: String,
        #[arg(long)]
        lang: String,
        #[arg(long)]
        po: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List releases offered by a source, optionally registering them
    Releases {
        #[arg(long, value_enum)]
        source: commands::releases::SourceArg,
        /// Directory, feed file or PO file, depending on the source
        #[arg(long)]
        path: Option<PathBuf>,
        /// Skip feed entries older than this (RFC 3339)
        #[arg(long, value_parser = parse_now)]
        since: Option<DateTime<Utc>>,
        /// Add new releases to the data file
        #[arg(long)]
        register: bool,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Write JSON schemas of reports and the data file
    Schema {
        #[arg(long, default_value = "./docs/schemas")]
        out_dir: PathBuf,
    },
}

fn parse_now(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp {s:?}: {e}"))
}

/// Shared state handed to every command.
pub struct Ctx {
    pub cfg: L10nConfig,
    pub data: PathBuf,
    pub clock: Box<dyn Clock>,
    pub use_color: bool,
}

trait Runnable {
    fn run(self, ctx: &Ctx) -> Result<()>;
}

impl Runnable for Commands {
    fn run(self, ctx: &Ctx) -> Result<()> {
        debug!(event = "command_start", cmd = ?self);
        match self {
            Commands::Export {
                project,
                release,
                lang,
                template,
                compact,
                installer_only,
                suggestions,
                out,
                format,
            } => commands::export::run_export(
                ctx,
                commands::export::ExportCmd {
                    project,
                    release,
                    lang,
                    template,
                    compact,
                    installer_only,
                    suggestions,
                    out,
                    format,
                },
            ),
            Commands::Package {
                project,
                release,
                lang,
                force,
                file_limit,
                release_limit,
                interval_secs,
                directory,
                filepath,
                no_link,
                format,
            } => commands::package::run_package(
                ctx,
                commands::package::PackageCmd {
                    target: project.zip(release),
                    lang,
                    force,
                    file_limit,
                    release_limit,
                    interval_secs,
                    directory,
                    filepath,
                    no_link,
                    format,
                },
            ),
            Commands::ImportPo {
                project,
                lang,
                po,
                format,
            } => commands::import_po::run_import_po(ctx, &project, &lang, &po, format),
            Commands::Releases {
                source,
                path,
                since,
                register,
                format,
            } => commands::releases::run_releases(ctx, source, path, since, register, format),
            Commands::Schema { out_dir } => commands::schema::run_schema(out_dir),
        }
    }
}

fn init_tracing(quiet: bool) -> WorkerGuard {
    let file_appender = rolling::daily("logs", "l10n.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if quiet { "warn" } else { "info" };
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        );

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
    guard
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    let _guard = init_tracing(cli.quiet);

    let cfg = match cli.config.as_ref() {
        Some(path) => l10n_config::load_config_from(std::slice::from_ref(path))?,
        None => l10n_config::load_config()?,
    };
    let data = cli
        .data
        .clone()
        .or_else(|| cfg.data.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA));
    let clock: Box<dyn Clock> = match cli.now {
        Some(at) => Box::new(ManualClock::new(at)),
        None => Box::new(SystemClock),
    };
    let use_color = !cli.no_color
        && std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none();
    info!(event = "startup", data = %data.display(), version = env!("CARGO_PKG_VERSION"));

    let ctx = Ctx {
        cfg,
        data,
        clock,
        use_color,
    };
    cli.cmd.run(&ctx)
}
