use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use fdate_maintainer_core::{
    app_paths, load_config, load_config_from, save_config, AppConfig, FileMaintainer,
    MaintenanceOptions, OperatorPrompt, RunReport, YearBounds,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[derive(Debug, Parser)]
#[command(name = "fdate-maintainer-cli")]
#[command(about = "ファイル名の日付に合わせて更新日時を揃えます")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Run(RunArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    Init,
}

#[derive(Debug, Args)]
struct RunArgs {
    base_path: PathBuf,
    #[arg(long = "pattern")]
    patterns: Vec<String>,
    #[arg(long)]
    min_year: Option<i32>,
    #[arg(long)]
    max_year: Option<i32>,
    #[arg(long, default_value_t = false)]
    all_mismatches: bool,
    #[arg(long, default_value_t = false)]
    no_rename: bool,
    #[arg(long, default_value_t = false)]
    embedded: bool,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn cmd_run(args: RunArgs) -> Result<()> {
    let _log_guard = init_logging(args.log_file.as_deref())?;

    let config = match args.config.as_deref() {
        Some(path) => {
            info!("[MNT] <CNFG> config = {}", path.display());
            load_config_from(path)?
        }
        None => load_config()?,
    };
    let options = merge_options(&args, &config)?;

    let maintainer = FileMaintainer::new(options);
    let report = maintainer.run(args.embedded, &mut StdinPrompt)?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => print_table(&report),
    }

    Ok(())
}

fn merge_options(args: &RunArgs, config: &AppConfig) -> Result<MaintenanceOptions> {
    let mut options = MaintenanceOptions::from_config(args.base_path.clone(), config);
    if !args.patterns.is_empty() {
        options.folder_patterns = args.patterns.clone();
    }
    options.year_bounds = YearBounds::new(
        args.min_year.unwrap_or(config.year_bounds.min_year),
        args.max_year.unwrap_or(config.year_bounds.max_year),
    )?;
    if args.all_mismatches {
        options.newest_only = false;
    }
    if args.no_rename {
        options.rename_proprietary = false;
    }
    Ok(options)
}

fn init_logging(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let mut guard = None;
    let file_layer = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .with_context(|| format!("ログファイル名が不正です: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, worker_guard) = tracing_appender::non_blocking(appender);
            guard = Some(worker_guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_filter(env_filter.clone()),
            )
        }
        None => None,
    };

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .init();
    Ok(guard)
}

struct StdinPrompt;

impl OperatorPrompt for StdinPrompt {
    fn acknowledge_duplicates(&mut self, report: &RunReport) -> Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr)?;
        writeln!(stderr, "************************************************************")?;
        writeln!(
            stderr,
            "  警告: 重複ファイルが {}件 あります。元ファイルは変更していません",
            report.duplicated
        )?;
        writeln!(stderr, "  ログの [Duplicated] を確認してください")?;
        writeln!(stderr, "************************************************************")?;
        writeln!(stderr, "Enterキーで終了します")?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        Ok(())
    }
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = save_config(&AppConfig::default())?;
    println!("設定ファイルを作成しました: {}", path.display());
    Ok(())
}

fn print_table(report: &RunReport) {
    println!(
        "集計: scanned={} renamed={} duplicated={} updated={}",
        report.scanned, report.renamed, report.duplicated, report.updated
    );
    if report.duplicates_found {
        println!("重複あり: ログの [Duplicated] を確認してください");
    }
}
