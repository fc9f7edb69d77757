use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{subscriber::set_global_default, Level};
use tracing_subscriber::EnvFilter;

mod analysis;
mod backup;
mod config;
mod error;
mod metadata;
mod plot;
mod state;

use analysis::summary::{Distribution, DistributionSummary};
use analysis::{run_analysis, AnalysisOptions, AnalysisRequest};
use backup::{system, BackupMode, BackupPlan};
use config::Config;
use error::{Error, Result};
use state::lens::{parse_f_stops, LensDatabase};

#[derive(Parser)]
#[command(name = "photokeep")]
#[command(about = "Back up a photo library and chart the exposure settings of your best shots")]
#[command(version)]
struct Cli {
    /// Increase verbosity (-v, -vv). Default INFO.
    #[arg(short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease verbosity (-q). Each -q reduces level by one step.
    #[arg(short = 'q', action = clap::ArgAction::Count, global = true)]
    quiet: u8,

    /// Config file (default: <config dir>/photokeep/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract EXIF data from rated photos and write a CSV report plus histograms
    Analyze(AnalyzeArgs),

    /// List the lenses in the lens database
    Lenses {
        /// Lens database CSV (Lens,FStopSteps)
        #[arg(long)]
        lens_db: Option<PathBuf>,
    },

    /// Copy photo folders onto a mounted external drive with rsync
    Backup(BackupArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Library root to scan
    root: Option<PathBuf>,

    /// Ignore photos rated below this
    #[arg(short, long)]
    min_rating: Option<f64>,

    /// Only analyze photos taken with this exact lens model
    #[arg(long, conflicts_with = "lens_index")]
    lens: Option<String>,

    /// Pick the lens by its number in `photokeep lenses` (0 = all lenses)
    #[arg(long)]
    lens_index: Option<usize>,

    /// Aperture bucket edges, comma separated (e.g. 1.4,2,2.8,4)
    #[arg(long, value_parser = parse_f_stops_arg)]
    f_stops: Option<FStops>,

    /// Directory for the CSV report and figure
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Lens database CSV (Lens,FStopSteps)
    #[arg(long)]
    lens_db: Option<PathBuf>,

    /// Parallel extraction workers (default: available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,
}

#[derive(Args)]
struct BackupArgs {
    /// Folders to back up (default: backup.sources from the config)
    sources: Vec<PathBuf>,

    /// Mount point of the destination drive
    #[arg(short, long)]
    dest: PathBuf,

    /// Delete files on the destination that are gone from the sources
    #[arg(long, conflicts_with = "archive")]
    mirror: bool,

    /// Never delete on the destination, even if the config says mirror
    #[arg(long)]
    archive: bool,

    /// Unmount the destination when done
    #[arg(long)]
    unmount: bool,
}

/// Parsed `--f-stops` list
#[derive(Debug, Clone)]
struct FStops(Vec<f64>);

fn parse_f_stops_arg(s: &str) -> std::result::Result<FStops, String> {
    parse_f_stops(s)
        .map(FStops)
        .ok_or_else(|| format!("expected comma separated numbers, got '{}'", s))
}

/// Map -q/-v counts to a tracing level; default INFO
fn log_level(verbose: u8, quiet: u8) -> Level {
    match verbose.saturating_add(1).saturating_sub(quiet) {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_tracing(verbose: u8, quiet: u8) {
    let level = log_level(verbose, quiet);
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact()
        .finish();

    let _ = set_global_default(subscriber);
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let code = match run(cli) {
        Ok(()) => 0,
        Err(e) if e.is_recoverable() => {
            println!("⚠️  {}", e);
            0
        }
        Err(e) => {
            eprintln!("❌ {}", e);
            1
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze(args) => analyze(config, args),
        Commands::Lenses { lens_db } => {
            list_lenses(lens_db.as_deref().unwrap_or(config.lens_database.as_path()))
        }
        Commands::Backup(args) => backup(config, args),
    }
}

/// Run the analysis pipeline on a fresh multi-threaded runtime
fn analyze(mut config: Config, args: AnalyzeArgs) -> Result<()> {
    if let Some(root) = args.root {
        config.library_root = root;
    }
    if let Some(min_rating) = args.min_rating {
        config.min_rating = min_rating;
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(lens_db) = args.lens_db {
        config.lens_database = lens_db;
    }
    if args.workers.is_some() {
        config.workers = args.workers;
    }
    config.validate()?;

    let f_stops = args.f_stops.map(|FStops(stops)| stops);
    let (lens_filter, f_stop_buckets) = match (args.lens, args.lens_index) {
        (Some(lens), _) => (Some(lens), f_stops),
        (None, Some(index)) => match LensDatabase::load(&config.lens_database)? {
            Some(db) => match db.select(index) {
                Some(profile) => (Some(profile.name.clone()), Some(profile.f_stops.clone())),
                None => (None, f_stops),
            },
            None => (None, f_stops),
        },
        (None, None) => (None, f_stops),
    };

    match &lens_filter {
        Some(lens) => println!("🔎 Lens: {}", lens),
        None => println!("🔎 Lens: all lenses"),
    }

    let request = AnalysisRequest {
        root: config.library_root.clone(),
        output_dir: config.output_dir.clone(),
        options: AnalysisOptions {
            min_rating: config.min_rating,
            lens_filter,
            workers: config.worker_count(),
            extract_timeout: config.extract_timeout(),
        },
        f_stop_buckets,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::io("tokio runtime", e))?;
    let output = runtime.block_on(run_analysis(&request))?;

    let result = &output.result;
    println!(
        "   {} files scanned, {} rated >= {}, {} other lens, {} incomplete",
        result.scanned, result.extracted, request.options.min_rating, result.lens_rejected, result.incomplete
    );
    println!("✅ Analysis saved to '{}'", output.report.display());
    println!("✅ Plots saved as '{}'", output.figure.display());

    print_summary(&output.summary);
    Ok(())
}

/// Console digest of the figure: where each distribution peaks
fn print_summary(summary: &DistributionSummary) {
    println!("\n📈 Distributions:");
    for distribution in summary.panels() {
        let peak = match distribution.peak() {
            Some((lo, hi)) if std::ptr::eq(distribution, &summary.shutter) => {
                format!("{} - {}", format_seconds(10f64.powf(lo)), format_seconds(10f64.powf(hi)))
            }
            Some((lo, hi)) => format!("{:.1} - {:.1}", lo, hi),
            None => "-".to_string(),
        };
        println!(
            "   {:<28} {:>5} photos, most in {}",
            distribution.title,
            distribution.total(),
            peak
        );
    }
    print_ticks(&summary.shutter);
}

fn print_ticks(distribution: &Distribution) {
    let labels: Vec<&str> = distribution.ticks.iter().map(|t| t.label.as_str()).collect();
    if !labels.is_empty() {
        println!("   Shutter axis: {}", labels.join(" "));
    }
}

/// Shutter speed as a photographer writes it: 1/250, 2.0s
fn format_seconds(seconds: f64) -> String {
    if seconds < 1.0 {
        format!("1/{:.0}", 1.0 / seconds)
    } else {
        format!("{:.1}s", seconds)
    }
}

/// Print the numbered lens table
fn list_lenses(path: &Path) -> Result<()> {
    let Some(db) = LensDatabase::load(path)? else {
        println!(
            "Lens database '{}' not found. Create it with columns Lens,FStopSteps.",
            path.display()
        );
        return Ok(());
    };

    println!("Available Lenses:");
    println!("0. All lenses");
    for (i, profile) in db.profiles().iter().enumerate() {
        let stops: Vec<String> = profile.f_stops.iter().map(|s| s.to_string()).collect();
        println!("{}. {} (f/{})", i + 1, profile.name, stops.join(", f/"));
    }
    Ok(())
}

/// Run the backup, then unmount if asked
fn backup(config: Config, args: BackupArgs) -> Result<()> {
    let sources = if args.sources.is_empty() {
        config.backup.sources.clone()
    } else {
        args.sources
    };

    let mirror = args.mirror || (config.backup.mirror && !args.archive);
    let plan = BackupPlan {
        sources,
        destination: args.dest,
        mode: if mirror { BackupMode::Mirror } else { BackupMode::Archive },
    };
    backup::run_backup(&plan)?;

    if args.unmount {
        system::unmount(&plan.destination);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_flags() {
        let cli = Cli::try_parse_from([
            "photokeep", "analyze", "/photos", "-m", "3", "--lens-index", "2", "--f-stops", "2.8,1.4",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.root, Some(PathBuf::from("/photos")));
                assert_eq!(args.min_rating, Some(3.0));
                assert_eq!(args.lens_index, Some(2));
                assert_eq!(args.f_stops.map(|f| f.0), Some(vec![1.4, 2.8]));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_lens_and_index_conflict() {
        assert!(Cli::try_parse_from([
            "photokeep", "analyze", "--lens", "XF35mmF1.4 R", "--lens-index", "1",
        ])
        .is_err());
    }

    #[test]
    fn test_bad_f_stops_rejected() {
        assert!(Cli::try_parse_from(["photokeep", "analyze", "--f-stops", "2,x"]).is_err());
    }

    #[test]
    fn test_backup_flags() {
        let cli = Cli::try_parse_from([
            "photokeep", "-v", "backup", "/a", "/b", "--dest", "/mnt/sdb1", "--mirror", "--unmount",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Backup(args) => {
                assert_eq!(args.sources, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
                assert_eq!(args.dest, PathBuf::from("/mnt/sdb1"));
                assert!(args.mirror && args.unmount && !args.archive);
            }
            _ => panic!("expected backup"),
        }
    }

    #[test]
    fn test_log_level_saturates() {
        assert_eq!(log_level(0, 0), Level::INFO);
        assert_eq!(log_level(1, 0), Level::DEBUG);
        assert_eq!(log_level(0, 3), Level::WARN);
        assert_eq!(log_level(u8::MAX, 0), Level::TRACE);
        assert_eq!(log_level(u8::MAX, u8::MAX), Level::WARN);
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.004), "1/250");
        assert_eq!(format_seconds(2.0), "2.0s");
    }
}
