use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use swimedit_core::analysis::StrokeRow;
use swimedit_core::journal::read_journal;
use swimedit_core::*;

#[derive(Parser)]
#[command(name = "swimedit")]
#[command(about = "Edit and analyse recorded pool swims", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a decoded workout (JSON) and start editing it
    Import {
        /// Decoded workout file
        file: PathBuf,
    },

    /// List the lengths of the current workout
    Show,

    /// List the laps of the current workout
    Laps,

    /// Merge two or more lengths into one
    Merge {
        #[arg(required = true, num_args = 1..)]
        ordinals: Vec<u32>,
    },

    /// Split one length into equal parts
    Split {
        ordinal: u32,

        /// Number of parts (2-10)
        #[arg(long, default_value_t = 2)]
        parts: u32,
    },

    /// Delete lengths or rest intervals
    Delete {
        #[arg(required = true, num_args = 1..)]
        ordinals: Vec<u32>,
    },

    /// Change the stroke of lengths
    Stroke {
        /// freestyle, backstroke, breaststroke or butterfly
        stroke: String,

        #[arg(required = true, num_args = 1..)]
        ordinals: Vec<u32>,
    },

    /// Change the pool length (metres)
    PoolSize { length: f64 },

    /// Restore the workout as imported
    Undo,

    /// Show session summary, stroke table and best times
    Summary,

    /// Show the edit journal
    Log,

    /// Write the current workout back out as JSON
    Export {
        #[arg(long)]
        out: PathBuf,
    },

    /// Write the length table as CSV
    ExportCsv {
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() {
    // Initialize logging
    swimedit_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("swimedit: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // Determine data directory
    let config = Config::load()?;
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    tracing::debug!("Using data directory {:?}", data_dir);

    match cli.command {
        Commands::Import { file } => cmd_import(&data_dir, &file),
        Commands::Show => cmd_show(&data_dir, &config),
        Commands::Laps => cmd_laps(&data_dir, &config),
        Commands::Merge { ordinals } => cmd_edit(
            &data_dir,
            &config,
            Edit::Merge {
                selection: ordinals.into(),
            },
        ),
        Commands::Split { ordinal, parts } => cmd_edit(
            &data_dir,
            &config,
            Edit::Split {
                selection: Selection::from([ordinal]),
                parts,
            },
        ),
        Commands::Delete { ordinals } => cmd_edit(
            &data_dir,
            &config,
            Edit::Delete {
                selection: ordinals.into(),
            },
        ),
        Commands::Stroke { stroke, ordinals } => {
            let stroke = Stroke::parse_known(&stroke)
                .ok_or_else(|| Error::InvalidParameter(format!("unknown stroke '{}'", stroke)))?;
            cmd_edit(
                &data_dir,
                &config,
                Edit::Reclassify {
                    selection: ordinals.into(),
                    stroke,
                },
            )
        }
        Commands::PoolSize { length } => {
            cmd_edit(&data_dir, &config, Edit::ChangePoolSize { length })
        }
        Commands::Undo => cmd_undo(&data_dir, &config),
        Commands::Summary => cmd_summary(&data_dir, &config),
        Commands::Log => cmd_log(&data_dir),
        Commands::Export { out } => cmd_export(&data_dir, &config, &out),
        Commands::ExportCsv { out } => cmd_export_csv(&data_dir, &config, &out),
    }
}

/// Reopen the editing session stored in `data_dir`
fn open_session(data_dir: &Path, config: &Config) -> Result<EditSession<FileStore>> {
    let store = FileStore::new(data_dir);
    let journal_path = store.journal_path();
    let entries = read_journal(&journal_path)?;

    let session = EditSession::resume(store, &entries)?;
    if config.editing.journal {
        Ok(session.with_journal(Box::new(EditJournal::new(journal_path))))
    } else {
        Ok(session)
    }
}

fn report_warning(warning: Option<Error>) {
    if let Some(warning) = warning {
        eprintln!("⚠ {} (the edit was applied but not saved)", warning);
    }
}

fn cmd_import(data_dir: &Path, file: &Path) -> Result<()> {
    let workout = codec::read_workout(file)?;
    codec::ensure_pool_swim(&workout)?;

    let store = FileStore::new(data_dir);
    EditJournal::new(store.journal_path()).clear()?;

    let (session, warning) = EditSession::open(store, workout);
    report_warning(warning);

    println!("✓ Imported {}", file.display());
    print_summary(session.current());
    Ok(())
}

fn cmd_edit(data_dir: &Path, config: &Config, edit: Edit) -> Result<()> {
    let mut session = open_session(data_dir, config)?;
    let outcome = session.apply(&edit)?;
    report_warning(outcome.warning);

    println!("✓ {}", capitalize(&edit.to_string()));
    print_summary(&outcome.workout);
    Ok(())
}

fn cmd_undo(data_dir: &Path, config: &Config) -> Result<()> {
    let mut session = open_session(data_dir, config)?;
    let outcome = session.undo();
    report_warning(outcome.warning);

    println!("✓ Restored the workout as imported");
    print_summary(&outcome.workout);
    Ok(())
}

fn cmd_show(data_dir: &Path, config: &Config) -> Result<()> {
    let session = open_session(data_dir, config)?;
    let workout = session.current();

    println!(
        "{:>4}  {:<6}  {:<12}  {:>8}  {:>7}  {:>5}",
        "#", "type", "stroke", "time", "strokes", "spm"
    );
    for segment in &workout.segments {
        let kind = if segment.is_active() { "active" } else { "rest" };
        let stroke = segment
            .stroke
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>4}  {:<6}  {:<12}  {:>8}  {:>7}  {:>5.0}",
            segment.ordinal,
            kind,
            stroke,
            format_clock(segment.elapsed_time, 1),
            segment.stroke_count,
            segment.cadence
        );
    }
    println!();
    println!("{} lengths", workout.segments.len());
    Ok(())
}

fn cmd_laps(data_dir: &Path, config: &Config) -> Result<()> {
    let session = open_session(data_dir, config)?;
    let workout = session.current();
    let unit = workout.session.pool_length_unit;
    let summary = IntervalSummary::from_workout(workout);

    println!(
        "{:>4}  {:>7}  {:>8}  {:<12}  {:>8}  {:>9}  {:>6}  {:>6}  {:>8}",
        "lap", "lengths", "distance", "stroke", "time", "pace/100", "spm", "spl", "rest"
    );
    for interval in &summary.intervals {
        let stroke = interval
            .stroke
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:>4}  {:>7}  {:>8}  {:<12}  {:>8}  {:>9}  {:>6.2}  {:>6.2}  {:>8}",
            interval.number,
            format!("{}-{}", interval.first_ordinal, interval.last_ordinal),
            format!(
                "{} {}",
                format_amount(unit.metres_to_unit(interval.distance)),
                unit.suffix()
            ),
            stroke,
            format_clock(interval.time, 1),
            interval
                .pace_per_100
                .map(|p| format_clock(p, 0))
                .unwrap_or_else(|| "-".into()),
            interval.avg_spm,
            interval.avg_spl,
            format_clock(interval.rest_time, 1)
        );
    }
    println!();
    println!(
        "{} laps, {} swimming, {} rest",
        summary.intervals.len(),
        format_clock(summary.total_time, 1),
        format_clock(summary.total_rest, 1)
    );
    Ok(())
}

fn cmd_summary(data_dir: &Path, config: &Config) -> Result<()> {
    let session = open_session(data_dir, config)?;
    let workout = session.current();
    let unit = workout.session.pool_length_unit;

    print_summary(workout);

    let strokes = StrokeSummary::from_workout(workout);
    println!();
    println!(
        "{:<12}  {:>7}  {:>8}  {:>8}  {:>9}  {:>4}  {:>4}",
        "stroke", "lengths", "distance", "time", "pace/100", "spm", "spl"
    );
    for row in &strokes.rows {
        let label = row
            .stroke
            .as_ref()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unknown".into());
        print_stroke_row(&label, row, unit);
    }
    print_stroke_row("total", &strokes.total, unit);
    println!("{:<12}  {:>7}  {:>8}  {:>8}", "rest", "", "", format_clock(strokes.rest_time, 0));

    let best = best_times(workout, &config.analysis.best_time_distances);
    if !best.is_empty() {
        println!();
        println!("Best times");
        for entry in &best {
            println!(
                "  {:<12}  {:>5} {}  {:>8}  lengths {}-{}",
                entry.stroke.to_string(),
                entry.distance,
                unit.suffix(),
                format_clock(entry.time, 1),
                entry.first_ordinal,
                entry.last_ordinal
            );
        }
    }
    Ok(())
}

fn print_stroke_row(label: &str, row: &StrokeRow, unit: PoolUnit) {
    println!(
        "{:<12}  {:>7}  {:>8}  {:>8}  {:>9}  {:>4.0}  {:>4}",
        label,
        row.lengths,
        format!(
            "{} {}",
            format_amount(unit.metres_to_unit(row.distance)),
            unit.suffix()
        ),
        format_clock(row.time, 0),
        row.pace_per_100
            .map(|p| format_clock(p, 0))
            .unwrap_or_else(|| "-".into()),
        row.avg_spm,
        row.avg_spl
    );
}

fn cmd_log(data_dir: &Path) -> Result<()> {
    let store = FileStore::new(data_dir);
    let entries = read_journal(&store.journal_path())?;

    if entries.is_empty() {
        println!("No edits recorded.");
        return Ok(());
    }

    for entry in &entries {
        let action = match &entry.action {
            JournalAction::Edit(edit) => edit.to_string(),
            JournalAction::Undo => "undo".to_string(),
        };
        println!("{}  {}", entry.applied_at.format("%Y-%m-%d %H:%M:%S"), action);
    }
    Ok(())
}

fn cmd_export(data_dir: &Path, config: &Config, out: &Path) -> Result<()> {
    let session = open_session(data_dir, config)?;
    codec::write_workout(session.current(), out)?;
    println!("✓ Wrote {}", out.display());
    Ok(())
}

fn cmd_export_csv(data_dir: &Path, config: &Config, out: &Path) -> Result<()> {
    let session = open_session(data_dir, config)?;
    let count = export::export_lengths_csv(session.current(), out)?;
    println!("✓ Wrote {} lengths to {}", count, out.display());
    Ok(())
}

fn print_summary(workout: &Workout) {
    let summary = SessionSummary::from_workout(workout);
    let suffix = summary.unit.suffix();

    println!();
    if let Some(timestamp) = summary.timestamp {
        println!("  Date:        {}", timestamp.format("%Y-%m-%d %H:%M"));
    }
    println!(
        "  Pool:        {} {}",
        format_amount(summary.pool_length_in_pool_units()),
        suffix
    );
    println!(
        "  Distance:    {} {}",
        format_amount(summary.distance_in_pool_units()),
        suffix
    );
    println!(
        "  Lengths:     {} active of {}, {} laps",
        summary.active_lengths,
        workout.segments.len(),
        workout.laps.len()
    );
    println!("  Active time: {}", format_clock(summary.active_time, 0));
    println!("  Rest time:   {}", format_clock(summary.rest_time, 0));
    if let Some(pace) = summary.pace_per_100 {
        println!("  Pace:        {} /100{}", format_clock(pace, 0), suffix);
    }
    println!("  Avg SPL:     {}", summary.avg_strokes_per_length);
    if let Some(hr) = summary.avg_heart_rate {
        println!("  Avg HR:      {:.0}", hr);
    }
}

/// Whole numbers without decimals, anything else with two
fn format_amount(value: f64) -> String {
    if (value - value.round()).abs() < 0.005 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
