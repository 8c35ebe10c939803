// Command-line shell around the dashboard core.
//
// The subcommands each run one recomputation pass and print (or write) the
// outputs a dashboard would draw. `interactive` keeps one session alive in a
// menu loop so the table is loaded once and filtered many times.
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use once_cell::sync::Lazy;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use rca_dashboard::config::DashboardConfig;
use rca_dashboard::loader::LoadReport;
use rca_dashboard::output;
use rca_dashboard::session::{DashboardOutputs, ExportOutcome, Session};
use rca_dashboard::types::{FilterCriteria, RegionSelection, Threshold};
use rca_dashboard::util::{format_int, format_metric};

#[derive(Parser, Debug)]
#[command(author, version, about = "District RCA dashboard", long_about = None)]
struct Cli {
    /// Config file (defaults to ./rca_dashboard.toml when present)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Dataset to load (overrides `data.path` from the config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    data: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// State to keep; repeat for several, omit for all
    #[arg(long = "state")]
    states: Vec<String>,

    /// Restrict to one district
    #[arg(long)]
    district: Option<String>,

    /// Minimum metric value, 0.0 to 10.0 in steps of 0.1
    #[arg(long)]
    threshold: Option<f64>,

    /// Do not filter on the metric
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "threshold")]
    no_threshold: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ranked districts and the top-K chart data
    Top {
        #[command(flatten)]
        filters: FilterArgs,

        /// Number of chart entries
        #[arg(long)]
        top_k: Option<usize>,

        /// Rows to preview on the console
        #[arg(long, default_value_t = 25)]
        rows: usize,

        /// Write the ranked view as CSV
        #[arg(long, value_hint = ValueHint::FilePath)]
        csv: Option<PathBuf>,

        /// Write the chart data as JSON
        #[arg(long, value_hint = ValueHint::FilePath)]
        json: Option<PathBuf>,
    },
    /// Overview and RCA trend of one district
    District {
        #[arg(long)]
        state: String,

        #[arg(long)]
        district: String,
    },
    /// First activity listed for each district
    Activities {
        #[command(flatten)]
        filters: FilterArgs,

        /// Write the summary as CSV
        #[arg(long, value_hint = ValueHint::FilePath)]
        csv: Option<PathBuf>,
    },
    /// Export the filtered view as a PDF report
    Export {
        #[command(flatten)]
        filters: FilterArgs,

        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,

        #[arg(long)]
        title: Option<String>,
    },
    /// List selectable states, or the districts of one state
    Options {
        #[arg(long)]
        state: Option<String>,
    },
    /// Menu-driven session
    Interactive,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = DashboardConfig::discover(cli.config.as_deref()).context("loading config")?;
    let data_path = cli.data.clone().unwrap_or_else(|| config.data.path.clone());

    match cli.command {
        Command::Interactive => run_interactive(config, data_path),
        command => {
            let mut session = Session::new(config.load_options(), config.filters.top_k);
            let report = session
                .load_path(&data_path)
                .with_context(|| format!("failed to load {}", data_path.display()))?;
            print_load_report(&report);
            run_command(command, &config, session)
        }
    }
}

fn run_command(command: Command, config: &DashboardConfig, mut session: Session) -> Result<()> {
    match command {
        Command::Top {
            filters,
            top_k,
            rows,
            csv,
            json,
        } => {
            let criteria = build_criteria(&filters, config)?;
            match top_k {
                Some(0) => return Err(anyhow!("--top-k must be at least 1")),
                Some(k) => session.set_top_k(k),
                None => {}
            }
            let out = session.recompute(&criteria);
            print_notes(&out);
            print_ranked(&out, rows);
            output::print_rca_definition();
            print_chart(&out);
            if let Some(path) = csv {
                output::write_csv(&path, &out.rows)?;
            }
            if let Some(path) = json {
                output::write_json(&path, &out.chart)?;
            }
        }
        Command::District { state, district } => {
            let criteria = FilterCriteria {
                regions: RegionSelection::One(state),
                district: Some(district),
                threshold: None,
            };
            let out = session.recompute(&criteria);
            print_notes(&out);
            print_overview(&out);
        }
        Command::Activities { filters, csv } => {
            let criteria = build_criteria(&filters, config)?;
            let out = session.recompute(&criteria);
            print_notes(&out);
            println!("Top Activity per District\n");
            output::preview_table_rows(&out.top_activities, usize::MAX);
            if let Some(path) = csv {
                output::write_csv(&path, &out.top_activities)?;
            }
        }
        Command::Export {
            filters,
            output: path,
            title,
        } => {
            let criteria = build_criteria(&filters, config)?;
            let path = path.unwrap_or_else(|| config.report.file_name.clone());
            let title = title.unwrap_or_else(|| config.report.title.clone());
            match session.export(&criteria, &path, &title) {
                ExportOutcome::Written { path, bytes } => {
                    println!(
                        "Report exported to {} ({} bytes)",
                        path.display(),
                        format_int(bytes)
                    );
                }
                ExportOutcome::Failed { notice } => return Err(anyhow!(notice)),
            }
        }
        Command::Options { state } => match state {
            Some(state) => {
                let districts = session.districts(&state);
                if districts.is_empty() {
                    println!("No districts available for {}.", state);
                }
                for d in districts {
                    println!("{}", d);
                }
            }
            None => {
                for s in session.states() {
                    println!("{}", s);
                }
            }
        },
        // Dispatched by `main` before any dataset is loaded.
        Command::Interactive => {}
    }
    Ok(())
}

fn build_criteria(args: &FilterArgs, config: &DashboardConfig) -> Result<FilterCriteria> {
    let threshold = if args.no_threshold {
        None
    } else {
        let value = args.threshold.unwrap_or(config.filters.threshold);
        Some(Threshold::new(value)?)
    };
    Ok(FilterCriteria {
        regions: RegionSelection::from_values(args.states.iter().cloned()),
        district: args.district.clone(),
        threshold,
    })
}

fn print_load_report(report: &LoadReport) {
    println!(
        "Processing dataset... ({} rows loaded, {} dated columns, {} missing values)",
        format_int(report.total_rows),
        format_int(report.series_columns),
        format_int(report.missing_cells)
    );
    println!("Ranking metric: {}\n", report.metric);
}

fn print_notes(out: &DashboardOutputs) {
    for note in &out.notes {
        println!("Note: {}", note);
    }
    if !out.notes.is_empty() {
        println!();
    }
}

fn print_ranked(out: &DashboardOutputs, max_rows: usize) {
    let label = out
        .view
        .as_ref()
        .map(|v| v.metric.label().to_string())
        .unwrap_or_default();
    println!("Top Performing Districts (by {})\n", label);
    output::preview_table_rows(&out.rows, max_rows);
}

fn print_chart(out: &DashboardOutputs) {
    println!("Chart data: top {} districts\n", out.chart.len());
    output::preview_table_rows(&out.chart, out.chart.len());
}

fn print_overview(out: &DashboardOutputs) {
    let Some(overview) = &out.overview else {
        return;
    };
    println!("Overview: {}, {}", overview.district, overview.state);
    println!("- Sub-Sector: {}", overview.sub_sector);
    println!("- Occupation/Activity: {}", overview.activity);
    println!(
        "- Latest RCA ({}): {}\n",
        overview.metric_label,
        format_metric(overview.latest_value)
    );
    println!("RCA Trend Over Time: {}\n", overview.district);
    output::preview_table_rows(&overview.trend, overview.trend.len());
}

// ---------------------------------------------------------------------------
// Interactive session
// ---------------------------------------------------------------------------

const PREVIEW_ROWS: usize = 25;

// Process-wide session so the table is loaded once and reused across menu
// choices.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    session: Session,
    criteria: FilterCriteria,
    config: DashboardConfig,
    data_path: PathBuf,
}

fn with_state<T>(f: impl FnOnce(&mut AppState) -> T) -> T {
    let mut guard = APP_STATE.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut guard)
}

/// One trimmed line, or `None` once input is closed.
fn read_answer<R: BufRead>(input: &mut R) -> Option<String> {
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

/// Read a single line after the common "Enter choice:" prompt.
fn read_choice() -> Option<String> {
    prompt("Enter choice: ")
}

/// Returns `true` if the user chose `Y`, `false` for `N` or closed input.
fn prompt_back_to_menu() -> bool {
    loop {
        let Some(answer) = prompt("Back to Dashboard Menu (Y/N): ") else {
            return false;
        };
        match answer.to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load() {
    let path = with_state(|s| s.data_path.clone());
    let Some(entered) = prompt(&format!("Dataset path [{}]: ", path.display())) else {
        return;
    };
    let path = if entered.is_empty() {
        path
    } else {
        PathBuf::from(entered)
    };
    load_into_state(&path);
}

fn load_into_state(path: &Path) {
    let result = with_state(|s| s.session.load_path(path));
    match result {
        Ok(report) => {
            print_load_report(&report);
            with_state(|s| s.data_path = path.to_path_buf());
        }
        // Blocking message; the previous table (if any) is still active.
        Err(e) => eprintln!("Failed to load file: {}\n", e),
    }
}

fn handle_filters() {
    let states = with_state(|s| s.session.states());
    if states.is_empty() {
        println!("Error: No data loaded. Please load the dataset first (option 1).\n");
        return;
    }
    println!("States: {}", states.join(", "));
    let Some(picked) = prompt("Select state(s), comma separated (blank for all): ") else {
        return;
    };
    let regions = RegionSelection::from_values(
        picked
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );

    let mut district = None;
    if let RegionSelection::One(state) = &regions {
        let districts = with_state(|s| s.session.districts(state));
        if districts.is_empty() {
            println!("No districts available for {}.", state);
        } else {
            println!("Districts: {}", districts.join(", "));
            let Some(d) = prompt("Select district (blank for all): ") else {
                return;
            };
            if !d.is_empty() {
                district = Some(d);
            }
        }
    }

    let default_threshold = with_state(|s| s.config.filters.threshold);
    let threshold = loop {
        let Some(raw) = prompt(&format!(
            "Minimum RCA threshold, 0.0-10.0 [{:.1}] (\"none\" to disable): ",
            default_threshold
        )) else {
            return;
        };
        if raw.eq_ignore_ascii_case("none") {
            break None;
        }
        let value = if raw.is_empty() {
            Ok(default_threshold)
        } else {
            raw.parse::<f64>()
        };
        match value.map_err(|e| e.to_string()).and_then(|v| {
            Threshold::new(v).map_err(|e| e.to_string())
        }) {
            Ok(t) => break Some(t),
            Err(e) => println!("Invalid threshold: {}", e),
        }
    };

    let criteria = FilterCriteria {
        regions,
        district,
        threshold,
    };
    debug!(?criteria, "Updated filter criteria");
    with_state(|s| s.criteria = criteria);
    println!();
}

fn handle_show() {
    let out = with_state(|s| s.session.recompute(&s.criteria));
    print_notes(&out);
    if out.overview.is_none() && out.view.is_some() {
        println!("Select a single district (option 2) to see its overview.\n");
    }
    print_overview(&out);
    print_ranked(&out, PREVIEW_ROWS);
    output::print_rca_definition();
    print_chart(&out);
    println!("Top Activity per District\n");
    output::preview_table_rows(&out.top_activities, out.top_activities.len());
}

fn handle_export() {
    let outcome = with_state(|s| {
        s.session
            .export(&s.criteria, &s.config.report.file_name, &s.config.report.title)
    });
    match outcome {
        ExportOutcome::Written { path, bytes } => println!(
            "Report exported to {} ({} bytes)\n",
            path.display(),
            format_int(bytes)
        ),
        ExportOutcome::Failed { notice } => {
            warn!("{}", notice);
            println!("Notice: {}\n", notice);
        }
    }
}

fn run_interactive(config: DashboardConfig, data_path: PathBuf) -> Result<()> {
    let threshold = config.threshold()?;
    with_state(|s| {
        s.session = Session::new(config.load_options(), config.filters.top_k);
        s.criteria = FilterCriteria {
            threshold: Some(threshold),
            ..Default::default()
        };
        s.config = config;
        s.data_path = data_path.clone();
    });
    if data_path.exists() {
        load_into_state(&data_path);
    }

    loop {
        println!("RCA District Dashboard:");
        println!("[1] Load the file");
        println!("[2] Choose filters");
        println!("[3] Show dashboard");
        println!("[4] Export PDF report");
        println!("[5] Exit\n");
        let Some(choice) = read_choice() else {
            println!("\nInput closed. Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(),
            "2" => handle_filters(),
            "3" => {
                println!();
                handle_show();
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            "4" => handle_export(),
            "5" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 1 to 5.\n"),
        }
    }
    Ok(())
}
