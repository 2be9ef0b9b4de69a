//! Top-level application entry.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and resolves configuration
//! - sets up logging and the tokio runtime
//! - dispatches to the TUI or one of the headless subcommands

use std::sync::Arc;

use clap::Parser;
use tokio::runtime::{Handle, Runtime};

use crate::cli::{AnalyzeArgs, ClientArgs, Command, UploadArgs};
use crate::config::ClientConfig;
use crate::controller::Track;
use crate::data::{Gateway, HttpGateway};
use crate::domain::{Material, UploadRole};
use crate::error::{AppError, EXIT_RUNTIME, EXIT_USAGE};
use crate::notify::Severity;
use crate::render::format::format_table;
use crate::render::tables::{PREDICTION_COLUMNS, RowMarker, TableRow, VENDOR_COLUMNS};
use crate::render::{ChartView, Region};

pub mod orchestrator;

use orchestrator::{AppMessage, EMPTY_MATERIALS_WARNING, Orchestrator};

/// Entry point for the `procure` binary.
pub fn run() -> Result<(), AppError> {
    // We want `procure` and `procure --api-base URL` to behave like `procure tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to start async runtime: {e}")))?;

    match cli.command {
        Command::Tui(args) => handle_tui(args, &runtime),
        Command::Materials(args) => handle_materials(args, &runtime),
        Command::Analyze(args) => handle_analyze(args, &runtime),
        Command::Upload(args) => handle_upload(args, &runtime),
    }
}

fn gateway_for(config: &ClientConfig) -> Result<Arc<dyn Gateway>, AppError> {
    Ok(Arc::new(HttpGateway::from_config(config)?))
}

fn handle_tui(args: ClientArgs, runtime: &Runtime) -> Result<(), AppError> {
    let config = ClientConfig::from_args(&args)?;
    crate::logging::init_file(&config.log_file)?;
    tracing::info!(api_base = %config.api_base, "starting tui");

    let orchestrator = Orchestrator::new(gateway_for(&config)?, runtime.handle().clone());
    crate::tui::run(orchestrator, &config)
}

fn handle_materials(args: ClientArgs, runtime: &Runtime) -> Result<(), AppError> {
    let config = ClientConfig::from_args(&args)?;
    crate::logging::init_stderr()?;
    let gateway = gateway_for(&config)?;

    let materials = runtime.block_on(gateway.list_materials())?;
    if materials.is_empty() {
        eprintln!("warning: {EMPTY_MATERIALS_WARNING}");
        return Ok(());
    }

    println!("{}", format_table(&["ID", "Name"], &material_rows(&materials)));
    Ok(())
}

fn handle_analyze(args: AnalyzeArgs, runtime: &Runtime) -> Result<(), AppError> {
    let config = ClientConfig::from_args(&args.client)?;
    crate::logging::init_stderr()?;
    let gateway = gateway_for(&config)?;

    runtime.block_on(async {
        let mut orch = Orchestrator::new(gateway, Handle::current());

        orch.load_materials();
        wait_and_apply(&mut orch).await?;
        flush_notifications(&mut orch);
        if !orch.view.visible {
            return Err(AppError::new(EXIT_RUNTIME, "No materials available."));
        }

        let Some(index) = orch
            .selection
            .options()
            .iter()
            .position(|o| o.material_id.as_deref() == Some(args.material_id.as_str()))
        else {
            return Err(AppError::new(
                EXIT_USAGE,
                format!(
                    "Unknown material '{}'. Run `procure materials` to list them.",
                    args.material_id
                ),
            ));
        };

        orch.on_selection_changed(index);

        // Print each track as soon as it resolves.
        let mut failed = false;
        while orch.selection.fetch_in_flight() {
            let track = match wait_and_apply(&mut orch).await? {
                Some(track) => track,
                None => continue,
            };
            match track {
                Track::Prices => println!("{}", format_price_track(&orch)),
                Track::Vendors => println!("{}", format_vendor_track(&orch)),
            }
            failed |= flush_notifications(&mut orch);
        }

        if let Some(path) = &args.export {
            crate::io::write_analysis_csv(
                path,
                &args.material_id,
                orch.view.prediction.as_ref(),
                orch.view.recommendation.as_ref(),
            )?;
            println!("Exported to {}", path.display());
        }

        if failed {
            return Err(AppError::new(EXIT_RUNTIME, "Analysis finished with errors."));
        }
        Ok(())
    })
}

fn handle_upload(args: UploadArgs, runtime: &Runtime) -> Result<(), AppError> {
    let config = ClientConfig::from_args(&args.client)?;
    crate::logging::init_stderr()?;
    let gateway = gateway_for(&config)?;

    runtime.block_on(async {
        let mut orch = Orchestrator::new(gateway, Handle::current());
        for (role, path) in [
            (UploadRole::Materials, &args.materials),
            (UploadRole::Prices, &args.prices),
            (UploadRole::Vendors, &args.vendors),
        ] {
            let path = match path {
                Some(p) => Some(crate::cli::picker::validate_csv_path(p)?),
                None => None,
            };
            orch.upload.bind(role, path);
        }

        orch.on_form_submitted();
        if !orch.upload.spinner_visible() {
            flush_notifications(&mut orch);
            return Err(AppError::new(EXIT_USAGE, "Upload not started."));
        }

        wait_and_apply(&mut orch).await?;
        if flush_notifications(&mut orch) {
            return Err(AppError::new(EXIT_RUNTIME, "Upload failed."));
        }

        // Successful uploads trigger a material refresh.
        if orch.materials_loading() {
            wait_and_apply(&mut orch).await?;
            flush_notifications(&mut orch);
            println!("{} material(s) available.", orch.selection.options().len() - 1);
        }
        Ok(())
    })
}

/// Await one gateway message and apply it. Returns which fetch track it was, if any.
async fn wait_and_apply(orch: &mut Orchestrator) -> Result<Option<Track>, AppError> {
    let msg = orch
        .next_message()
        .await
        .ok_or_else(|| AppError::new(EXIT_RUNTIME, "Gateway channel closed unexpectedly."))?;
    let track = match &msg {
        AppMessage::PricesResolved { .. } => Some(Track::Prices),
        AppMessage::VendorsResolved { .. } => Some(Track::Vendors),
        _ => None,
    };
    orch.apply(msg);
    Ok(track)
}

/// Print pending notifications to stderr. Returns `true` if any was an error.
fn flush_notifications(orch: &mut Orchestrator) -> bool {
    let mut any_error = false;
    for n in orch.notifier.drain() {
        eprintln!("{}: {}", n.severity.label(), n.message);
        any_error |= n.severity == Severity::Error;
    }
    any_error
}

fn material_rows(materials: &[Material]) -> Vec<TableRow> {
    materials
        .iter()
        .map(|m| TableRow::Cells {
            cells: vec![m.id.clone(), m.name.clone()],
            marker: RowMarker::Plain,
        })
        .collect()
}

fn format_price_track(orch: &Orchestrator) -> String {
    let mut out = String::from("=== Price forecast ===\n");
    match &orch.view.chart_region {
        Region::Error(msg) => out.push_str(&format!("{msg}\n")),
        _ => {
            if let Some(chart) = orch.view.chart.current() {
                out.push_str(&format_table(
                    &["Date", "Historical", "Predicted", "Low", "High"],
                    &chart_rows(&chart.view),
                ));
                out.push('\n');
            }
            out.push_str(&format_table(&PREDICTION_COLUMNS, &orch.view.prediction_rows));
        }
    }
    out
}

fn format_vendor_track(orch: &Orchestrator) -> String {
    let mut out = String::from("=== Vendor recommendation ===\n");
    match &orch.view.vendor_detail {
        Region::Error(msg) => out.push_str(&format!("{msg}\n")),
        Region::Ready(summary) => {
            out.push_str(&format!(
                "Best vendor: {} | weighted score: {}\n",
                summary.best_vendor_id, summary.weighted_score
            ));
            if let Some(b) = &summary.breakdown {
                out.push_str(&format!("Breakdown: {b}\n"));
            }
            out.push('\n');
            out.push_str(&format_table(&VENDOR_COLUMNS, &orch.view.vendor_rows));
        }
        Region::Empty | Region::Loading(_) => {}
    }
    out
}

/// The chart's series as text rows; `-` marks "no value".
fn chart_rows(view: &ChartView) -> Vec<TableRow> {
    let cell = |v: Option<f64>| v.map(|y| format!("{y:.2}")).unwrap_or_else(|| "-".to_string());
    view.labels
        .iter()
        .enumerate()
        .map(|(i, label)| TableRow::Cells {
            cells: vec![
                label.clone(),
                cell(view.historical[i]),
                cell(view.predicted[i]),
                cell(view.confidence_low[i]),
                cell(view.confidence_high[i]),
            ],
            marker: RowMarker::Plain,
        })
        .collect()
}

/// Rewrite argv so `procure` defaults to `procure tui`.
///
/// Rules:
/// - `procure`                      -> `procure tui`
/// - `procure --api-base URL ...`   -> `procure tui --api-base URL ...`
/// - `procure --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "materials" | "analyze" | "upload");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_and_flags_default_to_tui() {
        assert_eq!(rewrite_args(argv(&["procure"])), argv(&["procure", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["procure", "--api-base", "http://x"])),
            argv(&["procure", "tui", "--api-base", "http://x"])
        );
        assert_eq!(
            rewrite_args(argv(&["procure", "analyze", "M1"])),
            argv(&["procure", "analyze", "M1"])
        );
        assert_eq!(rewrite_args(argv(&["procure", "--help"])), argv(&["procure", "--help"]));
    }

    #[test]
    fn chart_rows_mark_missing_values() {
        let view = ChartView {
            labels: vec!["2024-01".into(), "2024-02".into()],
            historical: vec![Some(10.0), None],
            predicted: vec![None, Some(12.0)],
            confidence_low: vec![None, Some(11.0)],
            confidence_high: vec![None, Some(13.0)],
        };
        let rows = chart_rows(&view);
        assert_eq!(rows[0].cells().unwrap(), ["2024-01", "10.00", "-", "-", "-"]);
        assert_eq!(rows[1].cells().unwrap(), ["2024-02", "-", "12.00", "11.00", "13.00"]);
    }
}
