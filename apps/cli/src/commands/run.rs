//! `aeris run` - trigger one pipeline run.

use crate::commands::{exit_code_for_error, exit_code_for_kind, EXIT_OK};
use aeris_pipeline::{
    LogNotifier, NotificationStatus, PipelineConfig, PipelineOrchestrator, PipelineRun, RunState,
};
use aeris_store::LocalDirStore;
use aeris_training::StumpForestFamily;
use colored::Colorize;
use serde_json::json;
use std::sync::Arc;

pub async fn execute(json_output: bool) -> i32 {
    let config = match PipelineConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{} {e}", "Configuration error:".bold().red());
            return exit_code_for_error(&e);
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("{} {e}", "Configuration error:".bold().red());
        return exit_code_for_error(&e);
    }

    let store = match LocalDirStore::open(&config.store) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("{} {e}", "Storage error:".bold().red());
            return exit_code_for_error(&e.into());
        }
    };

    let orchestrator = PipelineOrchestrator::new(
        store,
        Arc::new(StumpForestFamily::default()),
        Arc::new(LogNotifier),
        config,
    );

    let run = match orchestrator.trigger().await {
        Ok(run) => run,
        Err(e) => {
            eprintln!("{} {e}", "Pipeline error:".bold().red());
            return exit_code_for_error(&e);
        }
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&run_to_json(&run)).unwrap_or_default());
    } else {
        print_run(&run);
    }

    match run.state {
        RunState::Succeeded => EXIT_OK,
        RunState::Failed => run.error_kind().map_or(crate::commands::EXIT_OTHER, exit_code_for_kind),
    }
}

fn run_to_json(run: &PipelineRun) -> serde_json::Value {
    json!({
        "run_id": &run.run_id,
        "started_at": run.started_at.to_rfc3339(),
        "finished_at": run.finished_at.to_rfc3339(),
        "state": format!("{:?}", run.state),
        "training_attempts": run.training_attempts,
        "error_kind": run.error_kind(),
        "error": run.training_error.as_ref().map(ToString::to_string),
        "notification": match &run.notification {
            NotificationStatus::Skipped => json!("skipped"),
            NotificationStatus::Delivered => json!("delivered"),
            NotificationStatus::Failed(e) => json!({ "failed": e }),
        },
        "report": &run.report,
    })
}

fn print_run(run: &PipelineRun) {
    println!();
    match run.state {
        RunState::Succeeded => {
            let report = run.report.as_ref().expect("succeeded run has a report");
            println!("{}", "Training pipeline complete".bold().green());
            println!("  Run:      {}", run.run_id.cyan());
            println!("  Duration: {} ms", report.duration_ms);
            println!("  Dataset:  {} rows x {} features", report.rows, report.features);
            println!("  Best:     {} (cv score {:.6})", report.params, report.cv_score);
            println!("  Model:    {}", report.model_path.dimmed());
            match &run.notification {
                NotificationStatus::Delivered => {
                    println!("  Notify:   {}", "delivered".green());
                }
                NotificationStatus::Failed(e) => {
                    // Training still succeeded; the delivery failure is
                    // reported separately.
                    println!("  Notify:   {} ({e})", "failed".yellow());
                }
                NotificationStatus::Skipped => {
                    println!("  Notify:   {}", "skipped".dimmed());
                }
            }
        }
        RunState::Failed => {
            println!("{}", "Training pipeline failed".bold().red());
            println!("  Run:      {}", run.run_id.cyan());
            println!("  Attempts: {}", run.training_attempts);
            if let Some(err) = &run.training_error {
                println!("  Error:    [{}] {}", run.error_kind().unwrap_or("unknown"), err);
            }
            println!("  Notify:   {}", "skipped".dimmed());
        }
    }
    println!();
}
