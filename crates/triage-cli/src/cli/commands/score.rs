use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinSet;

use triage_core::config::load_config_or_default;
use triage_core::loader::{load_scenario, load_trace};
use triage_core::model::ExecutionTrace;
use triage_core::scoring_api::Scorer;
use triage_metrics::{default_scorers, evaluate_run, RunReport};

use crate::cli::args::{OutputFormat, ScoreArgs};
use crate::exit_codes;

#[derive(Debug, Serialize)]
struct ScoreOutput {
    generated_at: String,
    scenario_id: String,
    config_version: u32,
    runs: Vec<TraceReport>,
}

#[derive(Debug, Serialize)]
struct TraceReport {
    trace: String,
    mean_score: Option<f64>,
    #[serde(flatten)]
    report: RunReport,
}

pub async fn cmd_score(args: ScoreArgs) -> anyhow::Result<i32> {
    let config = match load_config_or_default(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {e}");
            return Ok(exit_codes::EXIT_CONFIG_ERROR);
        }
    };
    let scenario = match load_scenario(&args.scenario) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("error: {e}");
            return Ok(exit_codes::EXIT_CONFIG_ERROR);
        }
    };

    let mut scorers = default_scorers(&config);
    if !args.only.is_empty() {
        let unknown: Vec<&String> = args
            .only
            .iter()
            .filter(|n| !scorers.iter().any(|s| s.name() == n.as_str()))
            .collect();
        if !unknown.is_empty() {
            eprintln!(
                "unknown scorer(s): {}",
                unknown.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
            );
            return Ok(exit_codes::EXIT_CONFIG_ERROR);
        }
        scorers.retain(|s| args.only.iter().any(|n| n == s.name()));
    }
    let scorers: Arc<[Arc<dyn Scorer>]> = scorers.into();

    let mut traces: Vec<(PathBuf, ExecutionTrace)> = Vec::with_capacity(args.traces.len());
    for path in &args.traces {
        match load_trace(path) {
            Ok(t) => traces.push((path.clone(), t)),
            Err(e) => {
                eprintln!("error: {e}");
                return Ok(exit_codes::EXIT_CONFIG_ERROR);
            }
        }
    }

    tracing::info!(
        scenario = %scenario.id,
        traces = traces.len(),
        scorers = scorers.len(),
        "scoring"
    );

    let mut set = JoinSet::new();
    for (idx, (path, trace)) in traces.into_iter().enumerate() {
        let scenario = Arc::clone(&scenario);
        let scorers = Arc::clone(&scorers);
        set.spawn_blocking(move || {
            let report = evaluate_run(&scenario, &trace, &scorers);
            (idx, path, report)
        });
    }

    let mut runs = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        let (idx, path, report) = joined.context("scoring task failed")?;
        runs.push((idx, path, report));
    }
    runs.sort_by_key(|(idx, _, _)| *idx);

    let runs: Vec<TraceReport> = runs
        .into_iter()
        .map(|(_, path, report)| TraceReport {
            trace: path.display().to_string(),
            mean_score: report.mean_applicable(),
            report,
        })
        .collect();

    let code = exit_code_for(&runs, args.min_score);

    let output = ScoreOutput {
        generated_at: chrono::Utc::now().to_rfc3339(),
        scenario_id: scenario.id.clone(),
        config_version: config.version,
        runs,
    };
    match args.format {
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&output).context("serializing report")?;
            println!("{text}");
        }
        OutputFormat::Text => print_text(&output, args.min_score),
    }
    Ok(code)
}

fn exit_code_for(runs: &[TraceReport], min_score: Option<f64>) -> i32 {
    let any_invalid = runs.iter().any(|r| !r.report.health.valid);
    let below = min_score.is_some_and(|min| {
        runs.iter().any(|r| {
            r.report
                .scores
                .values()
                .any(|s| s.applicable() && s.score < min)
        })
    });
    if any_invalid || below {
        exit_codes::EXIT_BELOW_THRESHOLD
    } else {
        exit_codes::EXIT_SUCCESS
    }
}

fn print_text(output: &ScoreOutput, min_score: Option<f64>) {
    println!("scenario: {}", output.scenario_id);
    for run in &output.runs {
        let health = &run.report.health;
        if health.valid {
            println!("\n{} (valid)", run.trace);
        } else {
            println!("\n{} (INVALID: {})", run.trace, health.reasons.join(", "));
        }
        for (name, result) in &run.report.scores {
            let marker = match (result.applicable(), min_score) {
                (false, _) => " n/a",
                (true, Some(min)) if result.score < min => " FAIL",
                _ => "",
            };
            match result.note() {
                Some(note) => println!("  {name:<28} {:.3}{marker}  ({note})", result.score),
                None => println!("  {name:<28} {:.3}{marker}", result.score),
            }
        }
        if let Some(mean) = run.mean_score {
            println!("  {:<28} {mean:.3}", "mean");
        }
    }
}
