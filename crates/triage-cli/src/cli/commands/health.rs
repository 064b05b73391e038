use anyhow::Context;
use serde_json::json;

use triage_core::health::assess_run_health;
use triage_core::loader::load_trace;

use crate::cli::args::{HealthArgs, OutputFormat};
use crate::exit_codes;

pub fn cmd_health(args: HealthArgs) -> anyhow::Result<i32> {
    let mut any_invalid = false;
    let mut rows = Vec::with_capacity(args.traces.len());
    for path in &args.traces {
        let trace = match load_trace(path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("error: {e}");
                return Ok(exit_codes::EXIT_CONFIG_ERROR);
            }
        };
        let health = assess_run_health(&trace);
        any_invalid |= !health.valid;
        rows.push((path.display().to_string(), health));
    }

    match args.format {
        OutputFormat::Json => {
            let out: Vec<_> = rows
                .iter()
                .map(|(trace, health)| json!({ "trace": trace, "health": health }))
                .collect();
            let text = serde_json::to_string_pretty(&out).context("serializing health")?;
            println!("{text}");
        }
        OutputFormat::Text => {
            for (trace, health) in &rows {
                if health.valid {
                    println!("{trace}: valid");
                } else {
                    println!("{trace}: INVALID ({})", health.reasons.join(", "));
                }
            }
        }
    }

    Ok(if any_invalid {
        exit_codes::EXIT_BELOW_THRESHOLD
    } else {
        exit_codes::EXIT_SUCCESS
    })
}
