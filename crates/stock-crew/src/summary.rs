//! Terminal tables for a finished run

use crate::analysis::SentimentReport;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use crew_orchestrator::{CrewOutput, RunStatus};

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// One row per task: state, budget spent, tool calls and any error
pub fn task_table(output: &CrewOutput) -> Table {
    let mut table = table(vec!["Task", "Agent", "State", "Iterations", "Tool calls", "Note"]);

    for record in &output.tasks {
        let note = match (&record.error, record.blocked) {
            (Some(error), _) => error.clone(),
            (None, true) => "blocked by a failed dependency".to_string(),
            (None, false) => String::new(),
        };
        table.add_row(vec![
            record.id.clone(),
            record.agent_role.clone(),
            record.state.to_string(),
            record.iterations.to_string(),
            record.tool_calls.len().to_string(),
            note,
        ]);
    }
    table
}

/// Fear/greed scores per asset
pub fn sentiment_table(report: &SentimentReport) -> Table {
    let mut table = table(vec!["Asset", "Trend", "Fear/Greed", "Summary"]);
    for asset in &report.assets {
        table.add_row(vec![
            asset.asset.clone(),
            asset.trend.to_string(),
            asset.score.to_string(),
            asset.summary.clone(),
        ]);
    }
    table
}

/// One line describing how the run ended
pub fn status_line(output: &CrewOutput) -> String {
    let status = match &output.status {
        RunStatus::Completed => "completed".to_string(),
        RunStatus::BudgetExceeded => "stopped at the iteration ceiling".to_string(),
        RunStatus::Failed(reason) => format!("failed: {reason}"),
    };
    format!(
        "{} run for {} {} ({} iterations used)",
        output.process,
        output.ticker.as_deref().unwrap_or("?"),
        status,
        output.iterations_used
    )
}
