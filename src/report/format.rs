//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the cleaning/statistics/modeling code stays free of presentation
//! - output changes are localized

use chrono::SecondsFormat;
use polars::prelude::{Column, DataFrame};

use crate::clean::CleaningRun;
use crate::domain::{
    CleaningConfig, ColumnKind, ColumnSummary, DiagnosticRow, EvaluationResult, float_values, text_values,
    timestamp_values,
};
use crate::error::PipelineError;
use crate::report::daily_errors;
use crate::stats::{OutlierReport, describe_table};

const CELL_WIDTH: usize = 14;
const NAME_WIDTH: usize = 16;

/// Summary of a cleaning run: configuration, quality counts, skipped stages.
pub fn format_cleaning_summary(run: &CleaningRun, config: &CleaningConfig) -> String {
    let mut out = String::new();

    out.push_str("=== wx - cleaning ===\n");
    out.push_str(&format!(
        "Policy: {} | keep duplicates: {}\n",
        config.missing_policy, config.keep_duplicates
    ));
    out.push_str(&format!(
        "Quality before cleaning: duplicates={} missing cells={}\n",
        run.quality.duplicate_count, run.quality.missing_value_count
    ));
    out.push_str(&format!(
        "Result: {} rows x {} columns\n",
        run.table.height(),
        run.table.width()
    ));

    if run.all_stages_applied() {
        out.push_str("All stages applied.\n");
    } else {
        out.push_str("Skipped stages:\n");
        for failure in &run.failures {
            out.push_str(&format!("  ! {:<18} {}\n", failure.stage, failure.error));
        }
    }

    out
}

/// Render up to `max_rows` rows of a frame.
pub fn format_table(table: &DataFrame, max_rows: usize) -> String {
    let mut out = String::new();
    let shown = table.head(Some(max_rows));
    let columns: Vec<(usize, Vec<String>)> = shown
        .get_columns()
        .iter()
        .map(|c| (cell_width(c), cells(c)))
        .collect();

    let header: Vec<String> = shown
        .get_columns()
        .iter()
        .zip(&columns)
        .map(|(c, (w, _))| format!("{:>width$}", truncate(c.name(), CELL_WIDTH), width = *w))
        .collect();
    push_line(&mut out, &header.join(" "));

    let rule: Vec<String> = columns.iter().map(|(w, _)| "-".repeat(*w)).collect();
    push_line(&mut out, &rule.join(" "));

    for row in 0..shown.height() {
        let line: Vec<String> = columns
            .iter()
            .map(|(w, values)| format!("{:>width$}", values[row], width = *w))
            .collect();
        push_line(&mut out, &line.join(" "));
    }
    if table.height() > max_rows {
        out.push_str(&format!("... {} more rows\n", table.height() - max_rows));
    }

    out
}

/// `describe()` with the Norwegian column headings.
pub fn format_describe(summaries: &[ColumnSummary]) -> Result<String, PipelineError> {
    Ok(format_table(&describe_table(summaries)?, summaries.len()))
}

pub fn format_correlation_matrix(matrix: &[(String, Vec<f64>)]) -> String {
    let mut out = String::new();
    let mut header = format!("{:<NAME_WIDTH$}", "");
    for (name, _) in matrix {
        header.push_str(&format!(" {:>CELL_WIDTH$}", truncate(name, CELL_WIDTH)));
    }
    push_line(&mut out, &header);

    for (name, row) in matrix {
        let mut line = format!("{:<NAME_WIDTH$}", truncate(name, NAME_WIDTH));
        for r in row {
            let cell = if r.is_finite() { format!("{r:.3}") } else { "-".to_string() };
            line.push_str(&format!(" {cell:>CELL_WIDTH$}"));
        }
        push_line(&mut out, &line);
    }
    out
}

pub fn format_outliers(report: &OutlierReport, max_rows: usize) -> String {
    let mut out = format!("Outliers (|z| > {}): {} rows\n", report.threshold, report.len());
    if !report.is_empty() {
        out.push_str(&format_table(&report.table, max_rows));
    }
    out
}

/// Last `tail` values of a rolling trend next to the raw series.
pub fn format_trend(column: &str, window: usize, raw: &[Option<f64>], trend: &[Option<f64>], tail: usize) -> String {
    let mut out = format!("Rolling mean of {column} (window {window}), last {} rows:\n", tail.min(trend.len()));
    push_line(&mut out, &format!("{:>6} {:>CELL_WIDTH$} {:>CELL_WIDTH$}", "row", column, "trend"));
    let start = trend.len().saturating_sub(tail);
    for (i, (value, smoothed)) in raw.iter().zip(trend).enumerate().skip(start) {
        push_line(
            &mut out,
            &format!(
                "{i:>6} {:>CELL_WIDTH$} {:>CELL_WIDTH$}",
                fmt_opt(*value),
                fmt_opt(*smoothed)
            ),
        );
    }
    out
}

pub fn format_evaluation(result: &EvaluationResult) -> String {
    if result.is_empty() {
        return "No fitted models to evaluate.\n".to_string();
    }
    let mut out = String::new();
    push_line(&mut out, &format!("{:<NAME_WIDTH$} {:>10} {:>10}", "model", "R^2", "RMSE"));
    for (name, score) in result {
        push_line(
            &mut out,
            &format!("{:<NAME_WIDTH$} {:>10.4} {:>10.4}", truncate(name, NAME_WIDTH), score.r2, score.rmse),
        );
    }
    out
}

/// Holdout predictions followed by the mean absolute error per day.
pub fn format_diagnostics(rows: &[DiagnosticRow], max_rows: usize) -> String {
    let mut out = String::new();
    push_line(
        &mut out,
        &format!(
            "{:<20} {:>10} {:>10} {:>10}",
            "Tid", "Faktisk", "Predikert", "Feil"
        ),
    );
    push_line(&mut out, &format!("{:-<20} {:-<10} {:-<10} {:-<10}", "", "", "", ""));
    for row in rows.iter().take(max_rows) {
        let ts = row
            .timestamp
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();
        push_line(
            &mut out,
            &format!(
                "{:<20} {:>10.2} {:>10.2} {:>10.2}",
                ts, row.actual, row.predicted, row.abs_error
            ),
        );
    }
    if rows.len() > max_rows {
        out.push_str(&format!("... {} more rows\n", rows.len() - max_rows));
    }

    let daily = daily_errors(rows);
    if !daily.is_empty() {
        out.push_str("\nMean absolute error per day:\n");
        for d in daily {
            push_line(&mut out, &format!("{} {:>10.3} (n={})", d.day, d.mean_abs_error, d.n));
        }
    }
    out
}

/// Display strings for every cell of a column; nulls are blank.
fn cells(column: &Column) -> Vec<String> {
    let typed = match ColumnKind::of(column) {
        ColumnKind::Numeric => float_values(column).ok().map(|v| v.into_iter().map(fmt_opt).collect()),
        ColumnKind::Timestamp => timestamp_values(column).ok().map(|v| {
            v.into_iter()
                .map(|t| t.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)).unwrap_or_default())
                .collect()
        }),
        ColumnKind::Text => text_values(column).ok().map(|v| {
            v.into_iter()
                .map(|s| s.map(|s| truncate(&s, 20)).unwrap_or_default())
                .collect()
        }),
        ColumnKind::Other => None,
    };
    typed.unwrap_or_else(|| {
        (0..column.len())
            .map(|row| match column.get(row) {
                Ok(value) if !value.is_null() => truncate(&value.to_string(), 20),
                _ => String::new(),
            })
            .collect()
    })
}

fn cell_width(column: &Column) -> usize {
    match ColumnKind::of(column) {
        ColumnKind::Numeric => CELL_WIDTH,
        _ => 20,
    }
}

fn fmt_f64(v: f64) -> String {
    if v.is_finite() { format!("{v:.3}") } else { "NaN".to_string() }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(fmt_f64).unwrap_or_default()
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
