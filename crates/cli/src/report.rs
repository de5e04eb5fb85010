use std::fmt::Write;

use topicsim_store::{AnalysisRecord, RunSummary};

use crate::run::RunOutcome;

pub fn format_outcome(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[topicsim] Run:               {}", outcome.run_id);
    let _ = writeln!(out, "[topicsim] Documents:         {}", outcome.documents);
    let _ = writeln!(
        out,
        "[topicsim] Mean similarity:   {}",
        format_score(Some(outcome.mean_similarity))
    );
    out
}

pub fn format_run_table(runs: &[RunSummary]) -> String {
    if runs.is_empty() {
        return "no runs recorded\n".to_string();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>6}  {:>3}  {:>6}  {:>6}  {:>7}  {:>6}  {:<25}",
        "run", "K", "V", "N", "alpha", "score", "date"
    );
    for run in runs {
        let _ = writeln!(
            out,
            "{:>6}  {:>3}  {:>6}  {:>6}  {:>7.3}  {:>6}  {:<25}",
            run.run_id,
            run.topics,
            run.vocab_size,
            run.docs,
            run.alpha,
            format_score(run.final_similarity_score),
            run.sim_date
        );
    }
    out
}

/// Run header followed by up to `limit` per-document results.
pub fn format_run_detail(run: &RunSummary, results: &[AnalysisRecord], limit: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "[topicsim] Run:               {}", run.run_id);
    let _ = writeln!(out, "[topicsim] Date:              {}", run.sim_date);
    let _ = writeln!(
        out,
        "[topicsim] Shape:             K={} V={} N={}",
        run.topics, run.vocab_size, run.docs
    );
    let _ = writeln!(out, "[topicsim] Alpha:             {}", run.alpha);
    let _ = writeln!(
        out,
        "[topicsim] Stored documents:  {}",
        run.stored_documents
    );
    let _ = writeln!(
        out,
        "[topicsim] Mean similarity:   {}",
        format_score(run.final_similarity_score)
    );
    if results.is_empty() {
        out.push_str("\nno analysis results\n");
        return out;
    }
    let _ = writeln!(out, "\n{:>8}  {:>6}  predicted theta", "doc", "cosine");
    for record in results.iter().take(limit) {
        let _ = writeln!(
            out,
            "{:>8}  {:>6.3}  {}",
            record.doc_id,
            record.cosine_similarity,
            format_vector(&record.predicted_theta)
        );
    }
    if results.len() > limit {
        let _ = writeln!(out, "... {} more", results.len() - limit);
    }
    out
}

fn format_score(score: Option<f64>) -> String {
    match score {
        Some(value) => format!("{value:.4}"),
        None => "-".to_string(),
    }
}

fn format_vector(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v:.3}")).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(score: Option<f64>) -> RunSummary {
        RunSummary {
            run_id: 7,
            topics: 2,
            vocab_size: 10,
            docs: 3,
            alpha: 0.5,
            sim_date: "2024-01-01T00:00:00+00:00".to_string(),
            final_similarity_score: score,
            stored_documents: 3,
        }
    }

    fn record(doc_id: i64) -> AnalysisRecord {
        AnalysisRecord {
            doc_id,
            run_id: 7,
            predicted_theta: vec![0.25, 0.75],
            cosine_similarity: 0.9,
        }
    }

    #[test]
    fn table_marks_unscored_runs() {
        let table = format_run_table(&[summary(Some(0.8123)), summary(None)]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("0.8123"));
        assert!(lines[2].contains(" - "));
        assert_eq!(format_run_table(&[]), "no runs recorded\n");
    }

    #[test]
    fn detail_respects_limit() {
        let results: Vec<AnalysisRecord> = (1..=3).map(record).collect();
        let detail = format_run_detail(&summary(Some(0.9)), &results, 2);
        assert!(detail.contains("[0.250, 0.750]"));
        assert!(detail.contains("... 1 more"));
        assert!(detail.contains("K=2 V=10 N=3"));
    }

    #[test]
    fn detail_without_results() {
        let detail = format_run_detail(&summary(None), &[], 10);
        assert!(detail.contains("Mean similarity:   -"));
        assert!(detail.ends_with("no analysis results\n"));
    }

    #[test]
    fn outcome_summary() {
        let text = format_outcome(&RunOutcome {
            run_id: 3,
            documents: 40,
            mean_similarity: 0.5,
        });
        assert!(text.contains("Documents:         40"));
        assert!(text.contains("0.5000"));
    }
}
