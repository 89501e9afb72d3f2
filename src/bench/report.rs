//! Aggregated benchmark tables.

use std::fmt::Write as _;

use statrs::statistics::Statistics;

use crate::solution::OptimizationResult;

/// Statistics for one (method, problem) pair over all repetitions.
///
/// A pair whose repetitions all failed still gets a row: `runs` is 0 and
/// every statistic is NaN (an empty field in delimited output).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BenchmarkRow {
    pub method: String,
    pub problem: String,
    /// Successful runs that entered the statistics.
    pub runs: usize,
    pub failures: usize,
    pub mean_objective: f64,
    /// Sample standard deviation; 0 for a single run.
    pub std_objective: f64,
    pub best_objective: f64,
    pub mean_time_ms: f64,
    /// Fraction of successful runs that stopped on the convergence test.
    pub convergence_rate: f64,
    /// `(mean − best_known) / |best_known| · 100`, when a best-known value
    /// is attached to the problem.
    pub best_known_gap: Option<f64>,
}

impl BenchmarkRow {
    /// Summarises the successful runs of one cell group.
    pub(crate) fn aggregate(
        method: &str,
        problem: &str,
        best_known: Option<f64>,
        results: &[OptimizationResult],
        failures: usize,
    ) -> Self {
        let runs = results.len();
        let objectives: Vec<f64> = results.iter().map(|r| r.objective_value).collect();
        let times: Vec<f64> = results.iter().map(|r| r.elapsed.as_secs_f64() * 1e3).collect();
        let mean = objectives.iter().mean();
        let std = match runs {
            0 => f64::NAN,
            1 => 0.0,
            _ => objectives.iter().std_dev(),
        };
        let best = if runs == 0 {
            f64::NAN
        } else {
            Statistics::min(objectives.iter())
        };
        let converged = results.iter().filter(|r| r.converged).count();
        let best_known_gap = best_known
            .filter(|bk| *bk != 0.0 && runs > 0)
            .map(|bk| (mean - bk) / bk.abs() * 100.0);

        Self {
            method: method.to_string(),
            problem: problem.to_string(),
            runs,
            failures,
            mean_objective: mean,
            std_objective: std,
            best_objective: best,
            mean_time_ms: times.iter().mean(),
            convergence_rate: converged as f64 / runs as f64,
            best_known_gap,
        }
    }
}

/// A repetition that produced no usable result.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FailedCell {
    pub method: String,
    pub problem: String,
    pub repetition: usize,
    pub error: String,
}

/// Output of [`BenchmarkSuite::run_comparison`](super::BenchmarkSuite::run_comparison).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BenchmarkReport {
    pub rows: Vec<BenchmarkRow>,
    pub failures: Vec<FailedCell>,
}

const COLUMNS: [&str; 10] = [
    "method",
    "problem",
    "runs",
    "failures",
    "mean_objective",
    "std_objective",
    "best_objective",
    "mean_time_ms",
    "convergence_rate",
    "best_known_gap",
];

impl BenchmarkReport {
    /// Row for `(method, problem)`.
    pub fn row(&self, method: &str, problem: &str) -> Option<&BenchmarkRow> {
        self.rows
            .iter()
            .find(|r| r.method == method && r.problem == problem)
    }

    /// Header plus one line per row, fields joined by `sep`. A missing gap
    /// or a NaN statistic is an empty field; text fields containing `sep`,
    /// a quote or a line break are quoted with doubled inner quotes.
    pub fn to_delimited(&self, sep: char) -> String {
        let mut out = COLUMNS.join(&sep.to_string());
        out.push('\n');
        for r in &self.rows {
            let fields = [
                quote_field(&r.method, sep),
                quote_field(&r.problem, sep),
                r.runs.to_string(),
                r.failures.to_string(),
                number(r.mean_objective, 4),
                number(r.std_objective, 4),
                number(r.best_objective, 4),
                number(r.mean_time_ms, 3),
                number(r.convergence_rate, 3),
                r.best_known_gap.map(|g| number(g, 4)).unwrap_or_default(),
            ];
            let _ = writeln!(out, "{}", fields.join(&sep.to_string()));
        }
        out
    }

    pub fn to_csv(&self) -> String {
        self.to_delimited(',')
    }

    /// Pretty-printed JSON of rows and failures.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn number(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:.decimals$}")
    }
}

fn quote_field(text: &str, sep: char) -> String {
    if text.contains([sep, '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::{Permutation, StopReason};
    use approx::assert_relative_eq;
    use std::time::Duration;

    fn result(objective: f64, converged: bool) -> OptimizationResult {
        OptimizationResult {
            method: "m".into(),
            solution: Permutation::identity(3),
            objective_value: objective,
            iterations: 10,
            elapsed: Duration::from_millis(4),
            converged,
            stop_reason: if converged {
                StopReason::Converged
            } else {
                StopReason::MaxIterations
            },
            trace: Vec::new(),
            recoveries: 0,
        }
    }

    #[test]
    fn test_aggregate_statistics() {
        let results = [result(10.0, true), result(12.0, false), result(14.0, true)];
        let row = BenchmarkRow::aggregate("m", "p", Some(8.0), &results, 1);
        assert_eq!(row.runs, 3);
        assert_eq!(row.failures, 1);
        assert_relative_eq!(row.mean_objective, 12.0);
        assert_relative_eq!(row.std_objective, 2.0);
        assert_relative_eq!(row.best_objective, 10.0);
        assert_relative_eq!(row.mean_time_ms, 4.0, epsilon = 1e-9);
        assert_relative_eq!(row.convergence_rate, 2.0 / 3.0);
        assert_relative_eq!(row.best_known_gap.unwrap(), 50.0);
    }

    #[test]
    fn test_aggregate_all_failed() {
        let row = BenchmarkRow::aggregate("m", "p", Some(5.0), &[], 3);
        assert_eq!(row.runs, 0);
        assert_eq!(row.failures, 3);
        assert!(row.mean_objective.is_nan());
        assert!(row.best_objective.is_nan());
        assert!(row.best_known_gap.is_none());

        let report = BenchmarkReport {
            rows: vec![row],
            failures: Vec::new(),
        };
        let csv = report.to_csv();
        assert_eq!(csv.lines().nth(1), Some("m,p,0,3,,,,,,"));
    }

    #[test]
    fn test_csv_quotes_separator_in_names() {
        let row = BenchmarkRow::aggregate("sa", "tai,12a", None, &[result(40.0, true)], 0);
        let odd = BenchmarkRow::aggregate("say \"hi\"", "p", None, &[result(40.0, true)], 0);
        let report = BenchmarkReport {
            rows: vec![row, odd],
            failures: Vec::new(),
        };
        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[1].starts_with("sa,\"tai,12a\",1,0,"));
        assert!(lines[2].starts_with("\"say \"\"hi\"\"\",p,1,0,"));

        // Outside quotes, every line has exactly the header's field count.
        for line in &lines {
            let mut quoted = false;
            let mut fields = 1;
            for c in line.chars() {
                match c {
                    '"' => quoted = !quoted,
                    ',' if !quoted => fields += 1,
                    _ => {}
                }
            }
            assert_eq!(fields, COLUMNS.len(), "{line}");
        }

        let tsv = report.to_delimited('\t');
        assert!(tsv.lines().nth(1).unwrap().starts_with("sa\ttai,12a\t"));
    }

    #[test]
    fn test_csv_layout() {
        let row = BenchmarkRow::aggregate("sa", "line4", None, &[result(40.0, true)], 0);
        let report = BenchmarkReport {
            rows: vec![row],
            failures: Vec::new(),
        };
        let csv = report.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("method,problem,runs"));
        assert!(lines[1].starts_with("sa,line4,1,0,40.0000,0.0000"));
        assert!(lines[1].ends_with(','));
        assert_eq!(report.to_delimited('\t').lines().next().unwrap().split('\t').count(), 10);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_json_export() {
        let report = BenchmarkReport {
            rows: Vec::new(),
            failures: vec![FailedCell {
                method: "m".into(),
                problem: "p".into(),
                repetition: 0,
                error: "boom".into(),
            }],
        };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"boom\""));
    }
}
