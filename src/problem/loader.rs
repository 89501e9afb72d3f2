//! QAPLIB text format reader.
//!
//! Instance files hold the size `n`, then the `n×n` flow matrix, then the
//! `n×n` distance matrix, all whitespace separated. Line breaks carry no
//! meaning (QAPLIB wraps long rows), so the reader works on a token stream
//! and reports the line of the offending token.
//!
//! Solution files (`.sln`) hold `n`, the objective value, and a 1-based
//! permutation.

use std::path::Path;

use super::types::Problem;
use crate::error::{QapError, QapResult};
use crate::matrix::SquareMatrix;
use crate::solution::Permutation;

/// Contents of a QAPLIB `.sln` file.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionFile {
    /// Declared instance size.
    pub size: usize,
    /// Objective value of the listed permutation (optimal or best known).
    pub objective: f64,
    /// The assignment, converted to 0-based indices.
    pub permutation: Permutation,
}

/// Upper bound on buffer space reserved from a size header.
const MAX_PREALLOC: usize = 1 << 16;

struct Tokens<'a> {
    inner: Box<dyn Iterator<Item = (usize, &'a str)> + 'a>,
    last_line: usize,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        let inner = text
            .lines()
            .enumerate()
            .flat_map(|(i, line)| line.split_whitespace().map(move |tok| (i + 1, tok)));
        Self {
            inner: Box::new(inner),
            last_line: 1,
        }
    }

    fn next_token(&mut self, what: &str) -> QapResult<(usize, &'a str)> {
        match self.inner.next() {
            Some((line, tok)) => {
                self.last_line = line;
                Ok((line, tok))
            }
            None => Err(QapError::format(
                self.last_line,
                format!("unexpected end of input, expected {what}"),
            )),
        }
    }

    fn next_usize(&mut self, what: &str) -> QapResult<usize> {
        let (line, tok) = self.next_token(what)?;
        tok.parse::<usize>()
            .map_err(|_| QapError::format(line, format!("expected {what}, found '{tok}'")))
    }

    fn next_f64(&mut self, what: &str) -> QapResult<f64> {
        let (line, tok) = self.next_token(what)?;
        let v = tok
            .parse::<f64>()
            .map_err(|_| QapError::format(line, format!("expected {what}, found '{tok}'")))?;
        if !v.is_finite() {
            return Err(QapError::format(line, format!("non-finite value '{tok}'")));
        }
        Ok(v)
    }

    fn expect_end(&mut self) -> QapResult<()> {
        match self.inner.next() {
            None => Ok(()),
            Some((line, tok)) => Err(QapError::format(
                line,
                format!("unexpected trailing token '{tok}'"),
            )),
        }
    }

    fn read_matrix(&mut self, n: usize, label: &str) -> QapResult<SquareMatrix> {
        let len = n.checked_mul(n).ok_or_else(|| {
            QapError::format(self.last_line, format!("instance size {n} is too large"))
        })?;
        // The header is untrusted; grow as tokens actually arrive.
        let mut data = Vec::with_capacity(len.min(MAX_PREALLOC));
        for i in 0..n {
            for j in 0..n {
                data.push(self.next_f64(&format!("{label}[{i}][{j}]"))?);
            }
        }
        SquareMatrix::from_vec(n, data)
    }
}

/// Parses an instance in QAPLIB format.
///
/// Fails with [`QapError::Format`] on a bad size header, missing or
/// non-numeric entries, or trailing data; with
/// [`QapError::InvalidProblem`] if the parsed matrices are not a valid instance.
pub fn parse_instance(name: &str, text: &str) -> QapResult<Problem> {
    let mut tokens = Tokens::new(text);
    let n = tokens.next_usize("instance size")?;
    if n == 0 {
        return Err(QapError::format(tokens.last_line, "instance size must be positive"));
    }
    let flow = tokens.read_matrix(n, "flow")?;
    let distance = tokens.read_matrix(n, "distance")?;
    tokens.expect_end()?;
    Problem::new(name, flow, distance)
}

/// Reads an instance file; the problem is named after the file stem.
pub fn load_instance_file(path: impl AsRef<Path>) -> QapResult<Problem> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "instance".to_string());
    parse_instance(&name, &text)
}

/// Parses a QAPLIB `.sln` file.
pub fn parse_solution(text: &str) -> QapResult<SolutionFile> {
    let mut tokens = Tokens::new(text);
    let size = tokens.next_usize("instance size")?;
    let objective = tokens.next_f64("objective value")?;
    let mut perm = Vec::with_capacity(size.min(MAX_PREALLOC));
    for i in 0..size {
        let (line, tok) = tokens.next_token(&format!("assignment {i}"))?;
        let loc: usize = tok
            .parse()
            .map_err(|_| QapError::format(line, format!("expected location, found '{tok}'")))?;
        if loc == 0 || loc > size {
            return Err(QapError::format(
                line,
                format!("location {loc} out of range 1..={size}"),
            ));
        }
        perm.push(loc - 1);
    }
    tokens.expect_end()?;
    let permutation = Permutation::new(perm)
        .map_err(|e| QapError::format(tokens.last_line, e.to_string()))?;
    Ok(SolutionFile {
        size,
        objective,
        permutation,
    })
}

/// Reads a `.sln` file.
pub fn load_solution_file(path: impl AsRef<Path>) -> QapResult<SolutionFile> {
    let text = std::fs::read_to_string(path)?;
    parse_solution(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SMALL: &str = "3\n\n0 1 2\n1 0 1\n2 1 0\n\n0 5 2\n5 0 3\n2 3 0\n";

    #[test]
    fn test_parse_small_instance() {
        let p = parse_instance("small", SMALL).unwrap();
        assert_eq!(p.size(), 3);
        assert_eq!(p.name(), "small");
        assert_relative_eq!(p.flow()[(0, 2)], 2.0);
        assert_relative_eq!(p.distance()[(1, 2)], 3.0);
    }

    #[test]
    fn test_wrapped_rows_are_accepted() {
        let text = "2 0 1\n1 0 0 3\n3\n0";
        let p = parse_instance("wrapped", text).unwrap();
        assert_relative_eq!(p.distance()[(0, 1)], 3.0);
    }

    #[test]
    fn test_missing_rows_is_format_error() {
        let text = "3\n0 1 2\n1 0 1\n";
        match parse_instance("short", text) {
            Err(QapError::Format { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(
            parse_instance("x", "three\n"),
            Err(QapError::Format { line: 1, .. })
        ));
        assert!(matches!(
            parse_instance("x", ""),
            Err(QapError::Format { .. })
        ));
        assert!(matches!(
            parse_instance("x", "0\n"),
            Err(QapError::Format { .. })
        ));
    }

    #[test]
    fn test_non_numeric_entry() {
        let text = "2\n0 1\nx 0\n0 1\n1 0\n";
        assert!(matches!(
            parse_instance("x", text),
            Err(QapError::Format { line: 3, .. })
        ));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let text = "2\n0 1\n1 0\n0 1\n1 0\n7\n";
        assert!(matches!(
            parse_instance("x", text),
            Err(QapError::Format { line: 6, .. })
        ));
    }

    #[test]
    fn test_oversized_header_with_short_body() {
        for text in ["10000000\n1 2\n", "5000000000\n1 2\n", "18446744073709551615\n1\n"] {
            let err = parse_instance("x", text).unwrap_err();
            assert!(matches!(err, QapError::Format { .. }), "{text:?}: {err}");
        }
        let err = parse_solution("1000000000000000\n7\n1 2\n").unwrap_err();
        assert!(matches!(err, QapError::Format { .. }), "{err}");
    }

    #[test]
    fn test_size_one_is_invalid_problem() {
        assert!(matches!(
            parse_instance("x", "1\n0\n0\n"),
            Err(QapError::InvalidProblem(_))
        ));
    }

    #[test]
    fn test_parse_solution() {
        let sol = parse_solution("3 16\n2 3 1\n").unwrap();
        assert_eq!(sol.size, 3);
        assert_relative_eq!(sol.objective, 16.0);
        assert_eq!(sol.permutation.as_slice(), &[1, 2, 0]);
    }

    #[test]
    fn test_parse_solution_rejects_duplicates() {
        assert!(matches!(
            parse_solution("3 16\n1 1 2\n"),
            Err(QapError::Format { .. })
        ));
        assert!(matches!(
            parse_solution("3 16\n1 4 2\n"),
            Err(QapError::Format { .. })
        ));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        assert!(matches!(
            load_instance_file("/nonexistent/qap/file.dat"),
            Err(QapError::Io(_))
        ));
    }
}
