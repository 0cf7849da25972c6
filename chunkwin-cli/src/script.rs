//! Line-oriented operation scripts for `chunkwin replay`.
//!
//! ```text
//! # comment
//! put 10 100
//! trim 5 23
//! clear 7 9
//! clear-all
//! size
//! values
//! debug
//! ```

use std::fmt;
use std::num::ParseIntError;

use chunkwin::{Tick, WindowedArray};
use thiserror::Error;

/// Errors raised while parsing a script. Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The first token is not a known operation.
    #[error("line {line}: unknown operation '{op}'")]
    UnknownOperation { line: usize, op: String },

    /// Wrong number of arguments for the operation.
    #[error("line {line}: '{op}' takes {expected} argument(s), got {got}")]
    Arity {
        line: usize,
        op: &'static str,
        expected: usize,
        got: usize,
    },

    /// An argument is not a valid `i64`.
    #[error("line {line}: invalid integer '{token}'")]
    InvalidInteger {
        line: usize,
        token: String,
        #[source]
        source: ParseIntError,
    },
}

/// One script operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Put { key: Tick, value: i64 },
    Trim { start: Tick, end: Tick },
    Clear { start: Tick, end: Tick },
    ClearAll,
    Size,
    Values,
    Debug,
}

impl Op {
    /// Operation name as written in scripts.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Put { .. } => "put",
            Op::Trim { .. } => "trim",
            Op::Clear { .. } => "clear",
            Op::ClearAll => "clear-all",
            Op::Size => "size",
            Op::Values => "values",
            Op::Debug => "debug",
        }
    }
}

/// A parsed operation with its source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub line: usize,
    pub op: Op,
}

/// Something a step printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Rejected(Tick),
    Size(usize),
    Values(Vec<i64>),
    Debug(String),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Rejected(key) => write!(f, "rejected {key}"),
            Output::Size(size) => write!(f, "{size}"),
            Output::Values(values) => {
                let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" "))
            }
            Output::Debug(rendered) => f.write_str(rendered),
        }
    }
}

impl Output {
    /// JSON form used by `--format json`.
    pub fn to_json(&self, step: &Step) -> serde_json::Value {
        let result = match self {
            Output::Rejected(key) => serde_json::json!({ "rejected": key }),
            Output::Size(size) => serde_json::json!(size),
            Output::Values(values) => serde_json::json!(values),
            Output::Debug(rendered) => serde_json::json!(rendered),
        };
        serde_json::json!({
            "line": step.line,
            "op": step.op.name(),
            "result": result,
        })
    }
}

/// Parses a whole script, failing on the first malformed line.
pub fn parse(source: &str) -> Result<Vec<Step>, ScriptError> {
    let mut steps = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let mut tokens = text.split_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        let args: Vec<&str> = tokens.collect();

        let op = match name {
            "put" => {
                let [key, value] = ints::<2>(line, "put", &args)?;
                Op::Put { key, value }
            }
            "trim" => {
                let [start, end] = ints::<2>(line, "trim", &args)?;
                Op::Trim { start, end }
            }
            "clear" => {
                let [start, end] = ints::<2>(line, "clear", &args)?;
                Op::Clear { start, end }
            }
            "clear-all" => {
                ints::<0>(line, "clear-all", &args)?;
                Op::ClearAll
            }
            "size" => {
                ints::<0>(line, "size", &args)?;
                Op::Size
            }
            "values" => {
                ints::<0>(line, "values", &args)?;
                Op::Values
            }
            "debug" => {
                ints::<0>(line, "debug", &args)?;
                Op::Debug
            }
            other => {
                return Err(ScriptError::UnknownOperation {
                    line,
                    op: other.to_string(),
                });
            }
        };
        steps.push(Step { line, op });
    }
    Ok(steps)
}

fn ints<const N: usize>(
    line: usize,
    op: &'static str,
    args: &[&str],
) -> Result<[i64; N], ScriptError> {
    if args.len() != N {
        return Err(ScriptError::Arity {
            line,
            op,
            expected: N,
            got: args.len(),
        });
    }
    let mut out = [0i64; N];
    for (slot, token) in out.iter_mut().zip(args) {
        *slot = token
            .parse()
            .map_err(|source| ScriptError::InvalidInteger {
                line,
                token: (*token).to_string(),
                source,
            })?;
    }
    Ok(out)
}

/// Executes `steps` against `array`, collecting everything they print.
pub fn run<'a>(array: &WindowedArray<i64>, steps: &'a [Step]) -> Vec<(&'a Step, Output)> {
    let mut outputs = Vec::new();
    for step in steps {
        let output = match step.op {
            Op::Put { key, value } => {
                if array.put(key, value) {
                    None
                } else {
                    Some(Output::Rejected(key))
                }
            }
            Op::Trim { start, end } => {
                array.trim_to_window(start, end);
                None
            }
            Op::Clear { start, end } => {
                array.clear_range(start, end);
                None
            }
            Op::ClearAll => {
                array.clear_all();
                None
            }
            Op::Size => Some(Output::Size(array.size())),
            Op::Values => Some(Output::Values(array.values())),
            Op::Debug => Some(Output::Debug(array.debug_string())),
        };
        if let Some(output) = output {
            outputs.push((step, output));
        }
    }
    outputs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let steps = parse("# header\n\nput 1 10\n   \n  size  \n").unwrap();
        assert_eq!(
            steps,
            vec![
                Step {
                    line: 3,
                    op: Op::Put { key: 1, value: 10 }
                },
                Step {
                    line: 5,
                    op: Op::Size
                },
            ]
        );
    }

    #[test]
    fn test_parse_all_operations() {
        let steps = parse("put -3 7\ntrim 1 2\nclear 3 4\nclear-all\nvalues\ndebug").unwrap();
        let ops: Vec<&str> = steps.iter().map(|s| s.op.name()).collect();
        assert_eq!(ops, ["put", "trim", "clear", "clear-all", "values", "debug"]);
        assert_eq!(steps[0].op, Op::Put { key: -3, value: 7 });
    }

    #[test]
    fn test_parse_reports_line_numbers() {
        let err = parse("put 1 1\nfrobnicate\n").unwrap_err();
        assert!(matches!(err, ScriptError::UnknownOperation { line: 2, .. }));
        assert_eq!(err.to_string(), "line 2: unknown operation 'frobnicate'");

        let err = parse("put 1\n").unwrap_err();
        assert!(matches!(
            err,
            ScriptError::Arity {
                line: 1,
                expected: 2,
                got: 1,
                ..
            }
        ));

        let err = parse("\n\nsize\ntrim 1 x\n").unwrap_err();
        assert!(matches!(err, ScriptError::InvalidInteger { line: 4, .. }));

        let err = parse("size now\n").unwrap_err();
        assert!(matches!(err, ScriptError::Arity { line: 1, .. }));
    }

    #[test]
    fn test_run_prints_reads_and_rejections() {
        let steps = parse("put 5 50\nput 3 30\nput 7 70\nsize\nvalues\ntrim 6 10\ndebug").unwrap();
        let array = WindowedArray::with_chunk_capacity(2).unwrap();
        let outputs: Vec<String> = run(&array, &steps)
            .iter()
            .map(|(_, output)| output.to_string())
            .collect();
        assert_eq!(outputs, ["rejected 3", "2", "50 70", "[(7: 70) ]"]);
    }

    #[test]
    fn test_json_output() {
        let steps = parse("put 2 20\nvalues").unwrap();
        let array = WindowedArray::new();
        let outputs = run(&array, &steps);
        let (step, output) = &outputs[0];
        assert_eq!(
            output.to_json(step),
            serde_json::json!({ "line": 2, "op": "values", "result": [20] })
        );
    }
}
