//! Syntax checking without executing any code.
//!
//! Parsing is done in-process with `rustpython-parser`; the file is never
//! handed to an interpreter.

use std::fs;
use std::path::Path;

use rustpython_parser::{Parse, ast};

use crate::core::targets::first_invalid_target;

const BOM: char = '\u{feff}';

/// Parse `path` and return the first syntax error, or `None` if it parses.
///
/// Never fails: unreadable or non-UTF-8 files yield a `cannot read file` message.
pub fn check_syntax(path: &Path) -> Option<String> {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(cause) => return Some(format!("FileReadError: cannot read file ({cause})")),
    };
    check_source(&source, &path.to_string_lossy())
}

/// Parse `source` and return the first syntax error, if any.
///
/// Invalid assignment/deletion targets and bare generator arguments count as
/// syntax errors too, as they do for the interpreter.
pub fn check_source(source: &str, source_path: &str) -> Option<String> {
    let source = source.strip_prefix(BOM).unwrap_or(source);
    let (message, offset) = match ast::Suite::parse(source, source_path) {
        Ok(suite) => first_invalid_target(source, suite)?,
        Err(err) => (err.error.to_string(), usize::from(err.offset)),
    };
    Some(format!(
        "SyntaxError: {message} at line {}",
        line_at(source, offset)
    ))
}

fn read_source(path: &Path) -> Result<String, String> {
    let bytes = fs::read(path).map_err(|err| err.to_string())?;
    String::from_utf8(bytes).map_err(|err| format!("invalid UTF-8: {err}"))
}

/// 1-based line of a byte offset.
///
/// Errors found at end of input (an unclosed bracket, say) carry the EOF
/// offset; those are reported on the last non-blank line instead of the
/// empty line after it.
fn line_at(source: &str, offset: usize) -> usize {
    let end = offset.min(source.trim_end().len());
    source.as_bytes()[..end]
        .iter()
        .filter(|byte| **byte == b'\n')
        .count()
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_source_has_no_error() {
        let source = "import os\n\ndef f(x):\n    return os.path.join(x, 'a')\n";
        assert_eq!(check_source(source, "ok.py"), None);
    }

    #[test]
    fn invalid_signature_reports_line() {
        let source = "x = 1\n\ndef f(:\n    pass\n";
        let message = check_source(source, "bad.py").expect("syntax error");
        assert!(message.starts_with("SyntaxError: "), "{message}");
        assert!(message.ends_with("at line 3"), "{message}");
    }

    #[test]
    fn unclosed_bracket_reports_last_code_line() {
        let message = check_source("x = 1\ny = (\n\n", "open.py").expect("syntax error");
        assert!(message.ends_with("at line 2"), "{message}");
    }

    #[test]
    fn invalid_targets_are_syntax_errors() {
        for (source, expected) in [
            ("f() = 1\n", "SyntaxError: cannot assign to function call at line 1"),
            ("x = 1\ndel f()\n", "SyntaxError: cannot delete function call at line 2"),
            (
                "x + 1 += 2\n",
                "SyntaxError: 'expression' is an illegal expression for augmented assignment at line 1",
            ),
            (
                "(a, b) += 1\n",
                "SyntaxError: 'tuple' is an illegal expression for augmented assignment at line 1",
            ),
            (
                "f(x for x in y, 1)\n",
                "SyntaxError: Generator expression must be parenthesized at line 1",
            ),
        ] {
            assert_eq!(check_source(source, "bad.py").as_deref(), Some(expected), "{source}");
        }
    }

    #[test]
    fn undefined_names_are_not_syntax_errors() {
        assert_eq!(check_source("print(undefined_name)\n", "x.py"), None);
    }

    #[test]
    fn leading_bom_is_ignored() {
        assert_eq!(check_source("\u{feff}x = 1\n", "bom.py"), None);
    }

    #[test]
    fn missing_file_is_read_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let message = check_syntax(&temp.path().join("absent.py")).expect("error");
        assert!(
            message.starts_with("FileReadError: cannot read file ("),
            "{message}"
        );
    }

    #[test]
    fn non_utf8_file_is_read_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("latin1.py");
        fs::write(&path, b"name = '\xe9t\xe9'\n").expect("write");
        let message = check_syntax(&path).expect("error");
        assert!(message.contains("invalid UTF-8"), "{message}");
    }

    #[test]
    fn checking_twice_is_identical() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("bad.py");
        fs::write(&path, "def f(:\n").expect("write");
        let first = check_syntax(&path);
        let second = check_syntax(&path);
        assert!(first.is_some());
        assert_eq!(first, second);
    }
}
