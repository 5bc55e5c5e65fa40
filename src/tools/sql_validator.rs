//! SQL statement validation for read-only enforcement.
//!
//! Two independent checks run on every query before a connection is opened:
//!
//! 1. [`ensure_single_statement`] scans the full text character by character,
//!    tracking quote and comment state, and rejects statement stacking
//!    (`SELECT 1; DROP TABLE x`). Semicolons inside string literals, quoted
//!    identifiers, or comments do not count as statement boundaries.
//! 2. [`ensure_read_only`] checks that the statement begins with `SELECT` or
//!    `WITH` and then parses it with [sqlparser](https://docs.rs/sqlparser/)
//!    (SQLite dialect) so that a mutation hidden behind a CTE prefix
//!    (`WITH t AS (...) INSERT ...`) is rejected as well. Anything that does
//!    not resolve to a plain query is blocked with the offending statement
//!    name in the error.
//!
//! Both checks are deterministic; a rejected query will be rejected again
//! unless the caller changes it.

use crate::error::{ExplorerError, ExplorerResult};
use sqlparser::ast::Statement;
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

/// Lexical state of the statement scanner.
///
/// States are mutually exclusive; comments form their own states so that a
/// semicolon inside `--` or `/* */` is never treated as a boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexState {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment,
}

/// Validate a query for execution through the read_query tool.
///
/// Runs the multi-statement detector first, then the read-only classifier.
/// Both must pass before any text reaches the database engine.
pub fn validate(sql: &str) -> ExplorerResult<()> {
    ensure_single_statement(sql)?;
    ensure_read_only(sql)
}

/// Reject query text containing more than one non-empty statement.
///
/// A semicolon outside any quote or comment ends a statement; a trailing
/// segment containing only whitespace and comments is not a statement, so
/// `SELECT 1;` and `SELECT 1; -- done` both pass while `SELECT 1; SELECT 2`
/// does not. A doubled quote character inside a quoted region is an escape
/// and does not end the region.
pub fn ensure_single_statement(sql: &str) -> ExplorerResult<()> {
    let mut state = LexState::Plain;
    let mut statements = 0usize;
    let mut current_has_content = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            LexState::Plain => match c {
                '\'' => {
                    state = LexState::SingleQuoted;
                    current_has_content = true;
                }
                '"' => {
                    state = LexState::DoubleQuoted;
                    current_has_content = true;
                }
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    state = LexState::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = LexState::BlockComment;
                }
                ';' => {
                    if current_has_content {
                        statements += 1;
                    }
                    current_has_content = false;
                }
                c if !c.is_whitespace() => current_has_content = true,
                _ => {}
            },
            LexState::SingleQuoted => {
                if c == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                    } else {
                        state = LexState::Plain;
                    }
                }
            }
            LexState::DoubleQuoted => {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                    } else {
                        state = LexState::Plain;
                    }
                }
            }
            LexState::LineComment => {
                if c == '\n' {
                    state = LexState::Plain;
                }
            }
            LexState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = LexState::Plain;
                }
            }
        }
    }
    if current_has_content {
        statements += 1;
    }

    if statements > 1 {
        return Err(ExplorerError::multiple_statements(format!(
            "expected a single statement, found {statements}"
        )));
    }
    Ok(())
}

/// Reject anything that is not a single read-only SELECT (or WITH ... SELECT).
///
/// The leading keyword is checked first so the error names what the caller
/// actually wrote (`INSERT`, `PRAGMA`, ...). Statements that pass the keyword
/// gate are parsed with the SQLite dialect; a parsed statement that is not a
/// plain query (the CTE-wrapped mutation case) is rejected with the operation
/// name. If the text does not parse at all, a conservative scan for top-level
/// mutating verbs is applied and otherwise the engine is left to report its
/// own syntax error at execution time.
pub fn ensure_read_only(sql: &str) -> ExplorerResult<()> {
    let Some(keyword) = leading_keyword(sql) else {
        return Err(ExplorerError::non_read_only("empty input"));
    };

    let keyword = keyword.to_ascii_uppercase();
    if keyword != "SELECT" && keyword != "WITH" {
        return Err(ExplorerError::non_read_only(keyword));
    }

    match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(parsed) => {
            for stmt in &parsed {
                if let Some(operation) = classify_statement(stmt) {
                    return Err(ExplorerError::non_read_only(operation));
                }
            }
            Ok(())
        }
        Err(_) => {
            // SQLite accepts some syntax sqlparser does not; the keyword gate
            // already passed, so only the trailing-verb bypass remains to check.
            match scan_mutating_verb(sql) {
                Some(verb) => Err(ExplorerError::non_read_only(verb)),
                None => Ok(()),
            }
        }
    }
}

/// Extract the first keyword of the statement, skipping leading whitespace
/// and comments.
fn leading_keyword(sql: &str) -> Option<&str> {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = match after.find('\n') {
                Some(idx) => after[idx + 1..].trim_start(),
                None => return None,
            };
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = match after.find("*/") {
                Some(idx) => after[idx + 2..].trim_start(),
                None => return None,
            };
        } else {
            break;
        }
    }

    let end = rest
        .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .unwrap_or(rest.len());
    if end == 0 { None } else { Some(&rest[..end]) }
}

/// Classify a parsed statement.
///
/// Returns `None` for read-only queries and the operation name for anything
/// that must be blocked. Only statement kinds SQLite can actually express are
/// spelled out; everything else falls through to a conservative reject.
fn classify_statement(stmt: &Statement) -> Option<&'static str> {
    match stmt {
        Statement::Query(_) => None,

        Statement::Insert(_) => Some("INSERT"),
        Statement::Update { .. } => Some("UPDATE"),
        Statement::Delete(_) => Some("DELETE"),
        Statement::Merge { .. } => Some("MERGE"),

        Statement::CreateTable { .. } => Some("CREATE TABLE"),
        Statement::CreateView { .. } => Some("CREATE VIEW"),
        Statement::CreateIndex(_) => Some("CREATE INDEX"),
        Statement::CreateVirtualTable { .. } => Some("CREATE VIRTUAL TABLE"),
        Statement::CreateTrigger { .. } => Some("CREATE TRIGGER"),
        Statement::AlterTable { .. } => Some("ALTER TABLE"),
        Statement::Drop { .. } => Some("DROP"),
        Statement::DropTrigger { .. } => Some("DROP TRIGGER"),
        Statement::Truncate { .. } => Some("TRUNCATE"),

        Statement::StartTransaction { .. } => Some("BEGIN"),
        Statement::Commit { .. } => Some("COMMIT"),
        Statement::Rollback { .. } => Some("ROLLBACK"),
        Statement::Savepoint { .. } => Some("SAVEPOINT"),
        Statement::ReleaseSavepoint { .. } => Some("RELEASE SAVEPOINT"),

        Statement::Pragma { .. } => Some("PRAGMA"),
        Statement::AttachDatabase { .. } => Some("ATTACH"),
        Statement::Vacuum { .. } => Some("VACUUM"),
        Statement::Analyze { .. } => Some("ANALYZE"),
        Statement::Set(_) => Some("SET"),
        Statement::Explain { .. } => Some("EXPLAIN"),

        _ => Some("unrecognized"),
    }
}

const MUTATING_VERBS: &[&str] = &[
    "INSERT", "UPDATE", "DELETE", "REPLACE", "MERGE", "CREATE", "DROP", "ALTER", "TRUNCATE",
    "ATTACH", "DETACH", "PRAGMA", "VACUUM", "REINDEX",
];

/// Scan for a mutating verb at the top level of the statement, outside
/// quotes, comments, and parentheses.
///
/// Fallback path for text sqlparser cannot parse: catches the trailing verb
/// of a `WITH ... AS (...) INSERT ...` clause without rejecting identifiers
/// that merely contain a verb as a substring.
fn scan_mutating_verb(sql: &str) -> Option<String> {
    let mut state = LexState::Plain;
    let mut depth = 0usize;
    let mut word = String::new();
    let mut chars = sql.chars().peekable();

    let check = |word: &str, depth: usize| -> Option<String> {
        if depth == 0 && !word.is_empty() {
            let upper = word.to_ascii_uppercase();
            if MUTATING_VERBS.contains(&upper.as_str()) {
                return Some(upper);
            }
        }
        None
    };

    while let Some(c) = chars.next() {
        match state {
            LexState::Plain => {
                if c.is_ascii_alphanumeric() || c == '_' {
                    word.push(c);
                    continue;
                }
                if let Some(found) = check(&word, depth) {
                    return Some(found);
                }
                word.clear();
                match c {
                    '\'' => state = LexState::SingleQuoted,
                    '"' => state = LexState::DoubleQuoted,
                    '-' if chars.peek() == Some(&'-') => {
                        chars.next();
                        state = LexState::LineComment;
                    }
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        state = LexState::BlockComment;
                    }
                    '(' => depth += 1,
                    ')' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }
            LexState::SingleQuoted => {
                if c == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                    } else {
                        state = LexState::Plain;
                    }
                }
            }
            LexState::DoubleQuoted => {
                if c == '"' {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                    } else {
                        state = LexState::Plain;
                    }
                }
            }
            LexState::LineComment => {
                if c == '\n' {
                    state = LexState::Plain;
                }
            }
            LexState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = LexState::Plain;
                }
            }
        }
    }
    check(&word, depth)
}
