//! Lexical scanning of style expressions.
//!
//! A deliberately small scanner: it skips comments and string literals,
//! finds calls to a fixed set of function names, and parses flat object
//! literals. No AST is built.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// A call expression like `css({ bg: "red" })`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call<'a> {
    /// Callee name.
    pub name: &'a str,
    /// Byte range of the whole call, callee included.
    pub range: Range<usize>,
    /// Text between the parentheses, trimmed.
    pub arg: &'a str,
}

/// A literal value inside a style object.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Num(f64),
}

/// Matches `import ... from "pkg"` and bare `import "pkg"` statements.
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[^;"']*?\s+from\s+)?["']([^"']+)["']"#)
        .expect("import pattern is valid")
});

/// Packages imported by `code`, with the byte range of each specifier.
pub fn imports(code: &str) -> Vec<(&str, Range<usize>)> {
    IMPORT_RE
        .captures_iter(code)
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.as_str(), m.range()))
        .collect()
}

/// Find every call to one of `names` outside strings and comments.
///
/// Calls are not searched recursively: text inside a matched call's
/// parentheses is skipped.
pub fn find_calls<'a>(code: &'a str, names: &[&str]) -> Result<Vec<Call<'a>>, String> {
    let bytes = code.as_bytes();
    let mut calls = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => i = skip_line_comment(bytes, i),
            b'/' if bytes.get(i + 1) == Some(&b'*') => i = skip_block_comment(bytes, i)?,
            b'"' | b'\'' | b'`' => i = skip_string(bytes, i)?,
            b if is_ident_start(b) => {
                let start = i;
                while i < bytes.len() && is_ident_continue(bytes[i]) {
                    i += 1;
                }
                let ident = &code[start..i];
                if !names.contains(&ident) || is_member_access(bytes, start) {
                    continue;
                }
                let open = skip_whitespace(bytes, i);
                if bytes.get(open) != Some(&b'(') {
                    continue;
                }
                let close = matching_paren(bytes, open)
                    .ok_or_else(|| format!("unbalanced `{ident}(` call"))?;
                calls.push(Call {
                    name: ident,
                    range: start..close + 1,
                    arg: code[open + 1..close].trim(),
                });
                i = close + 1;
            }
            _ => i += 1,
        }
    }

    Ok(calls)
}

/// Parse a flat object literal `{ key: "value", other: 1 }`.
pub fn parse_object(arg: &str) -> Result<Vec<(String, Literal)>, String> {
    let inner = arg
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| "expected an object literal".to_string())?;

    let mut entries = Vec::new();
    for entry in split_top_level(inner)? {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (key, value) = entry
            .split_once(':')
            .ok_or_else(|| format!("expected `key: value`, found `{entry}`"))?;
        let key = unquote(key.trim()).unwrap_or_else(|| key.trim().to_string());
        if key.is_empty() || !key.bytes().all(|b| is_ident_continue(b) || b == b'-') {
            return Err(format!("unsupported key `{key}`"));
        }
        entries.push((key, parse_literal(value.trim())?));
    }
    Ok(entries)
}

/// Parse a template literal without substitutions.
pub fn parse_template(arg: &str) -> Result<&str, String> {
    let inner = arg
        .strip_prefix('`')
        .and_then(|s| s.strip_suffix('`'))
        .ok_or_else(|| "expected a template literal".to_string())?;
    if inner.contains("${") {
        return Err("template substitutions are not supported".into());
    }
    Ok(inner)
}

fn parse_literal(value: &str) -> Result<Literal, String> {
    if let Some(s) = unquote(value) {
        return Ok(Literal::Str(s));
    }
    value
        .parse::<f64>()
        .map(Literal::Num)
        .map_err(|_| format!("dynamic value `{value}` cannot be extracted"))
}

fn unquote(s: &str) -> Option<String> {
    let quote = s.chars().next().filter(|c| matches!(c, '"' | '\''))?;
    let inner = s.strip_prefix(quote)?.strip_suffix(quote)?;
    Some(inner.replace(&format!("\\{quote}"), &quote.to_string()))
}

/// Split on commas that are not inside strings or brackets.
fn split_top_level(s: &str) -> Result<Vec<&str>, String> {
    let bytes = s.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'{' | b'[' | b'(' => depth += 1,
            b'}' | b']' | b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if depth > 0 && bytes[i] == b'{' {
            return Err("nested objects are not supported".into());
        }
        i += 1;
    }
    parts.push(&s[start..]);
    Ok(parts)
}

// =============================================================================
// Byte-level helpers
// =============================================================================

const fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

const fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_member_access(bytes: &[u8], ident_start: usize) -> bool {
    bytes[..ident_start]
        .iter()
        .rev()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|&b| b == b'.')
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn skip_line_comment(bytes: &[u8], i: usize) -> usize {
    bytes[i..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| i + p + 1)
}

fn skip_block_comment(bytes: &[u8], i: usize) -> Result<usize, String> {
    bytes[i + 2..]
        .windows(2)
        .position(|w| w == b"*/")
        .map(|p| i + 2 + p + 2)
        .ok_or_else(|| "unterminated block comment".to_string())
}

/// Returns the index just past the closing quote.
fn skip_string(bytes: &[u8], i: usize) -> Result<usize, String> {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return Ok(j + 1),
            b'\n' if quote != b'`' => break,
            _ => j += 1,
        }
    }
    Err("unterminated string literal".into())
}

/// Index of the `)` matching the `(` at `open`.
fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' | b'`' => {
                i = skip_string(bytes, i).ok()?;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
