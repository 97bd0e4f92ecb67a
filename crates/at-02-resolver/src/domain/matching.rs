//! Filter and ordering rules shared by in-process adapters.

use std::cmp::Ordering;

use serde_json::{Number, Value};
use shared_types::{render_value, AppliedFilter, FilterOp, Row};

use super::error::ResolverError;
use super::schema::ColumnSchema;

/// Total order over JSON values: null < bool < number < string < array < object.
///
/// Numbers compare by exact value regardless of integer/float representation.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => x.len().cmp(&y.len()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    match (integer(x), integer(y)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(i), None) => compare_int_float(i, y.as_f64().unwrap_or(f64::NAN)),
        (None, Some(i)) => compare_int_float(i, x.as_f64().unwrap_or(f64::NAN)).reverse(),
        (None, None) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            // -0.0 == 0.0, matching how integers compare against both
            x.partial_cmp(&y).unwrap_or_else(|| x.total_cmp(&y))
        }
    }
}

/// Exact comparison; casting `i` to f64 would round above 2^53.
fn compare_int_float(i: i128, f: f64) -> Ordering {
    const LIMIT: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0; // 2^127
    if f.is_nan() || f >= LIMIT {
        return Ordering::Less;
    }
    if f < -LIMIT {
        return Ordering::Greater;
    }
    let whole = f.trunc();
    // |whole| < 2^127 and integral, so the cast is exact
    match i.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)).unwrap_or(Ordering::Equal),
        ord => ord,
    }
}

/// Parse the value of an `in` filter.
///
/// JSON lists are accepted as is. Otherwise a literal list in `[...]` or
/// `(...)` with single- or double-quoted strings, numbers and
/// `True`/`False`/`None` is accepted too, as typed into a filter box.
pub fn parse_list_literal(raw: &str) -> Result<Vec<Value>, String> {
    if let Ok(items) = serde_json::from_str::<Vec<Value>>(raw) {
        return Ok(items);
    }

    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .or_else(|| trimmed.strip_prefix('(').and_then(|r| r.strip_suffix(')')))
        .ok_or_else(|| "expected a list like [1, 2] or ('a', 'b')".to_string())?;

    let mut items = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let Some(&first) = chars.peek() else { break };

        let item = if first == '\'' || first == '"' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(escaped) => text.push(escaped),
                        None => return Err("unterminated string".to_string()),
                    },
                    Some(c) if c == first => break,
                    Some(c) => text.push(c),
                    None => return Err("unterminated string".to_string()),
                }
            }
            Value::String(text)
        } else {
            let mut word = String::new();
            while let Some(c) = chars.next_if(|c| *c != ',' && !c.is_whitespace()) {
                word.push(c);
            }
            literal(&word)?
        };
        items.push(item);

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        match chars.next() {
            Some(',') | None => {}
            Some(c) => return Err(format!("unexpected '{c}'")),
        }
    }
    Ok(items)
}

fn literal(word: &str) -> Result<Value, String> {
    match word {
        "True" | "true" => Ok(Value::Bool(true)),
        "False" | "false" => Ok(Value::Bool(false)),
        "None" | "null" => Ok(Value::Null),
        _ => serde_json::from_str::<Number>(word)
            .map(Value::Number)
            .map_err(|_| format!("'{word}' is not a literal")),
    }
}

/// SQL `LIKE` matching: `%` matches any run, `_` any single character.
pub fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((bp, bt)) = backtrack {
            p = bp + 1;
            t = bt + 1;
            backtrack = Some((bp, bt + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

/// Wrap a pattern in `%…%` unless it already carries a `%`.
fn contains_pattern(raw: &str) -> String {
    if raw.contains('%') {
        raw.to_string()
    } else {
        format!("%{raw}%")
    }
}

#[derive(Debug, Clone)]
enum Test {
    Compare(FilterOp, Value),
    Like { pattern: String, case_insensitive: bool },
    In(Vec<Value>),
    IsNull,
    IsNotNull,
}

/// An `AppliedFilter` checked against a schema and ready to evaluate.
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    key: String,
    test: Test,
}

impl CompiledFilter {
    /// Validate `filter` against `column` and coerce its value.
    pub fn compile(column: &ColumnSchema, filter: &AppliedFilter) -> Result<Self, ResolverError> {
        let test = match &filter.op {
            op @ (FilterOp::Eq
            | FilterOp::Ne
            | FilterOp::Lt
            | FilterOp::Le
            | FilterOp::Gt
            | FilterOp::Ge) => Test::Compare(op.clone(), column.coerce(&filter.val)?),
            FilterOp::Like => Test::Like {
                pattern: contains_pattern(&filter.val),
                case_insensitive: false,
            },
            FilterOp::ILike => Test::Like {
                pattern: contains_pattern(&filter.val).to_lowercase(),
                case_insensitive: true,
            },
            FilterOp::In => {
                let items =
                    parse_list_literal(&filter.val).map_err(|reason| ResolverError::InvalidValue {
                        column: column.key.clone(),
                        value: filter.val.clone(),
                        reason,
                    })?;
                let items = items
                    .iter()
                    .map(|v| column.coerce_json(v))
                    .collect::<Result<Vec<_>, _>>()?;
                Test::In(items)
            }
            FilterOp::IsNull => Test::IsNull,
            FilterOp::IsNotNull => Test::IsNotNull,
            FilterOp::Other(op) => {
                return Err(ResolverError::UnsupportedOperator {
                    column: column.key.clone(),
                    op: op.clone(),
                })
            }
        };
        Ok(Self {
            key: column.key.clone(),
            test,
        })
    }

    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(&self.key).unwrap_or(&Value::Null);
        match &self.test {
            Test::IsNull => value.is_null(),
            Test::IsNotNull => !value.is_null(),
            // comparisons against null never match
            _ if value.is_null() => false,
            Test::Compare(op, expected) => {
                let ord = compare_values(value, expected);
                match op {
                    FilterOp::Eq => ord == Ordering::Equal,
                    FilterOp::Ne => ord != Ordering::Equal,
                    FilterOp::Lt => ord == Ordering::Less,
                    FilterOp::Le => ord != Ordering::Greater,
                    FilterOp::Gt => ord == Ordering::Greater,
                    FilterOp::Ge => ord != Ordering::Less,
                    _ => false,
                }
            }
            Test::Like {
                pattern,
                case_insensitive,
            } => {
                let text = render_value(value);
                if *case_insensitive {
                    like_match(&text.to_lowercase(), pattern)
                } else {
                    like_match(&text, pattern)
                }
            }
            Test::In(items) => items
                .iter()
                .any(|item| compare_values(value, item) == Ordering::Equal),
        }
    }
}
