//! Text helpers: static or generated text, titles and `$field` templates.

use std::fmt;
use std::sync::Arc;

use shared_types::{render_value, Row};

type TextFn = Arc<dyn Fn(Option<&Row>) -> String + Send + Sync>;

/// Text that is either fixed or generated on every request.
///
/// Generated text receives the current entry on detail views and `None`
/// everywhere else.
#[derive(Clone)]
pub enum TextSource {
    Static(String),
    Generated(TextFn),
}

impl TextSource {
    pub fn generated<F>(f: F) -> Self
    where
        F: Fn(Option<&Row>) -> String + Send + Sync + 'static,
    {
        TextSource::Generated(Arc::new(f))
    }

    pub fn render(&self, entry: Option<&Row>) -> String {
        match self {
            TextSource::Static(s) => s.clone(),
            TextSource::Generated(f) => f(entry),
        }
    }
}

impl fmt::Debug for TextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextSource::Static(s) => f.debug_tuple("Static").field(s).finish(),
            TextSource::Generated(_) => f.write_str("Generated(..)"),
        }
    }
}

impl From<&str> for TextSource {
    fn from(s: &str) -> Self {
        TextSource::Static(s.to_string())
    }
}

impl From<String> for TextSource {
    fn from(s: String) -> Self {
        TextSource::Static(s)
    }
}

/// `"send_mail"` -> `"Send Mail"`.
pub fn title_case(reference: &str) -> String {
    reference
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Substitute `$name` and `${name}` placeholders from `entry`.
///
/// `$$` yields a literal `$`. Placeholders naming a missing field, and a
/// `$` not followed by a name, are left as written.
pub fn render_template(template: &str, entry: &Row) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) if is_identifier(&braced[..end]) => (&braced[..end], end + 2),
                _ => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            let name = &after[..end];
            if is_identifier(name) {
                (name, end)
            } else {
                ("", 0)
            }
        };

        match entry.get(name) {
            Some(value) if consumed > 0 => {
                out.push_str(&render_value(value));
                rest = &after[consumed..];
            }
            _ => {
                out.push('$');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry() -> Row {
        json!({"name": "Ann", "id": 7, "email_2": "a@b.c"})
            .as_object()
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("send_mail"), "Send Mail");
        assert_eq!(title_case("reset"), "Reset");
        assert_eq!(title_case("API_key"), "Api Key");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_template_substitution() {
        assert_eq!(render_template("User ${name} (#$id)", &entry()), "User Ann (#7)");
        assert_eq!(render_template("$email_2!", &entry()), "a@b.c!");
    }

    #[test]
    fn test_template_safe_substitute() {
        assert_eq!(render_template("${missing} $nope", &entry()), "${missing} $nope");
        assert_eq!(render_template("cost: $5 $$ ${", &entry()), "cost: $5 $ ${");
        assert_eq!(render_template("end $", &entry()), "end $");
    }

    #[test]
    fn test_text_source() {
        let s = TextSource::from("fixed");
        assert_eq!(s.render(None), "fixed");

        let g = TextSource::generated(|row| match row {
            Some(r) => format!("has {} fields", r.len()),
            None => "no entry".into(),
        });
        assert_eq!(g.render(None), "no entry");
        assert_eq!(g.render(Some(&entry())), "has 3 fields");
    }
}
