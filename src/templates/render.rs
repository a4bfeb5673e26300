//! Template Compilation and Rendering
//!
//! Template sources are parsed once into a sequence of literal and
//! placeholder segments; rendering is a single pass over the segments
//! against a JSON context. `{{path.to.field}}` substitutes the
//! HTML-escaped value at that dotted path, `{{{path}}}` substitutes it
//! unescaped, and anything unresolvable renders as the empty string.

use serde_json::Value;

/// A template source compiled into renderable segments.
#[derive(Debug, Clone)]
pub struct CompiledTemplate {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Literal(String),
    Field { path: Vec<String>, raw: bool },
}

impl CompiledTemplate {
    /// Parse a template source.
    ///
    /// Lenient by design: malformed or unterminated placeholders are kept
    /// as literal text instead of failing the compile.
    pub fn compile(source: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            literal.push_str(&rest[..start]);
            let after = &rest[start..];

            let raw = after.starts_with("{{{");
            let (open_len, close) = if raw { (3, "}}}") } else { (2, "}}") };

            match after[open_len..].find(close) {
                Some(end) => {
                    let consumed = open_len + end + close.len();
                    let expr = after[open_len..open_len + end].trim();

                    if let Some(path) = parse_path(expr) {
                        if !literal.is_empty() {
                            segments.push(Segment::Literal(std::mem::take(&mut literal)));
                        }
                        segments.push(Segment::Field { path, raw });
                    } else {
                        literal.push_str(&after[..consumed]);
                    }
                    rest = &after[consumed..];
                }
                None => {
                    literal.push_str(after);
                    rest = "";
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// Render against a JSON context.
    pub fn render(&self, context: &Value) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { path, raw } => {
                    let text = lookup(context, path).map(value_to_text).unwrap_or_default();
                    if *raw {
                        out.push_str(&text);
                    } else {
                        out.push_str(&escape_html(&text));
                    }
                }
            }
        }
        out
    }
}

fn parse_path(expr: &str) -> Option<Vec<String>> {
    if expr.is_empty() {
        return None;
    }
    let segments: Vec<&str> = expr.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments.iter().map(|s| s.to_string()).collect())
}

fn lookup<'a>(context: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = context;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Null and composite values render empty rather than leaking JSON
        _ => String::new(),
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
