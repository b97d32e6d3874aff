//! JSON printer
//!
//! Renders a [`Value`] tree to text in either pretty or compact form.
//!
//! Pretty form is what goes on the wire: objects open with a newline, members
//! are tab-indented one level per depth and separated by comma plus newline,
//! and arrays stay on a single line with `", "` separators. Compact form has
//! no whitespace at all and is what [`Value`]'s `Display` shows.
//!
//! Containers render every child to its own string first, sum the rendered
//! lengths along with separators and indentation, and copy the pieces into a
//! single allocation of the right size.
//!
//! # Examples
//!
//! ```rust
//! use jrot_core::{printer, Value};
//!
//! let mut doc = Value::object();
//! doc.insert("id", 3);
//! doc.insert("tags", Value::from_iter([Value::from("a"), Value::from("b")]));
//!
//! assert_eq!(printer::print_compact(&doc), "{\"id\":3,\"tags\":[\"a\",\"b\"]}");
//! assert_eq!(printer::print(&doc), "{\n\t\"id\":\t3,\n\t\"tags\":\t[\"a\", \"b\"]\n}");
//! ```

use crate::value::{Member, Value};

/// Render a value in pretty (tab-indented) form.
pub fn print(value: &Value) -> String {
    print_value(value, 0, true)
}

/// Render a value in compact form.
pub fn print_compact(value: &Value) -> String {
    print_value(value, 0, false)
}

fn print_value(value: &Value, depth: usize, fmt: bool) -> String {
    match value.resolve() {
        Value::Null => "null".to_string(),
        Value::Bool(true) => "true".to_string(),
        Value::Bool(false) => "false".to_string(),
        Value::Number(n) => print_number(*n),
        Value::String(s) => print_string(s),
        Value::Array(items) => print_array(items, depth, fmt),
        Value::Object(members) => print_object(members, depth, fmt),
        // resolve() never returns Shared
        Value::Shared(_) => unreachable!(),
    }
}

/// Number formatting rules, in order:
///
/// 1. non-finite values have no JSON form and render as `null`;
/// 2. magnitudes below 1e-6 or above 1e9 use scientific notation;
/// 3. values that fit `i32` exactly render as a plain integer literal;
/// 4. values integral within `f64::EPSILON` render fixed with no fraction;
/// 5. everything else renders in the shortest fixed form.
fn print_number(n: f64) -> String {
    if !n.is_finite() {
        return "null".to_string();
    }
    if n != 0.0 && (n.abs() < 1.0e-6 || n.abs() > 1.0e9) {
        return format!("{:e}", n);
    }
    let alias = n as i32;
    if (n - f64::from(alias)).abs() <= f64::EPSILON
        && n <= f64::from(i32::MAX)
        && n >= f64::from(i32::MIN)
    {
        return format!("{}", alias);
    }
    if (n.floor() - n).abs() <= f64::EPSILON {
        return format!("{:.0}", n);
    }
    format!("{}", n)
}

/// Escape a string per the reverse of the parser's escape table; control
/// characters below 0x20 render as `\u00XX`.
fn print_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn print_array(items: &[Value], depth: usize, fmt: bool) -> String {
    let rendered: Vec<String> = items
        .iter()
        .map(|item| print_value(item, depth + 1, fmt))
        .collect();

    let separator_len = if fmt { 2 } else { 1 };
    let content: usize = rendered
        .iter()
        .map(|r| r.len() + separator_len)
        .sum();

    let mut out = String::with_capacity(content + 2);
    out.push('[');
    for (i, r) in rendered.iter().enumerate() {
        if i > 0 {
            out.push(',');
            if fmt {
                out.push(' ');
            }
        }
        out.push_str(r);
    }
    out.push(']');
    out
}

fn print_object(members: &[Member], depth: usize, fmt: bool) -> String {
    let depth = depth + 1;
    let names: Vec<String> = members.iter().map(|m| print_string(&m.key)).collect();
    let rendered: Vec<String> = members
        .iter()
        .map(|m| print_value(&m.value, depth, fmt))
        .collect();

    let per_member_overhead = if fmt { depth + 4 } else { 2 };
    let content: usize = names
        .iter()
        .zip(&rendered)
        .map(|(n, r)| n.len() + r.len() + per_member_overhead)
        .sum();

    let mut out = String::with_capacity(content + depth + 2);
    out.push('{');
    if fmt {
        out.push('\n');
    }
    for i in 0..members.len() {
        if fmt {
            for _ in 0..depth {
                out.push('\t');
            }
        }
        out.push_str(&names[i]);
        out.push(':');
        if fmt {
            out.push('\t');
        }
        out.push_str(&rendered[i]);
        if i + 1 != members.len() {
            out.push(',');
        }
        if fmt {
            out.push('\n');
        }
    }
    if fmt {
        for _ in 0..depth - 1 {
            out.push('\t');
        }
    }
    out.push('}');
    out
}
