//! [`Value`] to rison text.

use crate::read::{is_not_id_char, NOT_ID_START_CHARS};
use crate::parse::WHITESPACE;
use crate::value::Value;
use crate::Mode;

/// Render `value` as rison. Only the outermost container is affected by
/// `mode`; nested values are always fully wrapped.
pub fn render(value: &Value, mode: Mode) -> String {
    let mut out = String::new();
    match (mode, value) {
        (Mode::Object, Value::Object(object)) => {
            for (i, (key, value)) in object.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_entry(&mut out, key, value);
            }
        }
        (Mode::Array, Value::Array(array)) => write_elements(&mut out, array),
        _ => write_value(&mut out, value),
    }
    out
}

/// Append the standard rendering of `value` to `out`.
pub fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("!n"),
        Value::Bool(true) => out.push_str("!t"),
        Value::Bool(false) => out.push_str("!f"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_str(out, s),
        Value::Array(array) => {
            out.push_str("!(");
            write_elements(out, array);
            out.push(')');
        }
        Value::Object(object) => {
            out.push('(');
            for (i, (key, value)) in object.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_entry(out, key, value);
            }
            out.push(')');
        }
    }
}

fn write_elements(out: &mut String, array: &[Value]) {
    for (i, value) in array.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        write_value(out, value);
    }
}

fn write_entry(out: &mut String, key: &str, value: &Value) {
    write_str(out, key);
    out.push(':');
    write_value(out, value);
}

/// Strings that would read back as a bare identifier are written as is;
/// anything else is quoted.
fn write_str(out: &mut String, s: &str) {
    if is_ident(s) {
        out.push_str(s);
        return;
    }
    out.push('\'');
    for ch in s.chars() {
        if ch == '!' || ch == '\'' {
            out.push('!');
        }
        out.push(ch);
    }
    out.push('\'');
}

fn is_ident(s: &str) -> bool {
    match s.as_bytes().first() {
        None => false,
        Some(b) if NOT_ID_START_CHARS.contains(b) => false,
        Some(_) => !s.chars().any(|ch| is_not_id_char(ch) || WHITESPACE.contains(ch)),
    }
}
