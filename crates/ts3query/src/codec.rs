//! The wire argument codec: encoding typed records to the ServerQuery
//! key=value grammar and decoding the inverse, including the embedded-record
//! composition and type coercion rules the catalog relies on.

use std::collections::HashMap;

use crate::error::Error;

/// A single decoded wire value, typed per the decode contract.
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Str(String),
    Int(i64),
    Float(f64),
    IntList(Vec<i64>),
    FloatList(Vec<f64>),
}

/// Key → typed value map produced by [`decode_arg_map`].
///
/// Unknown keys are kept (and simply never read by a [`Decode`] impl);
/// missing keys fall back to each accessor's zero value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgMap(HashMap<String, RawValue>);

impl ArgMap {
    pub fn get_string(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(RawValue::Str(s)) => s.clone(),
            Some(RawValue::Int(i)) => i.to_string(),
            Some(RawValue::Float(f)) => f.to_string(),
            Some(RawValue::IntList(v)) => v.first().map(i64::to_string).unwrap_or_default(),
            Some(RawValue::FloatList(v)) => v.first().map(f64::to_string).unwrap_or_default(),
            None => String::new(),
        }
    }

    pub fn get_int(&self, key: &str) -> i64 {
        match self.0.get(key) {
            Some(RawValue::Int(i)) => *i,
            Some(RawValue::Float(f)) => *f as i64,
            Some(RawValue::IntList(v)) if v.len() == 1 => v[0],
            Some(RawValue::FloatList(v)) if v.len() == 1 => v[0] as i64,
            Some(RawValue::Str(s)) => s.parse().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get_int(key) == 1
    }

    pub fn get_int_list(&self, key: &str) -> Vec<i64> {
        match self.0.get(key) {
            Some(RawValue::IntList(v)) => v.clone(),
            Some(RawValue::Int(i)) => vec![*i],
            Some(RawValue::FloatList(v)) => v.iter().map(|f| *f as i64).collect(),
            Some(RawValue::Str(s)) if s.is_empty() => Vec::new(),
            _ => Vec::new(),
        }
    }
}

/// Accumulates `key=value` wire tokens in declaration order for one record.
#[derive(Default)]
pub struct ArgWriter {
    tokens: Vec<String>,
}

impl ArgWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_string(&mut self, key: &str, value: &str) {
        self.tokens.push(format!("{key}={}", encode_string(value)));
    }

    pub fn push_int(&mut self, key: &str, value: i64) {
        self.tokens.push(format!("{key}={}", encode_int(value)));
    }

    pub fn push_bool(&mut self, key: &str, value: bool) {
        self.tokens.push(format!("{key}={}", encode_bool(value)));
    }

    pub fn push_int_list(&mut self, key: &str, values: &[i64]) {
        self.tokens.push(format!("{key}={}", encode_int_list(values)));
    }

    /// Skips the field entirely when `value` is absent, per the
    /// null/pointer-typed-field encoding rule.
    pub fn push_opt_string(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value {
            self.push_string(key, value);
        }
    }

    pub fn finish(self) -> String {
        self.tokens.join(" ")
    }
}

/// A record that can be flattened onto the wire, including embedded siblings.
pub trait WireEncode {
    fn encode(&self, w: &mut ArgWriter);
}

/// A record that can be rebuilt from a decoded argument map.
///
/// Embedded fields share the parent's key namespace: a nested record's
/// `decode` is simply called again with the same [`ArgMap`].
pub trait WireDecode: Sized {
    fn decode(map: &ArgMap) -> Self;
}

/// Quotes `s` for the wire, escaping the full table from spec §6: the quote
/// character itself, the escape character, the record delimiter `|`, and
/// every control byte that would break line framing or round-trip lossily.
/// A literal space is left untouched — the enclosing quotes already make it
/// unambiguous to the quote-aware tokenizer in [`tokenize`], matching what
/// the reference server actually emits.
pub fn encode_string(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            '|' => out.push_str("\\p"),
            '/' => out.push_str("\\/"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '\0' => out.push_str("\\0"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn encode_int(i: i64) -> String {
    i.to_string()
}

pub fn encode_bool(b: bool) -> String {
    if b { "1" } else { "0" }.to_string()
}

pub fn encode_int_list(values: &[i64]) -> String {
    values
        .iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            Some('p') => out.push('|'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Quote-aware split of an argument region into raw `key=value` tokens.
fn tokenize(args: &str) -> Result<Vec<&str>, Error> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    let mut in_quotes = false;
    let mut chars = args.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if start.is_none() {
            if ch.is_whitespace() {
                continue;
            }
            start = Some(idx);
        }

        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                chars.next();
            }
            c if c.is_whitespace() && !in_quotes => {
                tokens.push(&args[start.unwrap()..idx]);
                start = None;
            }
            _ => {}
        }
    }

    if let Some(s) = start {
        tokens.push(&args[s..]);
    }
    if in_quotes {
        return Err(Error::Decoding("unterminated quoted value".into()));
    }
    Ok(tokens)
}

fn classify_value(raw: &str) -> RawValue {
    if raw.is_empty() {
        return RawValue::Str(String::new());
    }
    if let Some(stripped) = raw.strip_prefix('"') {
        let inner = stripped.strip_suffix('"').unwrap_or(stripped);
        return RawValue::Str(unescape(inner));
    }

    let starts_with_digit = raw.starts_with(|c: char| c.is_ascii_digit());
    if starts_with_digit && !raw.contains(' ') {
        if raw.contains(',') {
            let parts: Vec<&str> = raw.split(',').collect();
            if raw.contains('.') {
                if let Some(vals) = parts
                    .iter()
                    .map(|p| p.parse::<f64>().ok())
                    .collect::<Option<Vec<_>>>()
                {
                    return RawValue::FloatList(vals);
                }
            } else if let Some(vals) = parts
                .iter()
                .map(|p| p.parse::<i64>().ok())
                .collect::<Option<Vec<_>>>()
            {
                return RawValue::IntList(vals);
            }
        } else if raw.contains('.') {
            if let Ok(f) = raw.parse::<f64>() {
                return RawValue::Float(f);
            }
        } else if let Ok(i) = raw.parse::<i64>() {
            return RawValue::Int(i);
        }
    }

    RawValue::Str(raw.to_string())
}

/// Decodes one argument region (no leading command/event name) into a map.
pub fn decode_arg_map(args: &str) -> Result<ArgMap, Error> {
    let mut map = HashMap::new();
    for tok in tokenize(args.trim())? {
        let (key, raw) = tok
            .split_once('=')
            .ok_or_else(|| Error::Decoding(format!("malformed argument token: {tok}")))?;
        if key.is_empty() {
            return Err(Error::Decoding(format!("argument token missing key: {tok}")));
        }
        map.insert(key.to_string(), classify_value(raw));
    }
    Ok(ArgMap(map))
}

/// Splits a multi-record payload line on the `|` delimiter into per-record
/// argument regions.
pub fn split_records(payload: &str) -> Vec<&str> {
    if payload.trim().is_empty() {
        return Vec::new();
    }
    payload.split('|').collect()
}
