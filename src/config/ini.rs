//! INI reader for sectioned settings files.
//!
//! Supported syntax:
//! - `[section]` headers; keys before the first header are top-level
//! - `;` and `#` comment lines, and trailing ` ;comment` on unquoted values
//! - `key = value`, with optional single or double quotes around the value
//! - `key[] = value` appends to a list, `key[name] = value` fills a mapping
//! - unquoted `true`/`on`/`yes` and `false`/`off`/`no`/`none` read as
//!   booleans, unquoted `null` as null; everything else is a string

use super::value::{ConfigTree, SettingValue};
use thiserror::Error;

/// Error raised for INI text that cannot be read.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IniError {
    #[error("line {line}: unterminated section header")]
    UnterminatedSection { line: usize },

    #[error("line {line}: expected `key = value`")]
    MissingEquals { line: usize },

    #[error("line {line}: empty key")]
    EmptyKey { line: usize },

    #[error("line {line}: unterminated quoted value")]
    UnterminatedQuote { line: usize },
}

/// Parse INI text into a settings tree.
pub fn parse_ini(text: &str) -> Result<ConfigTree, IniError> {
    let mut root = ConfigTree::new();
    // Section being filled, flushed into `root` at the next header
    let mut current: Option<(String, ConfigTree)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let end = rest
                .find(']')
                .ok_or(IniError::UnterminatedSection { line: line_no })?;
            let name = rest[..end].trim().to_string();

            if let Some((done, map)) = current.take() {
                root.insert(done, SettingValue::Mapping(map));
            }
            // Re-opening a section keeps what it already holds
            let map = match root.remove(&name) {
                Some(SettingValue::Mapping(map)) => map,
                _ => ConfigTree::new(),
            };
            current = Some((name, map));
            continue;
        }

        let (raw_key, raw_value) = line
            .split_once('=')
            .ok_or(IniError::MissingEquals { line: line_no })?;
        let value = parse_value(raw_value.trim(), line_no)?;
        let target = match current.as_mut() {
            Some((_, map)) => map,
            None => &mut root,
        };
        insert_key(target, raw_key.trim(), value, line_no)?;
    }

    if let Some((name, map)) = current {
        root.insert(name, SettingValue::Mapping(map));
    }

    Ok(root)
}

/// Insert `value` under `key`, expanding `key[]` and `key[name]` forms.
fn insert_key(
    target: &mut ConfigTree,
    key: &str,
    value: SettingValue,
    line: usize,
) -> Result<(), IniError> {
    let (base, index) = match key.split_once('[') {
        Some((base, rest)) if rest.ends_with(']') => {
            (base.trim(), Some(rest[..rest.len() - 1].trim()))
        }
        _ => (key, None),
    };

    if base.is_empty() {
        return Err(IniError::EmptyKey { line });
    }

    match index {
        None => {
            target.insert(base.to_string(), value);
        }
        Some("") => {
            let slot = target
                .entry(base.to_string())
                .or_insert_with(|| SettingValue::List(Vec::new()));
            match slot {
                SettingValue::List(items) => items.push(value),
                other => *other = SettingValue::List(vec![value]),
            }
        }
        Some(name) => {
            let slot = target
                .entry(base.to_string())
                .or_insert_with(|| SettingValue::Mapping(ConfigTree::new()));
            match slot {
                SettingValue::Mapping(map) => {
                    map.insert(name.to_string(), value);
                }
                other => {
                    let mut map = ConfigTree::new();
                    map.insert(name.to_string(), value);
                    *other = SettingValue::Mapping(map);
                }
            }
        }
    }

    Ok(())
}

fn parse_value(raw: &str, line: usize) -> Result<SettingValue, IniError> {
    for quote in ['"', '\''] {
        if let Some(rest) = raw.strip_prefix(quote) {
            let end = rest
                .find(quote)
                .ok_or(IniError::UnterminatedQuote { line })?;
            return Ok(SettingValue::String(rest[..end].to_string()));
        }
    }

    let unquoted = match raw.find(" ;").or_else(|| raw.find("\t;")) {
        Some(pos) => raw[..pos].trim_end(),
        None => raw,
    };

    Ok(match unquoted.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => SettingValue::Bool(true),
        "false" | "off" | "no" | "none" => SettingValue::Bool(false),
        "null" => SettingValue::Null,
        _ => SettingValue::String(unquoted.to_string()),
    })
}
