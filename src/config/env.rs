//! Environment placeholder substitution for the environment override layer.
//!
//! String values may embed `{{NAME}}` placeholders. The grammar is the opener
//! `{{`, a name of zero or more characters other than `}`, and the closer
//! `}}`. Each name is looked up verbatim as an environment variable.
//!
//! A key whose placeholders all resolve gets the substituted (and coerced)
//! value. A key with any undefined variable is dropped and reported. List and
//! mapping values are not scanned.

use super::value::{ConfigTree, Number, SettingValue};
use regex_lite::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^}]*)\}\}").expect("placeholder pattern compiles"));

/// Source of environment variable values.
pub trait Environment {
    /// Look up a variable by exact name.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        if name.is_empty() {
            return None;
        }
        // Set but not valid UTF-8 still counts as defined
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl Environment for BTreeMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

impl<E: Environment + ?Sized> Environment for &E {
    fn var(&self, name: &str) -> Option<String> {
        (**self).var(name)
    }
}

/// An environment variable referenced by a placeholder but not defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvDiagnostic {
    pub section: String,
    pub key: String,
    pub variable: String,
}

impl fmt::Display for EnvDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "environment var '{}' not defined in config section [{}], setting '{}'",
            self.variable, self.section, self.key
        )
    }
}

/// Result of substituting placeholders in an override tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvResolution {
    /// Override tree with resolved values; unresolved keys and empty
    /// sections removed.
    pub settings: ConfigTree,
    /// One entry per distinct undefined variable, per key.
    pub diagnostics: Vec<EnvDiagnostic>,
}

/// Names of all placeholders in `value`, in order of appearance.
///
/// Values that lack either `{{` or `}}` yield nothing.
pub fn placeholder_names(value: &str) -> Vec<&str> {
    if !(value.contains("{{") && value.contains("}}")) {
        return Vec::new();
    }
    PLACEHOLDER
        .captures_iter(value)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Coerce substituted text into a typed value.
///
/// Exactly `true` and `false` become booleans, text that is entirely a
/// decimal number becomes a number, anything else stays a string.
pub fn coerce(text: String) -> SettingValue {
    match text.as_str() {
        "true" => return SettingValue::Bool(true),
        "false" => return SettingValue::Bool(false),
        _ => {}
    }
    match parse_number(&text) {
        Some(n) => SettingValue::Number(n),
        None => SettingValue::String(text),
    }
}

/// Parse decimal numeric syntax: optional surrounding whitespace, optional
/// sign, digits with an optional fraction, optional exponent.
fn parse_number(text: &str) -> Option<Number> {
    let trimmed = text.trim();
    if !is_numeric_syntax(trimmed) {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::Int(i));
    }
    trimmed.parse::<f64>().ok().map(Number::Float)
}

fn is_numeric_syntax(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut digits = i - int_start;

    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        digits += i - frac_start;
    }

    if digits == 0 {
        return false;
    }

    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if matches!(bytes.get(i), Some(b'+' | b'-')) {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return false;
        }
    }

    i == bytes.len()
}

/// Outcome of substituting a single string.
enum Substitution {
    /// No placeholder found; keep the value as written.
    Unchanged,
    Resolved(SettingValue),
    /// Undefined variable names, deduplicated, in order of first appearance.
    Missing(Vec<String>),
}

fn substitute(value: &str, env: &impl Environment) -> Substitution {
    let names = placeholder_names(value);
    if names.is_empty() {
        return Substitution::Unchanged;
    }

    let mut found: HashMap<&str, String> = HashMap::new();
    let mut missing: Vec<String> = Vec::new();
    for name in names {
        if found.contains_key(name) || missing.iter().any(|m| m == name) {
            continue;
        }
        match env.var(name) {
            Some(v) => {
                found.insert(name, v);
            }
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Substitution::Missing(missing);
    }

    // Single pass: substituted text is never rescanned
    let replaced = PLACEHOLDER.replace_all(value, |caps: &regex_lite::Captures<'_>| {
        caps.get(1)
            .and_then(|m| found.get(m.as_str()))
            .cloned()
            .unwrap_or_default()
    });
    Substitution::Resolved(coerce(replaced.into_owned()))
}

/// Substitute `{{NAME}}` placeholders in every section of `config`.
///
/// `config` is the environment override tree, keyed like the user
/// settings file. The input is left untouched.
pub fn apply_env_overrides(config: &ConfigTree, env: &impl Environment) -> EnvResolution {
    let mut settings = ConfigTree::new();
    let mut diagnostics = Vec::new();

    for (section, options) in config {
        let SettingValue::Mapping(options) = options else {
            settings.insert(section.clone(), options.clone());
            continue;
        };

        let mut resolved = ConfigTree::new();
        for (key, value) in options {
            match value {
                SettingValue::String(text) => match substitute(text, env) {
                    Substitution::Unchanged => {
                        resolved.insert(key.clone(), value.clone());
                    }
                    Substitution::Resolved(new_value) => {
                        resolved.insert(key.clone(), new_value);
                    }
                    Substitution::Missing(names) => {
                        diagnostics.extend(names.into_iter().map(|variable| EnvDiagnostic {
                            section: section.clone(),
                            key: key.clone(),
                            variable,
                        }));
                    }
                },
                SettingValue::List(_) | SettingValue::Mapping(_) => {
                    debug!(
                        section = %section,
                        key = %key,
                        "nested values are not scanned for placeholders"
                    );
                    resolved.insert(key.clone(), value.clone());
                }
                SettingValue::Null | SettingValue::Bool(_) | SettingValue::Number(_) => {
                    resolved.insert(key.clone(), value.clone());
                }
            }
        }

        if !resolved.is_empty() {
            settings.insert(section.clone(), SettingValue::Mapping(resolved));
        }
    }

    EnvResolution {
        settings,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ini::parse_ini;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_variable_counts_as_defined() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = "SETTINGS_RESOLVER_TEST_NON_UTF8_VALUE";
        // SAFETY: the name is unique to this test, no other thread reads it
        unsafe { std::env::set_var(name, OsStr::from_bytes(b"pass\xffword")) };

        let value = ProcessEnvironment.var(name);
        assert_eq!(value.as_deref(), Some("pass\u{FFFD}word"));

        let config = parse_ini(&format!("[sql]\npassword = {{{{{}}}}}\n", name)).unwrap();
        let resolved = apply_env_overrides(&config, &ProcessEnvironment);
        assert!(resolved.diagnostics.is_empty());

        unsafe { std::env::remove_var(name) };
    }

    fn section<'a>(tree: &'a ConfigTree, name: &str) -> &'a ConfigTree {
        tree[name].as_mapping().unwrap()
    }

    #[test]
    fn test_placeholder_grammar() {
        assert_eq!(placeholder_names("{{FOO}}"), vec!["FOO"]);
        assert_eq!(
            placeholder_names("mysql://{{USER}}:{{PASS}}@db"),
            vec!["USER", "PASS"]
        );
        assert_eq!(placeholder_names("{{}}"), vec![""]);
        assert_eq!(placeholder_names("{{ spaced name }}"), vec![" spaced name "]);
        assert!(placeholder_names("plain").is_empty());
        assert!(placeholder_names("{FOO}").is_empty());
        assert!(placeholder_names("{{FOO}").is_empty());
        assert!(placeholder_names("}} {{").is_empty());
        // A closing brace ends the name
        assert!(placeholder_names("{{A}B}}").is_empty());
    }

    #[test]
    fn test_coerce() {
        assert_eq!(coerce("true".into()), SettingValue::Bool(true));
        assert_eq!(coerce("false".into()), SettingValue::Bool(false));
        assert_eq!(coerce("TRUE".into()), SettingValue::from("TRUE"));
        assert_eq!(coerce("42".into()), SettingValue::from(42i64));
        assert_eq!(coerce("-7".into()), SettingValue::from(-7i64));
        assert_eq!(coerce("+3".into()), SettingValue::from(3i64));
        assert_eq!(coerce("3.5".into()), SettingValue::from(3.5));
        assert_eq!(coerce(".5".into()), SettingValue::from(0.5));
        assert_eq!(coerce("1e3".into()), SettingValue::from(1000.0));
        assert_eq!(coerce(" 8 ".into()), SettingValue::from(8i64));
        assert_eq!(coerce("42abc".into()), SettingValue::from("42abc"));
        assert_eq!(coerce("inf".into()), SettingValue::from("inf"));
        assert_eq!(coerce("NaN".into()), SettingValue::from("NaN"));
        assert_eq!(coerce("0x1A".into()), SettingValue::from("0x1A"));
        assert_eq!(coerce(".".into()), SettingValue::from("."));
        assert_eq!(coerce("1e".into()), SettingValue::from("1e"));
        assert_eq!(coerce("".into()), SettingValue::from(""));
    }

    #[test]
    fn test_resolves_placeholder() {
        let config = parse_ini("[s]\nk = {{FOO}}\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[("FOO", "bar")]));
        assert!(result.diagnostics.is_empty());
        assert_eq!(section(&result.settings, "s")["k"], SettingValue::from("bar"));
    }

    #[test]
    fn test_unresolved_placeholder_prunes_key_and_section() {
        let config = parse_ini("[s]\nk = {{BAZ}}\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[]));
        assert!(result.settings.is_empty());
        assert_eq!(
            result.diagnostics,
            vec![EnvDiagnostic {
                section: "s".into(),
                key: "k".into(),
                variable: "BAZ".into(),
            }]
        );
    }

    #[test]
    fn test_unresolved_key_dropped_siblings_kept() {
        let config = parse_ini("[sql]\nuser = {{DB_USER}}\npass = {{DB_PASS}}\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[("DB_USER", "admin")]));
        let sql = section(&result.settings, "sql");
        assert_eq!(sql.len(), 1);
        assert_eq!(sql["user"], SettingValue::from("admin"));
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].key, "pass");
    }

    #[test]
    fn test_coerces_substituted_values() {
        let config = parse_ini(
            "[s]\nflag = {{FLAG}}\nport = {{PORT}}\nname = {{NAME}}\nratio = {{RATIO}}\n",
        )
        .unwrap();
        let vars = env(&[
            ("FLAG", "true"),
            ("PORT", "42"),
            ("NAME", "42abc"),
            ("RATIO", "0.25"),
        ]);
        let result = apply_env_overrides(&config, &vars);
        let s = section(&result.settings, "s");
        assert_eq!(s["flag"], SettingValue::Bool(true));
        assert_eq!(s["port"], SettingValue::from(42i64));
        assert_eq!(s["name"], SettingValue::from("42abc"));
        assert_eq!(s["ratio"], SettingValue::from(0.25));
    }

    #[test]
    fn test_multiple_placeholders_in_one_value() {
        let config = parse_ini("[s]\ndsn = {{USER}}@{{HOST}}:{{USER}}\n").unwrap();
        let vars = env(&[("USER", "admin"), ("HOST", "db")]);
        let result = apply_env_overrides(&config, &vars);
        assert_eq!(
            section(&result.settings, "s")["dsn"],
            SettingValue::from("admin@db:admin")
        );
    }

    #[test]
    fn test_one_diagnostic_per_distinct_missing_variable() {
        let config = parse_ini("[s]\nk = {{A}}-{{B}}-{{A}}-{{C}}\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[("B", "set")]));
        let vars: Vec<&str> = result
            .diagnostics
            .iter()
            .map(|d| d.variable.as_str())
            .collect();
        assert_eq!(vars, vec!["A", "C"]);
        assert!(result.settings.is_empty());
    }

    #[test]
    fn test_substituted_text_is_not_rescanned() {
        let config = parse_ini("[s]\nk = {{OUTER}}\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[("OUTER", "{{INNER}}")]));
        assert!(result.diagnostics.is_empty());
        assert_eq!(
            section(&result.settings, "s")["k"],
            SettingValue::from("{{INNER}}")
        );
    }

    #[test]
    fn test_nested_values_left_untouched() {
        let config = parse_ini("[s]\nhosts[] = {{MISSING}}\nlimits[max] = {{MISSING}}\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[]));
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.settings, config);
    }

    #[test]
    fn test_plain_values_pass_through_uncoerced() {
        let config = parse_ini("[s]\nport = 8080\nflag = on\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[]));
        let s = section(&result.settings, "s");
        assert_eq!(s["port"], SettingValue::from("8080"));
        assert_eq!(s["flag"], SettingValue::Bool(true));
    }

    #[test]
    fn test_empty_sections_dropped_top_level_kept() {
        let config = parse_ini("mode = {{MODE}}\n[empty]\n[s]\nk = v\n").unwrap();
        let result = apply_env_overrides(&config, &env(&[]));
        assert!(!result.settings.contains_key("empty"));
        assert!(result.settings.contains_key("s"));
        // Top-level entries are not sections and are not scanned
        assert_eq!(result.settings["mode"], SettingValue::from("{{MODE}}"));
    }

    #[test]
    fn test_empty_name_is_undefined() {
        let config = parse_ini("[s]\nk = {{}}\n").unwrap();
        let result = apply_env_overrides(&config, &ProcessEnvironment);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].variable, "");
    }

    #[test]
    fn test_diagnostic_message_names_section_and_key() {
        let diag = EnvDiagnostic {
            section: "sql".into(),
            key: "password".into(),
            variable: "DB_PASS".into(),
        };
        let text = diag.to_string();
        assert!(text.contains("'DB_PASS'"));
        assert!(text.contains("[sql]"));
        assert!(text.contains("'password'"));
    }
}
