//! The resolved settings handed to the rest of the application.

use super::value::{ConfigTree, SettingValue};
use serde::Serialize;
use std::path::PathBuf;

/// Top-level key holding the application install directory.
pub const APP_DIR_KEY: &str = "app_dir";

/// Top-level key enabling verbose error display.
pub const DISPLAY_ERRORS_KEY: &str = "display_errors";

/// Final merged settings.
///
/// Built once at startup and shared by reference; never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Settings {
    tree: ConfigTree,
}

impl Settings {
    pub fn new(tree: ConfigTree) -> Self {
        Self { tree }
    }

    /// The whole settings tree.
    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    /// Look up a value by dotted path, e.g. `redis.port`.
    pub fn get(&self, path: &str) -> Option<&SettingValue> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.tree.get(first)?;
        for part in parts {
            current = current.as_mapping()?.get(part)?;
        }
        Some(current)
    }

    /// A whole section by name.
    pub fn section(&self, name: &str) -> Option<&ConfigTree> {
        self.tree.get(name).and_then(SettingValue::as_mapping)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(SettingValue::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(SettingValue::as_bool)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get(path).and_then(SettingValue::as_i64)
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(SettingValue::as_f64)
    }

    /// Whether verbose error display is switched on.
    pub fn display_errors(&self) -> bool {
        self.tree
            .get(DISPLAY_ERRORS_KEY)
            .is_some_and(SettingValue::is_truthy)
    }

    /// Directory that holds linked modules.
    ///
    /// `<app_dir>/modules` when that directory exists, otherwise `app_dir`
    /// itself. `None` when `app_dir` is not set.
    pub fn linked_modules_dir(&self) -> Option<PathBuf> {
        let app_dir = PathBuf::from(self.get_str(APP_DIR_KEY)?);
        let modules = app_dir.join("modules");
        if modules.is_dir() {
            Some(modules)
        } else {
            Some(app_dir)
        }
    }
}

impl From<ConfigTree> for Settings {
    fn from(tree: ConfigTree) -> Self {
        Self::new(tree)
    }
}
