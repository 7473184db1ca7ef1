//! Settings loader with layered merging.
//!
//! Reads the packaged defaults, the user settings file and the optional
//! environment override file from one settings directory, and merges them
//! in that order.

use super::env::{EnvDiagnostic, Environment, ProcessEnvironment, apply_env_overrides};
use super::ini::parse_ini;
use super::merge::merge_recursive;
use super::types::Settings;
use super::value::{ConfigTree, SettingValue};
use crate::error::{MISSING_SETTINGS_HINT, SettingsError, SettingsResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming the settings directory.
pub const SETTINGS_DIR_ENV: &str = "SETTINGS_RESOLVER_DIR";

/// File holding the environment override layer.
pub const ENV_SETTINGS_FILE: &str = "settings.env.ini";

/// Format of the user settings file, in order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Nested YAML document (`settings.yaml`)
    Structured,
    /// Sectioned INI file (`settings.ini`)
    Ini,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Structured => write!(f, "structured"),
            SourceKind::Ini => write!(f, "ini"),
        }
    }
}

impl SourceKind {
    /// All kinds, most preferred first.
    pub const PREFERENCE: [SourceKind; 2] = [SourceKind::Structured, SourceKind::Ini];

    pub fn settings_file_name(self) -> &'static str {
        match self {
            SourceKind::Structured => "settings.yaml",
            SourceKind::Ini => "settings.ini",
        }
    }

    pub fn defaults_file_name(self) -> &'static str {
        match self {
            SourceKind::Structured => "default-settings.yaml",
            SourceKind::Ini => "default-settings.ini",
        }
    }

    /// Parse file content of this kind into a tree.
    pub fn parse(self, content: &str) -> Result<ConfigTree, String> {
        match self {
            SourceKind::Structured => {
                match serde_yaml::from_str::<SettingValue>(content).map_err(|e| e.to_string())? {
                    SettingValue::Mapping(tree) => Ok(tree),
                    _ => Err("top level is not a mapping".to_string()),
                }
            }
            SourceKind::Ini => parse_ini(content).map_err(|e| e.to_string()),
        }
    }
}

/// Location of the settings files.
#[derive(Debug, Clone)]
pub struct SettingsPaths {
    /// Directory holding defaults, user settings and env overrides
    pub dir: PathBuf,
}

impl Default for SettingsPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl SettingsPaths {
    /// Discover the settings directory: `SETTINGS_RESOLVER_DIR` or the
    /// current directory.
    pub fn discover() -> Self {
        let dir = std::env::var(SETTINGS_DIR_ENV)
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        Self { dir }
    }

    /// Use an explicit directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn settings_file(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(kind.settings_file_name())
    }

    pub fn defaults_file(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(kind.defaults_file_name())
    }

    pub fn env_file(&self) -> PathBuf {
        self.dir.join(ENV_SETTINGS_FILE)
    }
}

/// Loader for settings files in an older layout.
///
/// Consulted when the user settings file exists but cannot be read in its
/// expected shape. Returning `None` means the file is not recognised either.
pub trait LegacySettings {
    fn load(&self, path: &Path) -> Option<ConfigTree>;
}

/// The user override layer as found on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct UserOverrides {
    pub kind: SourceKind,
    pub path: PathBuf,
    pub tree: ConfigTree,
}

/// Outcome of a full resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub settings: Settings,
    /// Undefined environment variables met in the env override layer
    pub diagnostics: Vec<EnvDiagnostic>,
    /// Format of the user settings file that was used
    pub source: SourceKind,
}

/// Settings loader that handles layered merging.
pub struct SettingsLoader<E = ProcessEnvironment> {
    pub paths: SettingsPaths,
    env: E,
    legacy: Option<Box<dyn LegacySettings>>,
}

impl SettingsLoader<ProcessEnvironment> {
    /// Loader over `paths` reading the process environment.
    pub fn new(paths: SettingsPaths) -> Self {
        Self {
            paths,
            env: ProcessEnvironment,
            legacy: None,
        }
    }

    /// Loader over the discovered settings directory.
    pub fn discover() -> Self {
        Self::new(SettingsPaths::discover())
    }
}

impl<E: Environment> SettingsLoader<E> {
    /// Replace the environment used for placeholder lookup.
    pub fn with_environment<F: Environment>(self, env: F) -> SettingsLoader<F> {
        SettingsLoader {
            paths: self.paths,
            env,
            legacy: self.legacy,
        }
    }

    /// Set the fallback for malformed user settings files.
    pub fn with_legacy(mut self, legacy: Box<dyn LegacySettings>) -> Self {
        self.legacy = Some(legacy);
        self
    }

    /// Find the user settings file, most preferred kind first.
    pub fn detect_source(&self) -> SettingsResult<(SourceKind, PathBuf)> {
        for kind in SourceKind::PREFERENCE {
            let path = self.paths.settings_file(kind);
            if path.is_file() {
                return Ok((kind, path));
            }
        }
        Err(SettingsError::missing_with_hint(
            self.paths.settings_file(SourceKind::Ini),
            MISSING_SETTINGS_HINT,
        ))
    }

    /// Load the packaged defaults for `kind`.
    ///
    /// The defaults are the floor every other layer sits on, so a missing or
    /// unreadable file is fatal.
    pub fn load_defaults(&self, kind: SourceKind) -> SettingsResult<ConfigTree> {
        let path = self.paths.defaults_file(kind);
        if !path.is_file() {
            return Err(SettingsError::missing(path));
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| SettingsError::malformed(&path, e))?;
        kind.parse(&content)
            .map_err(|reason| SettingsError::malformed(&path, reason))
    }

    /// Load the user settings file.
    ///
    /// A file that exists but cannot be parsed is handed to the legacy
    /// loader, and failing that treated as empty.
    pub fn load_user_overrides(&self) -> SettingsResult<UserOverrides> {
        let (kind, path) = self.detect_source()?;

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| kind.parse(&content));

        let tree = match parsed {
            Ok(tree) => tree,
            Err(reason) => self.recover_overrides(&path, &reason),
        };

        Ok(UserOverrides { kind, path, tree })
    }

    fn recover_overrides(&self, path: &Path, reason: &str) -> ConfigTree {
        warn!(
            path = %path.display(),
            reason = %reason,
            "Settings file is malformed, trying legacy format"
        );
        match self.legacy.as_ref().and_then(|legacy| legacy.load(path)) {
            Some(tree) => {
                info!(path = %path.display(), "Loaded settings with legacy loader");
                tree
            }
            None => {
                warn!(
                    path = %path.display(),
                    "No usable settings in file, continuing with defaults only"
                );
                ConfigTree::new()
            }
        }
    }

    /// Load the environment override file, if present and non-empty.
    pub fn load_env_overrides(&self) -> Option<ConfigTree> {
        let path = self.paths.env_file();
        if !path.is_file() {
            return None;
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| parse_ini(&content).map_err(|e| e.to_string()));

        match parsed {
            Ok(tree) if tree.is_empty() => {
                debug!(path = %path.display(), "Environment override file is empty");
                None
            }
            Ok(tree) => Some(tree),
            Err(reason) => {
                warn!(
                    path = %path.display(),
                    reason = %reason,
                    "Environment override file is malformed, skipping it"
                );
                None
            }
        }
    }

    /// Resolve the effective settings from all layers.
    ///
    /// Reads files on every call; resolve once at startup and share the
    /// result.
    pub fn resolve(&self) -> SettingsResult<Resolution> {
        let overrides = self.load_user_overrides()?;
        let defaults = self.load_defaults(overrides.kind)?;
        let mut merged = merge_recursive(&defaults, &overrides.tree);

        let mut diagnostics = Vec::new();
        if let Some(env_tree) = self.load_env_overrides() {
            let env_layer = apply_env_overrides(&env_tree, &self.env);
            merged = merge_recursive(&merged, &env_layer.settings);
            for diagnostic in &env_layer.diagnostics {
                warn!("{}", diagnostic);
            }
            diagnostics = env_layer.diagnostics;
        }

        info!(
            source = %overrides.kind,
            path = %overrides.path.display(),
            diagnostics = diagnostics.len(),
            "Resolved settings"
        );

        Ok(Resolution {
            settings: Settings::new(merged),
            diagnostics,
            source: overrides.kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_per_kind() {
        let paths = SettingsPaths::with_dir("/srv/app");
        assert_eq!(
            paths.settings_file(SourceKind::Structured),
            PathBuf::from("/srv/app/settings.yaml")
        );
        assert_eq!(
            paths.defaults_file(SourceKind::Ini),
            PathBuf::from("/srv/app/default-settings.ini")
        );
        assert_eq!(paths.env_file(), PathBuf::from("/srv/app/settings.env.ini"));
    }

    #[test]
    fn test_structured_must_be_mapping() {
        assert!(SourceKind::Structured.parse("a: 1").is_ok());
        assert!(SourceKind::Structured.parse("- a\n- b").is_err());
        assert!(SourceKind::Structured.parse("just text").is_err());
    }

    #[test]
    fn test_structured_accepts_scalar_keys() {
        let tree = SourceKind::Structured
            .parse("ports:\n  80: http\n  443: https\n")
            .unwrap();
        let ports = tree["ports"].as_mapping().unwrap();
        assert_eq!(ports["80"], SettingValue::from("http"));
        assert_eq!(ports["443"], SettingValue::from("https"));
    }

    #[test]
    fn test_structured_collection_key_reason() {
        let err = SourceKind::Structured
            .parse("? {a: 1}\n: value\n")
            .unwrap_err();
        assert!(err.contains("mapping keys must be strings, numbers or booleans"));
    }

    #[test]
    fn test_ini_parse_errors_surface_as_reason() {
        let err = SourceKind::Ini.parse("[broken").unwrap_err();
        assert!(err.contains("line 1"));
    }

    #[test]
    fn test_preference_order() {
        assert_eq!(
            SourceKind::PREFERENCE,
            [SourceKind::Structured, SourceKind::Ini]
        );
    }
}
