//! Layered settings resolution.
//!
//! Builds one settings tree from up to three layers, lowest precedence first:
//! 1. **Defaults** - `default-settings.yaml` or `default-settings.ini`
//! 2. **User** - `settings.yaml`, or `settings.ini` when no YAML file exists
//! 3. **Environment** - `settings.env.ini`, whose `{{NAME}}` placeholders are
//!    filled from environment variables
//!
//! ## Merge Strategy
//! - Mappings merge key by key, the higher layer winning
//! - Lists and scalars are replaced wholesale
//!
//! ## Environment Variables
//! - `SETTINGS_RESOLVER_DIR` - Settings directory (default: current directory)
//! - Any name referenced by a `{{NAME}}` placeholder

mod env;
mod ini;
mod loader;
mod merge;
mod types;
mod value;

pub use env::{
    EnvDiagnostic, EnvResolution, Environment, ProcessEnvironment, apply_env_overrides, coerce,
    placeholder_names,
};
pub use ini::{IniError, parse_ini};
pub use loader::{
    ENV_SETTINGS_FILE, LegacySettings, Resolution, SETTINGS_DIR_ENV, SettingsLoader,
    SettingsPaths, SourceKind, UserOverrides,
};
pub use merge::{deep_merge, merge_recursive};
pub use types::{APP_DIR_KEY, DISPLAY_ERRORS_KEY, Settings};
pub use value::{ConfigTree, Number, SettingValue};
