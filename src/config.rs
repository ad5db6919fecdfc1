use crate::overlay::{FormFactor, Viewport};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "openpad";
const SETTINGS_FILE: &str = "settings.toml";
const PREFERENCES_FILE: &str = "preferences.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Device and runtime settings of the pad
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PadSettings {
    /// Display density (physical pixels per logical pixel)
    pub density: f32,
    pub form_factor: FormFactor,
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub autosave_interval_secs: u64,
    /// Capacity of the channel toward the emulator core
    pub sink_capacity: usize,
    pub joystick_deadzone: f32,
    /// Preference file; defaults to `preferences.toml` next to the settings
    pub store_path: Option<PathBuf>,
    /// Game whose compat overrides apply
    pub game_id: Option<String>,
}

impl Default for PadSettings {
    fn default() -> Self {
        Self {
            density: 2.0,
            form_factor: FormFactor::Phone,
            viewport_width: 1920.0,
            viewport_height: 1080.0,
            autosave_interval_secs: 60,
            sink_capacity: 256,
            joystick_deadzone: 0.05,
            store_path: None,
            game_id: None,
        }
    }
}

impl PadSettings {
    /// `<config dir>/openpad`
    pub fn config_dir() -> PathBuf {
        let mut base = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        base.push(CONFIG_DIR);
        base
    }

    pub fn default_path() -> PathBuf {
        Self::config_dir().join(SETTINGS_FILE)
    }

    /// Preference file the store should open
    pub fn preferences_path(&self) -> PathBuf {
        self.store_path
            .clone()
            .unwrap_or_else(|| Self::config_dir().join(PREFERENCES_FILE))
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            self.viewport_width,
            self.viewport_height,
            self.density,
            self.form_factor,
        )
    }

    /// Writes a default settings file if none exists yet
    pub async fn ensure_default(path: &Path) -> Result<(), SettingsError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if exists {
            debug!("Settings file {} already exists", path.display());
            return Ok(());
        }

        info!("Creating default settings at {}", path.display());
        Self::default().save(path).await
    }

    pub async fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let settings: Self = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub async fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SettingsError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
