use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::cue::{SoundAssets, DEFAULT_COUNTDOWN_SOUND, DEFAULT_FINISH_SOUND};
use crate::timer::{Timing, FINISH_DISPLAY_TICKS, PREP_TIME};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub recipe_dir: Option<PathBuf>,
    pub countdown_sound: PathBuf,
    pub finish_sound: PathBuf,
    pub prep_secs: u32,
    pub finish_display_secs: u32,
    pub mute: bool,
    pub last_recipe: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recipe_dir: None,
            countdown_sound: PathBuf::from(DEFAULT_COUNTDOWN_SOUND),
            finish_sound: PathBuf::from(DEFAULT_FINISH_SOUND),
            prep_secs: PREP_TIME,
            finish_display_secs: FINISH_DISPLAY_TICKS,
            mute: false,
            last_recipe: None,
        }
    }
}

impl Config {
    pub fn timing(&self) -> Timing {
        Timing {
            prep_secs: self.prep_secs,
            finish_display_ticks: self.finish_display_secs,
        }
    }

    pub fn sound_assets(&self) -> SoundAssets {
        SoundAssets {
            countdown: self.countdown_sound.clone(),
            finish: self.finish_sound.clone(),
        }
    }

    pub fn recipe_dir(&self) -> PathBuf {
        self.recipe_dir
            .clone()
            .unwrap_or_else(AppDirs::default_recipe_dir)
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(e) => tracing::warn!(
                    path = %self.path.display(),
                    "ignoring unreadable config: {e}"
                ),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
