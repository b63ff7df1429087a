use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::core::error::FlowError;

pub const CONFIG_FILENAME: &str = "pdfflow_config.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub model: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub thread: String,
    #[serde(default)]
    pub src_lang: String,
    #[serde(default)]
    pub tgt_lang: String,
}

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn beside_executable() -> Self {
        Self::new(exe_dir().join(CONFIG_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Preferences {
        match self.try_load() {
            Ok(Some(prefs)) => {
                info!("loaded preferences from {}", self.path.display());
                prefs
            }
            Ok(None) => Preferences::default(),
            Err(err) => {
                warn!("{err}");
                Preferences::default()
            }
        }
    }

    pub fn save(&self, prefs: &Preferences) {
        if let Err(err) = self.try_save(prefs) {
            error!("{err}");
        }
    }

    fn try_load(&self) -> Result<Option<Preferences>, FlowError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(FlowError::Config {
                    message: format!("failed to read {}: {err}", self.path.display()),
                })
            }
        };

        serde_json::from_str::<Preferences>(&content)
            .map(Some)
            .map_err(|err| FlowError::Config {
                message: format!("failed to parse {}: {err}", self.path.display()),
            })
    }

    fn try_save(&self, prefs: &Preferences) -> Result<(), FlowError> {
        let content = serde_json::to_string_pretty(prefs).map_err(|err| FlowError::Config {
            message: format!("failed to serialize preferences: {err}"),
        })?;
        fs::write(&self.path, content).map_err(|err| FlowError::Config {
            message: format!("failed to write {}: {err}", self.path.display()),
        })
    }
}

// Older files may hold `"thread": 4`.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected a string or number, found {other}"
        ))),
    }
}

pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}
