use crate::language::{self, Direction};
use crate::models::{self, NamedPath};
use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KEY_MODELS_FOLDER: &str = "models_folder";
pub const KEY_MODEL_PATH: &str = "model_path";
pub const KEY_MODEL_OPTIONS: &str = "model_options";
pub const KEY_DISPLAY_LANGUAGE: &str = "display_language";
pub const KEY_TEXT_AREA_DIRECTION: &str = "text_area_direction";
pub const KEY_LOG_TO_FILE: &str = "prefs_log_to_file";
pub const KEY_ENGINE_COMMAND: &str = "engine_command";

#[derive(Error, Debug)]
#[error("preference store write failed: {0}")]
pub struct StoreWriteError(String);

/// Durable key/value store backed by a YAML file. Commits are atomic: the
/// store is written to a temp file and renamed over the previous one, so a
/// crash mid-save never corrupts committed values.
#[derive(Debug, Clone)]
pub struct PrefStore {
    path: PathBuf,
    values: BTreeMap<String, serde_yaml::Value>,
}

impl PrefStore {
    pub fn default_path() -> Result<PathBuf> {
        let base = BaseDirs::new().context("unable to resolve home directory")?;
        Ok(base.home_dir().join(".config").join("scriven.yaml"))
    }

    /// Opens the store at `path`, starting empty when the file does not
    /// exist yet.
    pub fn open(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read store {}", path.display()))?;
            serde_yaml::from_str(&contents)
                .with_context(|| format!("parse store {}", path.display()))?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads a single boolean key straight from the store file, for callers
    /// that need it before the store is opened (the logging bootstrap).
    /// Missing file, unparsable store, or a non-boolean value all read as
    /// `false`.
    pub fn peek_bool(path: &Path, key: &str) -> bool {
        let Ok(contents) = fs::read_to_string(path) else {
            return false;
        };
        serde_yaml::from_str::<BTreeMap<String, serde_yaml::Value>>(&contents)
            .ok()
            .and_then(|values| values.get(key).and_then(serde_yaml::Value::as_bool))
            .unwrap_or(false)
    }

    /// Typed read of a key. Missing keys and type mismatches read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        serde_yaml::from_value(value.clone()).ok()
    }

    /// Stages a value. Not durable until `save` returns.
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) {
        match serde_yaml::to_value(value) {
            Ok(value) => {
                self.values.insert(key.to_string(), value);
            }
            Err(err) => tracing::error!(key, error = %err, "unserializable preference value"),
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Commits staged values durably. Write-temp-then-rename keeps the
    /// previous committed state intact if the process dies mid-write.
    pub fn save(&self) -> Result<(), StoreWriteError> {
        let write = || -> Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create store dir {}", parent.display()))?;
            }
            let contents = serde_yaml::to_string(&self.values)?;
            let tmp = self.path.with_extension("yaml.tmp");
            fs::write(&tmp, contents)
                .with_context(|| format!("write store {}", tmp.display()))?;
            fs::rename(&tmp, &self.path)
                .with_context(|| format!("commit store {}", self.path.display()))?;
            Ok(())
        };
        write().map_err(|err| StoreWriteError(format!("{err:#}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ModelOptions {
    pub lang: String,
    pub translate: bool,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            translate: false,
        }
    }
}

/// In-memory projection of the persisted user preferences. Missing store
/// keys fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Preference {
    pub model_path: Option<PathBuf>,
    pub model_options: ModelOptions,
    pub display_language: String,
    pub text_area_direction: Direction,
    pub log_to_file: bool,
}

impl Default for Preference {
    fn default() -> Self {
        Self {
            model_path: None,
            model_options: ModelOptions::default(),
            display_language: "english".to_string(),
            text_area_direction: Direction::Ltr,
            log_to_file: false,
        }
    }
}

/// Settings derived from the display language. `None` fields mean the
/// language has no table entry and the current value stays untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    pub engine_lang: Option<&'static str>,
    pub direction: Option<Direction>,
}

/// Pure recomputation of language-derived settings. Invoked after every
/// preference mutation that touches the display language, so the cascade
/// does not depend on effect ordering.
pub fn derive_settings(preference: &Preference) -> Derived {
    let name = preference.display_language.as_str();
    match language::engine_code(name) {
        Some(code) => Derived {
            engine_lang: Some(code),
            direction: Some(language::direction(name)),
        },
        None => Derived {
            engine_lang: None,
            direction: None,
        },
    }
}

/// Preference Store facade: owns the durable store plus the in-memory
/// projection every other component consults. All mutation goes through
/// `&mut self`, which serializes writers.
pub struct Preferences {
    store: PrefStore,
    current: Preference,
    default_models_dir: PathBuf,
}

impl Preferences {
    pub fn load(store: PrefStore, default_models_dir: PathBuf) -> Self {
        let current = Preference {
            model_path: store.get(KEY_MODEL_PATH),
            model_options: store.get(KEY_MODEL_OPTIONS).unwrap_or_default(),
            display_language: store
                .get(KEY_DISPLAY_LANGUAGE)
                .unwrap_or_else(|| Preference::default().display_language),
            text_area_direction: store.get(KEY_TEXT_AREA_DIRECTION).unwrap_or_default(),
            log_to_file: store.get(KEY_LOG_TO_FILE).unwrap_or(false),
        };
        Self {
            store,
            current,
            default_models_dir,
        }
    }

    pub fn current(&self) -> &Preference {
        &self.current
    }

    pub fn store(&self) -> &PrefStore {
        &self.store
    }

    /// Configured model directory, falling back to the platform default
    /// when the `models_folder` key is unset.
    pub fn models_folder(&self) -> PathBuf {
        self.store
            .get(KEY_MODELS_FOLDER)
            .unwrap_or_else(|| self.default_models_dir.clone())
    }

    /// Command used to invoke the external transcription engine.
    pub fn engine_command(&self) -> PathBuf {
        self.store
            .get(KEY_ENGINE_COMMAND)
            .unwrap_or_else(|| PathBuf::from("scriven-engine"))
    }

    pub fn set_model_path(&mut self, path: PathBuf) {
        self.current.model_path = Some(path.clone());
        self.store.set(KEY_MODEL_PATH, path);
        self.commit();
    }

    pub fn set_log_to_file(&mut self, on: bool) {
        self.current.log_to_file = on;
        self.store.set(KEY_LOG_TO_FILE, on);
        self.commit();
    }

    /// Switches the display language and recomputes the derived settings.
    /// A language absent from the lookup table leaves the engine language
    /// and text direction unchanged.
    pub fn change_language(&mut self, new_lang: &str) {
        self.current.display_language = new_lang.to_string();
        let derived = derive_settings(&self.current);
        if let Some(code) = derived.engine_lang {
            self.current.model_options.lang = code.to_string();
        }
        if let Some(direction) = derived.direction {
            self.current.text_area_direction = direction;
        }
        self.store
            .set(KEY_DISPLAY_LANGUAGE, &self.current.display_language);
        self.store.set(KEY_MODEL_OPTIONS, &self.current.model_options);
        self.store
            .set(KEY_TEXT_AREA_DIRECTION, self.current.text_area_direction);
        self.commit();
    }

    /// Derives a default model when none is selected: the lexicographically
    /// first recognized model file in the model directory. Persists the
    /// selection. Returns the current model path, if any.
    pub fn default_model(&mut self) -> Option<PathBuf> {
        if self.current.model_path.is_some() {
            return self.current.model_path.clone();
        }
        let models = models::scan(&self.models_folder());
        let first = models.first()?;
        tracing::info!(model = %first.path.display(), "selected default model");
        self.set_model_path(first.path.clone());
        self.current.model_path.clone()
    }

    /// Persists a new model directory, then refreshes the derived state:
    /// rescans the directory and reruns default-model selection. `&mut self`
    /// keeps concurrent directory changes impossible.
    pub fn change_directory(&mut self, new_dir: PathBuf) -> Vec<NamedPath> {
        self.store.set(KEY_MODELS_FOLDER, &new_dir);
        self.commit();
        let models = models::scan(&new_dir);
        self.default_model();
        models
    }

    pub fn refresh_models(&self) -> Vec<NamedPath> {
        models::scan(&self.models_folder())
    }

    // Persistence is best-effort durable: a failed save is logged and the
    // in-memory mutation stays applied, the user is never blocked.
    fn commit(&mut self) {
        if let Err(err) = self.store.save() {
            tracing::error!(error = %err, "preference save failed");
        }
    }
}
