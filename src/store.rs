//! Tag and pin persistence.
//!
//! Both files are read and rewritten wholesale on every mutation; there is no
//! locking, so a concurrent writer simply wins or loses.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

const TAGS_FILE: &str = "session_tags.json";
const PINS_FILE: &str = "session_pins.json";

pub type TagMap = BTreeMap<String, String>;

#[derive(Clone, Debug)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn tags(&self) -> TagMap {
        load(&self.dir.join(TAGS_FILE))
    }

    pub fn pins(&self) -> Vec<String> {
        load(&self.dir.join(PINS_FILE))
    }

    /// Flips the pin for `id` and returns whether it is now pinned.
    pub fn toggle_pin(&self, id: &str) -> Result<bool> {
        let mut pins = self.pins();
        let pinned = if let Some(pos) = pins.iter().position(|p| p == id) {
            pins.remove(pos);
            false
        } else {
            pins.push(id.to_string());
            true
        };
        save(&self.dir.join(PINS_FILE), &pins)?;
        Ok(pinned)
    }

    pub fn set_tag(&self, id: &str, tag: &str) -> Result<()> {
        let mut tags = self.tags();
        if tag.is_empty() {
            tags.remove(id);
        } else {
            tags.insert(id.to_string(), tag.to_string());
        }
        save(&self.dir.join(TAGS_FILE), &tags)
    }

    pub fn remove_tag(&self, id: &str) -> Result<()> {
        self.set_tag(id, "")
    }

    /// Drops every entry that refers to `id`.
    pub fn forget(&self, id: &str) -> Result<()> {
        let mut tags = self.tags();
        if tags.remove(id).is_some() {
            save(&self.dir.join(TAGS_FILE), &tags)?;
        }
        let mut pins = self.pins();
        let before = pins.len();
        pins.retain(|p| p != id);
        if pins.len() != before {
            save(&self.dir.join(PINS_FILE), &pins)?;
        }
        Ok(())
    }
}

fn load<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            tracing::debug!("store {} unreadable, using default: {err}", path.display());
            return T::default();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|err| {
        tracing::debug!("store {} malformed, using default: {err}", path.display());
        T::default()
    })
}

fn save<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    atomic_write(path, &content)
}

fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let mut tmp = path.to_path_buf();
    tmp.set_extension("json.tmp");

    fs::write(&tmp, content).with_context(|| format!("failed writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("failed renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}
