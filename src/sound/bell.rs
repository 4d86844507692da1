//! Bell selection and bundled asset metadata.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selectable bell sound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BellType {
    #[default]
    #[serde(rename = "Regular Bell")]
    Regular,
    #[serde(rename = "Cow Bell")]
    Cow,
}

impl BellType {
    pub const ALL: [BellType; 2] = [BellType::Regular, BellType::Cow];

    /// Human-readable name, also the persisted value
    pub fn label(&self) -> &'static str {
        match self {
            BellType::Regular => "Regular Bell",
            BellType::Cow => "Cow Bell",
        }
    }

    /// Asset file stem
    pub fn sound_file_name(&self) -> &'static str {
        match self {
            BellType::Regular => "bike_bell",
            BellType::Cow => "cowbell",
        }
    }

    /// Asset file extension
    pub fn file_extension(&self) -> &'static str {
        match self {
            BellType::Regular | BellType::Cow => "wav",
        }
    }

    /// Full path of this bell's clip under `assets_dir`
    pub fn asset_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(format!(
            "{}.{}",
            self.sound_file_name(),
            self.file_extension()
        ))
    }
}

impl fmt::Display for BellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for BellType {
    type Err = String;

    /// Accepts the label ("Cow Bell") or a short name ("cow", "regular")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "regular bell" | "regular" | "bike_bell" => Ok(BellType::Regular),
            "cow bell" | "cow" | "cowbell" => Ok(BellType::Cow),
            other => Err(format!(
                "Unknown bell type '{}', expected one of: regular, cow",
                other
            )),
        }
    }
}
