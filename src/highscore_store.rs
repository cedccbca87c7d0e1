use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

const FILE_VERSION: u8 = 1;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct HighScoreFile {
    version: u8,
    #[serde(rename = "highScore", alias = "high_score")]
    high_score: u32,
    #[serde(rename = "updatedAt", alias = "updated_at", default)]
    updated_at: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HighScoreResponse {
    #[serde(rename = "highScore")]
    pub high_score: u32,
    #[serde(rename = "updatedAt")]
    pub updated_at: Option<String>,
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
}

/// Single best score persisted as JSON. Storage problems are logged and the
/// store keeps working from memory.
pub struct HighScoreStore {
    file_path: PathBuf,
    high_score: u32,
    updated_at: Option<String>,
}

impl HighScoreStore {
    pub fn new(file_path: PathBuf) -> Self {
        let (high_score, updated_at) = match load(&file_path) {
            Some(file) => (file.high_score, file.updated_at),
            None => (0, None),
        };
        Self {
            file_path,
            high_score,
            updated_at,
        }
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    /// Persists `score` when it beats the stored best. Returns whether it did.
    pub fn record(&mut self, score: u32) -> bool {
        if score <= self.high_score {
            return false;
        }
        self.high_score = score;
        self.updated_at = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
        tracing::info!(high_score = score, "new high score");
        self.save();
        true
    }

    pub fn build_response(&self) -> HighScoreResponse {
        HighScoreResponse {
            high_score: self.high_score,
            updated_at: self.updated_at.clone(),
            generated_at_iso: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    fn save(&self) {
        if let Some(parent) = self.file_path.parent() {
            if let Err(error) = fs::create_dir_all(parent) {
                tracing::warn!(path = %parent.display(), %error, "failed to create high score dir");
                return;
            }
        }

        let payload = HighScoreFile {
            version: FILE_VERSION,
            high_score: self.high_score,
            updated_at: self.updated_at.clone(),
        };
        match serde_json::to_string_pretty(&payload) {
            Ok(text) => {
                if let Err(error) = fs::write(&self.file_path, text) {
                    tracing::warn!(path = %self.file_path.display(), %error, "failed to write high score");
                }
            }
            Err(error) => {
                tracing::warn!(path = %self.file_path.display(), %error, "failed to serialize high score");
            }
        }
    }
}

fn load(path: &Path) -> Option<HighScoreFile> {
    let text = match fs::read_to_string(path) {
        Ok(value) => value,
        Err(error) => {
            if error.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), %error, "failed to read high score");
            }
            return None;
        }
    };
    match serde_json::from_str::<HighScoreFile>(&text) {
        Ok(file) if file.version == FILE_VERSION => Some(file),
        Ok(file) => {
            tracing::warn!(path = %path.display(), version = file.version, "unsupported high score version");
            None
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to parse high score");
            None
        }
    }
}
