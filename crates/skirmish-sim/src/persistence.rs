//! Save slots on disk, one JSON file per slot.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use skirmish_core::records::{HealthRecord, WeaponRecord};
use skirmish_core::state::ScoreView;
use skirmish_core::types::SimTime;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Invalid slot name: {0:?}")]
    InvalidSlot(String),
}

/// Everything needed to resume a session. Missing fields fall back to
/// defaults, and the player records merge onto a freshly built player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSave {
    pub slot_name: String,
    pub seed: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub waves_completed: u32,
    pub score: ScoreView,
    pub time: SimTime,
    pub player_position: Option<Vec2>,
    pub player_health: HealthRecord,
    pub player_weapon: WeaponRecord,
}

/// Summary for listing saves without keeping their full contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveMetadata {
    pub slot_name: String,
    pub waves_completed: u32,
    pub score: u64,
    pub timestamp: u64,
}

fn save_path(dir: &Path, slot: &str) -> Result<PathBuf, PersistenceError> {
    let valid = !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(PersistenceError::InvalidSlot(slot.to_string()));
    }
    Ok(dir.join(format!("{slot}.json")))
}

pub fn save_to_file(dir: &Path, slot: &str, data: &SessionSave) -> Result<(), PersistenceError> {
    let path = save_path(dir, slot)?;
    fs::create_dir_all(dir)?;
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load_from_file(dir: &Path, slot: &str) -> Result<SessionSave, PersistenceError> {
    let path = save_path(dir, slot)?;
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Saves in `dir`, newest first. Unreadable files are skipped.
pub fn list_saves(dir: &Path) -> Vec<SaveMetadata> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut saves: Vec<SaveMetadata> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| fs::read_to_string(path).ok())
        .filter_map(|json| serde_json::from_str::<SessionSave>(&json).ok())
        .map(|save| SaveMetadata {
            slot_name: save.slot_name,
            waves_completed: save.waves_completed,
            score: save.score.score,
            timestamp: save.timestamp,
        })
        .collect();
    saves.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.slot_name.cmp(&b.slot_name)));
    saves
}

pub fn delete_save(dir: &Path, slot: &str) -> Result<(), PersistenceError> {
    let path = save_path(dir, slot)?;
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("skirmish_save_test_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn sample(slot: &str, timestamp: u64) -> SessionSave {
        SessionSave {
            slot_name: slot.into(),
            seed: 9,
            timestamp,
            waves_completed: 2,
            score: ScoreView {
                score: 1200,
                kills: 12,
                waves_completed: 2,
            },
            player_health: HealthRecord {
                current: Some(40.0),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = temp_dir("roundtrip");
        let save = sample("slot1", 100);
        save_to_file(&dir, "slot1", &save).unwrap();
        let loaded = load_from_file(&dir, "slot1").unwrap();
        assert_eq!(loaded, save);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn list_is_newest_first() {
        let dir = temp_dir("list");
        save_to_file(&dir, "old", &sample("old", 100)).unwrap();
        save_to_file(&dir, "new", &sample("new", 200)).unwrap();
        fs::write(dir.join("junk.json"), "not json").unwrap();

        let saves = list_saves(&dir);
        assert_eq!(saves.len(), 2);
        assert_eq!(saves[0].slot_name, "new");
        assert_eq!(saves[1].slot_name, "old");
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn delete_missing_slot_is_ok() {
        let dir = temp_dir("delete");
        save_to_file(&dir, "gone", &sample("gone", 1)).unwrap();
        delete_save(&dir, "gone").unwrap();
        delete_save(&dir, "gone").unwrap();
        assert!(load_from_file(&dir, "gone").is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn slot_names_cannot_escape_the_directory() {
        let dir = temp_dir("escape");
        let err = save_to_file(&dir, "../evil", &SessionSave::default()).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidSlot(_)));
    }

    #[test]
    fn partial_save_uses_defaults() {
        let save: SessionSave = serde_json::from_str(r#"{ "slot_name": "quick", "waves_completed": 3 }"#).unwrap();
        assert_eq!(save.waves_completed, 3);
        assert_eq!(save.score, ScoreView::default());
        assert!(save.player_health.current.is_none());
    }
}
