use crate::error::{EmblemError, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Per-emblem knobs. All of them only change how the effect looks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmblemSettings {
    /// Lattice pixels per side.
    pub resolution: u32,
    /// World-space spacing between lattice positions.
    pub gap: f32,
    /// Repulsion radius around the cursor.
    pub displacement: f32,
    /// Repulsion strength multiplier.
    pub intensity: f32,
    /// Global animation time multiplier.
    pub speed: f32,
    /// Flips the rotation direction sign.
    pub reverse: bool,
    /// Uniform scale of the emblem group in the scene.
    pub scale: f32,
    /// Profile opened on click.
    pub url: String,
}

impl EmblemSettings {
    pub fn linkedin() -> Self {
        Self {
            resolution: 60,
            gap: 0.45,
            displacement: 6.0,
            intensity: 2.0,
            speed: 0.3,
            reverse: false,
            scale: 1.0,
            url: "https://www.linkedin.com/in/james-li-997439246/".to_string(),
        }
    }

    pub fn github() -> Self {
        Self {
            resolution: 70,
            gap: 0.4,
            displacement: 6.0,
            intensity: 2.0,
            speed: 0.3,
            reverse: true,
            scale: 0.894,
            url: "https://github.com/jahoi12345".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.resolution == 0 {
            return Err(EmblemError::InvalidSetting {
                name: "resolution",
                value: 0.0,
            });
        }
        positive("gap", self.gap)?;
        positive("displacement", self.displacement)?;
        positive("intensity", self.intensity)?;
        positive("speed", self.speed)?;
        positive("scale", self.scale)?;
        Ok(())
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(EmblemError::InvalidSetting {
            name,
            value: value as f64,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    pub enable_color: bool,
    /// `None` keeps particle layouts non-reproducible across runs.
    pub seed: Option<u64>,
    /// Pixel size of one terminal cell (width, height).
    pub cell_pixels: [u16; 2],
    pub linkedin: EmblemSettings,
    pub github: EmblemSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 30,
            enable_color: true,
            seed: None,
            cell_pixels: [8, 16],
            linkedin: EmblemSettings::linkedin(),
            github: EmblemSettings::github(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.fps_cap == 0 {
            return Err(EmblemError::InvalidSetting {
                name: "fps_cap",
                value: 0.0,
            });
        }
        if self.cell_pixels.contains(&0) {
            return Err(EmblemError::InvalidSetting {
                name: "cell_pixels",
                value: 0.0,
            });
        }
        self.linkedin.validate()?;
        self.github.validate()?;
        Ok(())
    }
}

pub struct Paths {
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Option<Paths> {
    let proj = ProjectDirs::from("dev", "emblem", "Emblem")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir).ok();
    Some(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("emblem.log"),
    })
}

/// Missing or malformed files fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    match fs::read_to_string(path) {
        Ok(s) => match serde_json::from_str::<Settings>(&s) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("ignoring malformed settings at {}: {err}", path.display());
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    atomic_rename(&tmp, path)?;
    Ok(())
}

fn atomic_rename(from: &Path, to: &Path) -> Result<()> {
    // Rename-over-existing is not atomic on Windows; remove first.
    if to.exists() {
        let _ = fs::remove_file(to);
    }
    fs::rename(from, to)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_positive_gap() {
        let mut s = EmblemSettings::linkedin();
        s.gap = 0.0;
        let err = s.validate().unwrap_err();
        assert!(matches!(err, EmblemError::InvalidSetting { name: "gap", .. }));

        s.gap = f32::NAN;
        assert!(s.validate().is_err());
    }

    #[test]
    fn rejects_zero_resolution() {
        let mut s = EmblemSettings::github();
        s.resolution = 0;
        assert!(matches!(
            s.validate(),
            Err(EmblemError::InvalidSetting {
                name: "resolution",
                ..
            })
        ));
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut s = Settings::default();
        s.seed = Some(7);
        s.github.displacement = 4.5;
        save_settings_atomic(&path, &s).unwrap();
        // second write replaces the first
        save_settings_atomic(&path, &s).unwrap();

        assert_eq!(load_settings(&path), s);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());
    }

    #[test]
    fn partial_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "fps_cap": 60 }"#).unwrap();
        let s = load_settings(&path);
        assert_eq!(s.fps_cap, 60);
        assert_eq!(s.linkedin, EmblemSettings::linkedin());
    }
}
