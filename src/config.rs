use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

/// Slide transition chosen for normal (non-burst) groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Effect {
    #[default]
    Crossfade,
    #[serde(alias = "pan-zoom")]
    Panzoom,
    None,
    Fast,
}

impl Effect {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Crossfade => "crossfade",
            Self::Panzoom => "panzoom",
            Self::None => "none",
            Self::Fast => "fast",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which parts of the picture location are shown as labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameStyle {
    #[default]
    Disabled,
    Filename,
    Foldername,
    #[serde(alias = "folder+file")]
    FolderAndFilename,
    FullPath,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Settings {
    /// SQLite picture database to read groups from.
    pub database_path: PathBuf,
    /// How long each picture of a normal group stays on screen.
    #[serde(with = "humantime_serde")]
    pub slide_time: Duration,
    /// Maximum number of pictures shown from one non-burst group.
    pub group_limit: usize,
    pub effect: Effect,
    /// Slide brightness in percent.
    pub dim_level: u8,
    pub show_background: bool,
    pub scale_images: bool,
    pub name_style: NameStyle,
    pub show_date: bool,
    pub show_tags: bool,
    pub show_music: bool,
    pub show_clock: bool,
    /// Start groups from pictures matching `filter-name` instead of random dates.
    pub use_filter: bool,
    pub filter_name: String,
    /// Speed up groups of pictures taken in burst mode.
    pub burst_enabled: bool,
    /// Time between pictures of a burst group.
    pub burst_interval_ms: u64,
    /// Granularity of cancellable waits.
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
    /// Pause between hiding the previous labels and revealing new ones.
    #[serde(with = "humantime_serde")]
    pub label_pause: Duration,
    /// How long configuration notifications stay visible.
    #[serde(with = "humantime_serde")]
    pub notification_time: Duration,
    /// Optional deterministic seed for pool shuffles and random offsets.
    pub shuffle_seed: Option<u64>,
}

impl Settings {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    ///
    /// Filter names are checked against the database when a session starts.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.database_path.as_os_str().is_empty(),
            "database-path must not be empty"
        );
        ensure!(self.group_limit > 0, "group-limit must be greater than zero");
        ensure!(self.dim_level <= 100, "dim-level must be between 0 and 100");
        ensure!(
            self.slide_time > Duration::ZERO,
            "slide-time must be positive"
        );
        ensure!(
            self.burst_interval_ms > 0,
            "burst-interval-ms must be greater than zero"
        );
        ensure!(
            self.poll_interval > Duration::ZERO,
            "poll-interval must be positive"
        );
        Ok(self)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Self::from_yaml_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?
            .validated()
            .context("invalid settings values")
    }

    pub fn burst_interval(&self) -> Duration {
        Duration::from_millis(self.burst_interval_ms)
    }

    /// Dim level as the ARGB colour string the skin expects.
    pub fn dim_color(&self) -> String {
        let alpha = (f64::from(self.dim_level.min(100)) * 2.55).round() as u8;
        format!("{alpha:02x}ffffff")
    }

    pub fn selection(&self) -> SelectionSettings {
        SelectionSettings {
            group_limit: self.group_limit,
            use_filter: self.use_filter,
            filter_name: self.filter_name.clone(),
            burst_enabled: self.burst_enabled,
        }
    }

    pub fn display(&self) -> DisplayOptions {
        DisplayOptions {
            show_tags: self.show_tags,
            show_date: self.show_date,
            name_style: self.name_style,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("MyPictures.db"),
            slide_time: Duration::from_secs(10),
            group_limit: 10,
            effect: Effect::default(),
            dim_level: 100,
            show_background: false,
            scale_images: false,
            name_style: NameStyle::default(),
            show_date: true,
            show_tags: true,
            show_music: false,
            show_clock: false,
            use_filter: false,
            filter_name: String::new(),
            burst_enabled: true,
            burst_interval_ms: 250,
            poll_interval: Duration::from_secs(1),
            label_pause: Duration::from_secs(1),
            notification_time: Duration::from_secs(15),
            shuffle_seed: None,
        }
    }
}

/// Settings snapshot consumed by the group selector.
#[derive(Debug, Clone)]
pub struct SelectionSettings {
    pub group_limit: usize,
    pub use_filter: bool,
    pub filter_name: String,
    pub burst_enabled: bool,
}

/// Settings snapshot consumed by the display property mapper.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    pub show_tags: bool,
    pub show_date: bool,
    pub name_style: NameStyle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dim_color_scales_percent_to_alpha() {
        let mut settings = Settings::default();
        assert_eq!(settings.dim_color(), "ffffffff");
        settings.dim_level = 40;
        assert_eq!(settings.dim_color(), "66ffffff");
        settings.dim_level = 0;
        assert_eq!(settings.dim_color(), "00ffffff");
    }

    #[test]
    fn effect_displays_as_its_config_name() {
        let settings: Settings = serde_yaml::from_str("effect: pan-zoom\n").unwrap();
        assert_eq!(settings.effect.to_string(), "panzoom");
        assert_eq!(Effect::Fast.to_string(), "fast");
    }

    #[test]
    fn defaults_validate() {
        assert!(Settings::default().validated().is_ok());
    }
}
