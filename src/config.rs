use crate::gfx::math::Color;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_anchor")]
    pub anchor: Anchor,

    #[serde(default = "default_margins")]
    pub margins: Margins,

    #[serde(default = "default_size")]
    pub size: Size,

    #[serde(default)]
    pub theme: Theme,

    #[serde(default = "default_fps_cap")]
    pub fps_cap: u32,

    #[serde(default = "default_true")]
    pub animations_enabled: bool,

    #[serde(default)]
    pub clock: ClockConfig,

    #[serde(default)]
    pub ticks: TickConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Margins {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: String,
    pub foreground: String,
    pub accent: String,
    pub second_hand: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Inset of the digit circle from the face edge, in logical pixels.
    pub digit_margin: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TickConfig {
    pub clock_ms: u64,
    pub timer_ms: u64,
    pub stopwatch_ms: u64,
}

/// Theme colors resolved once at startup.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub foreground: Color,
    pub accent: Color,
    pub second_hand: Color,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anchor: default_anchor(),
            margins: default_margins(),
            size: default_size(),
            theme: Theme::default(),
            fps_cap: default_fps_cap(),
            animations_enabled: true,
            clock: ClockConfig::default(),
            ticks: TickConfig::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: "#1a1a1a".to_string(),
            foreground: "#ffffff".to_string(),
            accent: "#4a9eff".to_string(),
            second_hand: "#ff4040".to_string(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { digit_margin: 30.0 }
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            clock_ms: 1000,
            timer_ms: 1000,
            stopwatch_ms: 100,
        }
    }
}

impl TickConfig {
    pub fn clock(&self) -> Duration {
        Duration::from_millis(self.clock_ms.max(1))
    }

    pub fn timer(&self) -> Duration {
        Duration::from_millis(self.timer_ms.max(1))
    }

    pub fn stopwatch(&self) -> Duration {
        Duration::from_millis(self.stopwatch_ms.max(1))
    }
}

impl Theme {
    pub fn palette(&self) -> Result<Palette> {
        Ok(Palette {
            background: Color::from_hex(&self.background).context("theme.background")?,
            foreground: Color::from_hex(&self.foreground).context("theme.foreground")?,
            accent: Color::from_hex(&self.accent).context("theme.accent")?,
            second_hand: Color::from_hex(&self.second_hand).context("theme.second_hand")?,
        })
    }
}

fn default_anchor() -> Anchor {
    Anchor::TopRight
}

fn default_margins() -> Margins {
    Margins {
        top: 8,
        right: 8,
        bottom: 8,
        left: 8,
    }
}

fn default_size() -> Size {
    Size {
        width: 320,
        height: 440,
    }
}

fn default_fps_cap() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join("tocks").join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Reading {}", config_path.display()))?;
            Self::from_toml(&contents)
                .with_context(|| format!("Parsing {}", config_path.display()))
        } else {
            let config = Config::default();
            match config.save() {
                Ok(()) => log::info!("Wrote default config to {}", config_path.display()),
                Err(e) => log::warn!("Could not write default config: {:#}", e),
            }
            Ok(config)
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::path()?;
        if let Some(dir) = config_path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, contents)?;

        Ok(())
    }

    /// Minimum time between frames.
    pub fn frame_budget(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.fps_cap.max(1)))
    }
}
