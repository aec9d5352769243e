use anyhow::{Context, Result};
use directories::ProjectDirs;
use ratatui::style::Color;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub theme: Theme,
    pub icons: Icons,
    pub logging: Logging,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Theme {
    #[serde(deserialize_with = "hex_to_color")]
    pub background: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub foreground: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub title_bar: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub close: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub button: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub disabled: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub focus: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub work: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub rest: Color,
    #[serde(deserialize_with = "hex_to_color")]
    pub black: Color,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Icons {
    pub close: String,
    pub running: String,
    pub paused: String,
    pub stopped: String,
    pub focus: String,
    pub separator: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Logging {
    /// Any `EnvFilter` directive; `RUST_LOG` wins when set.
    pub level: String,
}

// Greys and browns of a classic Tk window.
impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Rgb(110, 110, 110),
            foreground: Color::Rgb(255, 255, 255),
            title_bar: Color::Rgb(84, 84, 84),
            close: Color::Rgb(139, 35, 35),
            button: Color::Rgb(84, 84, 84),
            disabled: Color::Rgb(150, 150, 150),
            focus: Color::Rgb(72, 61, 139),
            work: Color::Rgb(255, 255, 255),
            rest: Color::Rgb(138, 154, 123),
            black: Color::Rgb(13, 12, 12),
        }
    }
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            close: "X".to_string(),
            running: "▶".to_string(),
            paused: "⏸".to_string(),
            stopped: "■".to_string(),
            focus: "▸".to_string(),
            separator: "│".to_string(),
        }
    }
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn hex_to_color<'de, D>(deserializer: D) -> Result<Color, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = serde::Deserialize::deserialize(deserializer)?;
    // Byte slicing below needs every character to be one byte wide.
    if !s.is_ascii() || !s.starts_with('#') || s.len() != 7 {
        return Err(serde::de::Error::custom("invalid hex color format"));
    }
    let r = u8::from_str_radix(&s[1..3], 16).map_err(serde::de::Error::custom)?;
    let g = u8::from_str_radix(&s[3..5], 16).map_err(serde::de::Error::custom)?;
    let b = u8::from_str_radix(&s[5..7], 16).map_err(serde::de::Error::custom)?;
    Ok(Color::Rgb(r, g, b))
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "pomodoro", "Pomodoro")
}

pub fn config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("pomodoro.toml"))
}

pub fn parse_config(source: &str) -> Result<Config> {
    Ok(toml::from_str(source)?)
}

pub fn load_config() -> Result<Config> {
    match config_path() {
        Some(path) if path.exists() => {
            let config_str = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file at {:?}", path))?;
            parse_config(&config_str)
                .with_context(|| format!("Failed to parse config file at {:?}", path))
        }
        _ => Ok(Config::default()),
    }
}
