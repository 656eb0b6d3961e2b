mod geometry;

pub use geometry::Geometry;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use stackd_util::{Color, NotificationUrgency, UrgencyTimeouts};

pub const ID: &str = "stackd";

// Only reachable for configs built in code, files are validated on load.
const FALLBACK_COLOR: Color = Color::rgb(0.5, 0.5, 0.5);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid geometry {0:?}")]
    InvalidGeometry(String),
    #[error("invalid color for {field}: {value:?}")]
    InvalidColor { field: String, value: String },
}

/// Which monitor the window goes to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FollowMode {
    /// The configured monitor, or the default screen.
    #[default]
    None,
    /// The monitor holding the pointer.
    Mouse,
    /// The monitor holding the focused window.
    Keyboard,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Per-urgency overrides. Unset fields fall back to the built-in value
/// for that urgency.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UrgencyConfig {
    pub foreground: Option<String>,
    pub background: Option<String>,
    /// Seconds; `0` never expires.
    pub timeout: Option<u64>,
}

/// Resolved colors and default expiry for one urgency level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UrgencyStyle {
    pub foreground: Color,
    pub background: Color,
    pub timeout: Option<Duration>,
}

/// Key combinations, written as `mod+mod+key` with X keysym names.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShortcutsConfig {
    pub close: String,
    pub close_all: String,
    pub history: String,
    pub context: String,
}

impl Default for ShortcutsConfig {
    fn default() -> Self {
        Self {
            close: "ctrl+space".to_string(),
            close_all: "ctrl+shift+space".to_string(),
            history: "ctrl+grave".to_string(),
            context: "ctrl+shift+period".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Pango font description.
    pub font: String,
    /// Display template, see the `%s %b %a %i %p %%` placeholders.
    pub format: String,
    /// Render a small markup subset instead of stripping it.
    pub allow_markup: bool,
    pub alignment: Alignment,
    pub word_wrap: bool,
    /// Extra spacing between lines in pixels.
    pub line_height: i32,
    /// Vertical padding inside each block.
    pub padding: i32,
    pub horizontal_padding: i32,
    pub frame_width: i32,
    pub frame_color: String,
    /// Height of the rule drawn between blocks, `0` for none.
    pub separator_height: i32,
    pub separator_color: String,
    pub geometry: Geometry,
    /// Xinerama monitor index used with `follow = "none"`.
    pub monitor: Option<u32>,
    pub follow: FollowMode,
    /// Seconds without input after which timeouts pause, `0` disables.
    pub idle_threshold: u64,
    /// Window transparency in percent.
    pub transparency: u8,
    /// Maximum number of displayed notifications, `0` for no limit.
    ///
    /// A non-zero geometry height takes precedence.
    pub max_notifications: u32,
    pub history_length: usize,
    /// Notifications recalled from history never expire.
    pub sticky_history: bool,
    /// Keep everything queued instead of showing it.
    pub do_not_disturb: bool,
    /// Command reading `#label [app]` lines on stdin for the context menu.
    pub dmenu: String,
    pub shortcuts: ShortcutsConfig,
    pub low: UrgencyConfig,
    pub normal: UrgencyConfig,
    pub critical: UrgencyConfig,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            font: "Monospace 8".to_string(),
            format: "<b>%s</b> %b".to_string(),
            allow_markup: true,
            alignment: Alignment::default(),
            word_wrap: true,
            line_height: 0,
            padding: 4,
            horizontal_padding: 8,
            frame_width: 1,
            frame_color: "#888888".to_string(),
            separator_height: 2,
            separator_color: "#888888".to_string(),
            geometry: Geometry {
                width: 300,
                height: 0,
                x: -30,
                y: 20,
                x_negative: true,
                y_negative: false,
            },
            monitor: None,
            follow: FollowMode::default(),
            idle_threshold: 120,
            transparency: 0,
            max_notifications: 5,
            history_length: 20,
            sticky_history: true,
            do_not_disturb: false,
            dmenu: "dmenu -p stackd:".to_string(),
            shortcuts: ShortcutsConfig::default(),
            low: UrgencyConfig::default(),
            normal: UrgencyConfig::default(),
            critical: UrgencyConfig::default(),
        }
    }
}

// Built-in per-urgency values: (foreground, background, timeout seconds)
const fn builtin(urgency: NotificationUrgency) -> (&'static str, &'static str, u64) {
    match urgency {
        NotificationUrgency::Low => ("#888888", "#222222", 10),
        NotificationUrgency::Normal => ("#ffffff", "#285577", 10),
        NotificationUrgency::Critical => ("#ffffff", "#900000", 0),
    }
}

/// Default location of the config file.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(ID).join("stackd.toml"))
}

impl NotificationsConfig {
    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&source)
    }

    /// Load `path`, or the default location when `None`.
    ///
    /// A missing default file is not an error. An explicitly named file
    /// must exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load(&path),
                _ => {
                    tracing::info!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.transparency > 100 {
            tracing::warn!("transparency {} clamped to 100", self.transparency);
            self.transparency = 100;
        }
        parse_color("frame_color", &self.frame_color)?;
        parse_color("separator_color", &self.separator_color)?;
        for urgency in [
            NotificationUrgency::Low,
            NotificationUrgency::Normal,
            NotificationUrgency::Critical,
        ] {
            self.urgency_style(urgency)?;
        }
        Ok(())
    }

    fn urgency_config(&self, urgency: NotificationUrgency) -> &UrgencyConfig {
        match urgency {
            NotificationUrgency::Low => &self.low,
            NotificationUrgency::Normal => &self.normal,
            NotificationUrgency::Critical => &self.critical,
        }
    }

    /// Colors and default timeout for `urgency`, merged with built-ins.
    pub fn urgency_style(&self, urgency: NotificationUrgency) -> Result<UrgencyStyle, ConfigError> {
        let (fg, bg, timeout) = builtin(urgency);
        let config = self.urgency_config(urgency);
        let foreground = config.foreground.as_deref().unwrap_or(fg);
        let background = config.background.as_deref().unwrap_or(bg);
        let timeout = config.timeout.unwrap_or(timeout);

        Ok(UrgencyStyle {
            foreground: parse_color(&format!("{urgency}.foreground"), foreground)?,
            background: parse_color(&format!("{urgency}.background"), background)?,
            timeout: (timeout > 0).then(|| Duration::from_secs(timeout)),
        })
    }

    /// Server-side default expiry per urgency.
    pub fn timeouts(&self) -> UrgencyTimeouts {
        let timeout = |urgency| {
            let (_, _, builtin) = builtin(urgency);
            let secs = self.urgency_config(urgency).timeout.unwrap_or(builtin);
            (secs > 0).then(|| Duration::from_secs(secs))
        };
        UrgencyTimeouts {
            low: timeout(NotificationUrgency::Low),
            normal: timeout(NotificationUrgency::Normal),
            critical: timeout(NotificationUrgency::Critical),
        }
    }

    /// How many notifications may be displayed at once, `None` for no limit.
    pub fn max_slots(&self) -> Option<usize> {
        let slots = if self.geometry.height > 0 {
            self.geometry.height
        } else {
            self.max_notifications
        };
        (slots > 0).then_some(slots as usize)
    }

    pub fn frame_color(&self) -> Color {
        self.frame_color.parse().unwrap_or(FALLBACK_COLOR)
    }

    pub fn separator_color(&self) -> Color {
        self.separator_color.parse().unwrap_or(FALLBACK_COLOR)
    }

    pub fn idle_threshold(&self) -> Option<Duration> {
        (self.idle_threshold > 0).then(|| Duration::from_secs(self.idle_threshold))
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidColor {
        field: field.to_string(),
        value: value.to_string(),
    })
}
