//! Player settings and preferences
//!
//! Persisted separately from scores in LocalStorage, under the shared
//! `mgp:` key namespace.

use serde::{Deserialize, Serialize};

/// Visual theme presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Theme {
    Midnight,
    Sunset,
    #[default]
    Graphite,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Midnight => "midnight",
            Theme::Sunset => "sunset",
            Theme::Graphite => "graphite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "midnight" => Some(Theme::Midnight),
            "sunset" => Some(Theme::Sunset),
            "graphite" => Some(Theme::Graphite),
            _ => None,
        }
    }

    /// Next theme in the cycle order
    pub fn cycle(&self) -> Self {
        match self {
            Theme::Midnight => Theme::Sunset,
            Theme::Sunset => Theme::Graphite,
            Theme::Graphite => Theme::Midnight,
        }
    }

    /// Table background fill
    pub fn background(&self) -> &'static str {
        match self {
            Theme::Midnight => "#0b1020",
            Theme::Sunset => "#1d1024",
            Theme::Graphite => "#14161a",
        }
    }

    /// Primary accent used for lamps and the plunger gauge
    pub fn accent(&self) -> &'static str {
        match self {
            Theme::Midnight => "#6ea8ff",
            Theme::Sunset => "#ff9e64",
            Theme::Graphite => "#9ece6a",
        }
    }
}

/// Player settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Visual theme
    pub theme: Theme,

    // === Feedback ===
    /// Sound effects
    pub sfx: bool,
    /// Vibration on bumper hits and tilt (touch devices)
    pub haptics: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,

    // === Accessibility ===
    /// Reduced motion (no bumper pulse glow, no DMD blink)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: Theme::Graphite,
            sfx: true,
            haptics: true,
            show_fps: false,
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective pulse glow (respects reduced_motion)
    pub fn effective_pulse(&self) -> bool {
        !self.reduced_motion
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "mgp:pinball:settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                if let Ok(settings) = serde_json::from_str(&json) {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_cycle_covers_all() {
        let start = Theme::Graphite;
        let mut theme = start;
        let mut seen = vec![theme];
        loop {
            theme = theme.cycle();
            if theme == start {
                break;
            }
            seen.push(theme);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_theme_round_trips_through_str() {
        for theme in [Theme::Midnight, Theme::Sunset, Theme::Graphite] {
            assert_eq!(Theme::from_str(theme.as_str()), Some(theme));
        }
        assert_eq!(Theme::from_str("neon"), None);
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = Settings {
            theme: Theme::Sunset,
            sfx: false,
            haptics: true,
            show_fps: true,
            reduced_motion: true,
        };
        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.theme, Theme::Sunset);
        assert!(!back.sfx);
        assert!(back.reduced_motion);
    }
}
