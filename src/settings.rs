//! Player settings and preferences
//!
//! Persisted separately from anything gameplay related, in LocalStorage.

use serde::{Deserialize, Serialize};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 128,
            QualityPreset::Medium => 512,
            QualityPreset::High => 1024,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,

    // === Visual Effects ===
    /// Motion trails behind falling tokens and bombs
    pub entity_trails: bool,
    /// Slice and explosion particles
    pub particles: bool,
    /// Red flash after a bomb hit
    pub screen_flash: bool,

    // === Accessibility ===
    /// Reduced motion (no flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            entity_trails: true,
            particles: true,
            screen_flash: true,
            reduced_motion: false,
        }
    }
}

/// One edit made through the settings panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    Quality(QualityPreset),
    EntityTrails(bool),
    Particles(bool),
    ScreenFlash(bool),
    ReducedMotion(bool),
}

impl SettingsChange {
    /// Settings panel control IDs
    pub const CONTROLS: [&'static str; 5] = [
        "quality-select",
        "trails-toggle",
        "particles-toggle",
        "flash-toggle",
        "reduced-motion-toggle",
    ];

    /// Map a control's new state to a change. `value` is read for the
    /// quality select, `checked` for the toggles.
    pub fn from_control(id: &str, value: &str, checked: bool) -> Option<Self> {
        match id {
            "quality-select" => QualityPreset::parse(value).map(SettingsChange::Quality),
            "trails-toggle" => Some(SettingsChange::EntityTrails(checked)),
            "particles-toggle" => Some(SettingsChange::Particles(checked)),
            "flash-toggle" => Some(SettingsChange::ScreenFlash(checked)),
            "reduced-motion-toggle" => Some(SettingsChange::ReducedMotion(checked)),
            _ => None,
        }
    }
}

impl Settings {
    /// Apply one panel edit
    pub fn apply_change(&mut self, change: SettingsChange) {
        match change {
            SettingsChange::Quality(preset) => self.apply_preset(preset),
            SettingsChange::EntityTrails(on) => self.entity_trails = on,
            SettingsChange::Particles(on) => self.particles = on,
            SettingsChange::ScreenFlash(on) => self.screen_flash = on,
            SettingsChange::ReducedMotion(on) => self.reduced_motion = on,
        }
    }

    /// Current state of a panel control as `(value, checked)`
    pub fn control_state(&self, id: &str) -> Option<(&'static str, bool)> {
        match id {
            "quality-select" => Some((self.quality.as_str(), false)),
            "trails-toggle" => Some(("", self.entity_trails)),
            "particles-toggle" => Some(("", self.particles)),
            "flash-toggle" => Some(("", self.screen_flash)),
            "reduced-motion-toggle" => Some(("", self.reduced_motion)),
            _ => None,
        }
    }

    /// Apply a quality preset (updates quality-dependent settings)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;

        // Low preset drops trails for performance
        if preset == QualityPreset::Low {
            self.entity_trails = false;
        }
    }

    /// Effective screen flash (respects reduced_motion)
    pub fn effective_screen_flash(&self) -> bool {
        self.screen_flash && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "token_slash_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
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

        if let (Some(storage), Ok(json)) = (storage, serde_json::to_string(self)) {
            if storage.set_item(Self::STORAGE_KEY, &json).is_ok() {
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
    pub fn save(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_preset_disables_trails() {
        let mut s = Settings::default();
        s.apply_change(SettingsChange::Quality(QualityPreset::Low));
        assert!(!s.entity_trails);
        assert_eq!(s.max_particles(), 128);
    }

    #[test]
    fn test_controls_map_to_changes() {
        assert_eq!(
            SettingsChange::from_control("quality-select", "high", false),
            Some(SettingsChange::Quality(QualityPreset::High))
        );
        assert_eq!(SettingsChange::from_control("quality-select", "ultra", false), None);
        assert_eq!(
            SettingsChange::from_control("reduced-motion-toggle", "on", true),
            Some(SettingsChange::ReducedMotion(true))
        );
        assert_eq!(SettingsChange::from_control("volume", "1", true), None);
    }

    #[test]
    fn test_control_state_round_trips() {
        let mut s = Settings::default();
        s.apply_change(SettingsChange::Particles(false));
        s.apply_change(SettingsChange::ReducedMotion(true));
        assert_eq!(s.max_particles(), 0);
        assert!(!s.effective_screen_flash());

        let mut copy = Settings::default();
        for id in SettingsChange::CONTROLS {
            let (value, checked) = s.control_state(id).expect("known control");
            let change = SettingsChange::from_control(id, value, checked).expect("valid state");
            copy.apply_change(change);
        }
        assert_eq!(serde_json::to_string(&copy).ok(), serde_json::to_string(&s).ok());
    }

    #[test]
    fn test_particles_off_means_zero_cap() {
        let s = Settings {
            particles: false,
            ..Settings::default()
        };
        assert_eq!(s.max_particles(), 0);
    }

    #[test]
    fn test_reduced_motion_suppresses_flash() {
        let s = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!s.effective_screen_flash());
        assert!(Settings::default().effective_screen_flash());
    }

    #[test]
    fn test_parse_preset() {
        assert_eq!(QualityPreset::parse("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::parse("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::parse("ultra"), None);
        assert_eq!(QualityPreset::High.as_str(), "High");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let s: Settings = serde_json::from_str(r#"{ "reduced_motion": true }"#).expect("valid");
        assert!(s.reduced_motion);
        assert!(s.entity_trails);
    }
}
