//! Simulation settings and change tracking.
//!
//! [`Settings`] is the host-side configuration store. Every mutation goes
//! through a [`SettingChange`]; applying one yields the [`SettingKey`] that
//! actually changed, and a [`ChangeSet`] of keys maps onto the minimal set of
//! [`Reaction`]s the simulation has to run (reinitialize particles or rewrite
//! one of the uniform records).
//!
//! # Example
//!
//! ```
//! use sparkfield::settings::{ChangeSet, Reaction, SettingChange, Settings};
//!
//! let mut settings = Settings::default();
//! let mut changes = ChangeSet::new();
//! changes.extend(settings.apply(SettingChange::TempOnHit(0.2)));
//! changes.extend(settings.apply(SettingChange::Color1("#ff0000".into())));
//!
//! assert_eq!(
//!     changes.reactions(),
//!     vec![Reaction::StaticSimulationUniforms, Reaction::RenderUniforms]
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const PRESETS_JSON: &str = include_str!("assets/presets.json");

/// Where particles are placed when the store is (re)initialized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartingPosition {
    /// Uniformly over the canvas.
    #[default]
    Random,
    /// All particles at the canvas center, flying outward.
    Ring,
}

/// Every tunable parameter of the simulation.
///
/// Field names serialize in camelCase so preset documents stay compatible
/// with the stock presets shipped in `assets/presets.json`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub particle_count: u32,
    /// Initial scalar speed in pixels per second.
    pub speed: f32,
    /// Sprite half-extent in pixels; also the collision radius.
    pub particle_size: f32,
    pub min_mass: f32,
    pub max_mass: f32,
    /// Color of a cold particle, `#rrggbb`.
    pub color1: String,
    /// Color of a hot particle, `#rrggbb`.
    pub color2: String,
    pub background_color: String,
    pub attractor_mass: f32,
    /// Heat gained per collision.
    pub temp_on_hit: f32,
    /// Heat lost per second.
    pub cooldown_rate: f32,
    #[serde(rename = "CoefficientOfRestitution")]
    pub restitution: f32,
    #[serde(rename = "MaxCollisionsPerFrame")]
    pub max_collisions_per_frame: u32,
    pub starting_position: StartingPosition,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particle_count: 60 * 100,
            speed: 10.0,
            particle_size: 1.0,
            min_mass: 1.0,
            max_mass: 10.0,
            color1: "#FFFFFF".into(),
            color2: "#000000".into(),
            background_color: "#000000".into(),
            attractor_mass: 20.0,
            temp_on_hit: 0.6,
            cooldown_rate: 0.3,
            restitution: 0.5,
            max_collisions_per_frame: 5,
            starting_position: StartingPosition::Random,
        }
    }
}

impl Settings {
    /// Parse a settings document. Missing fields take their default.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a settings document from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Names of the built-in presets.
    pub fn preset_names() -> Vec<String> {
        presets().map(|p| p.into_keys().collect()).unwrap_or_default()
    }

    /// Load one of the built-in presets by name.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        presets()?
            .remove(name)
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    pub fn color1_rgb(&self) -> [f32; 3] {
        hex_to_rgb(&self.color1)
    }

    pub fn color2_rgb(&self) -> [f32; 3] {
        hex_to_rgb(&self.color2)
    }

    pub fn background_rgb(&self) -> [f32; 3] {
        hex_to_rgb(&self.background_color)
    }

    /// Apply one change. Returns the key if the stored value changed.
    pub fn apply(&mut self, change: SettingChange) -> Option<SettingKey> {
        let key = change.key();
        let changed = match change {
            SettingChange::ParticleCount(v) => replace(&mut self.particle_count, v),
            SettingChange::Speed(v) => replace(&mut self.speed, v),
            SettingChange::ParticleSize(v) => replace(&mut self.particle_size, v),
            SettingChange::MinMass(v) => replace(&mut self.min_mass, v),
            SettingChange::MaxMass(v) => replace(&mut self.max_mass, v),
            SettingChange::Color1(v) => replace(&mut self.color1, v),
            SettingChange::Color2(v) => replace(&mut self.color2, v),
            SettingChange::BackgroundColor(v) => replace(&mut self.background_color, v),
            SettingChange::AttractorMass(v) => replace(&mut self.attractor_mass, v),
            SettingChange::TempOnHit(v) => replace(&mut self.temp_on_hit, v),
            SettingChange::CooldownRate(v) => replace(&mut self.cooldown_rate, v),
            SettingChange::Restitution(v) => replace(&mut self.restitution, v),
            SettingChange::MaxCollisionsPerFrame(v) => {
                replace(&mut self.max_collisions_per_frame, v)
            }
            SettingChange::StartingPosition(v) => replace(&mut self.starting_position, v),
        };
        changed.then_some(key)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

fn presets() -> Result<BTreeMap<String, Settings>, ConfigError> {
    Ok(serde_json::from_str(PRESETS_JSON)?)
}

/// Convert `#rrggbb` (leading `#` optional) to RGB in 0..1.
///
/// Anything else yields black.
pub fn hex_to_rgb(hex: &str) -> [f32; 3] {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return [0.0; 3];
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    match (channel(0), channel(2), channel(4)) {
        (Some(r), Some(g), Some(b)) => [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0],
        _ => [0.0; 3],
    }
}

/// Identifies one setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SettingKey {
    ParticleCount,
    Speed,
    ParticleSize,
    MinMass,
    MaxMass,
    Color1,
    Color2,
    BackgroundColor,
    AttractorMass,
    TempOnHit,
    CooldownRate,
    Restitution,
    MaxCollisionsPerFrame,
    StartingPosition,
}

impl SettingKey {
    /// The recompute a change to this key requires.
    pub fn reaction(self) -> Reaction {
        match self {
            SettingKey::ParticleCount
            | SettingKey::Speed
            | SettingKey::MinMass
            | SettingKey::MaxMass
            | SettingKey::StartingPosition => Reaction::Reinitialize,
            SettingKey::ParticleSize => Reaction::GlobalUniforms,
            SettingKey::AttractorMass
            | SettingKey::TempOnHit
            | SettingKey::CooldownRate
            | SettingKey::Restitution
            | SettingKey::MaxCollisionsPerFrame => Reaction::StaticSimulationUniforms,
            SettingKey::Color1 | SettingKey::Color2 => Reaction::RenderUniforms,
            SettingKey::BackgroundColor => Reaction::None,
        }
    }
}

/// A new value for one setting.
#[derive(Clone, Debug, PartialEq)]
pub enum SettingChange {
    ParticleCount(u32),
    Speed(f32),
    ParticleSize(f32),
    MinMass(f32),
    MaxMass(f32),
    Color1(String),
    Color2(String),
    BackgroundColor(String),
    AttractorMass(f32),
    TempOnHit(f32),
    CooldownRate(f32),
    Restitution(f32),
    MaxCollisionsPerFrame(u32),
    StartingPosition(StartingPosition),
}

impl SettingChange {
    pub fn key(&self) -> SettingKey {
        match self {
            SettingChange::ParticleCount(_) => SettingKey::ParticleCount,
            SettingChange::Speed(_) => SettingKey::Speed,
            SettingChange::ParticleSize(_) => SettingKey::ParticleSize,
            SettingChange::MinMass(_) => SettingKey::MinMass,
            SettingChange::MaxMass(_) => SettingKey::MaxMass,
            SettingChange::Color1(_) => SettingKey::Color1,
            SettingChange::Color2(_) => SettingKey::Color2,
            SettingChange::BackgroundColor(_) => SettingKey::BackgroundColor,
            SettingChange::AttractorMass(_) => SettingKey::AttractorMass,
            SettingChange::TempOnHit(_) => SettingKey::TempOnHit,
            SettingChange::CooldownRate(_) => SettingKey::CooldownRate,
            SettingChange::Restitution(_) => SettingKey::Restitution,
            SettingChange::MaxCollisionsPerFrame(_) => SettingKey::MaxCollisionsPerFrame,
            SettingChange::StartingPosition(_) => SettingKey::StartingPosition,
        }
    }
}

/// What the simulation must recompute after settings change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Reaction {
    /// Rebuild the particle store; also rewrites the global uniforms.
    Reinitialize,
    GlobalUniforms,
    StaticSimulationUniforms,
    RenderUniforms,
    /// Value is read directly at encode time.
    None,
}

/// A set of changed keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    keys: BTreeSet<SettingKey>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: SettingKey) {
        self.keys.insert(key);
    }

    pub fn contains(&self, key: SettingKey) -> bool {
        self.keys.contains(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = SettingKey> + '_ {
        self.keys.iter().copied()
    }

    /// Deduplicated reactions in execution order.
    ///
    /// `Reinitialize` subsumes `GlobalUniforms`; `None` never appears.
    pub fn reactions(&self) -> Vec<Reaction> {
        let wanted: BTreeSet<Reaction> = self.keys.iter().map(|k| k.reaction()).collect();
        let mut out = Vec::new();
        if wanted.contains(&Reaction::Reinitialize) {
            out.push(Reaction::Reinitialize);
        } else if wanted.contains(&Reaction::GlobalUniforms) {
            out.push(Reaction::GlobalUniforms);
        }
        if wanted.contains(&Reaction::StaticSimulationUniforms) {
            out.push(Reaction::StaticSimulationUniforms);
        }
        if wanted.contains(&Reaction::RenderUniforms) {
            out.push(Reaction::RenderUniforms);
        }
        out
    }
}

impl Extend<SettingKey> for ChangeSet {
    fn extend<I: IntoIterator<Item = SettingKey>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}

impl FromIterator<SettingKey> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = SettingKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}
