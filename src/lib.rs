//! # sparkfield
//!
//! A GPU-resident 2D particle swarm. Particles collide through a per-frame
//! linked-list grid, heat up when they hit each other, and are pulled or
//! pushed by point attractors. Everything is drawn as additive sprites.
//!
//! ## Quick Start
//!
//! ```ignore
//! use sparkfield::prelude::*;
//!
//! fn main() -> Result<(), SimulationError> {
//!     let settings = Settings::preset("JiggleZoom")?;
//!     sparkfield::run(App::new(settings))
//! }
//! ```
//!
//! ## Frame pipeline
//!
//! Every frame runs three compute stages in one pass, then one render pass:
//!
//! 1. **reset**: every cell head becomes empty (`-1`)
//! 2. **build_grid**: each particle atomically swaps itself in as the head of
//!    its cell and links to the previous head
//! 3. **integrate**: attractor forces, collisions against the shuffled 3x3
//!    neighborhood, heat decay, and wall bounces
//! 4. **render**: one six-vertex quad per particle slot
//!
//! ## Grid shape
//!
//! The particle count is padded to a multiple of [`WORKGROUP_SIZE`] and the
//! grid is a divisor pair of that count, so there is one cell per particle
//! slot. See [`grid::grid_size`].
//!
//! ## Settings
//!
//! [`Settings`] can come from a built-in preset, a JSON file, or be edited at
//! runtime through [`SettingChange`]s. Each changed key maps to exactly one
//! [`Reaction`]:
//!
//! | keys | reaction |
//! |------|----------|
//! | particle count, speed, masses, starting position | rebuild the particle store |
//! | particle size | global uniforms |
//! | attractor mass, heat, restitution, collision cap | static simulation uniforms |
//! | colors | render uniforms |
//! | background | none |

mod app;
pub mod attractor;
pub mod error;
pub mod gpu;
pub mod grid;
pub mod input;
pub mod particle;
pub mod settings;
pub mod shaders;
pub mod spatial;
pub mod sprite;
pub mod time;
pub mod uniforms;

pub use app::{run, App};
pub use attractor::{Attractor, AttractorRegistry, Direction};
pub use error::{ConfigError, GpuError, SimulationError, TextureError};
pub use glam::Vec2;
pub use gpu::{FrameInput, SimulationContext};
pub use grid::GridShape;
pub use particle::{GpuParticle, WORKGROUP_SIZE};
pub use settings::{ChangeSet, Reaction, SettingChange, SettingKey, Settings, StartingPosition};
pub use sprite::SpriteTexture;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::app::{run, App};
    pub use crate::attractor::{AttractorRegistry, Direction};
    pub use crate::error::SimulationError;
    pub use crate::gpu::{FrameInput, SimulationContext};
    pub use crate::input::{Input, InputAction, KeyAction, PointerAction};
    pub use crate::settings::{ChangeSet, SettingChange, Settings, StartingPosition};
    pub use crate::sprite::SpriteTexture;
    pub use crate::time::Time;
    pub use crate::Vec2;
}
