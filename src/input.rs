//! Pointer and keyboard handling.
//!
//! [`Input`] turns raw window events into simulation actions. The pointer is
//! tracked in canvas pixels with the origin at the bottom-left, clamped to the
//! canvas.
//!
//! | gesture              | action                                   |
//! |----------------------|------------------------------------------|
//! | left press           | [`PointerAction::FollowStart`]           |
//! | Shift + left press   | [`PointerAction::AddAttractor`] (attract)|
//! | Ctrl + left press    | [`PointerAction::AddAttractor`] (repel)  |
//! | left release         | [`PointerAction::FollowEnd`]             |
//! | `R`                  | [`KeyAction::Restart`]                   |
//! | `C`                  | [`KeyAction::ClearAttractors`]           |

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::attractor::Direction;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerAction {
    /// Drop a fixed attractor at the pointer.
    AddAttractor(Direction),
    /// Treat the pointer as a live attractor while held.
    FollowStart,
    FollowEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Restart,
    ClearAttractors,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    Pointer(PointerAction),
    Key(KeyAction),
}

/// Pointer and modifier state.
#[derive(Debug, Clone, Default)]
pub struct Input {
    canvas_size: Vec2,
    window_size: Vec2,
    pointer: Vec2,
    shift: bool,
    ctrl: bool,
    following: bool,
}

impl Input {
    pub fn new(canvas_width: u32, canvas_height: u32) -> Self {
        let canvas_size = Vec2::new(canvas_width as f32, canvas_height as f32);
        Self {
            canvas_size,
            window_size: canvas_size,
            ..Default::default()
        }
    }

    /// The window was resized; the canvas keeps its size and is stretched.
    pub fn resize(&mut self, window_width: u32, window_height: u32) {
        if window_width > 0 && window_height > 0 {
            self.window_size = Vec2::new(window_width as f32, window_height as f32);
        }
    }

    /// Pointer position in canvas pixels, origin bottom-left.
    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    /// Whether the pointer is currently acting as an attractor.
    pub fn following(&self) -> bool {
        self.following
    }

    /// Process a winit window event, returning the action it triggers.
    pub fn handle_event(&mut self, event: &WindowEvent) -> Option<InputAction> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(position.x as f32, position.y as f32);
                None
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.set_modifiers(state.shift_key(), state.control_key());
                None
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let action = match state {
                    ElementState::Pressed => self.pointer_pressed(),
                    ElementState::Released => self.pointer_released(),
                };
                Some(InputAction::Pointer(action))
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat =>
            {
                match event.physical_key {
                    PhysicalKey::Code(code) => key_action(code).map(InputAction::Key),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Cursor moved to window pixel `(x, y)`, origin top-left.
    pub fn cursor_moved(&mut self, x: f32, y: f32) {
        let scale = if self.window_size.min_element() > 0.0 {
            self.canvas_size / self.window_size
        } else {
            Vec2::ONE
        };
        let x = (x * scale.x).clamp(0.0, self.canvas_size.x);
        let y = (y * scale.y).clamp(0.0, self.canvas_size.y);
        self.pointer = Vec2::new(x, self.canvas_size.y - y);
    }

    pub fn set_modifiers(&mut self, shift: bool, ctrl: bool) {
        self.shift = shift;
        self.ctrl = ctrl;
    }

    pub fn pointer_pressed(&mut self) -> PointerAction {
        if self.shift {
            PointerAction::AddAttractor(Direction::Attract)
        } else if self.ctrl {
            PointerAction::AddAttractor(Direction::Repel)
        } else {
            self.following = true;
            PointerAction::FollowStart
        }
    }

    pub fn pointer_released(&mut self) -> PointerAction {
        self.following = false;
        PointerAction::FollowEnd
    }
}

fn key_action(code: KeyCode) -> Option<KeyAction> {
    match code {
        KeyCode::KeyR => Some(KeyAction::Restart),
        KeyCode::KeyC => Some(KeyAction::ClearAttractors),
        _ => None,
    }
}
