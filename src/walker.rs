//! Keyboard fly-through movement.
//!
//! Held keys set movement flags; every frame tick the [`Walker`] translates
//! the camera by a fixed step along its local axes for each flag that is set.

use glam::Vec3;
use winit::event::ElementState;
use winit::keyboard::KeyCode;

use crate::renderer::camera::Camera;

/// Distance moved per tick for each active flag.
pub const STEP: f32 = 0.5;

/// A direction of travel bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
}

impl Movement {
    /// Key bindings: W/S forward and back, A/D strafe, R/F rise and sink.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::KeyW => Some(Movement::Forward),
            KeyCode::KeyA => Some(Movement::Left),
            KeyCode::KeyS => Some(Movement::Backward),
            KeyCode::KeyD => Some(Movement::Right),
            KeyCode::KeyR => Some(Movement::Up),
            KeyCode::KeyF => Some(Movement::Down),
            _ => None,
        }
    }
}

/// Which directions are currently held.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MovementFlags {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl MovementFlags {
    pub fn set(&mut self, movement: Movement, active: bool) {
        let flag = match movement {
            Movement::Forward => &mut self.forward,
            Movement::Backward => &mut self.backward,
            Movement::Left => &mut self.left,
            Movement::Right => &mut self.right,
            Movement::Up => &mut self.up,
            Movement::Down => &mut self.down,
        };
        *flag = active;
    }

    pub fn any(&self) -> bool {
        self.forward || self.backward || self.left || self.right || self.up || self.down
    }
}

pub struct Walker {
    pub flags: MovementFlags,
    /// Keep moving forward unless backward is held
    pub auto_forward: bool,
    pub step: f32,
}

impl Walker {
    pub fn new() -> Self {
        Self {
            flags: MovementFlags::default(),
            auto_forward: false,
            step: STEP,
        }
    }

    /// Update flags from a key event. Returns true if the key is a movement key.
    ///
    /// Key repeat while held leaves the flag set.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        match Movement::from_key(key) {
            Some(movement) => {
                self.flags.set(movement, state == ElementState::Pressed);
                true
            }
            None => false,
        }
    }

    /// Release every held direction, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.flags = MovementFlags::default();
    }

    /// Apply one frame of movement to `camera`.
    ///
    /// Each active flag is applied as its own translation, so holding
    /// opposite directions applies both.
    pub fn tick(&self, camera: &mut Camera) {
        let flags = &self.flags;
        let step = self.step;

        if flags.forward || (self.auto_forward && !flags.backward) {
            camera.translate_local(Vec3::new(0.0, 0.0, -step));
        }
        if flags.backward {
            camera.translate_local(Vec3::new(0.0, 0.0, step));
        }

        if flags.left {
            camera.translate_local(Vec3::new(-step, 0.0, 0.0));
        }
        if flags.right {
            camera.translate_local(Vec3::new(step, 0.0, 0.0));
        }

        if flags.up {
            camera.translate_local(Vec3::new(0.0, step, 0.0));
        }
        if flags.down {
            camera.translate_local(Vec3::new(0.0, -step, 0.0));
        }
    }
}

impl Default for Walker {
    fn default() -> Self {
        Self::new()
    }
}
