//! Mouse orbit controls.
//!
//! Dragging rotates the camera around its target, shift-drag or middle-drag
//! pans, and the wheel zooms. Rotation is damped: drag deltas accumulate and
//! are released over several frames by [`OrbitController::update`].

use std::ops::RangeInclusive;

use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::KeyCode;

use crate::renderer::camera::Camera;

/// Sensitivity and limit constants for the orbit controls.
pub struct OrbitConfig {
    /// Mouse rotation sensitivity (radians per pixel)
    pub rotate_sensitivity: f32,
    /// Scales `rotate_sensitivity`
    pub rotate_speed: f32,
    /// Mouse pan sensitivity (units per pixel)
    pub pan_sensitivity: f32,
    /// Scroll zoom sensitivity (multiplier per scroll unit)
    pub zoom_sensitivity: f32,
    /// Fraction of the pending rotation dropped each update
    pub damping_factor: f32,
    /// Minimum camera distance
    pub min_distance: f32,
    /// Maximum camera distance
    pub max_distance: f32,
    /// Minimum elevation angle (radians); 0 keeps the camera above the horizon
    pub min_elevation: f32,
    /// Maximum elevation angle (radians, avoid looking straight down)
    pub max_elevation: f32,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            rotate_sensitivity: 0.005,
            rotate_speed: 0.5,
            pan_sensitivity: 0.1,
            zoom_sensitivity: 0.1,
            damping_factor: 0.25,
            min_distance: 1.0,
            max_distance: 24000.0,
            min_elevation: 0.0,
            max_elevation: std::f32::consts::FRAC_PI_2 - 0.01,
        }
    }
}

impl OrbitConfig {
    /// Allowed camera distance, never past the far plane.
    pub fn distance_range(&self, camera: &Camera) -> RangeInclusive<f32> {
        self.min_distance..=self.max_distance.min(camera.far)
    }
}

/// Tracks mouse state for drag operations.
#[derive(Default)]
pub struct PointerState {
    /// Left mouse button held
    pub left_pressed: bool,
    /// Middle mouse button held
    pub middle_pressed: bool,
    /// Shift key held
    pub shift_pressed: bool,
    /// Last mouse position (for computing delta)
    pub last_mouse_pos: Option<(f32, f32)>,
}

impl PointerState {
    /// Check if we should be rotating (left drag without shift)
    pub fn is_rotating(&self) -> bool {
        self.left_pressed && !self.shift_pressed
    }

    /// Check if we should be panning (middle drag OR shift+left drag)
    pub fn is_panning(&self) -> bool {
        self.middle_pressed || (self.left_pressed && self.shift_pressed)
    }
}

/// Orbit controller that processes pointer events and updates the camera.
#[derive(Default)]
pub struct OrbitController {
    pub config: OrbitConfig,
    pub pointer: PointerState,
    /// Rotation still to be applied, (azimuth, elevation) in radians
    pending: (f32, f32),
}

impl OrbitController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle mouse button press/release.
    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        let pressed = state == ElementState::Pressed;
        match button {
            MouseButton::Left => self.pointer.left_pressed = pressed,
            MouseButton::Middle => self.pointer.middle_pressed = pressed,
            _ => {}
        }
    }

    /// Track modifier keys. Returns true if the key was consumed.
    pub fn handle_modifier(&mut self, key: KeyCode, state: ElementState) -> bool {
        match key {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => {
                self.pointer.shift_pressed = state == ElementState::Pressed;
                true
            }
            _ => false,
        }
    }

    /// Handle mouse movement. Returns true if the controls changed.
    pub fn handle_mouse_move(&mut self, x: f32, y: f32, camera: &mut Camera) -> bool {
        let mut updated = false;

        if let Some((last_x, last_y)) = self.pointer.last_mouse_pos {
            let dx = x - last_x;
            let dy = y - last_y;

            if self.pointer.is_rotating() {
                let k = self.config.rotate_sensitivity * self.config.rotate_speed;
                self.pending.0 -= dx * k;
                self.pending.1 += dy * k;
                updated = true;
            } else if self.pointer.is_panning() {
                self.pan_camera(camera, dx, dy);
                updated = true;
            }
        }

        self.pointer.last_mouse_pos = Some((x, y));
        updated
    }

    /// Handle mouse scroll for zooming.
    pub fn handle_scroll(&mut self, delta: MouseScrollDelta, camera: &mut Camera) {
        let scroll_amount = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
        };

        self.zoom_camera(camera, scroll_amount);
    }

    /// Per-frame step: apply the pending rotation and decay it.
    pub fn update(&mut self, camera: &mut Camera) {
        camera.azimuth += self.pending.0;
        camera.elevation = (camera.elevation + self.pending.1)
            .clamp(self.config.min_elevation, self.config.max_elevation);

        let keep = 1.0 - self.config.damping_factor;
        self.pending.0 *= keep;
        self.pending.1 *= keep;
        if self.pending.0.abs() < 1e-6 && self.pending.1.abs() < 1e-6 {
            self.pending = (0.0, 0.0);
        }
    }

    /// Drop any rotation still in flight.
    pub fn stop(&mut self) {
        self.pending = (0.0, 0.0);
    }

    /// Pan camera target based on mouse delta.
    fn pan_camera(&self, camera: &mut Camera, dx: f32, dy: f32) {
        let (right, up, _) = camera.local_axes();

        // Scale pan by distance (feels more natural)
        let scale = camera.distance * self.config.pan_sensitivity * 0.01;

        camera.target -= right * dx * scale;
        camera.target += up * dy * scale;
    }

    /// Zoom camera by adjusting distance.
    fn zoom_camera(&self, camera: &mut Camera, scroll: f32) {
        // Exponential zoom feels more natural
        let factor = 1.0 - scroll * self.config.zoom_sensitivity;
        let range = self.config.distance_range(camera);
        camera.distance = (camera.distance * factor).clamp(*range.start(), *range.end());
    }
}
