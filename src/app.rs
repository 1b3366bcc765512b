//! Application context.
//!
//! [`Viewer`] owns everything the event handlers mutate: camera, movement
//! flags, orbit controls and the loaded scene. It is only created once the
//! environment is known to support GPU rendering.

use thiserror::Error;
use winit::event::{ElementState, MouseButton, MouseScrollDelta};
use winit::keyboard::KeyCode;

use crate::config::ViewerConfig;
use crate::input::OrbitController;
use crate::renderer::camera::Camera;
use crate::scene::Scene;
use crate::walker::Walker;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("GPU rendering is not supported here: {reason}")]
pub struct UnsupportedEnvironment {
    pub reason: String,
}

/// One-shot check that the host can render.
pub trait CapabilityProbe {
    fn probe(&self) -> Result<(), UnsupportedEnvironment>;
}

/// User-visible warning shown when the viewer cannot start.
#[derive(Debug, Default)]
pub struct WarningIndicator {
    message: Option<String>,
}

impl WarningIndicator {
    pub fn raise(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    pub fn is_visible(&self) -> bool {
        self.message.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

pub struct Viewer {
    pub camera: Camera,
    pub walker: Walker,
    pub orbit: OrbitController,
    pub scene: Scene,
}

impl Viewer {
    /// Check the environment, then build the scene.
    ///
    /// When the probe fails the indicator is raised and `build_scene` is never
    /// called.
    pub fn create<P, F>(
        probe: &P,
        indicator: &mut WarningIndicator,
        config: &ViewerConfig,
        build_scene: F,
    ) -> Result<Self, UnsupportedEnvironment>
    where
        P: CapabilityProbe + ?Sized,
        F: FnOnce(&ViewerConfig) -> Scene,
    {
        if let Err(err) = probe.probe() {
            log::error!("{}", err);
            indicator.raise(err.to_string());
            return Err(err);
        }

        let scene = build_scene(config);
        let mut walker = Walker::new();
        walker.auto_forward = config.auto_forward;

        Ok(Self {
            camera: Camera::new(),
            walker,
            orbit: OrbitController::new(),
            scene,
        })
    }

    /// Advance one frame: settle orbit damping, then walk.
    pub fn tick(&mut self) {
        self.orbit.update(&mut self.camera);
        self.walker.tick(&mut self.camera);
    }

    /// Route a key event. Returns true if the key was used.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        if self.orbit.handle_modifier(key, state) {
            return true;
        }
        if self.walker.handle_key(key, state) {
            return true;
        }
        if key == KeyCode::Home && state == ElementState::Pressed {
            self.reset_camera();
            return true;
        }
        false
    }

    pub fn handle_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        self.orbit.handle_mouse_button(button, state);
    }

    pub fn handle_mouse_move(&mut self, x: f32, y: f32) -> bool {
        self.orbit.handle_mouse_move(x, y, &mut self.camera)
    }

    pub fn handle_scroll(&mut self, delta: MouseScrollDelta) {
        self.orbit.handle_scroll(delta, &mut self.camera);
    }

    /// Forget held keys and buttons, e.g. when focus is lost.
    pub fn release_input(&mut self) {
        self.walker.release_all();
        self.orbit.pointer = Default::default();
    }

    pub fn reset_camera(&mut self) {
        self.camera = Camera::new();
        self.orbit.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct FixedProbe(Option<&'static str>);

    impl CapabilityProbe for FixedProbe {
        fn probe(&self) -> Result<(), UnsupportedEnvironment> {
            match self.0 {
                Some(reason) => Err(UnsupportedEnvironment {
                    reason: reason.to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_unsupported_skips_scene_and_raises_warning() {
        let built = Cell::new(false);
        let mut indicator = WarningIndicator::default();
        assert!(!indicator.is_visible());

        let result = Viewer::create(
            &FixedProbe(Some("no adapter")),
            &mut indicator,
            &ViewerConfig::default(),
            |_| {
                built.set(true);
                Scene::empty()
            },
        );

        assert!(result.is_err());
        assert!(!built.get());
        assert!(indicator.is_visible());
        assert!(indicator.message().unwrap().contains("no adapter"));
    }

    #[test]
    fn test_supported_builds_scene() {
        let mut indicator = WarningIndicator::default();
        let config = ViewerConfig {
            auto_forward: true,
            ..ViewerConfig::default()
        };

        let viewer = Viewer::create(&FixedProbe(None), &mut indicator, &config, |_| {
            Scene::empty()
        })
        .unwrap();

        assert!(!indicator.is_visible());
        assert!(viewer.walker.auto_forward);
    }

    fn viewer() -> Viewer {
        let mut indicator = WarningIndicator::default();
        Viewer::create(
            &FixedProbe(None),
            &mut indicator,
            &ViewerConfig::default(),
            |_| Scene::empty(),
        )
        .unwrap()
    }

    #[test]
    fn test_tick_applies_held_movement() {
        let mut viewer = viewer();
        let start = viewer.camera.position();

        assert!(viewer.handle_key(KeyCode::KeyR, ElementState::Pressed));
        viewer.tick();
        viewer.tick();

        let moved = viewer.camera.position() - start;
        assert!((moved.length() - 1.0).abs() < 1e-3);
        assert!(moved.y > 0.0);
    }

    #[test]
    fn test_home_resets_camera() {
        let mut viewer = viewer();
        viewer.handle_key(KeyCode::KeyD, ElementState::Pressed);
        viewer.tick();
        viewer.handle_key(KeyCode::KeyD, ElementState::Released);

        assert!(viewer.handle_key(KeyCode::Home, ElementState::Pressed));
        assert_eq!(viewer.camera.target, Camera::new().target);
    }

    #[test]
    fn test_release_input() {
        let mut viewer = viewer();
        viewer.handle_key(KeyCode::KeyW, ElementState::Pressed);
        viewer.handle_mouse_button(MouseButton::Left, ElementState::Pressed);

        viewer.release_input();

        assert!(!viewer.walker.flags.any());
        assert!(!viewer.orbit.pointer.left_pressed);
    }
}
