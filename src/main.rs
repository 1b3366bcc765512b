mod app;
mod config;
mod input;
mod renderer;
mod scene;
mod terrain;
mod ui;
mod walker;

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use app::{Viewer, WarningIndicator};
use config::{LayerConfig, ViewerConfig};
use renderer::{GpuProbe, Renderer};
use scene::{LayerKind, Scene};
use terrain::{HeightFormat, Source};

#[derive(Parser, Debug)]
#[command(name = "hmv")]
#[command(about = "Heightmap terrain viewer")]
struct Args {
    /// Ground heightmap: JSON array of numbers or an image, path or URL
    #[arg(default_value = config::DEFAULT_HEIGHTS)]
    heights: String,

    /// Colour texture draped over the ground
    #[arg(long, default_value = config::DEFAULT_TEXTURE)]
    texture: String,

    /// Water heightmap, drawn as a second layer
    #[arg(long, default_value = config::DEFAULT_WATER_HEIGHTS)]
    water: String,

    /// Colour texture for the water layer
    #[arg(long, default_value = config::DEFAULT_WATER_TEXTURE)]
    water_texture: String,

    /// Skip the water layer
    #[arg(long)]
    no_water: bool,

    /// Heightmap encoding (detected from the extension by default)
    #[arg(long, value_enum)]
    format: Option<HeightFormat>,

    /// Multiplier for numeric heightmap entries
    #[arg(long, default_value_t = terrain::loader::NUMERIC_HEIGHT_SCALE)]
    numeric_scale: f32,

    /// Divisor for image heightmaps: height = (R+G+B) / (12 * scale)
    #[arg(long, default_value = "1.0", value_parser = parse_image_scale)]
    image_scale: f32,

    /// Grid segments per side, e.g. 255 or 255x127 (derived from the heightmap by default)
    #[arg(long, value_parser = parse_segments)]
    segments: Option<(usize, usize)>,

    /// Plane extent in world units
    #[arg(long, default_value_t = config::DEFAULT_SIZE)]
    size: f32,

    /// Keep flying forward unless S is held
    #[arg(long)]
    auto_forward: bool,
}

fn parse_segments(s: &str) -> Result<(usize, usize), String> {
    let parse = |v: &str| match v.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("invalid segment count '{}'", v)),
    };
    match s.split_once(['x', 'X']) {
        Some((x, z)) => Ok((parse(x)?, parse(z)?)),
        None => {
            let n = parse(s)?;
            Ok((n, n))
        }
    }
}

fn parse_image_scale(s: &str) -> Result<f32, String> {
    match s.trim().parse::<f32>() {
        Ok(scale) if scale.is_finite() && scale > 0.0 => Ok(scale),
        _ => Err(format!("image scale must be a positive number, got '{}'", s)),
    }
}

impl From<Args> for ViewerConfig {
    fn from(args: Args) -> Self {
        Self {
            ground: LayerConfig {
                kind: LayerKind::Ground,
                heights: Source::parse(&args.heights),
                texture: Some(Source::parse(&args.texture)),
            },
            water: (!args.no_water).then(|| LayerConfig {
                kind: LayerKind::Water,
                heights: Source::parse(&args.water),
                texture: Some(Source::parse(&args.water_texture)),
            }),
            format: args.format,
            numeric_scale: args.numeric_scale,
            image_scale: args.image_scale,
            segments: args.segments,
            size: args.size,
            auto_forward: args.auto_forward,
        }
    }
}

struct App {
    window: Option<Arc<Window>>,
    renderer: Option<Renderer>,
    viewer: Viewer,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attrs = Window::default_attributes().with_title("hmv - Heightmap Viewer");
        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Cannot create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(Renderer::new(window.clone(), &mut self.viewer.scene)) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("Cannot initialise renderer: {:#}", e);
                event_loop.exit();
                return;
            }
        }

        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let (Some(window), Some(renderer)) = (self.window.as_ref(), self.renderer.as_mut()) else {
            return;
        };

        let consumed = renderer.handle_window_event(window, &event);

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => {
                // Releases always go through so no flag stays stuck
                if !consumed || state == ElementState::Released {
                    self.viewer.handle_key(key, state);
                }
            }
            WindowEvent::Focused(false) => {
                self.viewer.release_input();
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if !consumed || state == ElementState::Released {
                    self.viewer.handle_mouse_button(button, state);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.viewer
                    .handle_mouse_move(position.x as f32, position.y as f32);
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if !consumed {
                    self.viewer.handle_scroll(delta);
                }
            }
            WindowEvent::Resized(physical_size) => {
                renderer.resize(physical_size);
            }
            WindowEvent::RedrawRequested => {
                self.viewer.tick();
                match renderer.render(window, &mut self.viewer) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        renderer.resize(renderer.size)
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of GPU memory");
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
                window.request_redraw();
            }
            _ => {}
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = ViewerConfig::from(Args::parse());

    let mut indicator = WarningIndicator::default();
    let viewer = match Viewer::create(&GpuProbe, &mut indicator, &config, Scene::load) {
        Ok(viewer) => viewer,
        Err(e) => {
            if indicator.is_visible() {
                eprintln!("WARNING: {}", indicator.message().unwrap_or_default());
            }
            return Err(e.into());
        }
    };

    for layer in &viewer.scene.layers {
        log::info!(
            "{} mesh: {} vertices, {} triangles",
            layer.kind.label(),
            layer.mesh.vertices.len(),
            layer.mesh.triangle_indices.len() / 3
        );
    }
    if viewer.scene.layers.is_empty() {
        log::warn!("No terrain layer could be loaded, rendering an empty scene");
    }

    // Create window and run
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App {
        window: None,
        renderer: None,
        viewer,
    };

    event_loop.run_app(&mut app)?;

    Ok(())
}
