mod hud;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use stagecraft_driver::{DemoConfig, Stage, StopToken, Variant, Viewport, build, tick};
use stagecraft_input::{CameraCommand, ScrollTracker};
use stagecraft_render_wgpu::{GpuContext, WgpuRenderer};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::hud::Hud;

/// Scrollable page height in pixels for the scroll demo.
const PAGE_SCROLL: f32 = 6000.0;

#[derive(Parser)]
#[command(name = "stagecraft-desktop", about = "Stagecraft demo viewer")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// basic, orbit or scroll
    #[arg(long, default_value = "scroll")]
    variant: Variant,

    /// Texture directory
    #[arg(long, default_value = "./assets")]
    asset_dir: PathBuf,

    /// Number of stars in the scroll demo
    #[arg(long)]
    stars: Option<usize>,

    /// Star field RNG seed
    #[arg(long)]
    seed: Option<u64>,
}

impl Cli {
    fn config(&self) -> DemoConfig {
        let defaults = DemoConfig::default();
        DemoConfig {
            variant: self.variant,
            asset_dir: self.asset_dir.clone(),
            star_count: self.stars.unwrap_or(defaults.star_count),
            seed: self.seed.unwrap_or(defaults.seed),
            ..defaults
        }
    }
}

/// Pointer state used to turn cursor motion into drag commands.
#[derive(Default)]
struct Pointer {
    position: Option<PhysicalPosition<f64>>,
    left: bool,
    right: bool,
}

impl Pointer {
    fn button(&mut self, button: MouseButton, pressed: bool) {
        match button {
            MouseButton::Left => self.left = pressed,
            MouseButton::Right => self.right = pressed,
            _ => {}
        }
    }

    /// Record the cursor and return the drag command it implies, if any.
    fn moved(&mut self, position: PhysicalPosition<f64>) -> Option<CameraCommand> {
        let last = self.position.replace(position)?;
        let dx = (position.x - last.x) as f32;
        let dy = (position.y - last.y) as f32;
        if self.left {
            Some(CameraCommand::Orbit { dx, dy })
        } else if self.right {
            Some(CameraCommand::Pan { dx, dy })
        } else {
            None
        }
    }

    fn left_window(&mut self) {
        self.position = None;
    }
}

struct App {
    config: DemoConfig,
    stage: Option<Stage>,
    window: Option<Arc<Window>>,
    renderer: Option<WgpuRenderer>,
    hud: Option<Hud>,
    scroll: ScrollTracker,
    pointer: Pointer,
    stop: StopToken,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            stage: None,
            window: None,
            renderer: None,
            hud: None,
            scroll: ScrollTracker::new(PAGE_SCROLL),
            pointer: Pointer::default(),
            stop: StopToken::new(),
            fatal: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(format!("Stagecraft - {}", self.config.variant))
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();

        let gpu = GpuContext::new(window.clone(), size.width, size.height)?;
        let hud = Hud::new(&window, &gpu);
        let stage = build(&self.config, Viewport::new(size.width, size.height))?;

        self.renderer = Some(WgpuRenderer::new(gpu));
        self.hud = Some(hud);
        self.stage = Some(stage);
        self.window = Some(window);
        Ok(())
    }

    /// Rebuild the stage for a new viewport. The camera projection never
    /// changes in place, so a resize is a full reload.
    fn reload(&mut self, viewport: Viewport) {
        match build(&self.config, viewport) {
            Ok(mut stage) => {
                if self.config.variant == Variant::Scroll {
                    stage.push(CameraCommand::Scroll {
                        offset: self.scroll.offset(),
                    });
                }
                self.stage = Some(stage);
            }
            Err(e) => tracing::error!("failed to rebuild stage: {e}"),
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::F1 => {
                if let Some(hud) = &mut self.hud {
                    hud.visible = !hud.visible;
                }
            }
            KeyCode::Escape => self.stop.stop(),
            _ => {}
        }
    }

    fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        let Some(stage) = &mut self.stage else {
            return;
        };
        let (lines, pixels) = match delta {
            MouseScrollDelta::LineDelta(_, y) => (y, y * ScrollTracker::LINE_HEIGHT),
            MouseScrollDelta::PixelDelta(p) => {
                let pixels = p.y as f32;
                (pixels / ScrollTracker::LINE_HEIGHT, pixels)
            }
        };
        let command = match self.config.variant {
            Variant::Scroll => CameraCommand::Scroll {
                offset: self.scroll.scroll_pixels(pixels),
            },
            // Wheel up moves closer.
            Variant::Orbit | Variant::Basic => CameraCommand::Zoom { delta: -lines },
        };
        stage.push(command);
    }

    /// Pointer bookkeeping runs for every event, even ones the HUD consumes,
    /// so a button released over the panel never stays held.
    fn track_pointer(&mut self, event: &WindowEvent) -> Option<CameraCommand> {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                self.pointer.button(*button, *state == ElementState::Pressed);
                None
            }
            WindowEvent::CursorMoved { position, .. } => self.pointer.moved(*position),
            WindowEvent::CursorLeft { .. } => {
                self.pointer.left_window();
                None
            }
            _ => None,
        }
    }

    fn redraw(&mut self) {
        let (Some(stage), Some(renderer), Some(window)) =
            (&mut self.stage, &mut self.renderer, &self.window)
        else {
            return;
        };

        match tick(stage, renderer) {
            Ok(Some(frame)) => {
                if let Some(hud) = &mut self.hud {
                    hud.draw(window, renderer.gpu(), frame.view(), stage);
                }
                frame.present();
            }
            Ok(None) => {}
            Err(e) => tracing::error!("skipping frame: {e}"),
        }
        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            tracing::error!("startup failed: {e:#}");
            self.fatal = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let drag = self.track_pointer(&event);
        if let (Some(hud), Some(window)) = (&mut self.hud, &self.window) {
            if hud.on_window_event(window, &event) {
                return;
            }
        }
        if let (Some(command), Some(stage)) = (drag, &mut self.stage) {
            stage.push(command);
        }

        match event {
            WindowEvent::CloseRequested => {
                self.stop.stop();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = &mut self.renderer {
                    renderer.resize(size.width, size.height);
                }
                if let Some(stage) = &self.stage {
                    tracing::debug!(
                        frame = stage.scene().frame(),
                        width = size.width,
                        height = size.height,
                        "viewport resized, reloading stage"
                    );
                }
                self.reload(Viewport::new(size.width, size.height));
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => self.handle_key(key),
            WindowEvent::MouseWheel { delta, .. } => self.handle_wheel(delta),
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.stop.is_stopped() {
            event_loop.exit();
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = cli.config();
    tracing::info!(
        variant = %config.variant,
        asset_dir = %config.asset_dir.display(),
        "stagecraft-desktop starting"
    );

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "stagecraft-desktop",
            "--variant",
            "orbit",
            "--stars",
            "50",
            "--asset-dir",
            "/tmp/textures",
        ])
        .unwrap();
        let config = cli.config();
        assert_eq!(config.variant, Variant::Orbit);
        assert_eq!(config.star_count, 50);
        assert_eq!(config.seed, DemoConfig::default().seed);
        assert_eq!(config.asset_dir, PathBuf::from("/tmp/textures"));
    }

    #[test]
    fn released_button_stops_dragging() {
        let mut pointer = Pointer::default();
        assert_eq!(pointer.moved(PhysicalPosition::new(10.0, 10.0)), None);

        pointer.button(MouseButton::Left, true);
        assert_eq!(
            pointer.moved(PhysicalPosition::new(14.0, 7.0)),
            Some(CameraCommand::Orbit { dx: 4.0, dy: -3.0 })
        );

        // Release and motion over the HUD still reach the pointer.
        pointer.button(MouseButton::Left, false);
        pointer.moved(PhysicalPosition::new(200.0, 50.0));
        assert_eq!(pointer.moved(PhysicalPosition::new(201.0, 50.0)), None);

        pointer.button(MouseButton::Right, true);
        assert_eq!(
            pointer.moved(PhysicalPosition::new(203.0, 51.0)),
            Some(CameraCommand::Pan { dx: 2.0, dy: 1.0 })
        );
    }

    #[test]
    fn leaving_window_resets_drag_origin() {
        let mut pointer = Pointer::default();
        pointer.button(MouseButton::Left, true);
        pointer.moved(PhysicalPosition::new(0.0, 0.0));
        pointer.left_window();
        assert_eq!(pointer.moved(PhysicalPosition::new(500.0, 500.0)), None);
        assert_eq!(
            pointer.moved(PhysicalPosition::new(501.0, 500.0)),
            Some(CameraCommand::Orbit { dx: 1.0, dy: 0.0 })
        );
    }

    #[test]
    fn defaults_to_scroll_demo() {
        let cli = Cli::try_parse_from(["stagecraft-desktop"]).unwrap();
        assert_eq!(cli.config().variant, Variant::Scroll);
        assert_eq!(cli.config().asset_dir, PathBuf::from("./assets"));
    }
}
