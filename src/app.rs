use crate::backend::{GpuBackend, NullBackend, RenderBackend};
use crate::config::StduiConfig;
use crate::error::{Result, StduiError};
use crate::input::{CursorState, InputEvent, InputState, Key, MouseButton, PollStatus};
use crate::text::FontAtlas;
use crate::utils::{Color, Pose, Position, Size};
use crate::Engine;
use std::cell::RefCell;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{Key as WinitKey, NamedKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window, WindowAttributes, WindowId},
};

/// Pumps allowed for the window system to hand back a newly requested window.
const WINDOW_CREATION_PUMPS: usize = 200;

thread_local! {
    // winit allows one event loop per process; a closed surface leaves it here for the next open
    static PARKED_EVENT_LOOP: RefCell<Option<EventLoop<()>>> = const { RefCell::new(None) };
}

/// Receives winit callbacks during a pump and turns them into [`InputEvent`]s.
#[derive(Default)]
struct Shell {
    pending: Option<WindowAttributes>,
    window: Option<Arc<Window>>,
    creation_error: Option<String>,
    events: Vec<InputEvent>,
    last_cursor: PhysicalPosition<f64>,
}

impl Shell {
    fn create_pending(&mut self, event_loop: &ActiveEventLoop) {
        let Some(attributes) = self.pending.take() else {
            return;
        };
        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(Arc::new(window)),
            Err(e) => self.creation_error = Some(e.to_string()),
        }
    }

    fn is_current(&self, id: WindowId) -> bool {
        self.window.as_ref().is_some_and(|w| w.id() == id)
    }
}

impl ApplicationHandler<()> for Shell {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        self.create_pending(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // only reached on reopen, when `resumed` has already fired for this loop
        self.create_pending(event_loop);
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        if !self.is_current(id) {
            return;
        }
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if !event.state.is_pressed() {
                    return;
                }
                self.events.push(InputEvent::KeyPressed(translate_key(&event.logical_key)));
                if let Some(text) = &event.text {
                    self.events.extend(text.chars().map(InputEvent::Text));
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = translate_button(button);
                self.events.push(match state {
                    ElementState::Pressed => InputEvent::ButtonPressed {
                        button,
                        x: self.last_cursor.x as f32,
                        y: self.last_cursor.y as f32,
                    },
                    ElementState::Released => InputEvent::ButtonReleased { button },
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.last_cursor = position;
                self.events.push(InputEvent::CursorMoved {
                    x: position.x as f32,
                    y: position.y as f32,
                });
            }
            WindowEvent::RedrawRequested => self.events.push(InputEvent::Expose),
            WindowEvent::Resized(size) => self.events.push(InputEvent::Resized(Size::new(
                size.width as f32,
                size.height as f32,
            ))),
            WindowEvent::CloseRequested => self.events.push(InputEvent::CloseRequested),
            _ => (),
        }
    }
}

fn translate_key(key: &WinitKey) -> Key {
    match key {
        WinitKey::Named(NamedKey::Escape) => Key::Escape,
        WinitKey::Named(NamedKey::Enter) => Key::Enter,
        WinitKey::Named(NamedKey::Backspace) => Key::Backspace,
        WinitKey::Named(NamedKey::Delete) => Key::Delete,
        WinitKey::Named(NamedKey::Tab) => Key::Tab,
        WinitKey::Named(NamedKey::ArrowLeft) => Key::Left,
        WinitKey::Named(NamedKey::ArrowRight) => Key::Right,
        WinitKey::Named(NamedKey::ArrowUp) => Key::Up,
        WinitKey::Named(NamedKey::ArrowDown) => Key::Down,
        WinitKey::Character(s) => s.chars().next().map_or(Key::Other, Key::Character),
        _ => Key::Other,
    }
}

fn translate_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        _ => MouseButton::Other,
    }
}

/// The display connection, the window and the engine drawing into it.
///
/// Lifecycle: [`Surface::open`] -> [`Surface::create_window`] -> frame loop ->
/// [`Surface::close`]. Every handle is dropped and cleared on close, so closing twice is
/// harmless and a new surface can be opened afterwards.
pub struct Surface {
    config: StduiConfig,
    event_loop: Option<EventLoop<()>>,
    shell: Shell,
    engine: Option<Engine>,
    input: InputState,
}

impl Surface {
    /// Connects to the window system.
    pub fn open(config: StduiConfig) -> Result<Self> {
        let parked = PARKED_EVENT_LOOP.with(|slot| slot.borrow_mut().take());
        let event_loop = match parked {
            Some(event_loop) => {
                log::debug!("reusing the event loop of a closed surface");
                event_loop
            }
            None => EventLoop::new().map_err(|e| StduiError::DisplayUnavailable(e.to_string()))?,
        };
        event_loop.set_control_flow(ControlFlow::Poll);
        Ok(Self {
            config,
            event_loop: Some(event_loop),
            shell: Shell::default(),
            engine: None,
            input: InputState::new(),
        })
    }

    pub fn config(&self) -> &StduiConfig {
        &self.config
    }

    /// Creates the window at `(x, y)` with a `width x height` client area, then the GPU
    /// context, the shape renderer and the text renderer.
    pub fn create_window(&mut self, title: &str, x: i32, y: i32, width: u32, height: u32) -> Result<()> {
        if self.shell.window.is_some() {
            return Err(StduiError::WindowCreationFailed(
                "this surface already has a window".into(),
            ));
        }
        let font_path = self.config.font_path.clone().ok_or_else(|| StduiError::FontLoadFailed {
            path: Default::default(),
            reason: "no font configured".into(),
        })?;
        let atlas = FontAtlas::from_file(
            &font_path,
            self.config.font_pixel_height,
            self.config.atlas_size,
        )?;

        let event_loop = self
            .event_loop
            .as_mut()
            .ok_or_else(|| StduiError::DisplayUnavailable("surface is closed".into()))?;
        self.shell.creation_error = None;
        self.shell.pending = Some(
            Window::default_attributes()
                .with_title(title)
                .with_inner_size(PhysicalSize::new(width.max(1), height.max(1)))
                .with_position(PhysicalPosition::new(x, y)),
        );
        for _ in 0..WINDOW_CREATION_PUMPS {
            if let PumpStatus::Exit(code) =
                event_loop.pump_app_events(Some(Duration::ZERO), &mut self.shell)
            {
                return Err(StduiError::WindowCreationFailed(format!(
                    "event loop exited with status {code}"
                )));
            }
            if self.shell.window.is_some() || self.shell.creation_error.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        if let Some(reason) = self.shell.creation_error.take() {
            return Err(StduiError::WindowCreationFailed(reason));
        }
        let window = self.shell.window.clone().ok_or_else(|| {
            StduiError::WindowCreationFailed("the window system never delivered the window".into())
        })?;

        let backend: Box<dyn RenderBackend> = match GpuBackend::new(window.clone(), &self.config) {
            Ok(backend) => {
                log::info!("window {title:?} on {}", backend.adapter_name());
                Box::new(backend)
            }
            Err(e) => {
                log::error!("{e}; window {title:?} will not render");
                let size = window.inner_size();
                Box::new(NullBackend::new(Size::new(size.width as f32, size.height as f32)))
            }
        };
        self.engine = Some(Engine::new(backend, atlas, &self.config)?);
        window.request_redraw();
        Ok(())
    }

    /// Drains whatever events are pending without waiting for more.
    pub fn poll_events(&mut self) -> PollStatus {
        if !self.pump() {
            return PollStatus::Quit;
        }
        self.input.status()
    }

    /// Current pointer position and primary button, refreshed from the window system.
    ///
    /// winit only reports the pointer through events, so this pumps once more without
    /// blocking and reads the tracked state.
    pub fn sample_cursor(&mut self) -> CursorState {
        self.pump();
        self.input.cursor()
    }

    fn pump(&mut self) -> bool {
        let Some(event_loop) = self.event_loop.as_mut() else {
            return false;
        };
        if let PumpStatus::Exit(code) =
            event_loop.pump_app_events(Some(Duration::ZERO), &mut self.shell)
        {
            log::info!("event loop exited with status {code}");
            return false;
        }
        for event in self.shell.events.drain(..) {
            self.input.apply(event);
        }
        true
    }

    pub fn cursor(&self) -> CursorState {
        self.input.cursor()
    }

    /// Every character typed since the last call, oldest first. Keys left unread are
    /// dropped by `end_frame`.
    pub fn take_keys(&mut self) -> Vec<char> {
        std::iter::from_fn(|| self.input.take_key()).collect()
    }

    pub fn window(&self) -> Option<&Window> {
        self.shell.window.as_deref()
    }

    pub fn engine(&self) -> Option<&Engine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut Engine> {
        self.engine.as_mut()
    }

    /// Syncs the viewport to the window, samples the cursor, clears and resets transforms.
    pub fn begin_frame(&mut self) {
        let Some(window) = self.shell.window.clone() else {
            log::warn!("begin_frame on a surface without a window");
            return;
        };
        let size = window.inner_size();
        self.sample_cursor();
        if let Some(engine) = self.engine.as_mut() {
            engine.begin_frame(Size::new(size.width as f32, size.height as f32));
        }
    }

    /// Presents the frame. Typed keys nobody consumed are dropped.
    pub fn end_frame(&mut self) -> Result<()> {
        self.input.clear_keys();
        match self.engine.as_mut() {
            Some(engine) => engine.end_frame(),
            None => Ok(()),
        }
    }

    pub fn swap_buffers(&mut self) -> Result<()> {
        self.end_frame()
    }

    /// Releases the engine, then the window, then the display connection.
    pub fn close(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown();
        }
        let had_window = self.shell.window.take().is_some();
        self.shell = Shell::default();
        if let Some(mut event_loop) = self.event_loop.take() {
            if had_window {
                // let the window system process the destroyed window
                let _ = event_loop.pump_app_events(Some(Duration::ZERO), &mut self.shell);
            }
            PARKED_EVENT_LOOP.with(|slot| *slot.borrow_mut() = Some(event_loop));
            log::debug!("surface closed");
        }
        self.input.reset();
    }

    pub fn is_open(&self) -> bool {
        self.event_loop.is_some()
    }

    fn with_engine(&mut self, op: &str, f: impl FnOnce(&mut Engine)) {
        match self.engine.as_mut() {
            Some(engine) => f(engine),
            None => log::warn!("{op} on a surface without a window"),
        }
    }

    pub fn draw_triangle(&mut self, pose: Pose) {
        self.with_engine("draw_triangle", |e| e.draw_triangle(pose));
    }

    pub fn draw_rectangle(&mut self, pose: Pose) {
        self.with_engine("draw_rectangle", |e| e.draw_rectangle(pose));
    }

    pub fn draw_circle(&mut self, pose: Pose) {
        self.with_engine("draw_circle", |e| e.draw_circle(pose));
    }

    pub fn draw_polygon(&mut self, pose: Pose, vertices: &[Position]) {
        self.with_engine("draw_polygon", |e| e.draw_polygon(pose, vertices));
    }

    pub fn draw_text(&mut self, text: &str, x: f32, y: f32, scale: f32, color: Color) {
        self.with_engine("draw_text", |e| {
            e.draw_text(text, x, y, scale, color);
        });
    }

    pub fn draw_image(&mut self, path: impl AsRef<Path>, width: f32, height: f32, x: f32, y: f32) {
        self.with_engine("draw_image", |e| e.draw_image(path, width, height, x, y));
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        self.close();
    }
}
