use glam::Vec2;
use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::motion::MotionInput;

/// Everything the scene needs from the user for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub quit: bool,
    pub camera: MotionInput,
    pub player: MotionInput,
    /// Pointer travel since the previous frame, y pointing up.
    pub look: Vec2,
}

/// Turns absolute cursor positions into deltas. The first sample only sets the
/// baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    last: Option<Vec2>,
}

impl PointerTracker {
    pub fn sample(&mut self, x: f64, y: f64) -> Option<Vec2> {
        let current = Vec2::new(x as f32, y as f32);
        let delta = self
            .last
            .map(|last| Vec2::new(current.x - last.x, last.y - current.y));
        self.last = Some(current);
        delta
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[derive(Default)]
pub struct InputController {
    quit: bool,
    camera: MotionInput,
    player: MotionInput,
    pointer: PointerTracker,
    look: Vec2,
}

impl InputController {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_key(&mut self, code: KeyCode, pressed: bool) -> bool {
        match code {
            KeyCode::Escape => self.quit |= pressed,
            KeyCode::KeyW => self.camera.forward = pressed,
            KeyCode::KeyS => self.camera.back = pressed,
            KeyCode::KeyA => self.camera.left = pressed,
            KeyCode::KeyD => self.camera.right = pressed,
            KeyCode::ArrowUp => self.player.forward = pressed,
            KeyCode::ArrowDown => self.player.back = pressed,
            KeyCode::ArrowLeft => self.player.left = pressed,
            KeyCode::ArrowRight => self.player.right = pressed,
            _ => return false,
        }
        true
    }

    pub fn process_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event: key_event, .. } => match key_event.physical_key {
                PhysicalKey::Code(code) => {
                    self.set_key(code, key_event.state == ElementState::Pressed)
                }
                PhysicalKey::Unidentified(_) => false,
            },
            WindowEvent::CursorMoved { position, .. } => {
                self.process_cursor(*position);
                true
            }
            WindowEvent::Focused(false) => {
                self.camera = MotionInput::default();
                self.player = MotionInput::default();
                self.pointer.reset();
                true
            }
            WindowEvent::CloseRequested => {
                self.quit = true;
                true
            }
            _ => false,
        }
    }

    pub fn process_cursor(&mut self, position: PhysicalPosition<f64>) {
        if let Some(delta) = self.pointer.sample(position.x, position.y) {
            self.look += delta;
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    /// Snapshot for this frame. Pointer travel is consumed; held keys persist.
    pub fn poll(&mut self) -> FrameInput {
        let look = std::mem::take(&mut self.look);
        FrameInput {
            quit: self.quit,
            camera: self.camera,
            player: self.player,
            look,
        }
    }
}
