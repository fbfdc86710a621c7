use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;
use crate::motion::{self, ActorState, MotionInput, MotionParams};
use crate::terrain::Terrain;

pub const PITCH_LIMIT: f32 = 89.0;

/// Unit facing vector for yaw/pitch given in degrees.
pub fn front_from_angles(yaw: f32, pitch: f32) -> Vec3 {
    let (yaw_rad, pitch_rad) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(
        yaw_rad.cos() * pitch_rad.cos(),
        pitch_rad.sin(),
        yaw_rad.sin() * pitch_rad.cos(),
    )
    .normalize()
}

/// First-person camera that walks over the terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlyCamera {
    pub state: ActorState,
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity: f32,
}

impl FlyCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let pitch = config.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
        Self {
            state: ActorState::new(config.position, front_from_angles(config.yaw, pitch)),
            yaw: config.yaw,
            pitch,
            sensitivity: config.sensitivity,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    /// Turns the camera by a pointer delta in pixels. Positive `y` looks up.
    pub fn look(&mut self, delta: Vec2) {
        self.yaw += delta.x * self.sensitivity;
        self.pitch = (self.pitch + delta.y * self.sensitivity).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.state.front = front_from_angles(self.yaw, self.pitch);
    }

    pub fn advance(&mut self, input: MotionInput, terrain: &Terrain, params: &MotionParams) {
        self.state = motion::advance(self.state, input, terrain, params);
    }

    pub fn build_view_matrix(&self) -> Mat4 {
        let eye = self.state.position;
        Mat4::look_at_rh(eye, eye + self.state.front, Vec3::Y)
    }
}

pub struct Projection {
    aspect: f32,
    fovy: f32,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32, fovy_degrees: f32, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy_degrees.to_radians(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn build_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy, self.aspect, self.znear, self.zfar)
    }
}
