//! Props orbiting a shared center, each hopping at random.

use glam::{Mat3, Mat4, Vec3};
use rand::Rng;

use crate::config::OrbitConfig;

/// Jump state carried between frames for one prop.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JumpState {
    /// Seconds left in the current jump, 0 when idle.
    pub timer: f32,
    pub jumping: bool,
}

impl JumpState {
    /// Vertical offset of the jump arc at the current timer value.
    pub fn offset(&self, duration: f32, height: f32) -> f32 {
        if !self.jumping || duration <= 0.0 {
            return 0.0;
        }
        let progress = 1.0 - self.timer / duration;
        height * (progress * std::f32::consts::PI).sin()
    }
}

/// Placement of one prop for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropPose {
    pub position: Vec3,
    /// Columns are right, up, forward, with forward pointing at the orbit center.
    pub rotation: Mat3,
}

impl PropPose {
    pub fn model_matrix(&self, scale: f32) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_scale(Vec3::splat(scale))
            * Mat4::from_mat3(self.rotation)
    }
}

/// Rotation whose forward axis looks from `position` toward `center`.
pub fn facing_center(position: Vec3, center: Vec3) -> Mat3 {
    let forward = (center - position).normalize_or_zero();
    let right = Vec3::Y.cross(forward).normalize_or_zero();
    if forward == Vec3::ZERO || right == Vec3::ZERO {
        return Mat3::IDENTITY;
    }
    let up = forward.cross(right);
    Mat3::from_cols(right, up, forward)
}

/// Advances every prop by one frame and returns their poses.
///
/// `angle` is the shared orbit phase and grows by `params.speed * dt`. Jump
/// timers lose `params.jump_step` per call regardless of `dt`, and the jump
/// chance is rolled once per idle prop per call.
pub fn step<R: Rng>(
    instances: &mut [JumpState],
    angle: &mut f32,
    dt: f32,
    params: &OrbitConfig,
    rng: &mut R,
) -> Vec<PropPose> {
    *angle += params.speed * dt;

    let can_jump = params.jump_duration > 0.0;
    let center = params.center;

    instances
        .iter_mut()
        .enumerate()
        .map(|(i, jump)| {
            let phase = *angle + i as f32 * params.spacing;
            let mut position = Vec3::new(
                center.x + params.radius * phase.cos(),
                center.y,
                center.z + params.radius * phase.sin(),
            );

            if can_jump && !jump.jumping && rng.random::<f32>() < params.jump_probability {
                log::trace!("prop {} starts a jump", i);
                jump.jumping = true;
                jump.timer = params.jump_duration;
            }

            if jump.jumping {
                position.y += jump.offset(params.jump_duration, params.jump_height);

                jump.timer -= params.jump_step;
                if jump.timer <= 0.0 {
                    jump.jumping = false;
                    jump.timer = 0.0;
                }
            }

            PropPose {
                position,
                rotation: facing_center(position, center),
            }
        })
        .collect()
}

/// Owns the orbit phase, per-prop jump state and the random source.
pub struct OrbitAnimator<R: Rng> {
    params: OrbitConfig,
    angle: f32,
    instances: Vec<JumpState>,
    rng: R,
}

impl<R: Rng> OrbitAnimator<R> {
    pub fn new(params: OrbitConfig, rng: R) -> Self {
        if params.jump_duration <= 0.0 {
            log::warn!(
                "jump duration {} is not positive, props will not jump",
                params.jump_duration
            );
        }
        let instances = vec![JumpState::default(); params.count];
        Self {
            params,
            angle: 0.0,
            instances,
            rng,
        }
    }

    pub fn step(&mut self, dt: f32) -> Vec<PropPose> {
        step(&mut self.instances, &mut self.angle, dt, &self.params, &mut self.rng)
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn reset_angle(&mut self) {
        self.angle = 0.0;
    }

    pub fn instances(&self) -> &[JumpState] {
        &self.instances
    }

    pub fn params(&self) -> &OrbitConfig {
        &self.params
    }
}
