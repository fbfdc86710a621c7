//! Terrain-bound movement shared by the fly camera and the controllable character.

use glam::Vec3;

use crate::terrain::Terrain;

/// Directional keys held during the current frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl MotionInput {
    pub fn is_idle(&self) -> bool {
        !(self.forward || self.back || self.left || self.right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorState {
    pub position: Vec3,
    /// Unit facing vector.
    pub front: Vec3,
}

impl ActorState {
    pub fn new(position: Vec3, front: Vec3) -> Self {
        Self {
            position,
            front: front.try_normalize().unwrap_or(Vec3::NEG_Z),
        }
    }

    /// Unit vector to the actor's right, perpendicular to `front` and world up.
    pub fn right(&self) -> Vec3 {
        self.front.cross(Vec3::Y).normalize_or_zero()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionParams {
    pub bounds_min: f32,
    pub bounds_max: f32,
    /// Height kept above the ground.
    pub offset: f32,
    /// Distance per active key per frame.
    pub speed: f32,
}

/// Moves an actor one frame and pins it to the ground.
///
/// Key displacements are summed without normalisation, so diagonal movement is
/// faster than axial movement. `x` and `z` are clamped independently, then `y`
/// is set to the terrain height under the actor (negative heights count as 0)
/// plus `params.offset`.
pub fn advance(state: ActorState, input: MotionInput, terrain: &Terrain, params: &MotionParams) -> ActorState {
    let forward = state.front;
    let right = state.right();

    let mut displacement = Vec3::ZERO;
    if input.forward {
        displacement += params.speed * forward;
    }
    if input.back {
        displacement -= params.speed * forward;
    }
    if input.left {
        displacement -= params.speed * right;
    }
    if input.right {
        displacement += params.speed * right;
    }

    let mut position = state.position + displacement;
    // Not `f32::clamp`: inverted or NaN bounds must not panic.
    position.x = position.x.max(params.bounds_min).min(params.bounds_max);
    position.z = position.z.max(params.bounds_min).min(params.bounds_max);

    let ground = terrain.get_height(position.x, position.z).max(0.0);
    position.y = ground + params.offset;

    ActorState {
        position,
        front: state.front,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerrainConfig;

    fn terrain() -> Terrain {
        Terrain::new(&TerrainConfig {
            size: 10,
            cell_scale: 1.0,
            plateau_radius: 2.0,
            hill_radius: 5.0,
            hill_height: 7.0,
        })
    }

    fn params() -> MotionParams {
        MotionParams {
            bounds_min: 0.0,
            bounds_max: 10.0,
            offset: 4.0,
            speed: 0.5,
        }
    }

    #[test]
    fn idle_actor_snaps_to_ground() {
        let terrain = terrain();
        let state = ActorState::new(Vec3::new(5.5, -20.0, 5.5), Vec3::NEG_Z);
        let next = advance(state, MotionInput::default(), &terrain, &params());
        assert_eq!(next.position, Vec3::new(5.5, 11.0, 5.5));
        assert_eq!(next.front, Vec3::NEG_Z);
    }

    #[test]
    fn forward_and_strafe_follow_facing() {
        let terrain = terrain();
        let state = ActorState::new(Vec3::new(1.0, 0.0, 1.0), Vec3::NEG_Z);

        let forward = MotionInput { forward: true, ..Default::default() };
        let next = advance(state, forward, &terrain, &params());
        assert!((next.position.z - 0.5).abs() < 1e-6);

        // Facing -Z, right is +X.
        let right = MotionInput { right: true, ..Default::default() };
        let next = advance(state, right, &terrain, &params());
        assert!((next.position.x - 1.5).abs() < 1e-6);

        let left = MotionInput { left: true, ..Default::default() };
        let next = advance(state, left, &terrain, &params());
        assert!((next.position.x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn diagonal_is_not_normalised() {
        let terrain = terrain();
        let start = Vec3::new(3.0, 0.0, 3.0);
        let state = ActorState::new(start, Vec3::NEG_Z);
        let input = MotionInput { forward: true, right: true, ..Default::default() };
        let next = advance(state, input, &terrain, &params());
        let travelled = Vec3::new(next.position.x - start.x, 0.0, next.position.z - start.z).length();
        assert!((travelled - 0.5 * 2f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn opposite_keys_cancel() {
        let terrain = terrain();
        let state = ActorState::new(Vec3::new(3.0, 0.0, 3.0), Vec3::NEG_Z);
        let input = MotionInput { forward: true, back: true, left: true, right: true };
        let next = advance(state, input, &terrain, &params());
        assert!((next.position.x - 3.0).abs() < 1e-6);
        assert!((next.position.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn never_leaves_bounds() {
        let terrain = terrain();
        let params = MotionParams { speed: 100.0, ..params() };
        let mut state = ActorState::new(Vec3::new(5.0, 0.0, 5.0), Vec3::new(1.0, 0.0, 1.0));

        let inputs = [
            MotionInput { forward: true, ..Default::default() },
            MotionInput { back: true, left: true, ..Default::default() },
            MotionInput { right: true, ..Default::default() },
            MotionInput { back: true, ..Default::default() },
        ];
        for input in inputs.iter().cycle().take(40) {
            state = advance(state, *input, &terrain, &params);
            assert!((params.bounds_min..=params.bounds_max).contains(&state.position.x));
            assert!((params.bounds_min..=params.bounds_max).contains(&state.position.z));
            let ground = terrain.get_height(state.position.x, state.position.z).max(0.0);
            assert_eq!(state.position.y, ground + params.offset);
            assert!(state.position.y >= params.offset);
        }
    }

    #[test]
    fn strafing_at_the_edge_does_not_overshoot() {
        let terrain = terrain();
        let params = params();
        let mut state = ActorState::new(Vec3::new(params.bounds_max, 0.0, 5.0), Vec3::NEG_Z);
        let input = MotionInput { right: true, ..Default::default() };
        for _ in 0..20 {
            state = advance(state, input, &terrain, &params);
            assert_eq!(state.position.x, params.bounds_max);
        }
        // The edge is off the grid, so the ground reads 0.
        assert_eq!(state.position.y, params.offset);
    }

    #[test]
    fn sunken_ground_reads_as_zero() {
        let pit = Terrain::new(&TerrainConfig {
            hill_height: -7.0,
            ..TerrainConfig::default()
        });
        let params = MotionParams {
            bounds_max: pit.extent(),
            ..params()
        };
        let center = pit.extent() / 2.0;
        assert!(pit.get_height(center, center) < 0.0);

        let state = ActorState::new(Vec3::new(center, 0.0, center), Vec3::NEG_Z);
        let next = advance(state, MotionInput::default(), &pit, &params);
        assert_eq!(next.position.y, params.offset);
    }

    #[test]
    fn inverted_bounds_do_not_panic() {
        let terrain = terrain();
        let params = MotionParams {
            bounds_min: 0.0,
            bounds_max: -2.0,
            ..params()
        };
        let state = ActorState::new(Vec3::new(1.0, 0.0, 1.0), Vec3::NEG_Z);
        let input = MotionInput { forward: true, ..Default::default() };
        let next = advance(state, input, &terrain, &params);
        assert!(next.position.x.is_finite() && next.position.z.is_finite());
        assert_eq!(next.position.x, -2.0);

        let params = MotionParams { bounds_max: f32::NAN, ..params };
        let next = advance(state, input, &terrain, &params);
        assert!((next.position.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn vertical_facing_component_is_discarded() {
        let terrain = terrain();
        let state = ActorState::new(Vec3::new(1.0, 0.0, 1.0), Vec3::new(0.0, 1.0, -1.0));
        let input = MotionInput { forward: true, ..Default::default() };
        let next = advance(state, input, &terrain, &MotionParams { offset: 0.0, ..params() });
        assert_eq!(next.position.y, terrain.get_height(next.position.x, next.position.z));
        assert!(next.position.z < 1.0);
    }
}
