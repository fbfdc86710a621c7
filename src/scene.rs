//! Per-frame orchestration: input, actors, props, then the draw list.

use glam::{Mat4, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::animator::{OrbitAnimator, PropPose};
use crate::camera::FlyCamera;
use crate::camera_controller::FrameInput;
use crate::config::SceneConfig;
use crate::motion::MotionParams;
use crate::player::Player;
use crate::terrain::Terrain;

pub const LIGHT_COUNT: usize = 6;
pub const LIGHT_COLOR: Vec3 = Vec3::splat(0.8);

const CUBE_HEIGHT: f32 = 20.0;
const CUBE_Y_OFFSET: f32 = -0.001;
const CUBE_SCALE: f32 = 0.2;

const WHITE: Vec4 = Vec4::ONE;
const GREY: Vec4 = Vec4::new(0.5, 0.5, 0.5, 1.0);
const CUBE_TINT: Vec4 = Vec4::new(0.0, 2.0, 6.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshId {
    Terrain,
    Cube,
    Table,
    Umbrella,
    Chair,
    OrbitRabbit,
    Mug,
    Teapot,
    PlayerRabbit,
}

impl MeshId {
    pub const ALL: [MeshId; 9] = [
        MeshId::Terrain,
        MeshId::Cube,
        MeshId::Table,
        MeshId::Umbrella,
        MeshId::Chair,
        MeshId::OrbitRabbit,
        MeshId::Mug,
        MeshId::Teapot,
        MeshId::PlayerRabbit,
    ];

    /// Asset file for meshes loaded from disk; generated meshes have none.
    pub fn file_name(self) -> Option<&'static str> {
        match self {
            MeshId::Terrain | MeshId::Cube => None,
            MeshId::Table => Some("table.obj"),
            MeshId::Umbrella => Some("13518_Beach_Umbrella_v1_L3.obj"),
            MeshId::Chair => Some("Garden chair.obj"),
            MeshId::OrbitRabbit => Some("uploads_files_5014646_Rabbit_Quad.obj"),
            MeshId::Mug => Some("teamugblend.obj"),
            MeshId::Teapot => Some("20900_Brown_Betty_Teapot_v1.obj"),
            MeshId::PlayerRabbit => Some("uploads_files_5014646_Rabbit_Quad1.obj"),
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureId {
    Terrain,
    White,
    Table,
    TableNormal,
    Wood,
}

impl TextureId {
    pub const ALL: [TextureId; 5] = [
        TextureId::Terrain,
        TextureId::White,
        TextureId::Table,
        TextureId::TableNormal,
        TextureId::Wood,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            TextureId::Terrain => "terrain_texture.png",
            TextureId::White => "white.jpg",
            TextureId::Table => "Round_table_texture_.jpg",
            TextureId::TableNormal => "Round table texture _NRM.jpg",
            TextureId::Wood => "Round table texture .jpg",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One draw call handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub mesh: MeshId,
    pub texture: TextureId,
    pub transform: Mat4,
    pub color: Vec4,
}

impl DrawCommand {
    fn new(mesh: MeshId, texture: TextureId, transform: Mat4, color: Vec4) -> Self {
        Self {
            mesh,
            texture,
            transform,
            color,
        }
    }
}

/// Point lights: four far corners and the middle at height 50, plus one at the origin.
pub fn light_positions(terrain_size: usize) -> [Vec3; LIGHT_COUNT] {
    let half = terrain_size as f32 * 0.5;
    [
        Vec3::new(-half, 50.0, -half),
        Vec3::new(half, 50.0, -half),
        Vec3::new(-half, 50.0, half),
        Vec3::new(half, 50.0, half),
        Vec3::new(0.0, 50.0, 0.0),
        Vec3::ZERO,
    ]
}

/// Side length and base transform of the bounding cube.
pub fn cube_placement(terrain_size: usize) -> (f32, f32, f32, Mat4) {
    let side = terrain_size as f32 * CUBE_SCALE;
    let transform = Mat4::from_translation(Vec3::new(side * 0.5, CUBE_Y_OFFSET, side * 0.5));
    (side, CUBE_HEIGHT, CUBE_Y_OFFSET, transform)
}

fn uniform_scale(factor: f32) -> Mat4 {
    Mat4::from_scale(Vec3::splat(factor))
}

/// The static tea table, teapot, mugs, umbrella and chairs around `center`.
pub fn table_setting(center: Vec3) -> Vec<DrawCommand> {
    let at = |dx: f32, y: f32, dz: f32| Mat4::from_translation(Vec3::new(center.x + dx, y, center.z + dz));
    let small = uniform_scale(1.0 / 9.0);

    vec![
        DrawCommand::new(MeshId::Table, TextureId::Table, at(0.0, 7.0, 0.0), GREY),
        DrawCommand::new(
            MeshId::Teapot,
            TextureId::Table,
            at(-0.75, 8.5, -0.3)
                * small
                * Mat4::from_rotation_x(270f32.to_radians())
                * Mat4::from_rotation_z((-120f32).to_radians()),
            GREY,
        ),
        DrawCommand::new(MeshId::Mug, TextureId::Table, at(0.0, 8.4, 1.0) * small, GREY),
        DrawCommand::new(
            MeshId::Mug,
            TextureId::Table,
            at(0.0, 8.4, -1.0) * small * Mat4::from_rotation_y(120f32.to_radians()),
            GREY,
        ),
        DrawCommand::new(
            MeshId::Umbrella,
            TextureId::TableNormal,
            at(0.0, 5.0, 0.0) * small * Mat4::from_rotation_x(270f32.to_radians()),
            GREY,
        ),
        DrawCommand::new(
            MeshId::Chair,
            TextureId::Wood,
            at(1.0, 7.0, -1.5) * uniform_scale(2.0) * Mat4::from_rotation_y((-40f32).to_radians()),
            GREY,
        ),
        DrawCommand::new(
            MeshId::Chair,
            TextureId::Wood,
            at(-1.0, 7.0, 1.5) * uniform_scale(2.0) * Mat4::from_rotation_y(145f32.to_radians()),
            GREY,
        ),
    ]
}

pub struct Scene {
    config: SceneConfig,
    terrain: Terrain,
    camera: FlyCamera,
    player: Player,
    animator: OrbitAnimator<StdRng>,
    poses: Vec<PropPose>,
    camera_motion: MotionParams,
    player_motion: MotionParams,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        log::info!("jump generator seed: {}", seed);
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(config: SceneConfig, rng: StdRng) -> Self {
        let terrain = Terrain::new(&config.terrain);
        let bounds_max = config.bounds_max();

        let camera_motion = MotionParams {
            bounds_min: 0.0,
            bounds_max,
            offset: config.camera.eye_offset,
            speed: config.camera.speed,
        };
        let player_motion = MotionParams {
            bounds_min: 0.0,
            bounds_max,
            offset: config.player.body_offset,
            speed: config.player.speed,
        };

        Self {
            camera: FlyCamera::new(&config.camera),
            player: Player::new(&config.player),
            animator: OrbitAnimator::new(config.orbit.clone(), rng),
            poses: Vec::new(),
            terrain,
            camera_motion,
            player_motion,
            config,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn terrain(&self) -> &Terrain {
        &self.terrain
    }

    pub fn camera(&self) -> &FlyCamera {
        &self.camera
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn poses(&self) -> &[PropPose] {
        &self.poses
    }

    /// Runs one frame of simulation. `dt` is the time since the previous frame.
    pub fn update(&mut self, input: &FrameInput, dt: f32) {
        if input.look != glam::Vec2::ZERO {
            self.camera.look(input.look);
        }
        self.camera.advance(input.camera, &self.terrain, &self.camera_motion);
        self.player.advance(input.player, &self.terrain, &self.player_motion);
        self.poses = self.animator.step(dt);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.camera.build_view_matrix()
    }

    pub fn lights(&self) -> [Vec3; LIGHT_COUNT] {
        light_positions(self.config.terrain.size)
    }

    /// Draw calls for the current frame, in submission order.
    pub fn draw_list(&self) -> Vec<DrawCommand> {
        let scale = self.config.orbit.model_scale;
        let (_, _, _, cube_transform) = cube_placement(self.config.terrain.size);

        let mut commands = Vec::with_capacity(self.poses.len() + 10);
        commands.push(DrawCommand::new(MeshId::Terrain, TextureId::Terrain, Mat4::IDENTITY, WHITE));
        commands.extend(self.poses.iter().map(|pose| {
            DrawCommand::new(MeshId::OrbitRabbit, TextureId::White, pose.model_matrix(scale), WHITE)
        }));
        commands.push(DrawCommand::new(
            MeshId::PlayerRabbit,
            TextureId::White,
            self.player.model_matrix(),
            WHITE,
        ));
        commands.extend(table_setting(self.config.orbit.center));
        // Tinted over the wood grain left bound by the table setting.
        commands.push(DrawCommand::new(MeshId::Cube, TextureId::Wood, cube_transform, CUBE_TINT));
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_controller::InputController;
    use crate::motion::MotionInput;
    use winit::dpi::PhysicalPosition;

    fn scene() -> Scene {
        let mut config = SceneConfig::default();
        config.seed = Some(11);
        Scene::new(config)
    }

    #[test]
    fn update_snaps_actors_to_ground() {
        let mut scene = scene();
        scene.update(&FrameInput::default(), 0.016);

        let camera = scene.camera().position();
        let ground = scene.terrain().get_height(camera.x, camera.z).max(0.0);
        assert_eq!(camera.y, ground + scene.config().camera.eye_offset);

        let player = scene.player().position();
        assert_eq!(player.y, scene.terrain().get_height(player.x, player.z).max(0.0));
    }

    #[test]
    fn draw_list_covers_every_object() {
        let mut scene = scene();
        scene.update(&FrameInput::default(), 0.016);

        let commands = scene.draw_list();
        let count = |mesh: MeshId| commands.iter().filter(|c| c.mesh == mesh).count();

        assert_eq!(count(MeshId::OrbitRabbit), scene.config().orbit.count);
        assert_eq!(count(MeshId::Terrain), 1);
        assert_eq!(count(MeshId::Cube), 1);
        assert_eq!(count(MeshId::PlayerRabbit), 1);
        assert_eq!(count(MeshId::Table), 1);
        assert_eq!(count(MeshId::Teapot), 1);
        assert_eq!(count(MeshId::Mug), 2);
        assert_eq!(count(MeshId::Umbrella), 1);
        assert_eq!(count(MeshId::Chair), 2);
        assert_eq!(commands.len(), scene.config().orbit.count + 10);
        assert_eq!(commands[0].mesh, MeshId::Terrain);
    }

    #[test]
    fn unvalidated_negative_cell_scale_still_updates() {
        let mut config = SceneConfig::default();
        config.seed = Some(3);
        config.terrain.cell_scale = -0.2;
        let mut scene = Scene::new(config);
        let input = FrameInput {
            camera: MotionInput { forward: true, ..Default::default() },
            ..Default::default()
        };
        for _ in 0..5 {
            scene.update(&input, 0.016);
        }
        assert!(scene.camera().position().is_finite());
    }

    #[test]
    fn cube_is_tinted_wood() {
        let commands = scene().draw_list();
        let cube = commands.iter().find(|c| c.mesh == MeshId::Cube).unwrap();
        assert_eq!(cube.texture, TextureId::Wood);
        assert_eq!(cube.color, CUBE_TINT);
    }

    #[test]
    fn pointer_bursts_do_not_add_travel() {
        let mut scene = scene();
        let mut input = InputController::new();
        let start = scene.camera().position();

        // Many cursor samples between two frames still make one frame.
        for x in 0..20 {
            input.process_cursor(PhysicalPosition::new(400.0 + x as f64, 300.0));
        }
        let frame = FrameInput {
            camera: MotionInput { forward: true, ..Default::default() },
            ..input.poll()
        };
        assert_eq!(frame.look, glam::Vec2::new(19.0, 0.0));
        scene.update(&frame, 0.016);

        let moved = scene.camera().position() - start;
        let travelled = Vec3::new(moved.x, 0.0, moved.z).length();
        assert!((travelled - scene.config().camera.speed).abs() < 1e-4);
    }

    #[test]
    fn no_props_before_first_update() {
        let scene = scene();
        let commands = scene.draw_list();
        assert!(commands.iter().all(|c| c.mesh != MeshId::OrbitRabbit));
    }

    #[test]
    fn camera_stays_at_edge_when_strafing_out() {
        let mut config = SceneConfig::default();
        config.seed = Some(1);
        let bounds_max = config.bounds_max();
        config.camera.position = Vec3::new(bounds_max, 0.0, 30.0);
        let mut scene = Scene::new(config);

        // Default yaw looks down -Z, so strafing right pushes +X.
        let input = FrameInput {
            camera: MotionInput { right: true, ..Default::default() },
            ..Default::default()
        };
        for _ in 0..50 {
            scene.update(&input, 0.016);
            assert_eq!(scene.camera().position().x, bounds_max);
        }
    }

    #[test]
    fn look_turns_camera() {
        let mut scene = scene();
        let before = scene.camera().state.front;
        let input = FrameInput {
            look: glam::Vec2::new(100.0, 0.0),
            ..Default::default()
        };
        scene.update(&input, 0.0);
        assert!((scene.camera().state.front - before).length() > 0.1);
    }

    #[test]
    fn seeded_scenes_agree() {
        let mut a = scene();
        let mut b = scene();
        for _ in 0..100 {
            a.update(&FrameInput::default(), 0.016);
            b.update(&FrameInput::default(), 0.016);
        }
        assert_eq!(a.draw_list(), b.draw_list());
    }

    #[test]
    fn lights_and_cube() {
        let lights = light_positions(300);
        assert_eq!(lights[0], Vec3::new(-150.0, 50.0, -150.0));
        assert_eq!(lights[5], Vec3::ZERO);

        let (side, height, y_offset, transform) = cube_placement(300);
        assert_eq!(side, 60.0);
        assert_eq!(height, 20.0);
        assert_eq!(y_offset, -0.001);
        assert_eq!(transform.transform_point3(Vec3::ZERO), Vec3::new(30.0, -0.001, 30.0));
    }

    #[test]
    fn asset_tables_are_complete() {
        for (i, mesh) in MeshId::ALL.iter().enumerate() {
            assert_eq!(mesh.index(), i);
        }
        for (i, texture) in TextureId::ALL.iter().enumerate() {
            assert_eq!(texture.index(), i);
        }
        assert!(MeshId::Terrain.file_name().is_none());
        assert!(MeshId::Table.file_name().is_some());
    }
}
