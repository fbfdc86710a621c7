use glam::{Mat4, Vec3};

use crate::config::PlayerConfig;
use crate::motion::{self, ActorState, MotionInput, MotionParams};
use crate::terrain::Terrain;

/// The rabbit steered with the arrow keys.
pub struct Player {
    pub state: ActorState,
}

impl Player {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            state: ActorState::new(config.position, config.facing),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.state.position
    }

    pub fn advance(&mut self, input: MotionInput, terrain: &Terrain, params: &MotionParams) {
        self.state = motion::advance(self.state, input, terrain, params);
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.state.position)
    }
}
