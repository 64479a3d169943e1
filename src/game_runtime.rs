use bevy::prelude::*;

/// Coarse engine flow. The level only ticks while `Playing`; the `pause`
/// script command toggles `Paused`.
#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum EngineFlowState {
    #[default]
    Playing,
    Paused,
}

pub struct RuntimeStatePlugin;

impl Plugin for RuntimeStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<EngineFlowState>();
    }
}

pub fn gameplay_systems_enabled(state: Res<State<EngineFlowState>>) -> bool {
    *state.get() == EngineFlowState::Playing
}
