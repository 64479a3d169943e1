use crate::input::Button;
use crate::objects::commands::{Command, Cx, Flow};

/// simulate_button_down / simulate_button_up on the observed player. The
/// input is restored first so inactive players can be driven too.
pub struct SimulateButton {
    pub button: Button,
    pub down: bool,
}

impl Command for SimulateButton {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let button = self.button;
        let down = self.down;
        let player = cx.observed_mut();
        player.input.restore();
        if down {
            player.input.simulate_down(button);
        } else {
            player.input.simulate_up(button);
        }
        Flow::Continue
    }
}
