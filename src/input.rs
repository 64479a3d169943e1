use bevy::prelude::*;

/// Script-addressable buttons, the fixed set understood by input commands
/// and `on_button_*` events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Button {
    Up,
    Right,
    Down,
    Left,
    Fire1,
    Fire2,
    Fire3,
    Fire4,
    Fire5,
    Fire6,
    Fire7,
    Fire8,
}

pub const BUTTON_COUNT: usize = 12;

impl Button {
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        Some(match name.as_str() {
            "up" => Button::Up,
            "right" => Button::Right,
            "down" => Button::Down,
            "left" => Button::Left,
            "fire1" => Button::Fire1,
            "fire2" => Button::Fire2,
            "fire3" => Button::Fire3,
            "fire4" => Button::Fire4,
            "fire5" => Button::Fire5,
            "fire6" => Button::Fire6,
            "fire7" => Button::Fire7,
            "fire8" => Button::Fire8,
            _ => return None,
        })
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Button state of one player. Device input feeds the active player each
/// frame; scripts can simulate presses on any player. A disabled input
/// ignores the device but still accepts simulation after `restore`.
#[derive(Clone)]
pub struct InputState {
    pub enabled: bool,
    pub mapping: String,
    down: [bool; BUTTON_COUNT],
    previous: [bool; BUTTON_COUNT],
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            enabled: true,
            mapping: "default".to_string(),
            down: [false; BUTTON_COUNT],
            previous: [false; BUTTON_COUNT],
        }
    }
}

impl InputState {
    /// Shifts the edge-detection window. Call once per frame before feeding
    /// device state or simulations.
    pub fn begin_frame(&mut self) {
        self.previous = self.down;
        self.down = [false; BUTTON_COUNT];
    }

    pub fn feed(&mut self, button: Button, held: bool) {
        if self.enabled && held {
            self.down[button.index()] = true;
        }
    }

    pub fn simulate_down(&mut self, button: Button) {
        self.down[button.index()] = true;
    }

    pub fn simulate_up(&mut self, button: Button) {
        self.down[button.index()] = false;
    }

    /// Re-enables a disabled input so simulation can drive it.
    pub fn restore(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
        self.down = [false; BUTTON_COUNT];
    }

    pub fn change_mapping(&mut self, name: &str) {
        self.mapping = name.to_string();
    }

    pub fn button_down(&self, button: Button) -> bool {
        self.down[button.index()]
    }

    pub fn button_pressed(&self, button: Button) -> bool {
        self.down[button.index()] && !self.previous[button.index()]
    }

    pub fn button_up(&self, button: Button) -> bool {
        !self.down[button.index()] && self.previous[button.index()]
    }
}

/// Raw device state collected by the windowed shell, drained into the active
/// player's `InputState` by the level tick.
#[derive(Resource, Default, Clone)]
pub struct DeviceInput {
    pub held: Vec<Button>,
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DeviceInput::default()).add_systems(
            PreUpdate,
            keyboard_to_device.run_if(resource_exists::<ButtonInput<KeyCode>>),
        );
    }
}

fn keyboard_to_device(keyboard: Res<ButtonInput<KeyCode>>, mut device: ResMut<DeviceInput>) {
    device.held.clear();
    let pairs = [
        (KeyCode::ArrowUp, Button::Up),
        (KeyCode::ArrowRight, Button::Right),
        (KeyCode::ArrowDown, Button::Down),
        (KeyCode::ArrowLeft, Button::Left),
        (KeyCode::Space, Button::Fire1),
        (KeyCode::KeyZ, Button::Fire1),
        (KeyCode::KeyX, Button::Fire2),
        (KeyCode::Enter, Button::Fire3),
        (KeyCode::Escape, Button::Fire4),
    ];
    for (key, button) in pairs {
        if keyboard.pressed(key) {
            device.held.push(button);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pressed_fires_on_edge_only() {
        let mut input = InputState::default();
        input.begin_frame();
        input.simulate_down(Button::Fire1);
        assert!(input.button_down(Button::Fire1));
        assert!(input.button_pressed(Button::Fire1));
        input.begin_frame();
        input.simulate_down(Button::Fire1);
        assert!(input.button_down(Button::Fire1));
        assert!(!input.button_pressed(Button::Fire1));
    }

    #[test]
    fn up_fires_on_release() {
        let mut input = InputState::default();
        input.begin_frame();
        input.simulate_down(Button::Left);
        input.begin_frame();
        assert!(input.button_up(Button::Left));
        assert!(!input.button_down(Button::Left));
    }

    #[test]
    fn disabled_input_ignores_device_but_accepts_simulation() {
        let mut input = InputState::default();
        input.disable();
        input.begin_frame();
        input.feed(Button::Right, true);
        assert!(!input.button_down(Button::Right));
        input.simulate_down(Button::Right);
        assert!(input.button_down(Button::Right));
        input.restore();
        assert!(input.enabled);
    }

    #[test]
    fn unknown_button_name_is_rejected() {
        assert!(Button::from_name("FIRE3").is_some());
        assert!(Button::from_name("start").is_none());
    }
}
