use std::collections::VecDeque;

use serde::Serialize;

const MAX_EVENTS: usize = 500;

/// A notable runtime occurrence (object destroyed, level cleared, quest
/// pushed...). Kept for tooling and the render/UI layers; the scripted
/// runtime itself never reads these back.
#[derive(Serialize, Clone)]
pub struct GameEvent {
    pub name: String,
    pub data: serde_json::Value,
    pub frame: u64,
}

#[derive(Default, Clone)]
pub struct GameEventBus {
    pub recent: VecDeque<GameEvent>,
    pub frame: u64,
    pub dropped_events: u64,
}

impl GameEventBus {
    pub fn emit(&mut self, name: impl Into<String>, data: serde_json::Value) {
        self.recent.push_back(GameEvent {
            name: name.into(),
            data,
            frame: self.frame,
        });
        if self.recent.len() > MAX_EVENTS {
            let excess = self.recent.len() - MAX_EVENTS;
            for _ in 0..excess {
                self.recent.pop_front();
            }
            self.dropped_events = self.dropped_events.saturating_add(excess as u64);
        }
    }

    pub fn emitted_on(&self, name: &str, frame: u64) -> bool {
        self.recent
            .iter()
            .any(|e| e.frame == frame && e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_tracks_dropped_events() {
        let mut bus = GameEventBus::default();
        for i in 0..(MAX_EVENTS + 25) {
            bus.emit("test", serde_json::json!({ "i": i }));
        }
        assert_eq!(bus.recent.len(), MAX_EVENTS);
        assert!(bus.dropped_events >= 25);
    }
}
