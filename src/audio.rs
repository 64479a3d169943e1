use bevy::prelude::*;
use serde::{Deserialize, Serialize};

const MAX_AUDIO_EVENTS: usize = 256;

/// One playback request, as recorded by the board. The mixing backend drains
/// these; headless runs and tests assert on them directly.
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct AudioEvent {
    pub frame: u64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pan: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f32>,
}

/// The audio façade scripted objects talk to. Playback state is tracked
/// here; actual mixing happens in the platform layer.
#[derive(Clone)]
pub struct AudioBoard {
    pub level_music: String,
    pub current_music: Option<String>,
    pub music_volume: f32,
    pub music_looping: bool,
    pub frame: u64,
    pub recent_events: Vec<AudioEvent>,
}

impl Default for AudioBoard {
    fn default() -> Self {
        Self {
            level_music: String::new(),
            current_music: None,
            music_volume: 1.0,
            music_looping: true,
            frame: 0,
            recent_events: Vec::new(),
        }
    }
}

impl AudioBoard {
    fn log(&mut self, event: AudioEvent) {
        self.recent_events.push(event);
        if self.recent_events.len() > MAX_AUDIO_EVENTS {
            let excess = self.recent_events.len() - MAX_AUDIO_EVENTS;
            self.recent_events.drain(0..excess);
        }
    }

    pub fn play_sample(&mut self, name: &str, volume: f32, pan: f32, frequency: f32) {
        let event = AudioEvent {
            frame: self.frame,
            event_type: "sample".to_string(),
            name: name.to_string(),
            volume: Some(volume.clamp(0.0, 1.0)),
            pan: Some(pan.clamp(-1.0, 1.0)),
            frequency: Some(frequency),
        };
        self.log(event);
    }

    pub fn stop_sample(&mut self, name: &str) {
        let event = AudioEvent {
            frame: self.frame,
            event_type: "stop_sample".to_string(),
            name: name.to_string(),
            volume: None,
            pan: None,
            frequency: None,
        };
        self.log(event);
    }

    pub fn play_music(&mut self, name: &str, looping: bool) {
        self.current_music = Some(name.to_string());
        self.music_looping = looping;
        let event = AudioEvent {
            frame: self.frame,
            event_type: "music".to_string(),
            name: name.to_string(),
            volume: None,
            pan: None,
            frequency: None,
        };
        self.log(event);
    }

    pub fn play_level_music(&mut self) {
        let name = self.level_music.clone();
        self.play_music(&name, true);
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
    }

    pub fn music_is_playing(&self) -> bool {
        self.current_music.is_some() && self.music_volume > 0.0
    }

    /// True if the named sample was requested on the given frame.
    pub fn sample_played_on(&self, name: &str, frame: u64) -> bool {
        self.recent_events
            .iter()
            .any(|e| e.event_type == "sample" && e.frame == frame && e.name == name)
    }
}

pub struct AudioPlugin;

impl Plugin for AudioPlugin {
    fn build(&self, app: &mut App) {
        // Mixing backend hookup lives in the platform layer; the board
        // itself is owned by the level.
        let _ = app;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_volume_and_pan_are_clamped() {
        let mut board = AudioBoard::default();
        board.play_sample("ring", 2.0, -3.0, 44100.0);
        let event = board.recent_events.last().unwrap();
        assert_eq!(event.volume, Some(1.0));
        assert_eq!(event.pan, Some(-1.0));
    }

    #[test]
    fn music_state_tracks_playback() {
        let mut board = AudioBoard::default();
        assert!(!board.music_is_playing());
        board.play_music("boss", false);
        assert!(board.music_is_playing());
        assert!(!board.music_looping);
        board.set_music_volume(-1.0);
        assert_eq!(board.music_volume, 0.0);
        assert!(!board.music_is_playing());
    }

    #[test]
    fn level_music_replays_the_configured_track() {
        let mut board = AudioBoard {
            level_music: "zone1".to_string(),
            ..Default::default()
        };
        board.play_level_music();
        assert_eq!(board.current_music.as_deref(), Some("zone1"));
        assert!(board.music_looping);
    }

    #[test]
    fn event_log_is_bounded() {
        let mut board = AudioBoard::default();
        for _ in 0..(MAX_AUDIO_EVENTS + 20) {
            board.play_sample("tick", 1.0, 0.0, 0.0);
        }
        assert_eq!(board.recent_events.len(), MAX_AUDIO_EVENTS);
    }
}
