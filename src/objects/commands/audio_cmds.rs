use crate::objects::commands::{Command, Cx, Flow};
use crate::objects::expression::Expr;

pub struct PlaySample {
    pub name: String,
    pub volume: Expr,
    pub pan: Expr,
    pub frequency: Expr,
}

impl Command for PlaySample {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let volume = cx.eval(&self.volume);
        let pan = cx.eval(&self.pan);
        let frequency = cx.eval(&self.frequency);
        cx.level
            .audio
            .play_sample(&self.name, volume, pan, frequency);
        Flow::Continue
    }
}

pub struct StopSample {
    pub name: String,
}

impl Command for StopSample {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.audio.stop_sample(&self.name);
        Flow::Continue
    }
}

pub struct PlayMusic {
    pub name: String,
    pub looping: Expr,
}

impl Command for PlayMusic {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let looping = cx.eval(&self.looping).abs() >= 1e-5;
        cx.level.audio.play_music(&self.name, looping);
        Flow::Continue
    }
}

pub struct PlayLevelMusic;

impl Command for PlayLevelMusic {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        cx.level.audio.play_level_music();
        Flow::Continue
    }
}

pub struct SetMusicVolume {
    pub volume: Expr,
}

impl Command for SetMusicVolume {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let volume = cx.eval(&self.volume);
        cx.level.audio.set_music_volume(volume);
        Flow::Continue
    }
}
