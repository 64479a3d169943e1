use bevy::prelude::*;

use crate::level::DrawOp;
use crate::objects::commands::{Command, Cx, Flow, RenderCx};
use crate::objects::expression::Expr;
use crate::objects::symbols::{interpolate, write_var};
use crate::text::{substring_window, tagged_len, text_width};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Centre,
    Right,
}

/// textout / textout_centre / textout_right. The template is interpolated
/// against the symbol tables every tick and the visible length published as
/// `$_STRLEN`.
pub struct Textout {
    pub align: TextAlign,
    pub font: String,
    pub x: Expr,
    pub y: Expr,
    pub template: String,
    pub max_width: Expr,
    pub first_index: Expr,
    pub length: Expr,
    rendered: String,
    draw_position: Vec2,
}

impl Textout {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        align: TextAlign,
        font: String,
        x: Expr,
        y: Expr,
        template: String,
        max_width: Expr,
        first_index: Expr,
        length: Expr,
    ) -> Self {
        Self {
            align,
            font,
            x,
            y,
            template,
            max_width,
            first_index,
            length,
            rendered: String::new(),
            draw_position: Vec2::ZERO,
        }
    }
}

impl Command for Textout {
    fn update(&mut self, cx: &mut Cx) -> Flow {
        let start = cx.eval(&self.first_index).max(0.0) as usize;
        let length = cx.eval(&self.length).max(0.0) as usize; // saturates at usize::MAX
        let max_width = cx.eval(&self.max_width);
        let x = cx.eval(&self.x);
        let y = cx.eval(&self.y);

        let interpolated = interpolate(&self.template, &cx.ent.vm.symbols, &cx.level.globals);
        let windowed = substring_window(&interpolated, start, length);

        write_var(
            "_STRLEN",
            tagged_len(&windowed) as f32,
            &mut cx.ent.vm.symbols,
            &mut cx.level.globals,
        );

        let font = cx.level.fonts.get(&self.font);
        let mut width = text_width(&windowed, &font);
        if max_width > 0.0 {
            width = width.min(max_width);
        }
        let mut position = Vec2::new(x, y);
        match self.align {
            TextAlign::Left => {}
            TextAlign::Centre => position.x -= width / 2.0,
            TextAlign::Right => position.x -= width,
        }

        self.rendered = windowed;
        self.draw_position = cx.ent.actor.position + position;
        Flow::Continue
    }

    fn render(&self, rx: &mut RenderCx) {
        rx.out.push(DrawOp::Text {
            position: rx.project(self.draw_position),
            text: self.rendered.clone(),
            font: self.font.clone(),
            zindex: rx.ent.zindex,
        });
    }
}
