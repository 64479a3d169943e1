use bevy::prelude::*;

use crate::level::{DrawOp, Level};

/// Marks Bevy entities owned by the level draw pass.
#[derive(Component)]
struct LevelDraw;

pub struct RenderPlugin;

impl Plugin for RenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
            .add_systems(Update, sync_draw_ops.run_if(resource_exists::<Level>));
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Rebuilds the sprite/text entities from this frame's draw list. The level
/// works in y-down screen space; Bevy renders y-up.
fn sync_draw_ops(
    mut commands: Commands,
    level: Res<Level>,
    existing: Query<Entity, With<LevelDraw>>,
) {
    for entity in &existing {
        commands.entity(entity).despawn();
    }

    for op in level.render(false) {
        match op {
            DrawOp::Sprite {
                position,
                size,
                scale,
                angle,
                alpha,
                hflip,
                vflip,
                zindex,
                ..
            } => {
                let scaled = size * scale;
                let center = position + scaled / 2.0;
                commands.spawn((
                    LevelDraw,
                    Sprite {
                        color: Color::srgba(1.0, 1.0, 1.0, alpha),
                        custom_size: Some(scaled),
                        flip_x: hflip,
                        flip_y: vflip,
                        ..default()
                    },
                    Transform::from_translation(Vec3::new(center.x, -center.y, zindex))
                        .with_rotation(Quat::from_rotation_z(-angle)),
                ));
            }
            DrawOp::Text {
                position,
                text,
                zindex,
                ..
            } => {
                commands.spawn((
                    LevelDraw,
                    Text2d::new(text),
                    Transform::from_translation(Vec3::new(position.x, -position.y, zindex)),
                ));
            }
            DrawOp::Rect {
                min,
                max,
                color,
                zindex,
            } => {
                let size = max - min;
                let center = (min + max) / 2.0;
                commands.spawn((
                    LevelDraw,
                    Sprite {
                        color: Color::srgba(color[0], color[1], color[2], 0.25),
                        custom_size: Some(size),
                        ..default()
                    },
                    Transform::from_translation(Vec3::new(center.x, -center.y, zindex)),
                ));
            }
        }
    }
}
