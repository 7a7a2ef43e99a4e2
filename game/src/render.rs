use super::world::{Body, World};
use lively_api::{Draw_Command, Draw_Context};

const BACKGROUND: [u8; 4] = [18, 20, 28, 255];
const SCORE_PIP: [u8; 4] = [120, 220, 140, 255];

pub fn draw_world(world: &World, ctx: &mut Draw_Context) {
    ctx.push(Draw_Command::clear(BACKGROUND));

    for b in world.boxes.iter().filter(|b| b.alive != 0) {
        draw_body(b, ctx);
    }
    draw_body(&world.player, ctx);

    // One pip per point, wrapping every 40.
    for i in 0..world.score.min(200) {
        let (row, col) = (i / 40, i % 40);
        if !ctx.push(Draw_Command::rect(
            8. + col as f32 * 10.,
            8. + row as f32 * 10.,
            6.,
            6.,
            SCORE_PIP,
        )) {
            break;
        }
    }
}

fn draw_body(b: &Body, ctx: &mut Draw_Context) {
    ctx.push(Draw_Command::rect(b.pos[0], b.pos[1], b.size[0], b.size[1], b.color));
}
