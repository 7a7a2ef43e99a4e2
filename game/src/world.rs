use lively_api::{Frame_Input, Key, Relocatable};

pub const MAX_BOXES: usize = 16;
pub const DEFAULT_ARENA: [f32; 2] = [960., 540.];

const PLAYER_SPEED: f32 = 320.;
const PLAYER_SIZE: f32 = 28.;
const BOX_SIZE: f32 = 18.;
const SPAWN_INTERVAL: f32 = 1.5;
const INITIAL_BOXES: usize = 3;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Body {
    pub pos: [f32; 2],
    pub vel: [f32; 2],
    pub size: [f32; 2],
    pub color: [u8; 4],
    pub alive: u32,
}

/// All of the game's mutable state. Lives inside the state block, so it must stay plain
/// data: boxes are referred to by index, never by pointer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct World {
    pub frame: u64,
    pub game_time: f32,
    pub rng: u32,
    pub arena: [f32; 2],
    pub player: Body,
    pub boxes: [Body; MAX_BOXES],
    pub score: u32,
    pub spawn_timer: f32,
    pub quit_requested: u32,
    pub reload_requested: u32,
    pub restart_requested: u32,
    pub _pad: u32,
}

unsafe impl Relocatable for World {}

impl World {
    pub fn new(seed: u32) -> World {
        let mut world = World {
            frame: 0,
            game_time: 0.,
            rng: seed.max(1),
            arena: DEFAULT_ARENA,
            player: Body {
                pos: [
                    (DEFAULT_ARENA[0] - PLAYER_SIZE) * 0.5,
                    (DEFAULT_ARENA[1] - PLAYER_SIZE) * 0.5,
                ],
                vel: [0., 0.],
                size: [PLAYER_SIZE, PLAYER_SIZE],
                color: [240, 200, 60, 255],
                alive: 1,
            },
            boxes: [Body::default(); MAX_BOXES],
            score: 0,
            spawn_timer: SPAWN_INTERVAL,
            quit_requested: 0,
            reload_requested: 0,
            restart_requested: 0,
            _pad: 0,
        };
        for _ in 0..INITIAL_BOXES {
            world.spawn_box();
        }
        world
    }

    /// xorshift32
    fn next_rand(&mut self) -> u32 {
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.rng = x;
        x
    }

    fn rand_range(&mut self, min: f32, max: f32) -> f32 {
        let t = (self.next_rand() % 10_000) as f32 / 10_000.;
        min + (max - min) * t
    }

    pub fn n_alive_boxes(&self) -> usize {
        self.boxes.iter().filter(|b| b.alive != 0).count()
    }

    /// Returns the index of the spawned box, if there was a free slot.
    pub fn spawn_box(&mut self) -> Option<usize> {
        let slot = self.boxes.iter().position(|b| b.alive == 0)?;
        let pos = [
            self.rand_range(0., self.arena[0] - BOX_SIZE),
            self.rand_range(0., self.arena[1] - BOX_SIZE),
        ];
        let speed = self.rand_range(80., 220.);
        let angle = self.rand_range(0., std::f32::consts::PI * 2.);
        let color = [
            100 + (self.next_rand() % 156) as u8,
            100 + (self.next_rand() % 156) as u8,
            100 + (self.next_rand() % 156) as u8,
            255,
        ];
        self.boxes[slot] = Body {
            pos,
            vel: [speed * angle.cos(), speed * angle.sin()],
            size: [BOX_SIZE, BOX_SIZE],
            color,
            alive: 1,
        };
        Some(slot)
    }

    pub fn update(&mut self, input: &Frame_Input, dt: f32) {
        self.frame += 1;
        self.game_time += dt;

        if input.window_size[0] > 0 && input.window_size[1] > 0 {
            self.arena = [input.window_size[0] as f32, input.window_size[1] as f32];
        }

        self.quit_requested = (input.close_requested || input.was_pressed(Key::Escape)) as u32;
        self.reload_requested = input.was_pressed(Key::F5) as u32;
        self.restart_requested = input.was_pressed(Key::F6) as u32;

        self.move_player(input, dt);
        self.move_boxes(dt);
        self.collect_boxes();

        self.spawn_timer -= dt;
        if self.spawn_timer <= 0. {
            self.spawn_timer += SPAWN_INTERVAL;
            self.spawn_box();
        }
    }

    fn move_player(&mut self, input: &Frame_Input, dt: f32) {
        let mut dir = [0f32, 0f32];
        if input.is_down(Key::Left) {
            dir[0] -= 1.;
        }
        if input.is_down(Key::Right) {
            dir[0] += 1.;
        }
        if input.is_down(Key::Up) {
            dir[1] -= 1.;
        }
        if input.is_down(Key::Down) {
            dir[1] += 1.;
        }
        let len = (dir[0] * dir[0] + dir[1] * dir[1]).sqrt();
        if len > 0. {
            dir = [dir[0] / len, dir[1] / len];
        }

        let speed = if input.is_down(Key::Space) {
            PLAYER_SPEED * 2.
        } else {
            PLAYER_SPEED
        };
        let player = &mut self.player;
        player.vel = [dir[0] * speed, dir[1] * speed];
        for i in 0..2 {
            player.pos[i] = (player.pos[i] + player.vel[i] * dt)
                .max(0.)
                .min((self.arena[i] - player.size[i]).max(0.));
        }
    }

    fn move_boxes(&mut self, dt: f32) {
        let arena = self.arena;
        for b in self.boxes.iter_mut().filter(|b| b.alive != 0) {
            for i in 0..2 {
                b.pos[i] += b.vel[i] * dt;
                let max = (arena[i] - b.size[i]).max(0.);
                if b.pos[i] < 0. {
                    b.pos[i] = -b.pos[i];
                    b.vel[i] = b.vel[i].abs();
                } else if b.pos[i] > max {
                    b.pos[i] = max - (b.pos[i] - max);
                    b.vel[i] = -b.vel[i].abs();
                }
                b.pos[i] = b.pos[i].max(0.).min(max);
            }
        }
    }

    fn collect_boxes(&mut self) {
        let player = self.player;
        for b in self.boxes.iter_mut().filter(|b| b.alive != 0) {
            if overlaps(&player, b) {
                b.alive = 0;
                self.score += 1;
            }
        }
    }
}

fn overlaps(a: &Body, b: &Body) -> bool {
    a.pos[0] < b.pos[0] + b.size[0]
        && b.pos[0] < a.pos[0] + a.size[0]
        && a.pos[1] < b.pos[1] + b.size[1]
        && b.pos[1] < a.pos[1] + a.size[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lively_test::assert_approx_eq;

    fn input_with(keys: &[Key]) -> Frame_Input {
        let mut input = Frame_Input::default();
        input.begin_frame(1);
        for &k in keys {
            input.set_key(k, true);
        }
        input
    }

    #[test]
    fn new_world_is_deterministic() {
        assert_eq!(World::new(42), World::new(42));
        assert_ne!(World::new(42), World::new(43));
        assert_eq!(World::new(42).n_alive_boxes(), INITIAL_BOXES);
    }

    #[test]
    fn world_has_no_hidden_padding() {
        // The state block is compared byte for byte across reloads.
        let fields = 8 + 4 + 4 + 8 + 32 + 32 * MAX_BOXES + 4 * 6;
        assert_eq!(std::mem::size_of::<World>(), fields);
    }

    #[test]
    fn player_moves_and_stays_in_arena() {
        let mut world = World::new(1);
        let start = world.player.pos;
        world.update(&input_with(&[Key::Right]), 0.5);
        assert_approx_eq!(world.player.pos[0], start[0] + PLAYER_SPEED * 0.5, eps = 0.01);

        for _ in 0..100 {
            world.update(&input_with(&[Key::Right, Key::Down]), 0.1);
        }
        assert_approx_eq!(world.player.pos[0], DEFAULT_ARENA[0] - PLAYER_SIZE, eps = 0.01);
        assert_approx_eq!(world.player.pos[1], DEFAULT_ARENA[1] - PLAYER_SIZE, eps = 0.01);
    }

    #[test]
    fn boxes_bounce_inside_arena() {
        let mut world = World::new(7);
        for _ in 0..600 {
            world.update(&Frame_Input::default(), 1. / 60.);
        }
        for b in world.boxes.iter().filter(|b| b.alive != 0) {
            assert!(b.pos[0] >= 0. && b.pos[0] <= world.arena[0] - b.size[0]);
            assert!(b.pos[1] >= 0. && b.pos[1] <= world.arena[1] - b.size[1]);
        }
    }

    #[test]
    fn touching_a_box_scores() {
        let mut world = World::new(3);
        world.boxes[0].pos = world.player.pos;
        world.boxes[0].vel = [0., 0.];
        world.update(&Frame_Input::default(), 0.);
        assert_eq!(world.boxes[0].alive, 0);
        assert!(world.score >= 1);
    }

    #[test]
    fn spawns_over_time_up_to_max() {
        let mut world = World::new(9);
        // A zero-sized player can't collect anything.
        world.player.size = [0., 0.];
        for _ in 0..(MAX_BOXES * 4) {
            world.update(&Frame_Input::default(), SPAWN_INTERVAL);
        }
        assert_eq!(world.n_alive_boxes(), MAX_BOXES);
        assert_eq!(world.spawn_box(), None);
    }

    #[test]
    fn requests_are_edge_triggered() {
        let mut world = World::new(5);
        world.update(&input_with(&[Key::F5, Key::Escape]), 0.);
        assert_eq!(world.reload_requested, 1);
        assert_eq!(world.quit_requested, 1);
        assert_eq!(world.restart_requested, 0);

        let mut held = input_with(&[Key::F5]);
        held.begin_frame(2);
        world.update(&held, 0.);
        assert_eq!(world.reload_requested, 0);
    }

    #[test]
    fn window_size_resizes_arena() {
        let mut world = World::new(5);
        let mut input = Frame_Input::default();
        input.window_size = [320, 200];
        world.update(&input, 0.);
        assert_eq!(world.arena, [320., 200.]);
    }
}
