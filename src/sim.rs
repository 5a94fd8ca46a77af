// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

// NPC idle-wander simulation.  One state per map object, advanced on a
// fixed tick.  Each tick every NPC is either waiting, walking pixel by
// pixel toward a target square, pausing after arrival, or picking its
// next action.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use std::time::Duration;

use rand::Rng;

use crate::assets::{BLOCK_SIZE, WATER_TILE_ID};
use crate::assets::blockset::TileGrid;
use crate::assets::collision::{self, CollisionTable};
use crate::assets::objects::{Facing, MapObjects, ObjectMovement, WalkAxis};
use crate::assets::sprite::SpriteKind;

const BLOCK : i32 = BLOCK_SIZE as i32;
/// Wandering NPCs never stray more than this many squares per axis from
/// their spawn square.
pub const TETHER_RANGE : i32 = 5;
/// Seels swim instead of walking; their targets are checked against the
/// water tile rather than the collision table.
const AQUATIC_SPRITE : &str = "SPRITE_SEEL";

/// Default NPC tick cadence.
pub const NPC_TICK : Duration = Duration::from_millis(66);
/// Default water/flower animation cadence.
pub const WATER_TICK : Duration = Duration::from_millis(275);

/// Tick intervals for the two animation loops.  The driver schedules NPC
/// steps and water-tile shifts independently, each on its own interval.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SimConfig {
	pub npc_tick : Duration,
	pub water_tick : Duration,
}

impl Default for SimConfig {
	fn default() -> SimConfig {
		return SimConfig { npc_tick : NPC_TICK, water_tick : WATER_TICK };
	}
}

/// Per-NPC simulation state.  Positions are in pixels; one map square is
/// `BLOCK_SIZE` pixels.
#[derive(Clone, Debug)]
pub struct MovingState {
	pub current_x : i32,
	pub current_y : i32,
	pub target_x : i32,
	pub target_y : i32,
	pub initial_x : i32,
	pub initial_y : i32,
	pub facing : Facing,
	pub movement : ObjectMovement,
	pub sprite : String,
	pub sprite_kind : SpriteKind,
	pub wait_time : u32,
	pub just_moved : bool,
	pub walk_counter : u32,
}

fn grid_coord(pixel : i32) -> i32 {
	// nearest square, matching pixel positions mid-move
	return (pixel + BLOCK / 2).div_euclid(BLOCK);
}

impl MovingState {
	pub fn grid_x(&self) -> i32 {
		return grid_coord(self.current_x);
	}

	pub fn grid_y(&self) -> i32 {
		return grid_coord(self.current_y);
	}
}

fn initial_state(x : u32, y : u32, sprite : &str, movement : ObjectMovement,
		 sprite_kind : SpriteKind) -> MovingState {
	let px = x as i32 * BLOCK;
	let py = y as i32 * BLOCK;
	let facing = match movement {
		ObjectMovement::Stay(Some(f)) => f,
		ObjectMovement::Walk(WalkAxis::LeftRight) => Facing::Right,
		_ => Facing::Down,
	};
	return MovingState {
		current_x : px,
		current_y : py,
		target_x : px,
		target_y : py,
		initial_x : px,
		initial_y : py,
		facing,
		movement,
		sprite : sprite.to_string(),
		sprite_kind,
		wait_time : 0,
		just_moved : false,
		walk_counter : 0,
	};
}

// ----------------------------------------

/// Simulation for one loaded map.  Discarded and rebuilt on map change;
/// the epoch counter lets a driver detect ticks scheduled against a
/// simulation that has since been replaced.
pub struct Simulation {
	config : SimConfig,
	tileset_name : String,
	/// Squares permanently occupied by NPCs that never walk.
	fixed_blockers : Vec<(i32, i32)>,
	movers : Vec<MovingState>,
	epoch : u64,
}

/// `sprite_kind` resolves each object's sprite key to its sheet category;
/// unknown sprites should map to `SpriteKind::None`.
pub fn new(objects : &MapObjects, tileset_name : &str,
	   sprite_kind : impl Fn(&str) -> SpriteKind) -> Simulation {
	return new_with_config(objects, tileset_name, sprite_kind, SimConfig::default());
}

pub fn new_with_config(objects : &MapObjects, tileset_name : &str,
		       sprite_kind : impl Fn(&str) -> SpriteKind,
		       config : SimConfig) -> Simulation {
	let movers = objects.object_events.iter()
		.map(|obj| initial_state(obj.x, obj.y, &obj.sprite, obj.movement,
					 sprite_kind(&obj.sprite)))
		.collect();
	let fixed_blockers = objects.object_events.iter()
		.filter(|obj| !matches!(obj.movement, ObjectMovement::Walk(_)))
		.map(|obj| (obj.x as i32, obj.y as i32))
		.collect();
	return Simulation {
		config,
		tileset_name : tileset_name.to_string(),
		fixed_blockers,
		movers,
		epoch : 0,
	};
}

enum WalkChoice {
	Move { dx : i32, dy : i32, facing : Facing },
	Wait,
}

impl Simulation {
	pub fn movers(&self) -> &[MovingState] {
		return &self.movers;
	}

	pub fn epoch(&self) -> u64 {
		return self.epoch;
	}

	pub fn config(&self) -> SimConfig {
		return self.config;
	}

	/// Advances every NPC by one tick.  All decisions read the square
	/// occupancy as it stood at tick start; the new states are committed
	/// together at the end, so the outcome does not depend on NPC order.
	pub fn tick<R : Rng>(&mut self, grid : &TileGrid, collision : &CollisionTable,
			     rng : &mut R) {
		let snapshot : Vec<(i32, i32)> = self.movers.iter()
			.map(|m| (m.grid_x(), m.grid_y())).collect();
		let mut next = self.movers.clone();
		for (idx, state) in next.iter_mut().enumerate() {
			self.step_npc(idx, state, &snapshot, grid, collision, rng);
		}
		self.movers = next;
		self.epoch += 1;
	}

	/// Tick guarded by an epoch check: a tick scheduled before a map
	/// switch arrives with a stale epoch and is dropped.
	pub fn tick_if_current<R : Rng>(&mut self, epoch : u64, grid : &TileGrid,
					collision : &CollisionTable, rng : &mut R) -> bool {
		if epoch != self.epoch {
			pdebug!("dropping stale tick (epoch {epoch}, now {})", self.epoch);
			return false;
		}
		self.tick(grid, collision, rng);
		return true;
	}

	fn step_npc<R : Rng>(&self, idx : usize, state : &mut MovingState,
			     snapshot : &[(i32, i32)], grid : &TileGrid,
			     collision : &CollisionTable, rng : &mut R) {
		if state.wait_time > 0 {
			state.wait_time -= 1;
			return;
		}

		// One pixel per axis toward the target.
		if state.current_x != state.target_x || state.current_y != state.target_y {
			state.walk_counter += 1;
			state.current_x += (state.target_x - state.current_x).signum();
			state.current_y += (state.target_y - state.current_y).signum();
			return;
		}

		// Forced pause after every completed move.
		if state.just_moved {
			state.walk_counter = 0;
			state.wait_time = BLOCK as u32;
			state.just_moved = false;
			return;
		}

		match state.movement {
			ObjectMovement::Walk(axis) => {
				self.decide_walk(idx, state, axis, snapshot, grid, collision, rng);
			},
			ObjectMovement::Stay(None) if state.sprite_kind != SpriteKind::None => {
				// Spin in place: pick a facing, or wait.
				match rng.gen_range(0..5) {
					0 => { state.facing = Facing::Left; },
					1 => { state.facing = Facing::Right; },
					2 => { state.facing = Facing::Up; },
					3 => { state.facing = Facing::Down; },
					_ => {
						state.wait_time = random_wait(rng);
						return;
					},
				}
				// same post-move pause as a completed walk
				state.just_moved = true;
			},
			_ => {
				state.wait_time = random_wait(rng);
			},
		}
	}

	fn decide_walk<R : Rng>(&self, idx : usize, state : &mut MovingState, axis : WalkAxis,
				snapshot : &[(i32, i32)], grid : &TileGrid,
				collision : &CollisionTable, rng : &mut R) {
		let moves = [
			WalkChoice::Move { dx : BLOCK, dy : 0, facing : Facing::Right },
			WalkChoice::Move { dx : -BLOCK, dy : 0, facing : Facing::Left },
			WalkChoice::Move { dx : 0, dy : BLOCK, facing : Facing::Down },
			WalkChoice::Move { dx : 0, dy : -BLOCK, facing : Facing::Up },
			WalkChoice::Wait,
		];
		let options : Vec<&WalkChoice> = moves.iter().filter(|choice| {
			let (dx, dy) = match choice {
				WalkChoice::Wait => { return true; },
				WalkChoice::Move { dx, dy, .. } => (*dx, *dy),
			};
			match axis {
				WalkAxis::UpDown if dx != 0 => { return false; },
				WalkAxis::LeftRight if dy != 0 => { return false; },
				_ => {},
			}
			return self.can_enter(idx, state, dx, dy, snapshot, grid, collision);
		}).collect();

		if options.is_empty() {
			// boxed in: stay put and re-decide next tick
			state.target_x = state.current_x;
			state.target_y = state.current_y;
			return;
		}
		match options[rng.gen_range(0..options.len())] {
			WalkChoice::Wait => {
				state.wait_time = random_wait(rng);
			},
			WalkChoice::Move { dx, dy, facing } => {
				state.target_x = state.current_x + dx;
				state.target_y = state.current_y + dy;
				state.facing = *facing;
				state.just_moved = true;
			},
		}
	}

	fn can_enter(&self, idx : usize, state : &MovingState, dx : i32, dy : i32,
		     snapshot : &[(i32, i32)], grid : &TileGrid,
		     collision : &CollisionTable) -> bool {
		let gx = grid_coord(state.current_x + dx);
		let gy = grid_coord(state.current_y + dy);
		if gx < 0 || gy < 0 {
			return false;
		}

		if state.sprite == AQUATIC_SPRITE {
			// same sub-tile the collision check samples, but it must be water
			match grid.get(gx as usize * 2, gy as usize * 2 + 1) {
				Some(tile) if tile == WATER_TILE_ID => {},
				_ => { return false; },
			}
		} else if !collision::is_square_walkable(gx as usize, gy as usize, grid,
							 &self.tileset_name, collision) {
			return false;
		}

		// other NPCs' current squares, as of tick start
		for (other, pos) in snapshot.iter().enumerate() {
			if other != idx && *pos == (gx, gy) {
				return false;
			}
		}
		if self.fixed_blockers.contains(&(gx, gy)) {
			return false;
		}

		let dist_x = (state.initial_x / BLOCK - gx).abs();
		let dist_y = (state.initial_y / BLOCK - gy).abs();
		return dist_x <= TETHER_RANGE && dist_y <= TETHER_RANGE;
	}
}

fn random_wait<R : Rng>(rng : &mut R) -> u32 {
	return BLOCK as u32 * rng.gen_range(1..=3);
}

// ----------------------------------------

#[cfg(test)]
use rand::SeedableRng;
#[cfg(test)]
use rand::rngs::StdRng;
#[cfg(test)]
use std::collections::HashMap;
#[cfg(test)]
use crate::assets::blockset;
#[cfg(test)]
use crate::assets::objects::ObjectEvent;

#[cfg(test)]
fn uniform_grid(blocks_w : usize, blocks_h : usize, tile : u8) -> TileGrid {
	let block = vec![tile; 16];
	let bs = blockset::new(&block);
	let indices = vec![0u8; blocks_w * blocks_h];
	return blockset::assemble_map(&indices, &bs, blocks_w, blocks_h);
}

#[cfg(test)]
fn walkable_table(tile : u8) -> CollisionTable {
	let mut table = HashMap::new();
	table.insert("Overworld".to_string(), vec![tile]);
	return table;
}

#[cfg(test)]
fn npc(x : u32, y : u32, sprite : &str, movement : ObjectMovement) -> ObjectEvent {
	return ObjectEvent {
		x, y,
		sprite : sprite.to_string(),
		movement,
		text_script : "TEXT_1".to_string(),
		optional_param_1 : None,
		optional_param_2 : None,
	};
}

#[cfg(test)]
fn walker_sim(x : u32, y : u32) -> Simulation {
	let mut objects = MapObjects::default();
	objects.object_events.push(npc(x, y, "SPRITE_YOUNGSTER",
				       ObjectMovement::Walk(WalkAxis::AnyDir)));
	return new(&objects, "OVERWORLD", |_| SpriteKind::Walk);
}

#[test]
fn test_waiting_decrements() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(1);
	let mut sim = walker_sim(5, 5);
	sim.movers[0].wait_time = 3;
	sim.tick(&grid, &table, &mut rng);
	assert_eq!(2, sim.movers()[0].wait_time);
	assert_eq!(5 * 16, sim.movers()[0].current_x);
}

#[test]
fn test_transit_moves_one_pixel_per_axis() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(1);
	let mut sim = walker_sim(5, 5);
	sim.movers[0].target_x = 5 * 16 + 16;
	sim.movers[0].target_y = 5 * 16 - 16;
	sim.tick(&grid, &table, &mut rng);
	let m = &sim.movers()[0];
	assert_eq!(5 * 16 + 1, m.current_x);
	assert_eq!(5 * 16 - 1, m.current_y);
	assert_eq!(1, m.walk_counter);
}

#[test]
fn test_arrival_forces_block_pause() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(1);
	let mut sim = walker_sim(5, 5);
	sim.movers[0].just_moved = true;
	sim.movers[0].walk_counter = 9;
	sim.tick(&grid, &table, &mut rng);
	let m = &sim.movers()[0];
	assert_eq!(16, m.wait_time);
	assert_eq!(0, m.walk_counter);
	assert!(!m.just_moved);
}

#[test]
fn test_walk_decision_moves_or_waits() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(7);
	let mut sim = walker_sim(5, 5);
	sim.tick(&grid, &table, &mut rng);
	let m = &sim.movers()[0];
	let moved = (m.target_x, m.target_y) != (m.current_x, m.current_y);
	assert!(moved || m.wait_time > 0);
	if moved {
		assert!(m.just_moved);
		// cardinal move by exactly one square
		let dx = m.target_x - m.current_x;
		let dy = m.target_y - m.current_y;
		assert!((dx.abs() == 16 && dy == 0) || (dx == 0 && dy.abs() == 16));
	}
}

#[test]
fn test_axis_constraint() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(3);
	let mut objects = MapObjects::default();
	objects.object_events.push(npc(5, 5, "SPRITE_YOUNGSTER",
				       ObjectMovement::Walk(WalkAxis::UpDown)));
	let mut sim = new(&objects, "OVERWORLD", |_| SpriteKind::Walk);
	for _ in 0..500 {
		sim.tick(&grid, &table, &mut rng);
		assert_eq!(5 * 16, sim.movers()[0].current_x);
	}
}

#[test]
fn test_tether_invariant() {
	let grid = uniform_grid(40, 40, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(42);
	let mut sim = walker_sim(20, 20);
	for _ in 0..3000 {
		sim.tick(&grid, &table, &mut rng);
		let m = &sim.movers()[0];
		assert!((20 - m.grid_x()).abs() <= TETHER_RANGE);
		assert!((20 - m.grid_y()).abs() <= TETHER_RANGE);
	}
}

#[test]
fn test_boxed_in_by_fixed_npcs() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(11);
	let mut objects = MapObjects::default();
	objects.object_events.push(npc(5, 5, "SPRITE_YOUNGSTER",
				       ObjectMovement::Walk(WalkAxis::AnyDir)));
	for (x, y) in [(4, 5), (6, 5), (5, 4), (5, 6)] {
		objects.object_events.push(npc(x, y, "SPRITE_GUARD",
					       ObjectMovement::Stay(Some(Facing::Down))));
	}
	let mut sim = new(&objects, "OVERWORLD", |_| SpriteKind::Walk);
	for _ in 0..300 {
		sim.tick(&grid, &table, &mut rng);
		assert_eq!((5, 5), (sim.movers()[0].grid_x(), sim.movers()[0].grid_y()));
	}
}

#[test]
fn test_unwalkable_grid_pins_npc() {
	// grid tile not in the collision table
	let grid = uniform_grid(20, 20, 0x30);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(5);
	let mut sim = walker_sim(5, 5);
	for _ in 0..300 {
		sim.tick(&grid, &table, &mut rng);
		assert_eq!((5 * 16, 5 * 16),
			   (sim.movers()[0].current_x, sim.movers()[0].current_y));
	}
}

#[test]
fn test_aquatic_npc_needs_water() {
	let water = uniform_grid(20, 20, WATER_TILE_ID);
	let land = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);

	// on land the seel never moves, even where walkers could
	let mut rng = StdRng::seed_from_u64(9);
	let mut objects = MapObjects::default();
	objects.object_events.push(npc(5, 5, "SPRITE_SEEL",
				       ObjectMovement::Walk(WalkAxis::AnyDir)));
	let mut sim = new(&objects, "OVERWORLD", |_| SpriteKind::None);
	for _ in 0..300 {
		sim.tick(&land, &table, &mut rng);
		assert_eq!((5, 5), (sim.movers()[0].grid_x(), sim.movers()[0].grid_y()));
	}

	// on water it wanders despite the water tile being absent from the
	// collision table
	let mut sim = new(&objects, "OVERWORLD", |_| SpriteKind::None);
	let mut moved = false;
	for _ in 0..300 {
		sim.tick(&water, &table, &mut rng);
		let m = &sim.movers()[0];
		if (m.grid_x(), m.grid_y()) != (5, 5) {
			moved = true;
		}
	}
	assert!(moved);
}

#[test]
fn test_spinner_changes_facing_only() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(13);
	let mut objects = MapObjects::default();
	objects.object_events.push(npc(5, 5, "SPRITE_GAMBLER",
				       ObjectMovement::Stay(None)));
	let mut sim = new(&objects, "OVERWORLD", |_| SpriteKind::Facing);
	let mut facings = std::collections::HashSet::new();
	for _ in 0..500 {
		sim.tick(&grid, &table, &mut rng);
		let m = &sim.movers()[0];
		assert_eq!((5 * 16, 5 * 16), (m.current_x, m.current_y));
		facings.insert(format!("{:?}", m.facing));
	}
	assert!(facings.len() > 1);
}

#[test]
fn test_fixed_facing_npc_only_waits() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(17);
	let mut objects = MapObjects::default();
	objects.object_events.push(npc(5, 5, "SPRITE_GUARD",
				       ObjectMovement::Stay(Some(Facing::Left))));
	let mut sim = new(&objects, "OVERWORLD", |_| SpriteKind::Facing);
	for _ in 0..200 {
		sim.tick(&grid, &table, &mut rng);
		let m = &sim.movers()[0];
		assert_eq!(Facing::Left, m.facing);
		assert_eq!((5 * 16, 5 * 16), (m.current_x, m.current_y));
	}
}

#[test]
fn test_initial_facing() {
	let objects = {
		let mut o = MapObjects::default();
		o.object_events.push(npc(1, 1, "SPRITE_A", ObjectMovement::Walk(WalkAxis::LeftRight)));
		o.object_events.push(npc(2, 1, "SPRITE_B", ObjectMovement::Walk(WalkAxis::UpDown)));
		o.object_events.push(npc(3, 1, "SPRITE_C", ObjectMovement::Stay(Some(Facing::Up))));
		o
	};
	let sim = new(&objects, "OVERWORLD", |_| SpriteKind::Walk);
	assert_eq!(Facing::Right, sim.movers()[0].facing);
	assert_eq!(Facing::Down, sim.movers()[1].facing);
	assert_eq!(Facing::Up, sim.movers()[2].facing);
}

#[test]
fn test_tick_intervals() {
	let config = SimConfig::default();
	assert_eq!(Duration::from_millis(66), config.npc_tick);
	assert_eq!(Duration::from_millis(275), config.water_tick);

	let slow = SimConfig {
		npc_tick : Duration::from_millis(100),
		water_tick : Duration::from_millis(500),
	};
	let mut objects = MapObjects::default();
	objects.object_events.push(npc(5, 5, "SPRITE_YOUNGSTER",
				       ObjectMovement::Walk(WalkAxis::AnyDir)));
	let sim = new_with_config(&objects, "OVERWORLD", |_| SpriteKind::Walk, slow);
	assert_eq!(slow, sim.config());
	assert_eq!(SimConfig::default(), walker_sim(5, 5).config());
}

#[test]
fn test_stale_tick_dropped() {
	let grid = uniform_grid(20, 20, 0x01);
	let table = walkable_table(0x01);
	let mut rng = StdRng::seed_from_u64(1);
	let mut sim = walker_sim(5, 5);
	assert!(sim.tick_if_current(0, &grid, &table, &mut rng));
	assert_eq!(1, sim.epoch());
	assert!(!sim.tick_if_current(0, &grid, &table, &mut rng));
	assert_eq!(1, sim.epoch());
}
