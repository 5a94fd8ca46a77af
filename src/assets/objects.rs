// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use regex::Regex;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
	Down,
	Up,
	Left,
	Right,
}

impl Facing {
	fn parse(s : &str) -> Option<Facing> {
		return match s {
			"DOWN" => Some(Facing::Down),
			"UP" => Some(Facing::Up),
			"LEFT" => Some(Facing::Left),
			"RIGHT" => Some(Facing::Right),
			_ => None,
		};
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum WalkAxis {
	UpDown,
	LeftRight,
	AnyDir,
}

/// NPC movement mode plus its direction constraint.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ObjectMovement {
	/// Fixed position; `None` means the NPC spins to face random directions.
	Stay(Option<Facing>),
	/// Wanders, constrained to the given axis.
	Walk(WalkAxis),
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct WarpEvent {
	pub x : u32,
	pub y : u32,
	pub target_map : String,
	pub warp_index : u32,
	/// Set for warps inside an `IF DEF(_DEBUG)` region; those are not
	/// reachable in release builds of the game.
	pub is_debug : bool,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BgEvent {
	pub x : u32,
	pub y : u32,
	pub script_id : String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ObjectEvent {
	pub x : u32,
	pub y : u32,
	pub sprite : String,
	pub movement : ObjectMovement,
	pub text_script : String,
	pub optional_param_1 : Option<String>,
	pub optional_param_2 : Option<String>,
}

#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MapObjects {
	pub warp_events : Vec<WarpEvent>,
	pub bg_events : Vec<BgEvent>,
	pub object_events : Vec<ObjectEvent>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
	None,
	Warps,
	BgEvents,
	Objects,
}

/// Parses a map object file.  Sections are opened by `def_*_events`
/// sentinels; `def_warps_to` is always the last section, so it ends the
/// scan.  Lines that do not match their section's shape are skipped.
pub fn extract_map_objects(src : &str) -> MapObjects {
	lazy_static! {
		static ref WARP : Regex =
			Regex::new(r"warp_event\s+(\d+),\s+(\d+),\s+([A-Z_0-9]+),\s+(\d+)").unwrap();
		static ref BG : Regex =
			Regex::new(r"bg_event\s+(\d+),\s+(\d+),\s+([A-Z_0-9]+)").unwrap();
		static ref OBJECT : Regex =
			Regex::new(r"object_event\s+(\d+),\s+(\d+),\s+([A-Z_0-9]+),\s+([A-Z_]+),\s+([A-Z_]+|NONE),\s+([A-Z_0-9]+)(?:,\s+([A-Z_0-9]+))?(?:,\s+([A-Z_0-9]+))?").unwrap();
	}
	let mut result = MapObjects::default();
	let mut section = Section::None;
	let mut in_debug = false;

	for line in src.lines() {
		let line = line.trim();
		match line {
			"IF DEF(_DEBUG)" => {
				in_debug = true;
				continue;
			},
			"ENDC" => {
				in_debug = false;
				continue;
			},
			_ => {},
		}
		if line.starts_with("def_warp_events") {
			section = Section::Warps;
			continue;
		} else if line.starts_with("def_bg_events") {
			section = Section::BgEvents;
			continue;
		} else if line.starts_with("def_object_events") {
			section = Section::Objects;
			continue;
		} else if line.starts_with("def_warps_to") {
			break;
		}

		match section {
			Section::None => {},
			Section::Warps => {
				if let Some(cap) = WARP.captures(line) {
					result.warp_events.push(WarpEvent {
						x : cap[1].parse().unwrap_or(0),
						y : cap[2].parse().unwrap_or(0),
						target_map : cap[3].to_string(),
						warp_index : cap[4].parse().unwrap_or(0),
						is_debug : in_debug,
					});
				}
			},
			Section::BgEvents => {
				if let Some(cap) = BG.captures(line) {
					result.bg_events.push(BgEvent {
						x : cap[1].parse().unwrap_or(0),
						y : cap[2].parse().unwrap_or(0),
						script_id : cap[3].to_string(),
					});
				}
			},
			Section::Objects => {
				if let Some(cap) = OBJECT.captures(line) {
					let movement = match parse_movement(&cap[4], &cap[5]) {
						Some(m) => m,
						None => {
							pwarn!("skipping object with movement {}: {line}", &cap[4]);
							continue;
						},
					};
					result.object_events.push(ObjectEvent {
						x : cap[1].parse().unwrap_or(0),
						y : cap[2].parse().unwrap_or(0),
						sprite : cap[3].to_string(),
						movement,
						text_script : cap[6].to_string(),
						optional_param_1 : cap.get(7).map(|m| m.as_str().to_string()),
						optional_param_2 : cap.get(8).map(|m| m.as_str().to_string()),
					});
				}
			},
		}
	}
	return result;
}

/// Only STAY and WALK are understood; anything else drops the event.
fn parse_movement(movement : &str, direction : &str) -> Option<ObjectMovement> {
	return match movement {
		"STAY" => Some(ObjectMovement::Stay(Facing::parse(direction))),
		"WALK" => Some(ObjectMovement::Walk(match direction {
			"UP_DOWN" => WalkAxis::UpDown,
			"LEFT_RIGHT" => WalkAxis::LeftRight,
			_ => WalkAxis::AnyDir,
		})),
		_ => None,
	};
}

// ----------------------------------------

#[test]
fn test_extract_object_event() {
	let objs = extract_map_objects("
	def_object_events
	object_event 5, 5, SPRITE_OLD_MAN, STAY, DOWN, TEXT_OLDMAN
");
	assert!(objs.warp_events.is_empty());
	assert!(objs.bg_events.is_empty());
	assert_eq!(vec![ObjectEvent {
		x : 5,
		y : 5,
		sprite : "SPRITE_OLD_MAN".to_string(),
		movement : ObjectMovement::Stay(Some(Facing::Down)),
		text_script : "TEXT_OLDMAN".to_string(),
		optional_param_1 : None,
		optional_param_2 : None,
	}], objs.object_events);
}

#[test]
fn test_extract_all_sections() {
	let objs = extract_map_objects("
	def_warp_events
	warp_event 2, 7, LAST_MAP, 0
	warp_event 3, 7, LAST_MAP, 0

	def_bg_events
	bg_event 10, 5, TEXT_SIGN

	def_object_events
	object_event 4, 2, SPRITE_YOUNGSTER, WALK, ANY_DIR, TEXT_YOUNGSTER, OPP_BUG_CATCHER, 1
	object_event 6, 3, SPRITE_GIRL, STAY, NONE, TEXT_GIRL

	def_warps_to ROUTE_1
");
	assert_eq!(2, objs.warp_events.len());
	assert_eq!("LAST_MAP", objs.warp_events[0].target_map);
	assert!(!objs.warp_events[0].is_debug);
	assert_eq!(vec![BgEvent { x : 10, y : 5, script_id : "TEXT_SIGN".to_string() }],
		   objs.bg_events);
	assert_eq!(2, objs.object_events.len());
	assert_eq!(ObjectMovement::Walk(WalkAxis::AnyDir), objs.object_events[0].movement);
	assert_eq!(Some("OPP_BUG_CATCHER".to_string()), objs.object_events[0].optional_param_1);
	assert_eq!(Some("1".to_string()), objs.object_events[0].optional_param_2);
	assert_eq!(ObjectMovement::Stay(None), objs.object_events[1].movement);
}

#[test]
fn test_debug_warps() {
	let objs = extract_map_objects("
	def_warp_events
	warp_event 1, 1, OAKS_LAB, 1
	IF DEF(_DEBUG)
	warp_event 2, 2, AGATHAS_ROOM, 0
	ENDC
	warp_event 3, 3, OAKS_LAB, 2
");
	assert_eq!(vec![false, true, false],
		   objs.warp_events.iter().map(|w| w.is_debug).collect::<Vec<_>>());
}

#[test]
fn test_unknown_movement_skipped() {
	let objs = extract_map_objects("
	def_object_events
	object_event 1, 1, SPRITE_BIRD, FLY, ANY_DIR, TEXT_BIRD
	object_event 2, 2, SPRITE_GIRL, STAY, LEFT, TEXT_GIRL
");
	assert_eq!(1, objs.object_events.len());
	assert_eq!(ObjectMovement::Stay(Some(Facing::Left)), objs.object_events[0].movement);
}

#[test]
fn test_stops_at_warps_to() {
	let objs = extract_map_objects("
	def_warp_events
	warp_event 1, 1, OAKS_LAB, 1
	def_warps_to PALLET_TOWN
	warp_event 9, 9, OAKS_LAB, 1
");
	assert_eq!(1, objs.warp_events.len());
}
