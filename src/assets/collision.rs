// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use std::collections::HashMap;

use regex::Regex;

use super::blockset::TileGrid;

/// Walkable tile ids per collision table key (e.g. "Overworld").
pub type CollisionTable = HashMap<String, Vec<u8>>;

/// Parses data/tilesets/collision_tile_ids.asm.  Consecutive `<Name>_Coll::`
/// labels share the `coll_tiles` list that follows them.
pub fn parse_collision_tiles(src : &str) -> CollisionTable {
	lazy_static! {
		static ref LABEL : Regex = Regex::new(r"^(\w+)_Coll::").unwrap();
		static ref TILES : Regex = Regex::new(r"(?i)coll_tiles\s+((?:\$[0-9a-f]{2}(?:,\s*)?)+)").unwrap();
	}
	let mut table = CollisionTable::new();
	let mut pending : Vec<String> = Vec::new();
	for line in src.lines() {
		if let Some(cap) = LABEL.captures(line) {
			pending.push(cap[1].to_string());
			continue;
		}
		if let Some(cap) = TILES.captures(line) {
			if pending.is_empty() {
				continue;
			}
			let ids : Vec<u8> = cap[1].split(',')
				.filter_map(|id| u8::from_str_radix(id.trim().trim_start_matches('$'), 16).ok())
				.collect();
			for key in pending.drain(..) {
				table.insert(key, ids.clone());
			}
		}
	}
	return table;
}

/// "REDS_HOUSE_1" becomes "RedsHouse1", matching the `_Coll` label names.
pub fn normalize_tileset_name(name : &str) -> String {
	let mut out = String::with_capacity(name.len());
	for part in name.to_lowercase().split('_') {
		let mut chars = part.chars();
		if let Some(first) = chars.next() {
			out.extend(first.to_uppercase());
			out.push_str(chars.as_str());
		}
	}
	return out;
}

/// Walkability of a 16x16 map square.  The game only checks the bottom-left
/// 8x8 tile of the square.  Unknown tilesets and out-of-bounds squares are
/// not walkable.
pub fn is_square_walkable(square_x : usize, square_y : usize,
			  grid : &TileGrid, tileset_name : &str,
			  table : &CollisionTable) -> bool {
	let tile_id = match grid.get(square_x * 2, square_y * 2 + 1) {
		Some(id) => id,
		None => { return false; },
	};
	let key = normalize_tileset_name(tileset_name);
	let allowed = match table.get(&key) {
		Some(a) => a,
		None => {
			pwarn!("no collision data for tileset {key}");
			return false;
		},
	};
	return allowed.contains(&tile_id);
}

// ----------------------------------------

#[cfg(test)]
use super::blockset;

#[test]
fn test_parse_collision_tiles() {
	let src = "
Overworld_Coll::
	coll_tiles $00, $10, $1b, $20
Forest_Coll::
	coll_tiles $00, $2e
";
	let table = parse_collision_tiles(src);
	assert_eq!(Some(&vec![0x00, 0x10, 0x1b, 0x20]), table.get("Overworld"));
	assert_eq!(Some(&vec![0x00, 0x2e]), table.get("Forest"));
}

#[test]
fn test_parse_collision_shared_labels() {
	let src = "
RedsHouse1_Coll::
RedsHouse2_Coll::
	coll_tiles $00, $0a
";
	let table = parse_collision_tiles(src);
	assert_eq!(table.get("RedsHouse1"), table.get("RedsHouse2"));
	assert_eq!(Some(&vec![0x00, 0x0a]), table.get("RedsHouse1"));
}

#[test]
fn test_normalize_tileset_name() {
	assert_eq!("Overworld", normalize_tileset_name("OVERWORLD"));
	assert_eq!("RedsHouse1", normalize_tileset_name("REDS_HOUSE_1"));
	assert_eq!("ShipPort", normalize_tileset_name("SHIP_PORT"));
}

#[cfg(test)]
fn test_grid() -> TileGrid {
	// block 0: all 1s, block 1: all 99s
	let mut bst = vec![1u8; 16];
	bst.extend_from_slice(&[99u8; 16]);
	return blockset::load_and_assemble(&[0, 1, 1, 1], &bst, 2, 2);
}

#[test]
fn test_walkability() {
	let mut table = CollisionTable::new();
	table.insert("Overworld".to_string(), vec![0, 1, 2]);
	let grid = test_grid();
	// bottom-left tile of square (0,0) is grid (0,1) == 1
	assert!(is_square_walkable(0, 0, &grid, "OVERWORLD", &table));
	// square (2,0) sits in the all-99 block
	assert!(!is_square_walkable(2, 0, &grid, "OVERWORLD", &table));
}

#[test]
fn test_walkability_fail_closed() {
	let mut table = CollisionTable::new();
	table.insert("Overworld".to_string(), vec![0, 1, 2]);
	let grid = test_grid();
	// unknown tileset
	assert!(!is_square_walkable(0, 0, &grid, "CAVERN", &table));
	// out of bounds
	assert!(!is_square_walkable(4, 0, &grid, "OVERWORLD", &table));
	assert!(!is_square_walkable(0, 4, &grid, "OVERWORLD", &table));
}
