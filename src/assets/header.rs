// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use std::collections::HashMap;

use regex::Regex;

use super::AssetError;
use super::tileset::BlocksetMappings;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MapSize {
	pub width : u32,
	pub height : u32,
}

/// Map size constants keyed by their name, e.g. "ROUTE_1".
pub type SizeConstants = HashMap<String, MapSize>;

/// Parses constants/map_constants.asm.
pub fn parse_map_constants(src : &str) -> SizeConstants {
	lazy_static! {
		static ref CONST : Regex = Regex::new(r"\s*map_const\s+(\w+),\s*(\d+),\s*(\d+)").unwrap();
	}
	let mut result = SizeConstants::new();
	for line in src.lines() {
		if let Some(cap) = CONST.captures(line) {
			// widths in the source always fit u32
			let width = cap[2].parse().unwrap_or(0);
			let height = cap[3].parse().unwrap_or(0);
			result.insert(cap[1].to_string(), MapSize { width, height });
		}
	}
	return result;
}

// ----------------------------------------
// data/maps/map_header_pointers.asm

/// The `dw <Name>_h` lines, in order.  A map's numeric id is its line's
/// position in this table.
pub fn parse_header_pointers(src : &str) -> Vec<String> {
	return src.lines()
		.map(|l| l.trim())
		.filter(|l| l.starts_with("dw "))
		.map(|l| l.to_string())
		.collect();
}

pub fn map_id_for_header(header_name : &str, pointers : &[String]) -> Option<usize> {
	let target = format!("{}_h", header_name.trim_end_matches(".asm"));
	return pointers.iter().position(|line| line.contains(&target));
}

// ----------------------------------------
// Map headers

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Direction {
	North,
	South,
	East,
	West,
}

impl Direction {
	fn parse(s : &str) -> Option<Direction> {
		return match s.to_lowercase().as_str() {
			"north" => Some(Direction::North),
			"south" => Some(Direction::South),
			"east" => Some(Direction::East),
			"west" => Some(Direction::West),
			_ => None,
		};
	}
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Connection {
	pub direction : Direction,
	pub map_name : String,
	pub map_const : String,
	pub offset : i32,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MapHeader {
	pub name : String,
	pub size_const : String,
	/// Uppercased tileset constant name, e.g. "OVERWORLD".
	pub tileset : String,
	/// Base name of the blockset/tileset image files.
	pub actual_blockset : String,
	pub width : u32,
	pub height : u32,
	pub connections : Vec<Connection>,
}

/// Parses one map header file.  The `map_header` line and its size constant
/// are mandatory; everything else degrades gracefully.
pub fn extract_header(src : &str, size_constants : &SizeConstants,
		      mappings : &BlocksetMappings) -> Result<MapHeader, AssetError> {
	lazy_static! {
		static ref HEADER : Regex = Regex::new(r"map_header\s+(\w+),\s+(\w+),\s+(\w+)").unwrap();
		static ref CONNECTION : Regex = Regex::new(r"connection\s+(\w+),\s+(\w+),\s+(\w+),\s+(-?\d+)").unwrap();
	}
	let cap = HEADER.captures(src).ok_or(AssetError::HeaderParse)?;
	let name = cap[1].to_string();
	let size_const = cap[2].to_string();
	let tileset = cap[3].to_uppercase();

	let size = size_constants.get(&size_const)
		.ok_or_else(|| AssetError::UnknownSizeConst(size_const.clone()))?;
	let actual_blockset = resolve_blockset(&tileset, mappings);

	let mut connections = Vec::new();
	for ccap in CONNECTION.captures_iter(src) {
		let direction = match Direction::parse(&ccap[1]) {
			Some(d) => d,
			None => {
				pwarn!("unknown connection direction {} in {name}", &ccap[1]);
				continue;
			},
		};
		connections.push(Connection {
			direction,
			map_name : ccap[2].to_string(),
			map_const : ccap[3].to_string(),
			// the regex only admits integers
			offset : ccap[4].parse().unwrap_or(0),
		});
	}

	return Ok(MapHeader {
		name,
		size_const,
		tileset,
		actual_blockset,
		width : size.width,
		height : size.height,
		connections,
	});
}

// ----------------------------------------
// Blockset name resolution

/// Maps an uppercased tileset name to the blockset file base name, trying a
/// sequence of strategies and keeping the first hit.  The last one always
/// produces something, so this cannot fail outright.
fn resolve_blockset(tileset : &str, mappings : &BlocksetMappings) -> String {
	let resolved = resolve_direct(tileset, mappings)
		.or_else(|| resolve_by_overlap(tileset, mappings))
		.or_else(|| resolve_last_part(tileset))
		.unwrap_or_else(|| tileset.to_lowercase());
	return strip_variant_suffix(&resolved);
}

fn resolve_direct(tileset : &str, mappings : &BlocksetMappings) -> Option<String> {
	return mappings.forward.get(tileset).cloned();
}

/// Looks for substring overlap between the tileset name (or any of its
/// underscore-separated parts) and the names known to share a blockset.
fn resolve_by_overlap(tileset : &str, mappings : &BlocksetMappings) -> Option<String> {
	let mut blocksets : Vec<&String> = mappings.reverse.keys().collect();
	blocksets.sort();
	for blockset in blocksets {
		for known in &mappings.reverse[blockset] {
			let overlap = known.contains(tileset)
				|| tileset.contains(known.as_str())
				|| tileset.split('_').any(|part| known.contains(part));
			if overlap {
				pdebug!("resolved tileset {tileset} to blockset {blockset} via {known}");
				return Some(blockset.clone());
			}
		}
	}
	return None;
}

fn resolve_last_part(tileset : &str) -> Option<String> {
	if !tileset.contains('_') {
		return None;
	}
	return tileset.rsplit('_').next().map(|p| p.to_lowercase());
}

fn strip_variant_suffix(name : &str) -> String {
	let bytes = name.as_bytes();
	if bytes.len() > 2 && bytes[bytes.len() - 2] == b'_'
		&& (b'1'..=b'9').contains(&bytes[bytes.len() - 1]) {
		return name[..name.len() - 2].to_string();
	}
	return name.to_string();
}

// ----------------------------------------

#[cfg(test)]
fn test_mappings() -> BlocksetMappings {
	let mut m = BlocksetMappings {
		forward : HashMap::new(),
		reverse : HashMap::new(),
	};
	m.forward.insert("OVERWORLD".to_string(), "overworld".to_string());
	m.forward.insert("REDS_HOUSE_1".to_string(), "reds_house".to_string());
	m.reverse.insert("overworld".to_string(), vec!["OVERWORLD".to_string()]);
	m.reverse.insert("reds_house".to_string(),
			 vec!["REDS_HOUSE_1".to_string(), "REDS_HOUSE_2".to_string()]);
	return m;
}

#[test]
fn test_parse_map_constants() {
	let consts = parse_map_constants("
	map_const PALLET_TOWN, 10, 9
	map_const ROUTE_1, 10, 18
");
	assert_eq!(Some(&MapSize { width : 10, height : 18 }), consts.get("ROUTE_1"));
	assert_eq!(Some(&MapSize { width : 10, height : 9 }), consts.get("PALLET_TOWN"));
}

#[test]
fn test_map_id_lookup() {
	let pointers = parse_header_pointers("
MapHeaderPointers::
	dw PalletTown_h
	dw ViridianCity_h
	dw PewterCity_h
");
	assert_eq!(3, pointers.len());
	assert_eq!(Some(0), map_id_for_header("PalletTown", &pointers));
	assert_eq!(Some(2), map_id_for_header("PewterCity.asm", &pointers));
	assert_eq!(None, map_id_for_header("CeladonCity", &pointers));
}

#[test]
fn test_extract_header() {
	let mut consts = SizeConstants::new();
	consts.insert("ROUTE_1".to_string(), MapSize { width : 10, height : 18 });
	let src = "
	map_header Route1, ROUTE_1, OVERWORLD, NORTH | SOUTH
	connection north, ViridianCity, VIRIDIAN_CITY, -5
	connection south, PalletTown, PALLET_TOWN, 0
	end_map_header
";
	let header = extract_header(src, &consts, &test_mappings()).unwrap();
	assert_eq!("Route1", header.name);
	assert_eq!("ROUTE_1", header.size_const);
	assert_eq!("OVERWORLD", header.tileset);
	assert_eq!("overworld", header.actual_blockset);
	assert_eq!(10, header.width);
	assert_eq!(18, header.height);
	assert_eq!(2, header.connections.len());
	assert_eq!(Connection {
		direction : Direction::North,
		map_name : "ViridianCity".to_string(),
		map_const : "VIRIDIAN_CITY".to_string(),
		offset : -5,
	}, header.connections[0]);
}

#[test]
fn test_extract_header_no_connections() {
	let mut consts = SizeConstants::new();
	consts.insert("PALLET_TOWN".to_string(), MapSize { width : 10, height : 9 });
	let header = extract_header("	map_header PalletTown, PALLET_TOWN, overworld",
				    &consts, &test_mappings()).unwrap();
	assert_eq!("OVERWORLD", header.tileset);
	assert!(header.connections.is_empty());
}

#[test]
fn test_extract_header_errors() {
	let consts = SizeConstants::new();
	assert!(matches!(extract_header("nothing here", &consts, &test_mappings()),
			 Err(AssetError::HeaderParse)));
	assert!(matches!(extract_header("	map_header Route1, ROUTE_1, OVERWORLD",
					&consts, &test_mappings()),
			 Err(AssetError::UnknownSizeConst(_))));
}

#[test]
fn test_resolve_blockset_fallbacks() {
	let m = test_mappings();
	// direct hit
	assert_eq!("overworld", resolve_blockset("OVERWORLD", &m));
	// known variant sibling found through the reverse table
	assert_eq!("reds_house", resolve_blockset("REDS_HOUSE_2", &m));
	// unknown multi-part name falls back to the last part
	assert_eq!("gate", resolve_blockset("FOREST_GATE", &m));
	// unknown single name is just lowercased
	assert_eq!("dojo", resolve_blockset("DOJO", &m));
}
