// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use std::collections::HashMap;

use regex::Regex;

// ----------------------------------------
// Static tileset metadata, mirroring data/tilesets/tileset_headers.asm

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TileAnimation {
	None,
	Water,
	WaterFlower,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TilesetDescriptor {
	pub name : &'static str,
	pub id : usize,
	/// Tile ids that can be talked across (shop counters etc.)
	pub counter_tiles : [Option<u8>; 3],
	pub grass_tile : Option<u8>,
	pub animation : TileAnimation,
}

impl TilesetDescriptor {
	const fn plain(name : &'static str, id : usize, animation : TileAnimation) -> TilesetDescriptor {
		return TilesetDescriptor { name, id, counter_tiles : [None, None, None], grass_tile : None, animation };
	}

	const fn counters(name : &'static str, id : usize,
			  counter_tiles : [Option<u8>; 3], animation : TileAnimation) -> TilesetDescriptor {
		return TilesetDescriptor { name, id, counter_tiles, grass_tile : None, animation };
	}

	const fn grassy(name : &'static str, id : usize, grass_tile : u8, animation : TileAnimation) -> TilesetDescriptor {
		return TilesetDescriptor { name, id, counter_tiles : [None, None, None], grass_tile : Some(grass_tile), animation };
	}
}

pub const TILESETS : [TilesetDescriptor; 25] = [
	TilesetDescriptor::grassy("OVERWORLD",        0x00, 0x52, TileAnimation::WaterFlower),
	TilesetDescriptor::plain("REDS_HOUSE_1",      0x01, TileAnimation::None),
	TilesetDescriptor::counters("MART",           0x02, [Some(0x18), Some(0x19), Some(0x1e)], TileAnimation::None),
	TilesetDescriptor::grassy("FOREST",           0x03, 0x20, TileAnimation::Water),
	TilesetDescriptor::plain("REDS_HOUSE_2",      0x04, TileAnimation::None),
	TilesetDescriptor::counters("DOJO",           0x05, [Some(0x3a), None, None], TileAnimation::WaterFlower),
	TilesetDescriptor::counters("POKECENTER",     0x06, [Some(0x18), Some(0x19), Some(0x1e)], TileAnimation::None),
	TilesetDescriptor::counters("GYM",            0x07, [Some(0x3a), None, None], TileAnimation::WaterFlower),
	TilesetDescriptor::plain("HOUSE",             0x08, TileAnimation::None),
	TilesetDescriptor::counters("FOREST_GATE",    0x09, [Some(0x17), Some(0x32), None], TileAnimation::None),
	TilesetDescriptor::counters("MUSEUM",         0x0a, [Some(0x17), Some(0x32), None], TileAnimation::None),
	TilesetDescriptor::plain("UNDERGROUND",       0x0b, TileAnimation::None),
	TilesetDescriptor::counters("GATE",           0x0c, [Some(0x17), Some(0x32), None], TileAnimation::None),
	TilesetDescriptor::plain("SHIP",              0x0d, TileAnimation::Water),
	TilesetDescriptor::plain("SHIP_PORT",         0x0e, TileAnimation::Water),
	TilesetDescriptor::counters("CEMETERY",       0x0f, [Some(0x12), None, None], TileAnimation::None),
	TilesetDescriptor::plain("INTERIOR",          0x10, TileAnimation::None),
	TilesetDescriptor::plain("CAVERN",            0x11, TileAnimation::Water),
	TilesetDescriptor::counters("LOBBY",          0x12, [Some(0x15), Some(0x36), None], TileAnimation::None),
	TilesetDescriptor::plain("MANSION",           0x13, TileAnimation::None),
	TilesetDescriptor::plain("LAB",               0x14, TileAnimation::None),
	TilesetDescriptor::counters("CLUB",           0x15, [Some(0x07), Some(0x17), None], TileAnimation::None),
	TilesetDescriptor::counters("FACILITY",       0x16, [Some(0x12), None, None], TileAnimation::Water),
	TilesetDescriptor::grassy("PLATEAU",          0x17, 0x45, TileAnimation::Water),
	TilesetDescriptor::plain("BEACH_HOUSE",       0x18, TileAnimation::None),
];

pub fn descriptor(id : usize) -> Option<&'static TilesetDescriptor> {
	return TILESETS.get(id);
}

pub fn descriptor_by_name(name : &str) -> Option<&'static TilesetDescriptor> {
	return TILESETS.iter().find(|t| t.name == name);
}

// ----------------------------------------
// constants/tileset_constants.asm

/// Maps tileset constant names (e.g. "OVERWORLD") to their numeric ids.
/// The id is the position among the `const` lines, matching the game's
/// `const_def` counter.
pub fn parse_tileset_constants(src : &str) -> HashMap<String, usize> {
	lazy_static! {
		static ref CONST : Regex = Regex::new(r"const\s+(\w+)").unwrap();
	}
	let mut result = HashMap::new();
	let mut index = 0;
	for line in src.lines() {
		let line = line.trim();
		if !line.starts_with("const ") {
			continue;
		}
		if let Some(cap) = CONST.captures(line) {
			result.insert(cap[1].to_string(), index);
		}
		index += 1;
	}
	return result;
}

// ----------------------------------------
// gfx/tilesets.asm

/// Tileset graphics labels mapped to the blockset file they share.
/// Several `<Name>_GFX::` labels may precede one INCBIN line, in which
/// case they all use the same blockset.
pub struct BlocksetMappings {
	pub forward : HashMap<String, String>,
	pub reverse : HashMap<String, Vec<String>>,
}

pub fn parse_blockset_mappings(src : &str) -> BlocksetMappings {
	lazy_static! {
		static ref GFX : Regex = Regex::new(r"(\w+)_GFX::").unwrap();
		static ref INCBIN : Regex = Regex::new(r#"INCBIN\s+"gfx/blocksets/(\w+)\.bst""#).unwrap();
	}
	let mut forward : HashMap<String, String> = HashMap::new();
	let mut reverse : HashMap<String, Vec<String>> = HashMap::new();
	let mut pending : Vec<String> = Vec::new();
	for line in src.lines() {
		let line = line.trim();
		let gfx = GFX.captures(line);
		if let Some(cap) = &gfx {
			pending.push(cap[1].to_uppercase());
		}
		if let Some(cap) = INCBIN.captures(line) {
			let blockset = cap[1].to_string();
			for name in pending.drain(..) {
				forward.insert(name.clone(), blockset.clone());
				reverse.entry(blockset.clone()).or_default().push(name);
			}
		} else if gfx.is_none() && !line.ends_with("_Block::") && !pending.is_empty() && !line.is_empty() {
			// unrelated label or directive breaks the run
			pending.clear();
		}
	}
	ptrace!("blockset mappings: {} tilesets, {} blocksets", forward.len(), reverse.len());
	return BlocksetMappings { forward, reverse };
}

impl BlocksetMappings {
	/// Resolves the blockset base name for an uppercased tileset name.
	/// Unknown tilesets fall back to the lowercased name; a trailing
	/// `_1`..`_9` variant suffix is stripped either way.
	pub fn blockset_for(&self, tileset : &str) -> String {
		let base = match self.forward.get(tileset) {
			Some(b) => b.clone(),
			None => tileset.to_lowercase(),
		};
		return strip_variant_suffix(&base);
	}
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

#[test]
fn test_metadata_table() {
	assert_eq!(25, TILESETS.len());
	for (i, t) in TILESETS.iter().enumerate() {
		assert_eq!(i, t.id);
	}
	assert_eq!(TileAnimation::WaterFlower, descriptor(0x00).unwrap().animation);
	assert_eq!(Some(0x52), descriptor(0x00).unwrap().grass_tile);
	assert_eq!(TileAnimation::Water, descriptor(0x11).unwrap().animation);
	assert_eq!([Some(0x18), Some(0x19), Some(0x1e)], descriptor_by_name("MART").unwrap().counter_tiles);
	assert_eq!(None, descriptor(0x19));
}

#[test]
fn test_parse_tileset_constants() {
	let src = "
	const_def
	const OVERWORLD    ; 00
	const REDS_HOUSE_1 ; 01
	const MART         ; 02
";
	let consts = parse_tileset_constants(src);
	assert_eq!(Some(&0), consts.get("OVERWORLD"));
	assert_eq!(Some(&2), consts.get("MART"));
	assert_eq!(None, consts.get("const_def"));
}

#[test]
fn test_parse_blockset_mappings_shared() {
	let src = r#"
Overworld_GFX::
Overworld_Block::
	INCBIN "gfx/blocksets/overworld.bst"

RedsHouse1_GFX::
RedsHouse2_GFX::
RedsHouse_Block::
	INCBIN "gfx/blocksets/reds_house.bst"
"#;
	let m = parse_blockset_mappings(src);
	assert_eq!(Some(&"overworld".to_string()), m.forward.get("OVERWORLD"));
	assert_eq!(Some(&"reds_house".to_string()), m.forward.get("REDSHOUSE1"));
	assert_eq!(Some(&"reds_house".to_string()), m.forward.get("REDSHOUSE2"));
	assert_eq!(Some(&vec!["REDSHOUSE1".to_string(), "REDSHOUSE2".to_string()]),
		   m.reverse.get("reds_house"));
}

#[test]
fn test_parse_blockset_mappings_reset_on_other_line() {
	let src = r#"
Lonely_GFX::
SomeOtherLabel::
	INCBIN "gfx/blocksets/ignored.bst"
"#;
	let m = parse_blockset_mappings(src);
	assert!(m.forward.is_empty());
	// only `_Block::` labels may sit between the gfx label and its blockset
	let src = r#"
Cavern_GFX::
	INCBIN "gfx/tilesets/cavern.2bpp"
Cavern_Block::
	INCBIN "gfx/blocksets/cavern.bst"
"#;
	let m = parse_blockset_mappings(src);
	assert!(m.forward.is_empty());
}

#[test]
fn test_blockset_fallback() {
	let m = parse_blockset_mappings("");
	assert_eq!("overworld", m.blockset_for("OVERWORLD"));
	assert_eq!("reds_house", m.blockset_for("REDS_HOUSE_1"));
}
