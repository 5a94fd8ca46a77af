// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

/// One Game Boy Color channel triple, 5 bits per channel.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Rgb {
	pub r : u8,
	pub g : u8,
	pub b : u8,
}

const fn c(r : u8, g : u8, b : u8) -> Rgb {
	return Rgb { r, g, b };
}

impl Rgb {
	/// Expands a 5-bit channel value to 8 bits.
	pub fn expand(v : u8) -> u8 {
		return (v as f32 / 31.0 * 255.0).round() as u8;
	}

	pub fn to_rgb8(&self) -> [u8; 3] {
		return [Rgb::expand(self.r), Rgb::expand(self.g), Rgb::expand(self.b)];
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PaletteMode {
	Cgb,
	Sgb,
}

#[derive(Clone, Copy, Debug)]
pub struct PaletteEntry {
	pub index : usize,
	pub sgb : [Rgb; 4],
	pub cgb : [Rgb; 4],
}

impl PaletteEntry {
	pub fn colors(&self, mode : PaletteMode) -> &[Rgb; 4] {
		return match mode {
			PaletteMode::Cgb => &self.cgb,
			PaletteMode::Sgb => &self.sgb,
		};
	}
}

// ----------------------------------------
// Palette ids, from constants/palette_constants.asm

pub const PAL_ROUTE : usize = 0x00;
pub const PAL_PALLET : usize = 0x01;
pub const PAL_VIRIDIAN : usize = 0x02;
pub const PAL_PEWTER : usize = 0x03;
pub const PAL_CERULEAN : usize = 0x04;
pub const PAL_LAVENDER : usize = 0x05;
pub const PAL_VERMILION : usize = 0x06;
pub const PAL_CELADON : usize = 0x07;
pub const PAL_FUCHSIA : usize = 0x08;
pub const PAL_CINNABAR : usize = 0x09;
pub const PAL_INDIGO : usize = 0x0a;
pub const PAL_SAFFRON : usize = 0x0b;
pub const PAL_GRAYMON : usize = 0x19;
pub const PAL_CAVE : usize = 0x23;

/// The SGB/CGB palette table from data/sgb/sgb_palettes.asm.
pub const PALETTES : [PaletteEntry; 40] = [
	PaletteEntry { index : 0,	// PAL_ROUTE
		       sgb : [c(31, 31, 30), c(23, 26, 19), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(16, 31, 4), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 1,	// PAL_PALLET
		       sgb : [c(31, 31, 30), c(28, 27, 31), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(23, 17, 31), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 2,	// PAL_VIRIDIAN
		       sgb : [c(31, 31, 30), c(26, 31, 21), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(19, 31, 0), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 3,	// PAL_PEWTER
		       sgb : [c(31, 31, 30), c(23, 23, 22), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(18, 18, 15), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 4,	// PAL_CERULEAN
		       sgb : [c(31, 31, 30), c(22, 23, 31), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(5, 8, 31), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 5,	// PAL_LAVENDER
		       sgb : [c(31, 31, 30), c(27, 23, 29), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(25, 4, 31), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 6,	// PAL_VERMILION
		       sgb : [c(31, 31, 30), c(31, 25, 16), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 19, 0), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 7,	// PAL_CELADON
		       sgb : [c(31, 31, 30), c(22, 31, 22), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(5, 31, 5), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 8,	// PAL_FUCHSIA
		       sgb : [c(31, 31, 30), c(31, 26, 26), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 15, 15), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 9,	// PAL_CINNABAR
		       sgb : [c(31, 31, 30), c(31, 15, 14), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 8, 8), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 10,	// PAL_INDIGO
		       sgb : [c(31, 31, 30), c(17, 17, 25), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(11, 8, 31), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 11,	// PAL_SAFFRON
		       sgb : [c(31, 31, 30), c(31, 31, 19), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 12,	// PAL_TOWNMAP
		       sgb : [c(31, 31, 30), c(20, 26, 31), c(17, 23, 10), c(3, 2, 2)],
		       cgb : [c(31, 31, 31), c(0, 21, 31), c(10, 28, 0), c(1, 1, 1)] },
	PaletteEntry { index : 13,	// PAL_LOGO1
		       sgb : [c(31, 31, 30), c(30, 30, 17), c(21, 0, 4), c(21, 0, 4)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(31, 0, 0), c(31, 0, 0)] },
	PaletteEntry { index : 14,	// PAL_LOGO2
		       sgb : [c(31, 31, 30), c(30, 30, 17), c(18, 18, 24), c(7, 7, 16)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(7, 7, 25), c(0, 0, 17)] },
	PaletteEntry { index : 15,	// PAL_0F
		       sgb : [c(31, 31, 30), c(24, 20, 30), c(11, 20, 30), c(3, 2, 2)],
		       cgb : [c(31, 31, 31), c(13, 1, 31), c(0, 9, 31), c(1, 1, 1)] },
	PaletteEntry { index : 16,	// PAL_MEWMON
		       sgb : [c(31, 31, 30), c(31, 30, 22), c(27, 16, 16), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(31, 1, 1), c(3, 3, 3)] },
	PaletteEntry { index : 17,	// PAL_BLUEMON
		       sgb : [c(31, 31, 30), c(21, 22, 31), c(9, 10, 20), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(16, 18, 31), c(0, 1, 25), c(3, 3, 3)] },
	PaletteEntry { index : 18,	// PAL_REDMON
		       sgb : [c(31, 31, 30), c(31, 24, 11), c(26, 9, 6), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 17, 0), c(31, 0, 0), c(3, 3, 3)] },
	PaletteEntry { index : 19,	// PAL_CYANMON
		       sgb : [c(31, 31, 30), c(26, 28, 31), c(7, 24, 28), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(16, 26, 31), c(0, 17, 31), c(3, 3, 3)] },
	PaletteEntry { index : 20,	// PAL_PURPLEMON
		       sgb : [c(31, 31, 30), c(27, 22, 30), c(22, 15, 23), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(25, 15, 31), c(19, 0, 22), c(3, 3, 3)] },
	PaletteEntry { index : 21,	// PAL_BROWNMON
		       sgb : [c(31, 31, 30), c(26, 23, 18), c(18, 14, 10), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(29, 18, 10), c(17, 9, 5), c(3, 3, 3)] },
	PaletteEntry { index : 22,	// PAL_GREENMON
		       sgb : [c(31, 31, 30), c(24, 28, 18), c(13, 21, 15), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(17, 31, 11), c(1, 22, 6), c(3, 3, 3)] },
	PaletteEntry { index : 23,	// PAL_PINKMON
		       sgb : [c(31, 31, 30), c(31, 24, 26), c(31, 18, 21), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 15, 18), c(31, 0, 6), c(3, 3, 3)] },
	PaletteEntry { index : 24,	// PAL_YELLOWMON
		       sgb : [c(31, 31, 30), c(31, 31, 19), c(28, 23, 9), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(28, 14, 0), c(3, 3, 3)] },
	PaletteEntry { index : 25,	// PAL_GRAYMON
		       sgb : [c(31, 31, 30), c(25, 25, 18), c(16, 16, 14), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(20, 23, 10), c(11, 11, 5), c(3, 3, 3)] },
	PaletteEntry { index : 26,	// PAL_SLOTS1
		       sgb : [c(31, 31, 30), c(27, 22, 30), c(26, 9, 6), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(25, 1, 31), c(31, 0, 0), c(3, 3, 3)] },
	PaletteEntry { index : 27,	// PAL_SLOTS2
		       sgb : [c(31, 31, 30), c(31, 23, 26), c(29, 29, 8), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 4, 19), c(31, 31, 0), c(3, 3, 3)] },
	PaletteEntry { index : 28,	// PAL_SLOTS3
		       sgb : [c(31, 31, 30), c(23, 31, 20), c(29, 29, 8), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(8, 31, 0), c(31, 31, 0), c(3, 3, 3)] },
	PaletteEntry { index : 29,	// PAL_SLOTS4
		       sgb : [c(31, 31, 30), c(23, 29, 31), c(29, 29, 8), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(0, 31, 31), c(31, 31, 0), c(3, 3, 3)] },
	PaletteEntry { index : 30,	// PAL_BLACK
		       sgb : [c(31, 31, 30), c(6, 6, 6), c(6, 6, 6), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(3, 3, 3), c(3, 3, 3), c(3, 3, 3)] },
	PaletteEntry { index : 31,	// PAL_GREENBAR
		       sgb : [c(31, 31, 30), c(31, 31, 19), c(0, 21, 0), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(0, 31, 0), c(3, 3, 3)] },
	PaletteEntry { index : 32,	// PAL_YELLOWBAR
		       sgb : [c(31, 31, 30), c(31, 31, 19), c(28, 23, 9), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(31, 18, 0), c(3, 3, 3)] },
	PaletteEntry { index : 33,	// PAL_REDBAR
		       sgb : [c(31, 31, 30), c(31, 31, 19), c(26, 9, 6), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(31, 0, 0), c(3, 3, 3)] },
	PaletteEntry { index : 34,	// PAL_BADGE
		       sgb : [c(31, 31, 30), c(20, 15, 11), c(22, 21, 20), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(23, 8, 0), c(17, 14, 11), c(3, 3, 3)] },
	PaletteEntry { index : 35,	// PAL_CAVE
		       sgb : [c(31, 31, 30), c(20, 15, 11), c(22, 21, 20), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(23, 8, 0), c(17, 14, 11), c(3, 3, 3)] },
	PaletteEntry { index : 36,	// PAL_GAMEFREAK
		       sgb : [c(31, 31, 30), c(28, 24, 14), c(20, 20, 11), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 19, 0), c(19, 19, 0), c(3, 3, 3)] },
	PaletteEntry { index : 37,	// PAL_PIKACHUS_BEACH
		       sgb : [c(31, 31, 30), c(31, 30, 22), c(23, 27, 31), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 31, 0), c(11, 23, 31), c(3, 3, 3)] },
	PaletteEntry { index : 38,	// PAL_PIKACHU_PORTRAIT
		       sgb : [c(31, 31, 30), c(28, 23, 9), c(18, 14, 10), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(31, 18, 0), c(19, 7, 1), c(3, 3, 3)] },
	PaletteEntry { index : 39,	// PAL_PIKACHUS_BEACH_TITLE
		       sgb : [c(31, 31, 30), c(16, 16, 16), c(31, 25, 9), c(6, 6, 6)],
		       cgb : [c(31, 31, 31), c(9, 9, 9), c(31, 21, 0), c(3, 3, 3)] },
];

pub fn get(id : usize) -> Option<&'static PaletteEntry> {
	return PALETTES.get(id);
}

// ----------------------------------------
// Palette selection, following the game's SGB palette routine

const CEMETERY_TILESET : usize = 15;
const CAVERN_TILESET : usize = 17;
const FIRST_INDOOR_MAP : usize = 0x25;
const CERULEAN_CAVE_2F : usize = 0xe2;
const CERULEAN_CAVE_1F : usize = 0xe4;
const LORELEIS_ROOM : usize = 0xf5;
const BRUNOS_ROOM : usize = 0xf6;
const NUM_CITY_MAPS : usize = 0x0b;
const TRADE_CENTER : usize = 0xef;
const COLOSSEUM : usize = 0xf0;

/// Map id ranges with a fixed town palette, checked before anything else.
/// Each town's indoor maps keep the town's palette that way.
const LOCATION_OVERRIDES : [(usize, usize, usize); 11] = [
	(0x58, 0x5e, PAL_VERMILION),
	(0x7a, 0x8c, PAL_CELADON),
	(0xb2, 0xb9, PAL_SAFFRON),
	(0x3e, 0x44, PAL_CERULEAN),
	(0xa5, 0xac, PAL_CINNABAR),
	(0x8d, 0x97, PAL_LAVENDER),
	(0x98, 0x9e, PAL_FUCHSIA),
	(0x25, 0x28, PAL_PALLET),
	(0x29, 0x33, PAL_VIRIDIAN),
	(0x34, 0x3a, PAL_PEWTER),
	(0xad, 0xb1, PAL_INDIGO),
];

/// Picks the palette id for a map.  Always returns an id; callers bounds-check
/// against `PALETTES`.
pub fn select_palette(map_id : usize, tileset_id : usize) -> usize {
	for &(lo, hi, pal) in LOCATION_OVERRIDES.iter() {
		if map_id >= lo && map_id <= hi {
			return pal;
		}
	}

	// The -1 offsets below cancel against the final +1.
	let mut base = map_id as isize;
	if base >= NUM_CITY_MAPS as isize {
		base = PAL_ROUTE as isize - 1;
	}

	if tileset_id == CEMETERY_TILESET {
		base = PAL_GRAYMON as isize - 1;
	} else if tileset_id == CAVERN_TILESET {
		base = PAL_CAVE as isize - 1;
	} else if map_id < FIRST_INDOOR_MAP {
		base = map_id as isize;
	} else if map_id < CERULEAN_CAVE_2F {
		// ordinary dungeon or building
		base = PAL_GRAYMON as isize - 1;
	} else if map_id < CERULEAN_CAVE_1F + 1 {
		base = PAL_CAVE as isize - 1;
	} else if map_id == LORELEIS_ROOM {
		base = 0;
	} else if map_id == BRUNOS_ROOM {
		base = PAL_CAVE as isize - 1;
	} else if map_id == TRADE_CENTER || map_id == COLOSSEUM {
		base = PAL_GRAYMON as isize - 1;
	} else {
		base = map_id as isize;
		if base >= NUM_CITY_MAPS as isize {
			base = PAL_ROUTE as isize - 1;
		}
	}

	// Redundant with the clamp above, but kept to match the game routine.
	if (0x0b..=0x24).contains(&map_id) {
		base = PAL_ROUTE as isize - 1;
	}
	return (base + 1) as usize;
}

// ----------------------------------------

#[test]
fn test_palette_table() {
	assert_eq!(40, PALETTES.len());
	for (i, p) in PALETTES.iter().enumerate() {
		assert_eq!(i, p.index);
	}
	assert_eq!(c(16, 31, 4), PALETTES[PAL_ROUTE].cgb[1]);
	assert_eq!(c(23, 8, 0), PALETTES[PAL_CAVE].cgb[1]);
}

#[test]
fn test_channel_expansion() {
	assert_eq!(255, Rgb::expand(31));
	assert_eq!(0, Rgb::expand(0));
	assert_eq!(25, Rgb::expand(3));
	assert_eq!([255, 255, 255], c(31, 31, 31).to_rgb8());
}

#[test]
fn test_select_palette_overrides() {
	// Viridian Forest carries the Viridian town palette
	assert_eq!(PAL_VIRIDIAN, select_palette(51, 0));
	assert_eq!(PAL_VIRIDIAN, select_palette(51, CAVERN_TILESET));
	assert_eq!(PAL_VERMILION, select_palette(0x58, 0));
	assert_eq!(PAL_INDIGO, select_palette(0xb1, 3));
	assert_eq!(PAL_PALLET, select_palette(0x25, 0));
}

#[test]
fn test_select_palette_towns_and_routes() {
	// the first NUM_CITY_MAPS ids are the towns themselves
	assert_eq!(PAL_PALLET, select_palette(0x00, 0));
	assert_eq!(PAL_SAFFRON, select_palette(0x0a, 0));
	// routes clamp to PAL_ROUTE, for every tileset
	for tileset_id in 0..25 {
		for map_id in 0x0b..=0x24 {
			assert_eq!(PAL_ROUTE, select_palette(map_id, tileset_id));
		}
	}
}

#[test]
fn test_select_palette_special_tilesets() {
	assert_eq!(PAL_GRAYMON, select_palette(0xd0, CEMETERY_TILESET));
	assert_eq!(PAL_CAVE, select_palette(0xd0, CAVERN_TILESET));
}

#[test]
fn test_select_palette_indoor() {
	// generic building
	assert_eq!(PAL_GRAYMON, select_palette(0xd0, 0x08));
	// Cerulean Cave
	assert_eq!(PAL_CAVE, select_palette(0xe3, 0x08));
	assert_eq!(PAL_CAVE, select_palette(0xe4, 0x08));
	// Elite Four rooms
	assert_eq!(1, select_palette(LORELEIS_ROOM, 0x08));
	assert_eq!(PAL_CAVE, select_palette(BRUNOS_ROOM, 0x08));
	// cable club
	assert_eq!(PAL_GRAYMON, select_palette(TRADE_CENTER, 0x08));
	assert_eq!(PAL_GRAYMON, select_palette(COLOSSEUM, 0x08));
	// far indoor ids past all special cases clamp to route
	assert_eq!(PAL_ROUTE, select_palette(0xf8, 0x08));
}
