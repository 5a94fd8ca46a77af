// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use image::{imageops, RgbaImage};

use super::BLOCK_SIZE;
use super::objects::Facing;
use super::palette::{PaletteEntry, PaletteMode};
use super::recolor::BASE_COLORS;

/// What a sprite sheet offers, derived from its height: a single pose,
/// one pose per facing, or facing plus mid-stride frames.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpriteKind {
	None,
	Facing,
	Walk,
}

pub fn sprite_kind_for_sheet(sheet_height : u32) -> SpriteKind {
	return match sheet_height {
		96 => SpriteKind::Walk,
		48 => SpriteKind::Facing,
		_ => SpriteKind::None,
	};
}

// ----------------------------------------
// Walk-cycle frame selection

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpriteFrame {
	Static,
	Walking,
}

/// Approximates the game's four-phase gait over one block of travel.
pub fn sprite_frame(walk_counter : u32) -> SpriteFrame {
	let phase = walk_counter as usize % BLOCK_SIZE;
	if phase < 3 {
		return SpriteFrame::Static;
	} else if phase < 6 {
		return SpriteFrame::Walking;
	} else if phase < 9 {
		return SpriteFrame::Static;
	} else if phase < 13 {
		return SpriteFrame::Walking;
	}
	return SpriteFrame::Static;
}

// ----------------------------------------
// Sprite sheet frame extraction

/// Cuts one 16x16 frame out of a sprite sheet and colors it for display.
/// Sheets stack frames vertically: down, up, left still poses, then the
/// three walking midframes.  Right faces reuse the left frame mirrored.
/// Pure white becomes transparent and the light gray takes its place as
/// the brightest palette color.
pub fn process_sprite(sheet : &RgbaImage, palette : &PaletteEntry, mode : PaletteMode,
		      facing : Facing, walking : bool) -> RgbaImage {
	let base = match facing {
		Facing::Down => 0,
		Facing::Up => 1,
		Facing::Left | Facing::Right => 2,
	};
	let frame = if walking { base + 3 } else { base };

	let y0 = (frame * 16).min(sheet.height().saturating_sub(16));
	let mut out = imageops::crop_imm(sheet, 0, y0, 16, 16).to_image();
	if facing == Facing::Right {
		out = imageops::flip_horizontal(&out);
	}

	for px in out.pixels_mut() {
		if px.0[0] == 0xff && px.0[1] == 0xff && px.0[2] == 0xff {
			px.0[3] = 0;
		} else if px.0[0] == 0xaa && px.0[1] == 0xaa && px.0[2] == 0xaa {
			px.0[0] = 0xff;
			px.0[1] = 0xff;
			px.0[2] = 0xff;
		}
	}

	let new_colors : Vec<[u8; 3]> = palette.colors(mode).iter()
		.map(|c| c.to_rgb8()).collect();
	for px in out.pixels_mut() {
		if px.0[3] == 0 {
			continue;
		}
		let rgb = [px.0[0], px.0[1], px.0[2]];
		for (base_color, repl) in BASE_COLORS.iter().zip(new_colors.iter()) {
			if rgb == *base_color {
				px.0[0] = repl[0];
				px.0[1] = repl[1];
				px.0[2] = repl[2];
				break;
			}
		}
	}
	return out;
}

// ----------------------------------------
// Tile animation

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ShiftDirection {
	Left,
	Right,
}

/// Rotates every pixel row of a tile by one, wrapping around.
pub fn shift_tile_rows(tile : &mut RgbaImage, direction : ShiftDirection) {
	let (width, height) = tile.dimensions();
	for y in 0..height {
		match direction {
			ShiftDirection::Left => {
				let first = *tile.get_pixel(0, y);
				for x in 0..width - 1 {
					let next = *tile.get_pixel(x + 1, y);
					tile.put_pixel(x, y, next);
				}
				tile.put_pixel(width - 1, y, first);
			},
			ShiftDirection::Right => {
				let last = *tile.get_pixel(width - 1, y);
				for x in (1..width).rev() {
					let prev = *tile.get_pixel(x - 1, y);
					tile.put_pixel(x, y, prev);
				}
				tile.put_pixel(0, y, last);
			},
		}
	}
}

/// Drives the rippling water tile.  The 8-tick cycle slides the tile one
/// pixel per tick, half the cycle leftward and half rightward, so it ends
/// where it started.
pub struct WaterAnimator {
	counter : u8,
	tile : RgbaImage,
}

pub fn new_water_animator(tile : RgbaImage) -> WaterAnimator {
	return WaterAnimator { counter : 0, tile };
}

impl WaterAnimator {
	pub fn tick(&mut self) -> &RgbaImage {
		self.counter = (self.counter + 1) & 7;
		let direction = if self.counter & 4 != 0 { ShiftDirection::Left } else { ShiftDirection::Right };
		shift_tile_rows(&mut self.tile, direction);
		return &self.tile;
	}

	pub fn tile(&self) -> &RgbaImage {
		return &self.tile;
	}
}

/// Which of the three flower tile variants to show for a given water tick.
pub fn flower_frame(counter : u8) -> u8 {
	let phase = counter & 3;
	if phase < 2 {
		return 1;
	} else if phase == 2 {
		return 2;
	}
	return 3;
}

// ----------------------------------------

#[cfg(test)]
use image::Rgba;
#[cfg(test)]
use super::palette;

#[test]
fn test_sprite_kind() {
	assert_eq!(SpriteKind::None, sprite_kind_for_sheet(16));
	assert_eq!(SpriteKind::Facing, sprite_kind_for_sheet(48));
	assert_eq!(SpriteKind::Walk, sprite_kind_for_sheet(96));
	assert_eq!(SpriteKind::None, sprite_kind_for_sheet(17));
}

#[test]
fn test_sprite_frame_phases() {
	let frames : Vec<SpriteFrame> = (0..16).map(sprite_frame).collect();
	assert_eq!(SpriteFrame::Static, frames[0]);
	assert_eq!(SpriteFrame::Static, frames[2]);
	assert_eq!(SpriteFrame::Walking, frames[3]);
	assert_eq!(SpriteFrame::Walking, frames[5]);
	assert_eq!(SpriteFrame::Static, frames[6]);
	assert_eq!(SpriteFrame::Walking, frames[9]);
	assert_eq!(SpriteFrame::Walking, frames[12]);
	assert_eq!(SpriteFrame::Static, frames[13]);
	assert_eq!(SpriteFrame::Static, frames[15]);
	// wraps per block
	assert_eq!(sprite_frame(4), sprite_frame(20));
}

#[cfg(test)]
fn test_sheet() -> RgbaImage {
	// each 16px frame filled with a distinct marker color in the dark gray slot
	let mut sheet = RgbaImage::new(16, 96);
	for frame in 0..6u32 {
		for y in 0..16 {
			for x in 0..16 {
				sheet.put_pixel(x, frame * 16 + y, Rgba([0x55, 0x55, 0x55, 0xff]));
			}
		}
		// marker pixel in the top-left corner, outside the base color set
		sheet.put_pixel(0, frame * 16, Rgba([0x10 + frame as u8, 0x20, 0x30, 0xff]));
	}
	return sheet;
}

#[test]
fn test_process_sprite_frame_choice() {
	let pal = palette::get(palette::PAL_ROUTE).unwrap();
	let sheet = test_sheet();
	assert_eq!([0x10, 0x20, 0x30], marker(&process_sprite(&sheet, pal, PaletteMode::Cgb, Facing::Down, false)));
	assert_eq!([0x11, 0x20, 0x30], marker(&process_sprite(&sheet, pal, PaletteMode::Cgb, Facing::Up, false)));
	assert_eq!([0x12, 0x20, 0x30], marker(&process_sprite(&sheet, pal, PaletteMode::Cgb, Facing::Left, false)));
	assert_eq!([0x13, 0x20, 0x30], marker(&process_sprite(&sheet, pal, PaletteMode::Cgb, Facing::Down, true)));
	assert_eq!([0x15, 0x20, 0x30], marker(&process_sprite(&sheet, pal, PaletteMode::Cgb, Facing::Left, true)));
}

#[cfg(test)]
fn marker(img : &RgbaImage) -> [u8; 3] {
	let px = img.get_pixel(0, 0);
	return [px.0[0], px.0[1], px.0[2]];
}

#[test]
fn test_process_sprite_mirrors_right() {
	let pal = palette::get(palette::PAL_ROUTE).unwrap();
	let sheet = test_sheet();
	let right = process_sprite(&sheet, pal, PaletteMode::Cgb, Facing::Right, false);
	// the frame-2 marker lands on the right edge after mirroring
	assert_eq!([0x12, 0x20, 0x30], {
		let px = right.get_pixel(15, 0);
		[px.0[0], px.0[1], px.0[2]]
	});
}

#[test]
fn test_process_sprite_recolors() {
	let pal = palette::get(palette::PAL_ROUTE).unwrap();
	let mut sheet = RgbaImage::new(16, 16);
	for px in sheet.pixels_mut() {
		*px = Rgba([0x55, 0x55, 0x55, 0xff]);
	}
	sheet.put_pixel(0, 0, Rgba([0xff, 0xff, 0xff, 0xff]));
	sheet.put_pixel(1, 0, Rgba([0xaa, 0xaa, 0xaa, 0xff]));
	let out = process_sprite(&sheet, pal, PaletteMode::Cgb, Facing::Down, false);
	// white turns transparent
	assert_eq!(0, out.get_pixel(0, 0).0[3]);
	// light gray takes the brightest palette slot
	let bright = pal.cgb[0].to_rgb8();
	assert_eq!([bright[0], bright[1], bright[2], 0xff], out.get_pixel(1, 0).0);
	// dark gray maps to the third slot
	let dark = pal.cgb[2].to_rgb8();
	assert_eq!([dark[0], dark[1], dark[2], 0xff], out.get_pixel(5, 5).0);
}

#[test]
fn test_shift_tile_rows() {
	let mut tile = RgbaImage::new(8, 1);
	for x in 0..8 {
		tile.put_pixel(x, 0, Rgba([x as u8, 0, 0, 0xff]));
	}
	shift_tile_rows(&mut tile, ShiftDirection::Left);
	assert_eq!(1, tile.get_pixel(0, 0).0[0]);
	assert_eq!(0, tile.get_pixel(7, 0).0[0]);
	shift_tile_rows(&mut tile, ShiftDirection::Right);
	assert_eq!(0, tile.get_pixel(0, 0).0[0]);
	assert_eq!(7, tile.get_pixel(7, 0).0[0]);
}

#[test]
fn test_water_animation_cycle() {
	let mut tile = RgbaImage::new(8, 8);
	for y in 0..8 {
		for x in 0..8 {
			tile.put_pixel(x, y, Rgba([x as u8, y as u8, 0, 0xff]));
		}
	}
	let reference = tile.clone();
	let mut anim = new_water_animator(tile);
	// eight ticks shift four pixels each way and return to the start
	for _ in 0..8 {
		anim.tick();
	}
	assert_eq!(reference, *anim.tile());
}

#[test]
fn test_flower_frames() {
	assert_eq!(1, flower_frame(0));
	assert_eq!(1, flower_frame(1));
	assert_eq!(2, flower_frame(2));
	assert_eq!(3, flower_frame(3));
	assert_eq!(1, flower_frame(4));
}
