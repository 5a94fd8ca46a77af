// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use image::RgbaImage;

use super::palette::{PaletteEntry, PaletteMode};

/// The four placeholder grays all source tileset art is drawn in.
pub const BASE_COLORS : [[u8; 3]; 4] = [
	[0xff, 0xff, 0xff],
	[0xaa, 0xaa, 0xaa],
	[0x55, 0x55, 0x55],
	[0x00, 0x00, 0x00],
];

/// Substitutes the placeholder grays with a palette's colors.  Matching is
/// exact; anything else (already-colored art, stray alpha) passes through
/// untouched.
pub fn recolor_tileset(src : &RgbaImage, palette : &PaletteEntry, mode : PaletteMode) -> RgbaImage {
	let new_colors : Vec<[u8; 3]> = palette.colors(mode).iter()
		.map(|c| c.to_rgb8()).collect();
	let mut out = src.clone();
	for px in out.pixels_mut() {
		let rgb = [px.0[0], px.0[1], px.0[2]];
		for (base, repl) in BASE_COLORS.iter().zip(new_colors.iter()) {
			if rgb == *base {
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

#[cfg(test)]
use image::Rgba;
#[cfg(test)]
use super::palette;

#[test]
fn test_recolor_exact_match() {
	let mut img = RgbaImage::new(2, 2);
	img.put_pixel(0, 0, Rgba([0xff, 0xff, 0xff, 0xff]));
	img.put_pixel(1, 0, Rgba([0xaa, 0xaa, 0xaa, 0xff]));
	img.put_pixel(0, 1, Rgba([0x55, 0x55, 0x55, 0xff]));
	img.put_pixel(1, 1, Rgba([0x00, 0x00, 0x00, 0xff]));
	let pal = palette::get(palette::PAL_ROUTE).unwrap();
	let out = recolor_tileset(&img, pal, PaletteMode::Cgb);
	for (i, px) in out.pixels().enumerate() {
		let want = pal.cgb[i].to_rgb8();
		assert_eq!([want[0], want[1], want[2], 0xff], px.0);
	}
}

#[test]
fn test_recolor_leaves_other_pixels() {
	let mut img = RgbaImage::new(2, 1);
	// one off from a base color
	img.put_pixel(0, 0, Rgba([0xfe, 0xff, 0xff, 0xff]));
	img.put_pixel(1, 0, Rgba([0x12, 0x34, 0x56, 0x80]));
	let pal = palette::get(palette::PAL_CAVE).unwrap();
	let out = recolor_tileset(&img, pal, PaletteMode::Sgb);
	assert_eq!([0xfe, 0xff, 0xff, 0xff], out.get_pixel(0, 0).0);
	assert_eq!([0x12, 0x34, 0x56, 0x80], out.get_pixel(1, 0).0);
}

#[test]
fn test_recolor_mode_selects_column() {
	let mut img = RgbaImage::new(1, 1);
	img.put_pixel(0, 0, Rgba([0xaa, 0xaa, 0xaa, 0xff]));
	let pal = palette::get(palette::PAL_ROUTE).unwrap();
	let sgb = recolor_tileset(&img, pal, PaletteMode::Sgb);
	let cgb = recolor_tileset(&img, pal, PaletteMode::Cgb);
	let want_sgb = pal.sgb[1].to_rgb8();
	let want_cgb = pal.cgb[1].to_rgb8();
	assert_eq!([want_sgb[0], want_sgb[1], want_sgb[2], 0xff], sgb.get_pixel(0, 0).0);
	assert_eq!([want_cgb[0], want_cgb[1], want_cgb[2], 0xff], cgb.get_pixel(0, 0).0);
	assert_ne!(sgb.get_pixel(0, 0).0, cgb.get_pixel(0, 0).0);
}

#[test]
fn test_recolor_preserves_alpha() {
	let mut img = RgbaImage::new(1, 1);
	img.put_pixel(0, 0, Rgba([0xff, 0xff, 0xff, 0x42]));
	let pal = palette::get(palette::PAL_PALLET).unwrap();
	let out = recolor_tileset(&img, pal, PaletteMode::Cgb);
	assert_eq!(0x42, out.get_pixel(0, 0).0[3]);
	assert_eq!(pal.cgb[0].to_rgb8()[0], out.get_pixel(0, 0).0[0]);
}
