// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

pub mod blockset;
pub mod tileset;
pub mod palette;
pub mod recolor;
pub mod collision;
pub mod header;
pub mod objects;
pub mod script;
pub mod text;
pub mod sprite;

use self::blockset::TileGrid;
use self::header::MapHeader;
use self::objects::MapObjects;
use self::text::LinkedText;

// ----------------------------------------
// Map geometry constants

/// Edge length of one 8x8 graphics tile, in pixels.
pub const TILE_SIZE : usize = 8;
/// Edge length of one walkable map square (2x2 tiles), in pixels.
pub const BLOCK_SIZE : usize = 16;
/// Tileset images are laid out 16 tiles per row.
pub const TILES_PER_ROW : usize = 16;

/// The water tile is always tile 0x14 in animated tilesets.
pub const WATER_TILE_ID : u8 = 20;
/// The flower tile is always tile 0x03 in the overworld tileset.
pub const FLOWER_TILE_ID : u8 = 3;

// ----------------------------------------

/// Fatal asset failures.  Everything else in the pipeline degrades with a
/// warning instead (missing tileset image, out-of-range block index, ...).
#[derive(Error, Debug)]
pub enum AssetError {
	#[error("i/o error on {path}: {source}")]
	Io { path : PathBuf, source : std::io::Error },
	#[error("image decode error on {path}: {source}")]
	Image { path : PathBuf, source : image::ImageError },
	#[error("no map_header line in header source")]
	HeaderParse,
	#[error("map dimensions not found for {0}")]
	UnknownSizeConst(String),
}

fn read_text(path : &Path) -> Result<String, AssetError> {
	fs::read_to_string(path).map_err(|source| AssetError::Io { path : path.to_path_buf(), source })
}

fn read_bytes(path : &Path) -> Result<Vec<u8>, AssetError> {
	fs::read(path).map_err(|source| AssetError::Io { path : path.to_path_buf(), source })
}

/// Reads a file that is allowed to be absent (script continuations, text files).
fn read_text_opt(path : &Path) -> Option<String> {
	fs::read_to_string(path).ok()
}

// ----------------------------------------
// Per-map decode result

/// Everything the rendering layer needs for one selected map.
/// Immutable after construction; the NPC simulation keeps its own state.
pub struct MapBundle {
	pub header : MapHeader,
	pub map_id : usize,
	pub tileset_id : usize,
	pub palette_id : usize,
	pub grid : TileGrid,
	/// Recolored tileset surface; `None` if the tileset image was missing.
	pub tileset_image : Option<RgbaImage>,
	pub objects : MapObjects,
	pub dialogue : LinkedText,
}

// ----------------------------------------
// Asset directory

/// Shared lookup tables, parsed once from the extracted ROM asset tree.
/// All per-map work goes through `load_map`; the tables are never mutated
/// after `load`.
pub struct GameAssets {
	path : PathBuf,
	pub size_constants : header::SizeConstants,
	pub blockset_mappings : tileset::BlocksetMappings,
	pub tileset_ids : HashMap<String, usize>,
	pub header_pointers : Vec<String>,
	pub collision : collision::CollisionTable,
}

impl GameAssets {
    pub fn load(path : &Path) -> Result<GameAssets, AssetError> {
	let size_constants = header::parse_map_constants(
	    &read_text(&path.join("constants/map_constants.asm"))?);
	let blockset_mappings = tileset::parse_blockset_mappings(
	    &read_text(&path.join("gfx/tilesets.asm"))?);
	let tileset_ids = tileset::parse_tileset_constants(
	    &read_text(&path.join("constants/tileset_constants.asm"))?);
	let header_pointers = header::parse_header_pointers(
	    &read_text(&path.join("data/maps/map_header_pointers.asm"))?);
	let collision = collision::parse_collision_tiles(
	    &read_text(&path.join("data/tilesets/collision_tile_ids.asm"))?);
	pinfo!("loaded asset tables from {:?}: {} size constants, {} tileset ids, {} collision sets",
	       path, size_constants.len(), tileset_ids.len(), collision.len());
	Ok(GameAssets {
	    path : path.to_path_buf(),
	    size_constants,
	    blockset_mappings,
	    tileset_ids,
	    header_pointers,
	    collision,
	})
    }

    /// Loads and decodes everything for one map, named by its header file
    /// base name (e.g. "Route1").  `mode` picks the SGB or CGB palette
    /// column for the recolored tileset.
    pub fn load_map(&self, name : &str, mode : palette::PaletteMode) -> Result<MapBundle, AssetError> {
	let header_text = read_text(&self.path.join(format!("data/maps/headers/{name}.asm")))?;
	let header = header::extract_header(&header_text, &self.size_constants, &self.blockset_mappings)?;

	let blk = read_bytes(&self.path.join(format!("maps/{}.blk", header.name)))?;
	let bst = read_bytes(&self.path.join(format!("blocksets/{}.bst", header.actual_blockset)))?;
	let grid = blockset::load_and_assemble(&blk, &bst,
					       header.width as usize, header.height as usize);

	let map_id = match header::map_id_for_header(name, &self.header_pointers) {
	    Some(id) => id,
	    None => {
		pwarn!("map {name} not found in header pointer table, assuming id 0");
		0
	    }
	};
	let tileset_id = *self.tileset_ids.get(&header.tileset).unwrap_or(&0);
	let palette_id = palette::select_palette(map_id, tileset_id);

	let tileset_image = self.load_recolored_tileset(&header.actual_blockset, palette_id, mode);

	let objects_text = read_text(&self.path.join(format!("data/maps/objects/{name}.asm")))?;
	let objects = objects::extract_map_objects(&objects_text);

	let dialogue = self.load_dialogue(&header.name);

	pinfo!("map {name}: id {map_id:#x}, tileset {} ({tileset_id}), palette {palette_id}, {}x{} blocks",
	       header.tileset, header.width, header.height);

	Ok(MapBundle {
	    header,
	    map_id,
	    tileset_id,
	    palette_id,
	    grid,
	    tileset_image,
	    objects,
	    dialogue,
	})
    }

    /// Script sources may continue in `_2`/`_3` files; text pointers are
    /// resolved across the concatenation.
    fn load_dialogue(&self, map_name : &str) -> LinkedText {
	let mut script_text = match read_text_opt(&self.path.join(format!("scripts/{map_name}.asm"))) {
	    Some(t) => t,
	    None => {
		pwarn!("no script source for {map_name}");
		String::new()
	    }
	};
	for suffix in ["_2", "_3"] {
	    if let Some(more) = read_text_opt(&self.path.join(format!("scripts/{map_name}{suffix}.asm"))) {
		script_text.push('\n');
		script_text.push_str(&more);
	    }
	}
	let text_src = match read_text_opt(&self.path.join(format!("text/{map_name}.asm"))) {
	    Some(t) => t,
	    None => {
		pwarn!("no text source for {map_name}");
		String::new()
	    }
	};
	let pointers = script::extract_script_text_pointers(&script_text);
	let texts = text::extract_text(&text_src);
	return text::link_text(&pointers, &texts);
    }

    fn load_recolored_tileset(&self, blockset_name : &str, palette_id : usize,
			      mode : palette::PaletteMode) -> Option<RgbaImage> {
	let img = self.load_image(&format!("tilesets/{blockset_name}.png"))?;
	let pal = palette::get(palette_id)?;
	return Some(recolor::recolor_tileset(&img, pal, mode));
    }

    /// Loads a sprite sheet for an object sprite key like "SPRITE_OLD_MAN".
    pub fn load_sprite_sheet(&self, sprite_key : &str) -> Option<RgbaImage> {
	let file = format!("gfx/sprites/{}.png",
			   sprite_key.trim_start_matches("SPRITE_").to_lowercase());
	return self.load_image(&file);
    }

    fn load_image(&self, rel : &str) -> Option<RgbaImage> {
	let path = self.path.join(rel);
	match image::open(&path) {
	    Ok(img) => Some(img.to_rgba8()),
	    Err(e) => {
		pwarn!("could not load image {:?}: {e}", path);
		None
	    }
	}
    }
}
