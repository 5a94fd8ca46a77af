// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

#[allow(unused)]
use log::{Level, log_enabled, trace, debug, info, warn, error};
#[allow(unused)]
use crate::{ptrace, pdebug, pinfo, pwarn, perror};

/// One map square: a 4x4 grid of tile indices into the tileset image,
/// stored row by row.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Block {
	pub tiles : [u8; 16],
}

impl Block {
	pub fn tile_at(&self, x : usize, y : usize) -> u8 {
		return self.tiles[y * 4 + x];
	}
}

/// A tileset's block definitions, indexed by the bytes of a .blk map file.
pub struct Blockset {
	blocks : Vec<Block>,
}

/// Decodes a .bst file.  Each block is 16 consecutive bytes; a trailing
/// partial block is discarded.
pub fn new(src : &[u8]) -> Blockset {
	let full = src.len() / 16;
	if src.len() % 16 != 0 {
		pwarn!("blockset has {} trailing bytes, ignoring", src.len() % 16);
	}
	let mut blocks = Vec::with_capacity(full);
	for i in 0..full {
		let mut tiles = [0u8; 16];
		tiles.copy_from_slice(&src[i * 16..(i + 1) * 16]);
		blocks.push(Block { tiles });
	}
	return Blockset { blocks };
}

impl Blockset {
	pub fn len(&self) -> usize {
		return self.blocks.len();
	}

	pub fn is_empty(&self) -> bool {
		return self.blocks.is_empty();
	}

	pub fn get(&self, index : usize) -> Option<&Block> {
		return self.blocks.get(index);
	}

	pub fn blocks(&self) -> &[Block] {
		return &self.blocks;
	}
}

// ----------------------------------------

/// A fully assembled map as a grid of 8x8 tile indices.
/// `width` and `height` are in tiles (4x the block dimensions).
pub struct TileGrid {
	pub width : usize,
	pub height : usize,
	tiles : Vec<u8>,
}

impl TileGrid {
	pub fn get(&self, x : usize, y : usize) -> Option<u8> {
		if x >= self.width || y >= self.height {
			return None;
		}
		return Some(self.tiles[y * self.width + x]);
	}

	pub fn tiles(&self) -> &[u8] {
		return &self.tiles;
	}

	/// Hex dump of the tile grid, one map row per line.  Debugging aid.
	pub fn dump_hex(&self) -> String {
		let mut out = String::new();
		for y in 0..self.height {
			for x in 0..self.width {
				if x > 0 {
					out.push(' ');
				}
				out.push_str(&format!("{:02x}", self.tiles[y * self.width + x]));
			}
			out.push('\n');
		}
		return out;
	}
}

/// Expands block indices into a tile grid.  The grid starts zeroed, so
/// malformed input degrades to tile 0 instead of failing.
pub fn assemble_map(indices : &[u8], blockset : &Blockset,
		    blocks_w : usize, blocks_h : usize) -> TileGrid {
	let width = blocks_w * 4;
	let height = blocks_h * 4;
	let mut tiles = vec![0u8; width * height];
	if indices.len() != blocks_w * blocks_h {
		pwarn!("map has {} block indices, expected {}x{} = {}",
		       indices.len(), blocks_w, blocks_h, blocks_w * blocks_h);
	}
	for (i, &index) in indices.iter().enumerate().take(blocks_w * blocks_h) {
		let block = match blockset.get(index as usize) {
			Some(b) => b,
			None => {
				pwarn!("block index {:#x} out of range (blockset has {} blocks)",
				       index, blockset.len());
				continue;
			},
		};
		let bx = (i % blocks_w) * 4;
		let by = (i / blocks_w) * 4;
		for ty in 0..4 {
			for tx in 0..4 {
				tiles[(by + ty) * width + bx + tx] = block.tile_at(tx, ty);
			}
		}
	}
	return TileGrid { width, height, tiles };
}

/// Convenience wrapper: decode the blockset and assemble in one step.
pub fn load_and_assemble(indices : &[u8], blockset_src : &[u8],
			 blocks_w : usize, blocks_h : usize) -> TileGrid {
	let blockset = new(blockset_src);
	return assemble_map(indices, &blockset, blocks_w, blocks_h);
}

// ----------------------------------------

#[cfg(test)]
fn counting_blockset(n : usize) -> Vec<u8> {
	// block k is filled with the value k
	let mut v = Vec::new();
	for k in 0..n {
		v.extend_from_slice(&[k as u8; 16]);
	}
	return v;
}

#[test]
fn test_decode_blockset() {
	let src : Vec<u8> = (0..33).collect();
	let bs = new(&src);
	assert_eq!(2, bs.len());
	assert_eq!(Some(&Block { tiles : [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15] }),
		   bs.get(0));
	assert_eq!(5, bs.get(1).unwrap().tile_at(1, 1));
	assert_eq!(None, bs.get(2));
}

#[test]
fn test_assemble_basic() {
	let bs = new(&counting_blockset(3));
	let grid = assemble_map(&[2, 0, 1, 2], &bs, 2, 2);
	assert_eq!(8, grid.width);
	assert_eq!(8, grid.height);
	assert_eq!(Some(2), grid.get(0, 0));
	assert_eq!(Some(2), grid.get(3, 3));
	assert_eq!(Some(0), grid.get(4, 0));
	assert_eq!(Some(1), grid.get(0, 4));
	assert_eq!(Some(2), grid.get(7, 7));
	assert_eq!(None, grid.get(8, 0));
}

#[test]
fn test_assemble_block_layout() {
	let mut src = [0u8; 16];
	for (i, t) in src.iter_mut().enumerate() {
		*t = i as u8 + 0x10;
	}
	let bs = new(&src);
	let grid = assemble_map(&[0], &bs, 1, 1);
	// row-major within the block
	assert_eq!(Some(0x10), grid.get(0, 0));
	assert_eq!(Some(0x13), grid.get(3, 0));
	assert_eq!(Some(0x14), grid.get(0, 1));
	assert_eq!(Some(0x1f), grid.get(3, 3));
}

#[test]
fn test_assemble_out_of_range_index() {
	let bs = new(&counting_blockset(1));
	let grid = assemble_map(&[0, 7], &bs, 2, 1);
	// bad index leaves its block zeroed
	assert_eq!(Some(0), grid.get(0, 0));
	assert_eq!(Some(0), grid.get(4, 0));
	assert_eq!(Some(0), grid.get(7, 3));
}

#[test]
fn test_assemble_length_mismatch() {
	let bs = new(&counting_blockset(4));
	// too short: remaining blocks stay zeroed
	let grid = assemble_map(&[3], &bs, 2, 1);
	assert_eq!(Some(3), grid.get(0, 0));
	assert_eq!(Some(0), grid.get(4, 0));
	// too long: excess ignored
	let grid = assemble_map(&[1, 2, 3], &bs, 2, 1);
	assert_eq!(Some(1), grid.get(0, 0));
	assert_eq!(Some(2), grid.get(4, 0));
}

#[test]
fn test_dump_hex() {
	let bs = new(&counting_blockset(2));
	let grid = assemble_map(&[1], &bs, 1, 1);
	let dump = grid.dump_hex();
	assert_eq!(4, dump.lines().count());
	assert_eq!("01 01 01 01", dump.lines().next().unwrap());
}
