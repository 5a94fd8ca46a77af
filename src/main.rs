// Licenced under the GNU General Public Licence, v3.  Please refer to the file "COPYING" for details.

use std::{env, path::Path, process};

use rand::thread_rng;

use pokemap::assets::GameAssets;
use pokemap::assets::palette::PaletteMode;
use pokemap::assets::sprite::{self, SpriteKind};
use pokemap::assets::text::DialogueText;
use pokemap::sim;

struct Options {
    asset_dir : String,
    map_name : String,
    mode : PaletteMode,
    ticks : u32,
    dump_tileset : bool,
}

fn usage(program : &str) -> ! {
    eprintln!("usage: {program} <assetdir> <MapName> [--sgb] [--ticks N] [--dump-tileset]");
    process::exit(2);
}

fn parse_args() -> Options {
    let args : Vec<String> = env::args().collect();
    let mut options = Options {
	asset_dir : String::new(),
	map_name : String::new(),
	mode : PaletteMode::Cgb,
	ticks : 0,
	dump_tileset : false,
    };
    let mut positional = Vec::new();
    let mut i = 1;
    while i < args.len() {
	match args[i].as_str() {
	    "--sgb" => {
		options.mode = PaletteMode::Sgb;
	    },
	    "--ticks" => {
		i += 1;
		let value = args.get(i).and_then(|a| a.parse().ok());
		options.ticks = match value {
		    Some(n) => n,
		    None => {
			eprintln!("--ticks needs a number");
			usage(&args[0]);
		    }
		};
	    },
	    "--dump-tileset" => {
		options.dump_tileset = true;
	    },
	    arg if arg.starts_with("--") => {
		eprintln!("unknown option {arg}");
		usage(&args[0]);
	    },
	    arg => {
		positional.push(arg.to_string());
	    },
	}
	i += 1;
    }
    if positional.len() != 2 {
	usage(&args[0]);
    }
    options.asset_dir = positional.remove(0);
    options.map_name = positional.remove(0);
    return options;
}

fn print_map(assets : &GameAssets, options : &Options) {
    let name = &options.map_name;
    let bundle = match assets.load_map(name, options.mode) {
	Ok(b) => b,
	Err(e) => {
	    eprintln!("failed to load map {name}: {e}");
	    process::exit(1);
	}
    };

    println!("map {name}: id {:#04x}", bundle.map_id);
    println!("  tileset  {} (id {}), blockset {}", bundle.header.tileset,
	     bundle.tileset_id, bundle.header.actual_blockset);
    println!("  palette  {} ({:?})", bundle.palette_id, options.mode);
    println!("  size     {}x{} blocks", bundle.header.width, bundle.header.height);
    for conn in &bundle.header.connections {
	println!("  connection {:?} -> {} (offset {})",
		 conn.direction, conn.map_name, conn.offset);
    }
    println!("{}", bundle.grid.dump_hex());

    for warp in &bundle.objects.warp_events {
	let dbg = if warp.is_debug { " [debug]" } else { "" };
	println!("  warp ({},{}) -> {} #{}{dbg}", warp.x, warp.y,
		 warp.target_map, warp.warp_index);
    }
    for bg in &bundle.objects.bg_events {
	println!("  sign ({},{}) {}", bg.x, bg.y, bg.script_id);
    }
    for obj in &bundle.objects.object_events {
	println!("  npc  ({},{}) {} {:?} text {}", obj.x, obj.y, obj.sprite,
		 obj.movement, obj.text_script);
    }

    for (pointer, text) in &bundle.dialogue {
	match text {
	    DialogueText::Plain(lines) => {
		for line in lines {
		    println!("  text {pointer}: {:?}", line);
		}
	    },
	    DialogueText::Trainer { before, end, after } => {
		println!("  text {pointer} (trainer):");
		println!("    before: {:?}", before);
		println!("    end:    {:?}", end);
		println!("    after:  {:?}", after);
	    },
	}
    }

    if options.dump_tileset {
	match &bundle.tileset_image {
	    Some(img) => {
		let file = format!("{name}_tileset.png");
		match img.save(&file) {
		    Ok(()) => println!("wrote {file}"),
		    Err(e) => eprintln!("could not write {file}: {e}"),
		}
	    },
	    None => {
		eprintln!("no tileset image for {name}, nothing to write");
	    },
	}
    }

    if options.ticks > 0 {
	run_simulation(assets, &bundle, options.ticks);
    }
}

fn run_simulation(assets : &GameAssets, bundle : &pokemap::assets::MapBundle, ticks : u32) {
    let sprite_kind = |key : &str| {
	match assets.load_sprite_sheet(key) {
	    Some(sheet) => sprite::sprite_kind_for_sheet(sheet.height()),
	    None => SpriteKind::None,
	}
    };
    let config = sim::SimConfig::default();
    let mut simulation = sim::new_with_config(&bundle.objects, &bundle.header.tileset,
					      sprite_kind, config);
    let mut rng = thread_rng();
    for _ in 0..ticks {
	simulation.tick(&bundle.grid, &assets.collision, &mut rng);
    }
    println!("after {ticks} ticks ({:?} NPC cadence, {:?} water cadence):",
	     config.npc_tick, config.water_tick);
    for (idx, m) in simulation.movers().iter().enumerate() {
	println!("  npc {idx}: square ({},{}) facing {:?}",
		 m.grid_x(), m.grid_y(), m.facing);
    }
}

// ================================================================================
fn main() {
    env_logger::init();
    let options = parse_args();

    let assets = match GameAssets::load(Path::new(&options.asset_dir)) {
	Ok(a) => a,
	Err(e) => {
	    eprintln!("failed to load asset tables: {e}");
	    process::exit(1);
	}
    };
    print_map(&assets, &options);
}
