use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};

use dimensions_benchmark::PreviewMetrics;
use dimensions_preview::{
    forward_interaction, render_offsets, render_origin, AnchoredOffset, DiffPlacer, MirrorContext,
    PreviewAttributes, PreviewController, PreviewMirror, PreviewTracker, ServerContext,
};
use dimensions_slots::{MemorySlotTable, SlotAllocator, SlotTable};
use dimensions_storage::{FileSaveGame, SaveGame, SaveGameExt};
use dimensions_template::{StructureTemplate, TemplateDefinition, TemplateRegistry};
use dimensions_world::{BlockPos, BlockRegistry, BlockSink, BlockTable, FlatWorld};

const STRUCTURES_KEY: &str = "dimensions.structures";

const BUILTIN_TEMPLATE: &str = include_str!("../templates/watchtower.json");

const BLOCKS: [&str; 8] = [
    "bedrock",
    "dirt",
    "grass_block",
    "cobblestone",
    "stone_bricks",
    "spruce_log",
    "oak_log",
    "glass",
];

#[derive(Parser)]
#[command(name = "dimensions", about = "Structure previews rendered through recycled sub-dimension slots")]
pub struct Args {
    /// Directory holding the save game
    #[arg(long, env = "DIMENSIONS_SAVE_DIR", default_value = "./world")]
    pub save_dir: PathBuf,

    /// JSON structure template (built-in watchtower if absent)
    #[arg(long, env = "DIMENSIONS_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// Number of structures placed in a fresh world
    #[arg(long, default_value = "3")]
    pub structures: usize,

    /// Distance between structures along X
    #[arg(long, default_value = "32")]
    pub spacing: i32,

    /// Break the last structure after toggling
    #[arg(long)]
    pub remove_last: bool,

    /// Do not write the save game back
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SavedStructure {
    pos: BlockPos,
    preview: PreviewAttributes,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let metrics = Arc::new(PreviewMetrics::new(format!(
        "save_dir={} structures={} spacing={}",
        args.save_dir.display(),
        args.structures,
        args.spacing
    )));

    let mut blocks = BlockTable::new();
    blocks.register_all(BLOCKS)?;
    let blocks = Arc::new(blocks);
    let mut world = FlatWorld::superflat(Arc::clone(&blocks))?;

    let definition = load_definition(args.template.as_deref())?;
    let mut templates = TemplateRegistry::with_metrics(Arc::clone(&metrics));
    let template = templates.get_or_build(&definition)?;
    println!("Using template {} ({} blocks)", template.key(), template.len());

    let mut save = FileSaveGame::open(&args.save_dir)?;
    let mut allocator = SlotAllocator::with_metrics(Arc::clone(&metrics));
    allocator.on_save_game_loaded(&save);

    let mut structures = load_structures(&save, &args);
    for (phase, structure) in structures.iter().enumerate() {
        let missing = build_partially(&mut world, &template, structure.pos, phase)?;
        log::debug!("Structure at {} is missing {} blocks", structure.pos, missing);
    }

    let placer = DiffPlacer::with_metrics(Arc::clone(&metrics));
    let mut table = MemorySlotTable::new();
    // Observer side keeps its own registrations and only sees what is streamed
    let mut client_table = MemorySlotTable::new();
    let mut tracker = PreviewTracker::new();

    let mut controllers: Vec<PreviewController> = structures
        .iter()
        .map(|s| PreviewController::from_attributes(s.pos, Arc::clone(&template), s.preview))
        .collect();
    // Only the first structure drives the local renderer
    let mut mirrors: Vec<PreviewMirror> = structures
        .iter()
        .enumerate()
        .map(|(i, s)| PreviewMirror::from_attributes(s.pos, i == 0, s.preview))
        .collect();

    // Saved previews must be re-registered before anything new is allocated
    {
        let mut ctx = ServerContext {
            allocator: &mut allocator,
            table: &mut table,
            world: &world,
            registry: blocks.as_ref(),
            placer: &placer,
        };
        for controller in &mut controllers {
            controller.initialize(&mut ctx);
        }
    }
    {
        let mut ctx = MirrorContext { table: &mut client_table, tracker: &mut tracker };
        for mirror in &mut mirrors {
            mirror.initialize(&mut ctx);
        }
    }

    for (controller, mirror) in controllers.iter_mut().zip(mirrors.iter_mut()) {
        let mut ctx = ServerContext {
            allocator: &mut allocator,
            table: &mut table,
            world: &world,
            registry: blocks.as_ref(),
            placer: &placer,
        };
        let outcome = forward_interaction(&mut [], Some(&mut *controller), &mut ctx, |_| true);
        println!("Toggled structure at {}: {:?} ({:?})", controller.pos(), controller.state(), outcome.handling);

        publish(controller, mirror, &mut MirrorContext { table: &mut client_table, tracker: &mut tracker })?;
    }

    if args.remove_last {
        if let (Some(mut controller), Some(mut mirror)) = (controllers.pop(), mirrors.pop()) {
            let mut ctx = ServerContext {
                allocator: &mut allocator,
                table: &mut table,
                world: &world,
                registry: blocks.as_ref(),
                placer: &placer,
            };
            controller.on_removed(&mut ctx);
            let mut ctx = MirrorContext { table: &mut client_table, tracker: &mut tracker };
            publish(&mut controller, &mut mirror, &mut ctx)?;
            mirror.on_removed(&mut ctx);
            println!("Removed structure at {}", controller.pos());
        }
    }

    let streamed = stream_slots(&table, &mut client_table);
    log::debug!("Streamed {} slots to the observer", streamed);
    print_render_offsets(&client_table, &tracker);

    structures = controllers
        .iter()
        .map(|c| SavedStructure { pos: c.pos(), preview: c.to_attributes() })
        .collect();
    println!(
        "{} slots registered, {} free: {:?}",
        table.len(),
        allocator.free_len(),
        allocator.free_ids().map(|id| id.0).collect::<Vec<_>>()
    );

    if args.no_save {
        println!("Skipping save");
    } else {
        allocator.on_game_world_save(&mut save)?;
        save.store_data(STRUCTURES_KEY, &structures)
            .context("Failed to store structures")?;
        println!("Saved world to {}", save.root().display());
    }

    println!("{}", metrics.generate_report());
    Ok(())
}

fn load_definition(path: Option<&Path>) -> Result<TemplateDefinition> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read template {}", path.display()))?;
            TemplateDefinition::from_json(&text)
        }
        None => TemplateDefinition::from_json(BUILTIN_TEMPLATE),
    }
}

fn load_structures(save: &dyn SaveGame, args: &Args) -> Vec<SavedStructure> {
    match save.get_data::<Vec<SavedStructure>>(STRUCTURES_KEY) {
        Ok(Some(structures)) => {
            println!("Loaded {} structures from save", structures.len());
            return structures;
        }
        Ok(None) => {}
        Err(e) => log::error!("Discarding unreadable structure list: {:#}", e),
    }

    (0..args.structures)
        .map(|i| SavedStructure {
            pos: BlockPos::new(i as i32 * args.spacing, 1, 0),
            preview: PreviewAttributes::default(),
        })
        .collect()
}

/// Place two thirds of the template, leaving a different third missing for
/// each `phase`. Returns the number of blocks left out.
///
/// Uses the last registry match, so wildcard positions hold a different block
/// than the one a preview would suggest.
fn build_partially(world: &mut FlatWorld, template: &StructureTemplate, anchor: BlockPos, phase: usize) -> Result<usize> {
    let registry = Arc::clone(world.registry());
    let mut missing = 0;

    for (index, entry) in template.offsets().iter().enumerate() {
        if (index + phase) % 3 == 0 {
            missing += 1;
            continue;
        }
        let pattern = template
            .block_pattern(entry.type_index)
            .with_context(|| format!("No pattern for type index {}", entry.type_index))?;
        let block = registry
            .search_blocks(pattern)
            .pop()
            .with_context(|| format!("No registered block matches {}", pattern))?;
        world.set_block(anchor + entry.offset(), block.id);
    }
    Ok(missing)
}

fn publish(controller: &mut PreviewController, mirror: &mut PreviewMirror, ctx: &mut MirrorContext<'_>) -> Result<()> {
    if let Some(attributes) = controller.take_sync() {
        let packet = attributes.to_nbt()?;
        mirror.on_sync_bytes(&packet, ctx)?;
    }
    Ok(())
}

/// Copy the server's contents into every slot the observer has registered.
/// Returns the number of slots refreshed.
fn stream_slots(server: &dyn SlotTable, client: &mut dyn SlotTable) -> usize {
    let mut streamed = 0;
    for id in client.loaded_ids() {
        let (Some(source), Some(target)) = (server.get(id), client.get_mut(id)) else {
            continue;
        };
        target.clear_chunks();
        for (pos, block) in source.blocks() {
            target.set_block(*pos, *block);
        }
        target.unload_unused_regions();
        streamed += 1;
    }
    streamed
}

fn print_render_offsets(table: &dyn SlotTable, tracker: &PreviewTracker) {
    for (id, offset) in render_offsets(table, tracker, &AnchoredOffset) {
        let Some(slot) = table.get(id) else { continue };
        let origin = render_origin(slot, offset);
        println!(
            "slot {:>4} blocks={:<3} tracked={:<5} origin={:?}",
            id,
            slot.block_count(),
            tracker.tracked() == Some(id),
            origin.map(|o| (o.x, o.y, o.z))
        );
    }
}
