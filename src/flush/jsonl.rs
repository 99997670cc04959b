use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::{LogisticsIncident, Tile, UnitSave, World};
use crate::rules::Rules;

/// Write an iterator of serializable items to a JSONL file (one JSON object per line).
fn write_jsonl<T: Serialize>(path: &Path, items: impl Iterator<Item = T>) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for item in items {
        serde_json::to_writer(&mut writer, &item)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()
}

/// Read a JSONL file written by [`flush_to_jsonl`]. Blank lines are skipped.
pub fn load_jsonl<T: DeserializeOwned>(path: &Path) -> io::Result<Vec<T>> {
    let reader = BufReader::new(File::open(path)?);
    let mut items = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        items.push(serde_json::from_str(&line)?);
    }
    Ok(items)
}

/// Flush the world state to JSONL files in the given output directory.
///
/// Creates the output directory if it does not exist. Writes 3 files:
/// - `units.jsonl`: one save tree per independent unit, sub-mobs nested
/// - `tiles.jsonl`: one Tile per line
/// - `incidents.jsonl`: one LogisticsIncident per line
pub fn flush_to_jsonl(world: &World, output_dir: &Path) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    write_jsonl(&output_dir.join("units.jsonl"), world.save_all().into_iter())?;
    write_jsonl(&output_dir.join("tiles.jsonl"), world.tiles.values())?;
    write_jsonl(&output_dir.join("incidents.jsonl"), world.incidents.iter())?;

    Ok(())
}

/// Rebuild a world from a checkpoint directory under `rules`.
///
/// Unit records that fail validation surface as `InvalidData`. The caller
/// sets `turn`, which checkpoints carry in their directory name.
pub fn load_world_jsonl(rules: Rules, input_dir: &Path) -> io::Result<World> {
    let mut world = World::new(rules);
    for tile in load_jsonl::<Tile>(&input_dir.join("tiles.jsonl"))? {
        world.add_tile(tile);
    }
    for save in load_jsonl::<UnitSave>(&input_dir.join("units.jsonl"))? {
        world
            .restore_unit(&save)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    }
    world.incidents = load_jsonl::<LogisticsIncident>(&input_dir.join("incidents.jsonl"))?;
    Ok(world)
}
