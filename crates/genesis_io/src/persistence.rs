//! Versioned save records and the atomic save store.
//!
//! Saves are gzip-compressed JSON named `world-NNNNNN.json.gz`. Older records
//! are upgraded in place on load, one schema step at a time.

use crate::error::{IoError, Result};
use crate::serialization::{json_value_from_gz, to_json_gz};
use genesis_core::brain::BrainLogic;
use genesis_data::{BehaviorParams, Organism, OrganismId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const CURRENT_SCHEMA: u32 = 3;
/// Newest memory entries kept in a record.
pub const MEMORY_SLICE: usize = 50;
/// Highest-trust neighbors kept in a record.
pub const TRUST_SLICE: usize = 32;

const SAVE_PREFIX: &str = "world-";
const SAVE_SUFFIX: &str = ".json.gz";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganismRecord {
    pub schema_version: u32,
    pub organism: Organism,
}

/// Everything needed to resume a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldRecord {
    pub schema_version: u32,
    /// Assigned by [`SaveStore::save`].
    pub save_seq: u64,
    pub tick: u64,
    pub seed: u64,
    pub config_fingerprint: String,
    pub width: u16,
    pub height: u16,
    /// Row-major patch stocks.
    pub stocks: Vec<f64>,
    pub organisms: Vec<Organism>,
    pub next_id: OrganismId,
}

impl WorldRecord {
    /// Builds a current-schema record, bounding each organism's slices.
    #[must_use]
    pub fn new(
        tick: u64,
        seed: u64,
        config_fingerprint: String,
        (width, height): (u16, u16),
        stocks: Vec<f64>,
        organisms: &[Organism],
        next_id: OrganismId,
    ) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA,
            save_seq: 0,
            tick,
            seed,
            config_fingerprint,
            width,
            height,
            stocks,
            organisms: organisms.iter().map(|o| serialize(o).organism).collect(),
            next_id,
        }
    }
}

fn bounded(organism: &Organism) -> Organism {
    let mut organism = organism.clone();
    let entries = &mut organism.memory.entries;
    if entries.len() > MEMORY_SLICE {
        let excess = entries.len() - MEMORY_SLICE;
        entries.drain(..excess);
    }

    let trust = &mut organism.social.trust;
    if trust.len() > TRUST_SLICE {
        let mut ranked: Vec<(OrganismId, f32)> = trust.iter().map(|(k, v)| (*k, *v)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        ranked.truncate(TRUST_SLICE);
        *trust = ranked.into_iter().collect();
    }
    organism
}

/// Snapshot of one organism with bounded memory and trust slices.
#[must_use]
pub fn serialize(organism: &Organism) -> OrganismRecord {
    OrganismRecord {
        schema_version: CURRENT_SCHEMA,
        organism: bounded(organism),
    }
}

/// Checks a current-schema record and hands back its organism.
pub fn deserialize(record: OrganismRecord) -> Result<Organism> {
    if record.schema_version != CURRENT_SCHEMA {
        return Err(IoError::Schema {
            found: record.schema_version,
            supported: CURRENT_SCHEMA,
        });
    }
    check_organism(&record.organism)?;
    Ok(record.organism)
}

fn check_organism(organism: &Organism) -> Result<()> {
    let id = organism.id();
    organism
        .intel
        .genome
        .validate()
        .map_err(|e| IoError::validation(format!("organism {id}: {e}")))?;
    let energy = organism.vitals.energy;
    if energy.is_nan() || energy < 0.0 {
        return Err(IoError::validation(format!("organism {id}: negative energy")));
    }
    if organism.memory.len() > organism.memory.capacity {
        return Err(IoError::validation(format!(
            "organism {id}: memory exceeds capacity"
        )));
    }
    Ok(())
}

/// Reads any supported organism record from JSON.
pub fn organism_from_value(value: Value) -> Result<Organism> {
    let record: OrganismRecord = serde_json::from_value(migrate(value)?)?;
    deserialize(record)
}

fn schema_of(value: &Value) -> Result<u32> {
    let found = value
        .get("schema_version")
        .and_then(Value::as_u64)
        .unwrap_or(1);
    let found = u32::try_from(found).unwrap_or(u32::MAX);
    if found > CURRENT_SCHEMA || found == 0 {
        return Err(IoError::Schema {
            found,
            supported: CURRENT_SCHEMA,
        });
    }
    Ok(found)
}

fn object_mut<'a>(value: &'a mut Value, what: &str) -> Result<&'a mut Map<String, Value>> {
    value
        .as_object_mut()
        .ok_or_else(|| IoError::validation(format!("{what} is not an object")))
}

/// v1 kept `memory_size` next to a bare entry list and had no behavior block.
fn organism_v1_to_v2(organism: &mut Value) -> Result<()> {
    let obj = object_mut(organism, "organism")?;
    let capacity = obj
        .remove("memory_size")
        .and_then(|v| v.as_u64())
        .unwrap_or(0);
    let entries = match obj.remove("memory") {
        Some(Value::Array(list)) => list,
        _ => Vec::new(),
    };
    obj.insert(
        "memory".into(),
        json!({ "capacity": capacity, "entries": entries }),
    );

    let intel = obj
        .get_mut("intel")
        .ok_or_else(|| IoError::validation("organism without intel"))?;
    let intel = object_mut(intel, "intel")?;
    if !intel.contains_key("behavior") {
        intel.insert(
            "behavior".into(),
            serde_json::to_value(BehaviorParams::default())?,
        );
    }
    Ok(())
}

/// v2 had no trust map.
fn organism_v2_to_v3(organism: &mut Value) -> Result<()> {
    let obj = object_mut(organism, "organism")?;
    let social = obj
        .entry("social")
        .or_insert_with(|| json!({ "observations": [], "imitation": null, "followed_lead": null }));
    let social = object_mut(social, "social")?;
    social.entry("trust").or_insert_with(|| json!({}));
    Ok(())
}

fn upgrade_organism(organism: &mut Value, from: u32) -> Result<()> {
    if from < 2 {
        organism_v1_to_v2(organism)?;
    }
    if from < 3 {
        organism_v2_to_v3(organism)?;
    }
    Ok(())
}

/// Upgrades an organism record to [`CURRENT_SCHEMA`].
pub fn migrate(mut value: Value) -> Result<Value> {
    let from = schema_of(&value)?;
    if from == CURRENT_SCHEMA {
        return Ok(value);
    }
    let obj = object_mut(&mut value, "record")?;
    let organism = obj
        .get_mut("organism")
        .ok_or_else(|| IoError::validation("record without organism"))?;
    upgrade_organism(organism, from)?;
    obj.insert("schema_version".into(), json!(CURRENT_SCHEMA));
    debug!(from, to = CURRENT_SCHEMA, "Migrated organism record");
    Ok(value)
}

/// Upgrades a world record and every organism inside it.
pub fn migrate_world(mut value: Value) -> Result<Value> {
    let from = schema_of(&value)?;
    if from == CURRENT_SCHEMA {
        return Ok(value);
    }
    let obj = object_mut(&mut value, "world record")?;
    if let Some(Value::Array(organisms)) = obj.get_mut("organisms") {
        for organism in organisms {
            upgrade_organism(organism, from)?;
        }
    }
    obj.insert("schema_version".into(), json!(CURRENT_SCHEMA));
    info!(from, to = CURRENT_SCHEMA, "Migrated world save");
    Ok(value)
}

/// Parses and validates a world record of any supported schema.
pub fn world_from_value(value: Value) -> Result<WorldRecord> {
    let record: WorldRecord = serde_json::from_value(migrate_world(value)?)?;
    if record.stocks.len() != record.width as usize * record.height as usize {
        return Err(IoError::validation(format!(
            "{} stocks for a {}x{} grid",
            record.stocks.len(),
            record.width,
            record.height
        )));
    }
    for organism in &record.organisms {
        check_organism(organism)?;
    }
    Ok(record)
}

/// Directory of numbered world saves.
///
/// A save goes to a temporary file that is synced and renamed into place, so
/// an interrupted write never replaces an earlier save. The sequence number
/// advances only after the rename succeeds.
#[derive(Debug)]
pub struct SaveStore {
    dir: PathBuf,
    next_seq: u64,
}

fn seq_of(path: &Path) -> Option<u64> {
    let name = path.file_name()?.to_str()?;
    name.strip_prefix(SAVE_PREFIX)?
        .strip_suffix(SAVE_SUFFIX)?
        .parse()
        .ok()
}

impl SaveStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| IoError::from(e).with_context(format!("creating {}", dir.display())))?;
        let mut store = Self { dir, next_seq: 1 };
        store.next_seq = store.sequences()?.last().map_or(1, |s| s + 1);
        Ok(store)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    #[must_use]
    pub fn path_for(&self, seq: u64) -> PathBuf {
        self.dir.join(format!("{SAVE_PREFIX}{seq:06}{SAVE_SUFFIX}"))
    }

    /// Existing save sequence numbers, ascending.
    pub fn sequences(&self) -> Result<Vec<u64>> {
        let mut seqs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            if let Some(seq) = seq_of(&entry?.path()) {
                seqs.push(seq);
            }
        }
        seqs.sort_unstable();
        Ok(seqs)
    }

    /// Writes `record` as the next save and returns its path.
    pub fn save(&mut self, mut record: WorldRecord) -> Result<PathBuf> {
        let seq = self.next_seq;
        record.save_seq = seq;
        let bytes = to_json_gz(&record)?;
        let target = self.path_for(seq);
        let tmp = self.dir.join(format!(".{SAVE_PREFIX}{seq:06}.tmp"));

        let written = (|| -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &target)
        })();
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(IoError::from(e).with_context(format!("saving {}", target.display())));
        }

        self.next_seq += 1;
        info!(seq, tick = record.tick, organisms = record.organisms.len(), "World saved");
        Ok(target)
    }

    pub fn load(&self, seq: u64) -> Result<WorldRecord> {
        let path = self.path_for(seq);
        if !path.exists() {
            return Err(IoError::not_found(path.display().to_string()));
        }
        let bytes = fs::read(&path)?;
        let value = json_value_from_gz(&bytes)
            .map_err(|e| e.with_context(format!("reading {}", path.display())))?;
        world_from_value(value)
    }

    /// The highest-numbered save, if any.
    pub fn load_latest(&self) -> Result<Option<WorldRecord>> {
        match self.sequences()?.last() {
            Some(&seq) => self.load(seq).map(Some),
            None => Ok(None),
        }
    }
}
