//! # World Manager
//!
//! Owns every resident chunk and decides where each one comes from.
//!
//! ## Chunk Lifecycle
//!
//! ```text
//! first request ──► chunk file? ──yes──► load (clean, needs remesh)
//!                        │
//!                        no / malformed
//!                        ▼
//!                    generate (needs save)
//!                        │
//!                        ▼
//!        insert into map, register + blend seam profile
//!                        │
//!        edits ──► save passes ──► unload (save callback)
//! ```
//!
//! ## Locking
//!
//! Two independent scopes, never nested:
//!
//! 1. The chunk map lock, held only to look up, insert or remove `Arc`s
//! 2. Each chunk's own lock, taken after the map lock is released
//!
//! Seam profiles change only while the map lock is held, so the registry
//! always matches the set of resident chunks. The seam registry lock is
//! always taken after the map lock, never before.
//!
//! Generation and file loads run with no lock held. If two threads race
//! to create the same chunk, the first insert wins and the other result is
//! dropped, so a resident coordinate is never generated twice.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use loam_core::{world_to_chunk, Block, Chunk, ChunkCoord, ChunkData, LocalPos};

use crate::chunk_persistence::ChunkStore;
use crate::config::WorldConfig;
use crate::error::WorldError;
use crate::generator::{ColumnSample, TerrainGenerator};
use crate::noise::WorldSeed;
use crate::seam::{SeamCache, SurfaceProfile};

/// How a chunk became resident.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Origin {
    Loaded,
    Generated,
}

/// Lifetime counters, updated without locks.
#[derive(Debug, Default)]
struct Counters {
    generated: AtomicU64,
    loaded: AtomicU64,
    malformed: AtomicU64,
    saved: AtomicU64,
    save_failures: AtomicU64,
    unloaded: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// World statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WorldStats {
    /// Chunks currently in memory.
    pub resident_chunks: usize,
    /// Resident chunks waiting for a remesh.
    pub dirty_chunks: usize,
    /// Resident chunks waiting for a save.
    pub unsaved_chunks: usize,
    /// Registered seam profiles.
    pub seam_profiles: usize,
    /// Chunks generated since open.
    pub generated: u64,
    /// Chunks loaded from files since open.
    pub loaded: u64,
    /// Chunk files rejected as malformed since open.
    pub malformed: u64,
    /// Successful chunk saves since open.
    pub saved: u64,
    /// Failed chunk saves since open.
    pub save_failures: u64,
    /// Chunks evicted since open.
    pub unloaded: u64,
}

/// A persistent voxel world.
///
/// All methods take `&self`; share the world between threads with `Arc`.
pub struct World {
    config: WorldConfig,
    generator: TerrainGenerator,
    store: ChunkStore,
    /// Resident chunks. The coarse lock.
    chunks: RwLock<HashMap<ChunkCoord, Arc<Chunk>>>,
    seams: SeamCache,
    counters: Counters,
}

impl World {
    /// Opens a world. No chunk is loaded until first requested.
    #[must_use]
    pub fn open(config: WorldConfig) -> Self {
        tracing::info!(
            "Opening world: seed={}, max_height={}, sea_level={}, dir={}",
            config.seed.value(),
            config.max_height,
            config.sea_level,
            config.chunk_dir.display()
        );
        Self {
            generator: config.generator(),
            store: ChunkStore::new(config.chunk_dir.clone()),
            config,
            chunks: RwLock::new(HashMap::new()),
            seams: SeamCache::new(),
            counters: Counters::default(),
        }
    }

    /// Saves every resident chunk, then drops all chunks and seam profiles.
    ///
    /// Returns the number of chunks saved.
    pub fn close(self) -> usize {
        let saved = self.save_all_loaded_chunks();
        self.chunks.write().clear();
        self.seams.clear();
        tracing::info!("Closed world: {} chunks saved", saved);
        saved
    }

    /// Settings the world runs with.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Generation seed.
    #[must_use]
    pub const fn seed(&self) -> WorldSeed {
        self.config.seed
    }

    /// Terrain generator in use.
    #[must_use]
    pub const fn generator(&self) -> &TerrainGenerator {
        &self.generator
    }

    /// Chunk file store.
    #[must_use]
    pub const fn store(&self) -> &ChunkStore {
        &self.store
    }

    /// Directory holding chunk files.
    #[must_use]
    pub fn chunk_dir(&self) -> &Path {
        self.store.dir()
    }

    /// Seam profile registry owned by this world.
    #[must_use]
    pub const fn seam_cache(&self) -> &SeamCache {
        &self.seams
    }

    /// True if `cy` is a chunk row inside the world's height.
    #[must_use]
    pub const fn row_in_range(&self, cy: i32) -> bool {
        cy >= 0 && cy < self.config.chunk_rows()
    }

    // =========================================================================
    // Chunk access
    // =========================================================================

    /// Resident chunk at `coord`, never loading or generating.
    #[must_use]
    pub fn try_get_chunk(&self, coord: ChunkCoord) -> Option<Arc<Chunk>> {
        self.chunks.read().get(&coord).cloned()
    }

    /// True if the chunk is in memory.
    #[must_use]
    pub fn is_resident(&self, coord: ChunkCoord) -> bool {
        self.chunks.read().contains_key(&coord)
    }

    /// Number of chunks in memory.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.chunks.read().len()
    }

    /// Returns the resident chunk, loading or generating it first if needed.
    ///
    /// A chunk file that exists but has the wrong length is logged and the
    /// chunk is generated instead.
    pub fn get_or_create_chunk(&self, coord: ChunkCoord) -> Arc<Chunk> {
        if let Some(chunk) = self.try_get_chunk(coord) {
            return chunk;
        }

        let (chunk, origin) = self.load_or_generate(coord);
        // Nobody else can see the candidate yet, so scanning it blocks no one.
        let profile = SurfaceProfile::from_chunk(&chunk);
        let candidate = Arc::new(chunk);

        let mut chunks = self.chunks.write();
        if let Some(existing) = chunks.get(&coord) {
            return Arc::clone(existing);
        }
        chunks.insert(coord, Arc::clone(&candidate));
        self.seams.register(profile);
        self.seams.blend_with_neighbors(coord);
        drop(chunks);

        match origin {
            Origin::Loaded => Counters::bump(&self.counters.loaded),
            Origin::Generated => Counters::bump(&self.counters.generated),
        }
        candidate
    }

    /// True if `chunk` is the instance resident at its coordinate.
    fn is_current(&self, chunk: &Arc<Chunk>) -> bool {
        self.chunks
            .read()
            .get(&chunk.coord())
            .is_some_and(|resident| Arc::ptr_eq(resident, chunk))
    }

    /// Patches one column of a chunk's seam profile, unless the chunk was
    /// evicted meanwhile. The column is scanned before the map lock is
    /// taken; the map read lock is then held across the registry update so
    /// an unload cannot drop the profile in between.
    fn refresh_column(&self, chunk: &Arc<Chunk>, local: LocalPos) {
        let height = SurfaceProfile::scan_column(chunk, local.x, local.z);
        let chunks = self.chunks.read();
        let still_resident = chunks
            .get(&chunk.coord())
            .is_some_and(|resident| Arc::ptr_eq(resident, chunk));
        if still_resident {
            self.seams.update_column(chunk.coord(), local.x, local.z, height);
        }
    }

    fn load_or_generate(&self, coord: ChunkCoord) -> (Chunk, Origin) {
        match self.store.load(coord) {
            Ok(Some(data)) => {
                let chunk = Chunk::from_data(coord, data);
                chunk.mark_needs_remesh();
                tracing::debug!("Loaded chunk [{},{},{}]", coord.x, coord.y, coord.z);
                return (chunk, Origin::Loaded);
            }
            Ok(None) => {}
            Err(e @ WorldError::MalformedChunk { .. }) => {
                Counters::bump(&self.counters.malformed);
                tracing::warn!("{}; regenerating", e);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read chunk [{},{},{}]: {}; regenerating",
                    coord.x,
                    coord.y,
                    coord.z,
                    e
                );
            }
        }

        let chunk = self.generator.generate(coord);
        chunk.mark_dirty();
        tracing::debug!("Generated chunk [{},{},{}]", coord.x, coord.y, coord.z);
        (chunk, Origin::Generated)
    }

    /// Every resident chunk, in no particular order.
    #[must_use]
    pub fn all_chunks(&self) -> Vec<Arc<Chunk>> {
        self.chunks.read().values().cloned().collect()
    }

    /// Replaces the contents of `out` with every resident chunk.
    ///
    /// Lets a caller reuse one buffer across frames. Returns the count.
    pub fn copy_chunks_to(&self, out: &mut Vec<Arc<Chunk>>) -> usize {
        out.clear();
        out.extend(self.chunks.read().values().cloned());
        out.len()
    }

    // =========================================================================
    // Voxel access
    // =========================================================================

    /// Block at world coordinates. Air if the chunk is not resident.
    #[must_use]
    pub fn get_block(&self, wx: i32, wy: i32, wz: i32) -> Block {
        let (coord, local) = world_to_chunk(wx, wy, wz);
        self.try_get_chunk(coord)
            .map_or(Block::AIR, |chunk| chunk.get_block(local.x, local.y, local.z))
    }

    /// Liquid level at world coordinates. 0 if the chunk is not resident.
    #[must_use]
    pub fn get_liquid(&self, wx: i32, wy: i32, wz: i32) -> u8 {
        let (coord, local) = world_to_chunk(wx, wy, wz);
        self.try_get_chunk(coord)
            .map_or(0, |chunk| chunk.get_liquid(local.x, local.y, local.z))
    }

    /// Metadata at world coordinates. 0 if the chunk is not resident.
    #[must_use]
    pub fn get_metadata(&self, wx: i32, wy: i32, wz: i32) -> u8 {
        let (coord, local) = world_to_chunk(wx, wy, wz);
        self.try_get_chunk(coord)
            .map_or(0, |chunk| chunk.get_metadata(local.x, local.y, local.z))
    }

    /// Sets a block, creating its chunk if needed.
    ///
    /// Positions above or below the world's chunk rows are ignored. On a
    /// change the edited column of the chunk's seam profile is rescanned
    /// and every resident neighbor sharing the touched faces is flagged for
    /// remeshing.
    ///
    /// Returns true if the voxel changed.
    pub fn set_block(&self, wx: i32, wy: i32, wz: i32, block: Block) -> bool {
        self.edit(wx, wy, wz, true, |chunk, p| chunk.set_block(p.x, p.y, p.z, block))
    }

    /// Sets a liquid level, creating the chunk if needed. Same rules as
    /// [`Self::set_block`], without a profile update.
    pub fn set_liquid(&self, wx: i32, wy: i32, wz: i32, level: u8) -> bool {
        self.edit(wx, wy, wz, false, |chunk, p| chunk.set_liquid(p.x, p.y, p.z, level))
    }

    /// Sets a metadata byte, creating the chunk if needed. Same rules as
    /// [`Self::set_liquid`].
    pub fn set_metadata(&self, wx: i32, wy: i32, wz: i32, value: u8) -> bool {
        self.edit(wx, wy, wz, false, |chunk, p| chunk.set_metadata(p.x, p.y, p.z, value))
    }

    /// Applies a voxel write, retrying if an unload evicted the chunk
    /// between lookup and write, so the edit always lands in the resident
    /// instance.
    fn edit<F>(&self, wx: i32, wy: i32, wz: i32, reshapes: bool, apply: F) -> bool
    where
        F: Fn(&Chunk, LocalPos) -> bool,
    {
        let (coord, local) = world_to_chunk(wx, wy, wz);
        if !self.row_in_range(coord.y) {
            return false;
        }

        let mut changed = false;
        let chunk = loop {
            let chunk = self.get_or_create_chunk(coord);
            changed |= apply(&chunk, local);
            if self.is_current(&chunk) {
                break chunk;
            }
            tracing::debug!(
                "Chunk [{},{},{}] evicted during a write; retrying",
                coord.x,
                coord.y,
                coord.z
            );
        };
        if !changed {
            return false;
        }

        if reshapes {
            self.refresh_column(&chunk, local);
        }
        for face in local.touched_faces() {
            if let Some(neighbor) = self.try_get_chunk(coord.neighbor(face)) {
                neighbor.mark_needs_remesh();
            }
        }
        true
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Writes one chunk to its file.
    ///
    /// On success the save flag is cleared unless the chunk changed while
    /// it was being written. On failure the error is logged and the chunk
    /// stays flagged. Returns true on success.
    pub fn save_chunk(&self, chunk: &Chunk) -> bool {
        let coord = chunk.coord();
        let (bytes, version) = chunk.save_snapshot();
        match self.store.save_bytes(coord, &bytes) {
            Ok(()) => {
                chunk.mark_saved_if_unchanged(version);
                Counters::bump(&self.counters.saved);
                true
            }
            Err(e) => {
                Counters::bump(&self.counters.save_failures);
                tracing::error!(
                    "Failed to save chunk [{},{},{}]: {}",
                    coord.x,
                    coord.y,
                    coord.z,
                    e
                );
                false
            }
        }
    }

    /// Attempts to save chunks flagged `needs_save`, at most `save_budget`
    /// attempts per call.
    ///
    /// Chunks are taken oldest modification first. A failed attempt is
    /// logged and still uses up one unit of the budget; everything not
    /// saved stays flagged for the next call. Returns the number saved.
    pub fn save_modified_chunks(&self) -> usize {
        let mut pending: Vec<_> = self
            .all_chunks()
            .into_iter()
            .filter(|c| c.needs_save())
            .collect();
        pending.sort_by_key(|c| (c.last_modified_ms(), c.coord()));

        let saved = pending
            .iter()
            .take(self.config.save_budget)
            .filter(|c| self.save_chunk(c))
            .count();

        if saved > 0 {
            tracing::info!(
                "Saved {} modified chunks ({} still pending)",
                saved,
                pending.iter().filter(|c| c.needs_save()).count()
            );
        }
        saved
    }

    /// Saves every resident chunk regardless of flags.
    ///
    /// Returns the number saved; failures are logged and skipped.
    pub fn save_all_loaded_chunks(&self) -> usize {
        let chunks = self.all_chunks();
        let saved = chunks.iter().filter(|c| self.save_chunk(c)).count();
        tracing::info!("Saved {} of {} loaded chunks", saved, chunks.len());
        saved
    }

    /// Evicts every resident chunk whose coordinate is not in `keep`.
    ///
    /// Evicted chunks and their seam profiles are dropped under the map
    /// lock. Then, with no map lock held, each one with unsaved changes is
    /// snapshotted and `on_save` runs once per snapshot. The callback may
    /// freely call back into the world.
    ///
    /// Returns the number of chunks evicted.
    pub fn unload_chunks<F>(&self, keep: &HashSet<ChunkCoord>, mut on_save: F) -> usize
    where
        F: FnMut(ChunkCoord, ChunkData),
    {
        let evicted: Vec<Arc<Chunk>> = {
            let mut chunks = self.chunks.write();
            let doomed: Vec<ChunkCoord> = chunks
                .keys()
                .filter(|coord| !keep.contains(coord))
                .copied()
                .collect();
            for coord in &doomed {
                self.seams.remove(*coord);
            }
            doomed.iter().filter_map(|coord| chunks.remove(coord)).collect()
        };

        let mut unsaved = Vec::new();
        for chunk in &evicted {
            if chunk.needs_save() {
                unsaved.push((chunk.coord(), chunk.snapshot()));
            }
            tracing::debug!(
                "Unloaded chunk [{},{},{}]",
                chunk.coord().x,
                chunk.coord().y,
                chunk.coord().z
            );
        }
        self.counters
            .unloaded
            .fetch_add(evicted.len() as u64, Ordering::Relaxed);

        for (coord, data) in unsaved {
            on_save(coord, data);
        }
        evicted.len()
    }

    /// [`Self::unload_chunks`] with a callback that writes each unsaved
    /// snapshot to the chunk store.
    ///
    /// Returns `(evicted, saved)`.
    pub fn unload_and_save(&self, keep: &HashSet<ChunkCoord>) -> (usize, usize) {
        let mut saved = 0;
        let evicted = self.unload_chunks(keep, |coord, data| {
            match self.store.save_bytes(coord, &data.to_bytes()) {
                Ok(()) => {
                    Counters::bump(&self.counters.saved);
                    saved += 1;
                }
                Err(e) => {
                    Counters::bump(&self.counters.save_failures);
                    tracing::error!(
                        "Failed to save unloaded chunk [{},{},{}]: {}",
                        coord.x,
                        coord.y,
                        coord.z,
                        e
                    );
                }
            }
        });
        (evicted, saved)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Generator's view of a column. Ignores edits.
    #[must_use]
    pub fn column_at(&self, wx: i32, wz: i32) -> ColumnSample {
        self.generator.column(wx, wz)
    }

    /// Carved terrain surface the generator produces at a column.
    #[must_use]
    pub fn surface_height_at(&self, wx: i32, wz: i32) -> i32 {
        self.column_at(wx, wz).carved_surface
    }

    /// Biome name at a column.
    #[must_use]
    pub fn biome_name_at(&self, wx: i32, wz: i32) -> &'static str {
        self.column_at(wx, wz).biome.name()
    }

    /// Desert weight at a column, in `[0, 1]`.
    #[must_use]
    pub fn desert_weight_at(&self, wx: i32, wz: i32) -> f64 {
        self.generator
            .classifier()
            .desert_weight(f64::from(wx), f64::from(wz))
    }

    /// Ocean weight at a column, in `[0, 1]`.
    #[must_use]
    pub fn ocean_weight_at(&self, wx: i32, wz: i32) -> f64 {
        self.generator
            .classifier()
            .ocean_weight(f64::from(wx), f64::from(wz))
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        let chunks = self.all_chunks();
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        WorldStats {
            resident_chunks: chunks.len(),
            dirty_chunks: chunks.iter().filter(|c| c.is_dirty()).count(),
            unsaved_chunks: chunks.iter().filter(|c| c.needs_save()).count(),
            seam_profiles: self.seams.len(),
            generated: load(&self.counters.generated),
            loaded: load(&self.counters.loaded),
            malformed: load(&self.counters.malformed),
            saved: load(&self.counters.saved),
            save_failures: load(&self.counters.save_failures),
            unloaded: load(&self.counters.unloaded),
        }
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("resident_chunks", &self.resident_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_core::{Face, CHUNK_VOLUME};

    fn temp_world(name: &str) -> World {
        let dir = std::env::temp_dir().join(format!("loam_world_unit_{name}_{}", std::process::id()));
        std::fs::remove_dir_all(&dir).ok();
        World::open(WorldConfig::new(WorldSeed::new(1337), dir))
    }

    fn cleanup(world: &World) {
        std::fs::remove_dir_all(world.chunk_dir()).ok();
    }

    #[test]
    fn test_get_block_does_not_generate() {
        let world = temp_world("no_generate");
        assert_eq!(world.get_block(5, 0, 5), Block::AIR);
        assert_eq!(world.resident_count(), 0);
        assert_eq!(world.stats().generated, 0);
    }

    #[test]
    fn test_set_block_generates_chunk() {
        let world = temp_world("set_generates");
        assert!(world.set_block(-1, 200, -1, Block::STONE));
        let coord = ChunkCoord::new(-1, 0, -1);
        assert!(world.is_resident(coord));
        assert_eq!(world.get_block(-1, 200, -1), Block::STONE);
        assert_eq!(world.get_block(-1, 0, -1), Block::BEDROCK);
        assert!(world.seam_cache().contains(coord));

        let stats = world.stats();
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.unsaved_chunks, 1);
        cleanup(&world);
    }

    #[test]
    fn test_same_block_twice_is_noop() {
        let world = temp_world("idempotent");
        assert!(world.set_block(3, 150, 3, Block::DIRT));
        let chunk = world.try_get_chunk(ChunkCoord::new(0, 0, 0)).unwrap();
        let version = chunk.version();
        assert!(!world.set_block(3, 150, 3, Block::DIRT));
        assert_eq!(chunk.version(), version);
        cleanup(&world);
    }

    #[test]
    fn test_rows_outside_world_ignored() {
        let world = temp_world("rows");
        assert!(!world.set_block(0, -1, 0, Block::STONE));
        assert!(!world.set_block(0, 256, 0, Block::STONE));
        assert_eq!(world.resident_count(), 0);
        assert!(!world.row_in_range(-1));
        assert!(world.row_in_range(0));
        assert!(!world.row_in_range(1));
    }

    #[test]
    fn test_edge_write_flags_neighbor() {
        let world = temp_world("neighbor");
        let center = world.get_or_create_chunk(ChunkCoord::new(0, 0, 0));
        let east = world.get_or_create_chunk(ChunkCoord::new(1, 0, 0));
        let south = world.get_or_create_chunk(ChunkCoord::new(0, 0, 1));
        east.clear_dirty();
        south.clear_dirty();
        east.mark_saved();
        let east_version = east.version();

        // Interior write: no neighbor flagged.
        assert!(world.set_block(7, 200, 7, Block::STONE));
        assert!(!east.is_dirty());

        // x == 15 touches the east face only.
        assert!(world.set_block(15, 200, 7, Block::STONE));
        assert!(east.is_dirty());
        assert!(!east.needs_save());
        assert_eq!(east.version(), east_version);
        assert!(!south.is_dirty());
        assert!(center.needs_save());
        cleanup(&world);
    }

    #[test]
    fn test_seam_profiles_blend_on_insert() {
        let world = temp_world("blend");
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        world.get_or_create_chunk(a);
        world.get_or_create_chunk(b);

        let pa = world.seam_cache().get(a).unwrap();
        let pb = world.seam_cache().get(b).unwrap();
        assert_eq!(pa.edge(Face::East), pb.edge(Face::West));
        cleanup(&world);
    }

    #[test]
    fn test_write_racing_unload_lands_in_resident_chunk() {
        let world = temp_world("edit_unload_race");
        let coord = ChunkCoord::new(0, 0, 0);
        world.get_or_create_chunk(coord);

        // The first attempt is evicted between lookup and write.
        let attempts = std::cell::Cell::new(0);
        let snapshots = std::cell::RefCell::new(Vec::new());
        let changed = world.edit(1, 100, 1, true, |chunk, p| {
            attempts.set(attempts.get() + 1);
            if attempts.get() == 1 {
                let evicted = world.unload_chunks(&HashSet::new(), |c, _| snapshots.borrow_mut().push(c));
                assert_eq!(evicted, 1);
            }
            chunk.set_block(p.x, p.y, p.z, Block::GRAVEL)
        });

        assert!(changed);
        assert_eq!(attempts.get(), 2);
        assert_eq!(snapshots.into_inner(), vec![coord]);
        assert!(world.is_resident(coord));
        assert_eq!(world.get_block(1, 100, 1), Block::GRAVEL);
        assert!(world.try_get_chunk(coord).unwrap().needs_save());
        assert_eq!(
            world.seam_cache().get(coord).unwrap().height(1, 1),
            Some(SurfaceProfile::scan_column(&world.try_get_chunk(coord).unwrap(), 1, 1))
        );
        cleanup(&world);
    }

    #[test]
    fn test_interior_edit_keeps_blended_edges() {
        let world = temp_world("interior_edit");
        let a = ChunkCoord::new(0, 0, 0);
        let b = ChunkCoord::new(1, 0, 0);
        world.get_or_create_chunk(a);
        world.get_or_create_chunk(b);
        let blended = world.seam_cache().get(a).unwrap();

        assert!(world.set_block(7, 250, 7, Block::STONE));
        let after = world.seam_cache().get(a).unwrap();
        assert_eq!(after.height(7, 7), Some(250));
        assert_eq!(after.edge(Face::East), blended.edge(Face::East));
        assert_eq!(after.edge(Face::East), world.seam_cache().get(b).unwrap().edge(Face::West));

        // A border edit rewrites only its own edge entry.
        assert!(world.set_block(15, 251, 4, Block::STONE));
        let border = world.seam_cache().get(a).unwrap();
        assert_eq!(border.edge(Face::East).unwrap()[4], 251);
        assert_eq!(border.edge(Face::East).unwrap()[5], blended.edge(Face::East).unwrap()[5]);
        cleanup(&world);
    }

    #[test]
    fn test_copy_chunks_to_reuses_buffer() {
        let world = temp_world("copy");
        world.get_or_create_chunk(ChunkCoord::new(0, 0, 0));
        world.get_or_create_chunk(ChunkCoord::new(0, 0, 1));
        let mut out = vec![Arc::new(Chunk::new(ChunkCoord::new(9, 9, 9)))];
        assert_eq!(world.copy_chunks_to(&mut out), 2);
        assert!(out.iter().all(|c| c.coord().y == 0));
        assert_eq!(world.all_chunks().len(), 2);
        cleanup(&world);
    }

    #[test]
    fn test_malformed_file_regenerates() {
        let world = temp_world("malformed");
        let coord = ChunkCoord::new(4, 0, 4);
        world.store().save_bytes(coord, &[1; 100]).unwrap();

        let chunk = world.get_or_create_chunk(coord);
        let expected = world.generator().generate(coord);
        assert_eq!(chunk.to_bytes(), expected.to_bytes());
        assert_eq!(chunk.to_bytes().len(), CHUNK_VOLUME);

        let stats = world.stats();
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.loaded, 0);
        cleanup(&world);
    }

    #[test]
    fn test_diagnostics() {
        let world = temp_world("diag");
        let name = world.biome_name_at(100, -100);
        assert!(["Grassland", "Desert", "Shallows", "Ocean"].contains(&name));
        assert!((0.0..=1.0).contains(&world.desert_weight_at(100, -100)));
        assert!((0.0..=1.0).contains(&world.ocean_weight_at(100, -100)));
        assert_eq!(world.surface_height_at(3, 4), world.column_at(3, 4).carved_surface);
        assert_eq!(world.resident_count(), 0);
    }
}
