//! # Streaming Integration Tests
//!
//! Walks a viewer through the world and checks residency, eviction and
//! persistence end to end.

use std::path::PathBuf;

use strata_terrain::{Material, WorldSeed};
use strata_world::{ChunkCoord, ChunkStore, StoreConfig, WorldPos};

fn temp_save_dir() -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("test_streaming_{id}"))
}

/// Test: Leaving and returning regenerates an unedited chunk identically.
#[test]
fn test_far_viewer_evicts_and_return_regenerates() {
    let store = ChunkStore::new(WorldSeed::new(42), StoreConfig::test()).unwrap();
    let origin = ChunkCoord::new(0, 0, 0);

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    let before = store.with_chunk(origin, |chunk| chunk.blocks().to_vec()).unwrap();

    store.update([10_000.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    assert!(store.loaded_chunks().iter().all(|h| h.coord() != origin));
    assert!(store.get_block(WorldPos::new(0, 0, 0)).is_none());

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    let after = store.with_chunk(origin, |chunk| chunk.blocks().to_vec()).unwrap();
    assert!(before == after, "Regenerated chunk differs");
}

/// Test: An edit survives eviction when a save directory is configured.
#[test]
fn test_edit_survives_evict_and_reload() {
    let dir = temp_save_dir();
    let config = StoreConfig::test().with_save_directory(&dir);
    let store = ChunkStore::new(WorldSeed::new(42), config).unwrap();
    let pos = WorldPos::new(5, 200, -7);

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    store.set_block(pos, Material::Stone);
    assert_eq!(store.get_block(pos).map(|b| b.material()), Some(Material::Stone));

    let report = store.update([10_000.0, 70.0, 10_000.0], 0.05);
    assert_eq!(report.saved, 1, "Only the edited chunk should be saved: {report:?}");
    assert!(dir.join("chunk_0_0_-1.dat").exists());
    assert!(!dir.join("chunk_0_0_0.dat").exists());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 1);
    assert!(store.get_block(pos).is_none());

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    assert_eq!(store.get_block(pos).map(|b| b.material()), Some(Material::Stone));
    assert_eq!(store.stats().restored_this_session, 1);

    // Restored chunks start clean
    let chunk = store.get_chunk(pos.chunk()).unwrap();
    assert!(!chunk.read().is_dirty());

    let _ = std::fs::remove_dir_all(&dir);
}

/// Test: Clean chunks are never written, and regenerate on return.
#[test]
fn test_clean_chunks_are_not_saved_on_eviction() {
    let dir = temp_save_dir();
    let config = StoreConfig::test().with_save_directory(&dir);
    let store = ChunkStore::new(WorldSeed::new(42), config).unwrap();

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();

    let report = store.update([10_000.0, 70.0, 10_000.0], 0.05);
    store.flush_generation_queue();
    assert_eq!(report.evicted, 13);
    assert_eq!(report.saved, 0);
    assert!(std::fs::read_dir(&dir).map_or(true, |entries| entries.count() == 0));
    let generated = store.stats().generated_this_session;

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    let stats = store.stats();
    assert_eq!(stats.restored_this_session, 0);
    assert_eq!(stats.generated_this_session, generated + 13);

    let _ = std::fs::remove_dir_all(&dir);
}

/// Test: Without a save directory, evicted edits are gone on return.
#[test]
fn test_edit_lost_without_save_directory() {
    let store = ChunkStore::new(WorldSeed::new(42), StoreConfig::test()).unwrap();
    let pos = WorldPos::new(2, 250, 2);

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    store.set_block(pos, Material::Glass);

    let report = store.update([10_000.0, 70.0, 0.0], 0.05);
    assert_eq!(report.saved, 0);

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    assert_eq!(store.get_block(pos).map(|b| b.material()), Some(Material::Air));
}

/// Test: Walking in a straight line keeps the resident set bounded.
#[test]
fn test_walk_keeps_resident_set_bounded() {
    let store = ChunkStore::new(WorldSeed::new(7), StoreConfig::test()).unwrap();

    let mut x = 0.0f32;
    for step in 0..40 {
        x += 16.0;
        store.update([x, 70.0, -x * 0.5], 0.05);
        if step % 4 == 0 {
            store.flush_generation_queue();
        }

        // Everything within the unload radius (4): at most 49 grid points
        assert!(store.resident_count() <= 49, "Resident set grew to {}", store.resident_count());
    }
    store.flush_generation_queue();

    let stats = store.stats();
    assert!(stats.evicted_this_session > 0);
    assert_eq!(stats.pending_generation, 0);

    // Ground under the viewer
    let viewer = WorldPos::from_viewer([x, 0.0, -x * 0.5]);
    assert_eq!(
        store.get_block(viewer).map(|b| b.material()),
        Some(Material::Bedrock)
    );
}

/// Test: `save_dirty` writes every edited resident chunk.
#[test]
fn test_save_dirty_writes_edited_chunks() {
    let dir = temp_save_dir();
    let store =
        ChunkStore::new(WorldSeed::new(9), StoreConfig::test().with_save_directory(&dir)).unwrap();

    store.update([0.0, 70.0, 0.0], 0.05);
    store.flush_generation_queue();
    store.set_block(WorldPos::new(0, 120, 0), Material::Wood);
    store.set_block(WorldPos::new(17, 120, 0), Material::Wood);
    store.set_block(WorldPos::new(18, 121, 0), Material::Leaves);

    assert_eq!(store.save_dirty(), 2);
    assert_eq!(store.save_dirty(), 0);
    assert!(dir.join("chunk_0_0_0.dat").exists());
    assert!(dir.join("chunk_1_0_0.dat").exists());

    let _ = std::fs::remove_dir_all(&dir);
}
