//! Position-as-seed hashing: coordinate hashes, seed mixing, change tokens.
//!
//! Every pseudo-random choice in the crate is derived from an XXH32 digest of
//! a coordinate tuple. There is no generator state: the same coordinates
//! always produce the same value on every platform.

use xxhash_rust::xxh32::{xxh32, Xxh32};

/// Coordinate ordinal reserved for template selection. Pools use `1..=K`.
pub const TEMPLATE_ORDINAL: i32 = 0;

/// Hash a seed and a coordinate tuple to a stable 32-bit value.
///
/// The seed is wrapped to 32 bits and used as the XXH32 seed. Coordinates are
/// fed as little-endian `i32`s in order.
pub fn prompt_hash(seed: u64, coords: &[i32]) -> u32 {
    let mut hasher = Xxh32::new((seed & 0xFFFF_FFFF) as u32);
    for coord in coords {
        hasher.update(&coord.to_le_bytes());
    }
    hasher.digest()
}

/// Map a hash onto `0..pool_size`.
///
/// # Panics
///
/// Panics if `pool_size` is zero. Validated profiles never contain empty
/// pools, so reaching this is a bug in the caller.
pub fn index_of(hash: u32, pool_size: u32) -> usize {
    assert!(pool_size > 0, "index_of called with an empty pool");
    (hash % pool_size) as usize
}

/// Number of seed inputs `mix_seeds` combines.
pub const MIX_SEED_COUNT: usize = 4;

/// Combine up to four seeds into one, order-sensitively.
///
/// Missing trailing seeds count as `0`, so `mix_seeds(&[1])` equals
/// `mix_seeds(&[1, 0, 0, 0])`. All four seeds are always fed as
/// little-endian bytes into a single unseeded XXH32.
///
/// # Panics
///
/// Panics if more than four seeds are given.
pub fn mix_seeds(seeds: &[u32]) -> u32 {
    assert!(
        seeds.len() <= MIX_SEED_COUNT,
        "mix_seeds takes at most {} seeds, got {}",
        MIX_SEED_COUNT,
        seeds.len()
    );
    let mut padded = [0u32; MIX_SEED_COUNT];
    padded[..seeds.len()].copy_from_slice(seeds);

    let mut hasher = Xxh32::new(0);
    for seed in padded {
        hasher.update(&seed.to_le_bytes());
    }
    hasher.digest()
}

/// Unseeded XXH32 of a profile identifier.
pub fn profile_id_hash(profile_id: &str) -> u32 {
    xxh32(profile_id.as_bytes(), 0)
}

/// Fingerprint of a single generation request, for caching layers.
///
/// Two requests with equal tokens may reuse each other's output. Collisions
/// are possible but only matter as a stale cache hit.
pub fn change_token(seed: u32, position_index: u32, profile_id: &str) -> u32 {
    let mixed = seed ^ profile_id_hash(profile_id);
    prompt_hash(
        u64::from(mixed),
        &[position_index as i32, TEMPLATE_ORDINAL],
    )
}

/// Fingerprint of a batch request starting at `start_index`.
pub fn batch_change_token(seed: u32, start_index: u32, count: u32, profile_id: &str) -> u32 {
    let mixed = seed ^ profile_id_hash(profile_id);
    prompt_hash(u64::from(mixed), &[start_index as i32, count as i32])
}
