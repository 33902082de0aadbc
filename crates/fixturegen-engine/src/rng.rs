use std::sync::atomic::{AtomicU64, Ordering};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Version of the key mixing function. Bump whenever the derivation
/// changes so frozen seeds can detect incompatible output.
pub const CASCADE_VERSION: u32 = 1;

/// How substream seeds are derived from the master seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngMode {
    /// Key-derived substreams: output is a pure function of
    /// `(seed, model_id, field_path, item_index)` regardless of call
    /// order, thread, or platform.
    Portable,
    /// Sequential counter-derived streams kept for backward
    /// compatibility; reproducible only for an identical call order
    /// within one process.
    Legacy,
}

/// Deterministic substream generator.
///
/// Each field-generation call requests its own substream and owns it
/// exclusively; substreams are never reused across calls, so
/// independent instances can be generated out of order or in
/// parallel without perturbing each other.
#[derive(Debug)]
pub struct SeedCascade {
    seed: u64,
    mode: RngMode,
    legacy_counter: AtomicU64,
}

impl SeedCascade {
    pub fn new(seed: u64, mode: RngMode) -> Self {
        Self {
            seed,
            mode,
            legacy_counter: AtomicU64::new(0),
        }
    }

    pub fn mode(&self) -> RngMode {
        self.mode
    }

    /// Substream for one `(model, field, item)` generation call.
    pub fn substream(&self, model_id: &str, field_path: &str, item_index: u64) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive(model_id, field_path, item_index, 0))
    }

    /// Fresh substream for a validator-driven regeneration attempt.
    /// Attempt 0 is the original stream.
    pub fn retry_substream(
        &self,
        model_id: &str,
        field_path: &str,
        item_index: u64,
        attempt: u32,
    ) -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(self.derive(model_id, field_path, item_index, attempt))
    }

    /// Dedicated stream for a field's null-presence draw, separate
    /// from the value stream so suppressing a value never shifts the
    /// randomness its siblings or its own retries consume.
    pub fn presence_stream(&self, model_id: &str, field_path: &str, item_index: u64) -> ChaCha8Rng {
        let mut hash = self.fold_key(model_id, field_path, item_index, 0);
        hash ^= 0x70_6e_6f_6e_65; // "pnone"
        ChaCha8Rng::seed_from_u64(splitmix64(hash))
    }

    fn derive(&self, model_id: &str, field_path: &str, item_index: u64, attempt: u32) -> u64 {
        splitmix64(self.fold_key(model_id, field_path, item_index, attempt))
    }

    fn fold_key(&self, model_id: &str, field_path: &str, item_index: u64, attempt: u32) -> u64 {
        match self.mode {
            RngMode::Portable => {
                let mut hash = self.seed ^ u64::from(CASCADE_VERSION);
                hash = fnv1a(hash, model_id.as_bytes());
                hash = fnv1a(hash, field_path.as_bytes());
                hash ^= item_index.wrapping_mul(0x9e37_79b9_7f4a_7c15);
                hash ^= u64::from(attempt) << 32;
                hash
            }
            RngMode::Legacy => {
                let ticket = self.legacy_counter.fetch_add(1, Ordering::Relaxed);
                self.seed
                    .wrapping_add(ticket)
                    .wrapping_add(u64::from(attempt))
            }
        }
    }
}

fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    hash ^= 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x1000_0000_1b3);
    }
    hash
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}
