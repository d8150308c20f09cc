// ============================================================
// Layer 4: Seeded Sampling
// ============================================================
// Every random choice in a run goes through here, so a fixed
// seed reproduces a run byte for byte.
//
// Each example gets its OWN generator, derived from the run
// seed and the example's position in the input:
//
//   example_rng(seed, 0)  ─▶ StdRng #0
//   example_rng(seed, 1)  ─▶ StdRng #1
//   ...
//
// so an example's draws never depend on how many draws the
// examples before it made, or on which worker handles it.
//
// Sampling within one example is WITHOUT replacement:
// asking for n substitutes never yields the same candidate
// twice.
//
// Reference: rand crate documentation (SliceRandom, SeedableRng)

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// SplitMix64 finaliser, spreads nearby (seed, index) pairs apart
fn mix(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Generator for the example at position `index` in a run seeded with `seed`
pub fn example_rng(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(mix(seed ^ mix(index as u64)))
}

/// Pick up to `n` distinct items uniformly at random.
///
/// Returns fewer than `n` when fewer are available (possibly none).
/// The result keeps the order in which items were drawn.
pub fn sample_without_replacement<'a, T, R>(items: &'a [T], n: usize, rng: &mut R) -> Vec<&'a T>
where
    R: rand::Rng + ?Sized,
{
    items.choose_multiple(rng, n.min(items.len())).collect()
}
