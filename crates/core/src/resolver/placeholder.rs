//! Deterministic last-resort media selection.

use sha2::{Digest, Sha256};

/// Public sample videos used when no discovery API produced a source.
pub const DEFAULT_PLACEHOLDERS: &[&str] = &[
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ElephantsDream.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerBlazes.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerEscapes.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerFun.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerJoyrides.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/ForBiggerMeltdowns.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/Sintel.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/SubaruOutbackOnStreetAndDirt.mp4",
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/TearsOfSteel.mp4",
];

/// Index into a pool of `pool_len` entries for `(title, episode)`.
///
/// SHA-256 of `"{title}{episode}"`, first eight bytes read big-endian,
/// modulo the pool size. Stable across processes and platforms.
pub fn placeholder_index(title: &str, episode: u32, pool_len: usize) -> usize {
    if pool_len == 0 {
        return 0;
    }
    let digest = Sha256::digest(format!("{}{}", title, episode).as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(prefix) % pool_len as u64) as usize
}

/// Placeholder for `(title, episode)`, or `None` for an empty pool.
pub fn select_placeholder<'a>(pool: &'a [String], title: &str, episode: u32) -> Option<&'a str> {
    pool.get(placeholder_index(title, episode, pool.len()))
        .map(String::as_str)
}
