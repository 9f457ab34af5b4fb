//! Percentage rollout.
//!
//! A user id hashes (BLAKE3, first 128 bits) to a bucket in `0..100`; the user is in the
//! rollout when the bucket is below the percentage. Buckets never depend on the
//! percentage, so raising it only ever adds users.

/// Bucket of a user id, stable across calls and processes.
pub fn bucket(user_id: &str) -> u8 {
    let hash = blake3::hash(user_id.as_bytes());
    let mut prefix = [0u8; 16];
    prefix.copy_from_slice(&hash.as_bytes()[..16]);
    (u128::from_be_bytes(prefix) % 100) as u8
}

/// Whether `user_id` falls inside a rollout of `percentage` (clamped to 100).
///
/// Without a user id only a full rollout applies.
pub fn in_rollout(user_id: Option<&str>, percentage: u8) -> bool {
    let percentage = percentage.min(100);
    match user_id {
        Some(id) => bucket(id) < percentage,
        None => percentage >= 100,
    }
}
