//! Step-instance fingerprinting
//!
//! Every interactive button rendered while a step is active is stamped with a
//! checksum of (scene, step, step entry time). A button pressed after the step
//! was re-entered carries a stale stamp and is rejected by the callback
//! filter. This is a freshness check, not a security token.

use chrono::{DateTime, Utc};

/// CRC-32 over `"{scene}:{step}:{entered_at-epoch-millis}"`, as a signed
/// 32-bit value.
pub fn fingerprint(scene: &str, step: &str, entered_at: DateTime<Utc>) -> i32 {
    let input = format!("{scene}:{step}:{}", entered_at.timestamp_millis());
    crc32fast::hash(input.as_bytes()) as i32
}

pub fn validate_fingerprint(
    hash: i32,
    scene: &str,
    step: &str,
    entered_at: DateTime<Utc>,
) -> bool {
    hash == fingerprint(scene, step, entered_at)
}
