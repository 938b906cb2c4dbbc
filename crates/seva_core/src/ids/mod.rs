use rand::Rng;
use time::OffsetDateTime;

const ID_PREFIX: &str = "SEVA";
const SUFFIX_LEN: usize = 6;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Allocate a complaint identifier: `SEVA` + millisecond epoch timestamp +
/// a 6-character random base36 suffix, upper-cased.
///
/// Collisions are possible in principle (same millisecond, same suffix) but
/// treated as negligible here; the ledger optionally re-checks against the
/// live snapshot and regenerates when `verify_unique_ids` is enabled.
pub fn generate_complaint_id(now: OffsetDateTime) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{ID_PREFIX}{millis}{suffix}")
}
