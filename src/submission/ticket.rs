use chrono::{DateTime, FixedOffset};
use rand::Rng;

const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 6;

/// Support ticket number, `TKT-<YYYYMMDD>-<6 uppercase alnum>`.
/// The date is taken in the site's local offset.
pub fn generate(now: &DateTime<FixedOffset>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("TKT-{}-{suffix}", now.format("%Y%m%d"))
}
