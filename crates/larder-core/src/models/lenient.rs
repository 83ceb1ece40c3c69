//! Forgiving decoders for numeric fields written by other clients
//!
//! Clients that store numbers as doubles may write `2.5` servings or
//! `12.5` minutes. Such values are rounded to the nearest whole number and
//! clamped into `u32` instead of rejecting the record.

use serde::{Deserialize, Deserializer};

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_whole(value: f64) -> u32 {
    // `as` saturates: negatives become 0, huge values u32::MAX
    value.round() as u32
}

/// Any JSON number as a whole `u32`
pub(crate) fn whole<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    f64::deserialize(deserializer).map(to_whole)
}

/// Optional JSON number as a whole `u32`; `null` stays `None`
pub(crate) fn optional_whole<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.map(to_whole))
}
