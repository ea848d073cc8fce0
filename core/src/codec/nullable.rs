//! Deserializers for numbers that JSON writers emit as `null`.
//!
//! `serde_json` writes NaN and the infinities as `null`. These read `null`
//! back as NaN so such a record still loads; integer element types later
//! cast NaN to 0.

use serde::de::Error;
use serde::{Deserialize, Deserializer};

pub(crate) fn f64_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

pub(crate) fn f64_seq<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    let values = Vec::<Option<f64>>::deserialize(deserializer)?;
    Ok(values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
}

pub(crate) fn f32_array<'de, D, const N: usize>(deserializer: D) -> Result<[f32; N], D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Option<f32>>::deserialize(deserializer)?;
    let len = values.len();
    let values: Vec<f32> = values.into_iter().map(|v| v.unwrap_or(f32::NAN)).collect();
    values
        .try_into()
        .map_err(|_| D::Error::invalid_length(len, &format!("{N} numbers").as_str()))
}
