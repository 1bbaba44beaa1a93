//! Serde helpers for request payloads.
//!
//! Select boxes and date inputs submit `""` when nothing is chosen; these
//! helpers read that as `None` instead of failing the whole payload.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

fn non_blank<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.filter(|s| !s.trim().is_empty()))
}

/// Deserialize an optional UUID, treating empty strings as None.
pub fn optional_uuid<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| Uuid::parse_str(s.trim()).map_err(serde::de::Error::custom))
        .transpose()
}

/// Deserialize an optional NaiveDate (YYYY-MM-DD), treating empty strings as None.
pub fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(serde::de::Error::custom))
        .transpose()
}

/// Deserialize an optional NaiveTime (HH:MM or HH:MM:SS), treating empty strings as None.
pub fn optional_time<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
where
    D: Deserializer<'de>,
{
    non_blank(deserializer)?
        .map(|s| {
            NaiveTime::parse_from_str(s.trim(), "%H:%M")
                .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
                .map_err(serde::de::Error::custom)
        })
        .transpose()
}
