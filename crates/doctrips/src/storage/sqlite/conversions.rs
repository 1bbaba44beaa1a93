//! Row conversion helpers.
//!
//! Converts between SQLite rows and the types in `doctrips_core`.

use rusqlite::types::Type;
use rusqlite::Row;
use serde_json::{json, Value};
use uuid::Uuid;

use doctrips_core::permissions::{Group, User};
use doctrips_core::record::{OnDelete, RecordKind, Reference, StoredRecord};
use doctrips_core::timetable::Timetable;
use doctrips_core::years::TripsYear;

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

/// Convert a row to a StoredRecord.
///
/// Expected columns: id, kind, trips_year, label, sort_key, unique_key,
/// references_json, data
pub fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let id: String = row.get(0)?;
    let kind: String = row.get(1)?;
    let trips_year: i32 = row.get(2)?;
    let label: String = row.get(3)?;
    let sort_key: String = row.get(4)?;
    let unique_key: Option<String> = row.get(5)?;
    let references: String = row.get(6)?;
    let data: String = row.get(7)?;

    Ok(StoredRecord {
        kind: parse_kind(&kind, 1)?,
        id: parse_uuid(&id, 0)?,
        trips_year,
        label,
        sort_key,
        unique_key,
        references: json_to_references(&references)
            .map_err(|e| conversion_error(6, e))?,
        data: parse_json(&data, 7)?,
    })
}

/// Convert a row to a User.
///
/// Expected columns: id, netid, name, email, is_superuser, groups_json
pub fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let groups: String = row.get(5)?;
    let groups: Vec<Group> =
        serde_json::from_str(&groups).map_err(|e| conversion_error(5, e.to_string()))?;

    Ok(User {
        id: parse_uuid(&id, 0)?,
        netid: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        is_superuser: row.get(4)?,
        groups,
    })
}

/// Convert a row to a TripsYear.
///
/// Expected columns: year, is_current
pub fn row_to_year(row: &Row<'_>) -> rusqlite::Result<TripsYear> {
    Ok(TripsYear::new(row.get(0)?, row.get(1)?))
}

/// Convert a single `data` column to a Timetable.
pub fn row_to_timetable(row: &Row<'_>) -> rusqlite::Result<Timetable> {
    let data: String = row.get(0)?;
    serde_json::from_str(&data).map_err(|e| conversion_error(0, e.to_string()))
}

/// Serializes references for the `references_json` column.
pub fn references_to_json(references: &[Reference]) -> String {
    Value::Array(
        references
            .iter()
            .map(|r| {
                json!({
                    "kind": r.kind.as_str(),
                    "target": r.target,
                    "field": r.field,
                    "on_delete": r.on_delete.as_str(),
                })
            })
            .collect(),
    )
    .to_string()
}

/// Parses the `references_json` column.
pub fn json_to_references(raw: &str) -> Result<Vec<Reference>, String> {
    let values: Vec<Value> = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    values
        .iter()
        .map(|value| {
            let text = |key: &str| {
                value
                    .get(key)
                    .and_then(Value::as_str)
                    .ok_or_else(|| format!("reference is missing {key}"))
            };
            let kind = text("kind")?;
            let on_delete = text("on_delete")?;
            Ok(Reference {
                kind: RecordKind::parse(kind).ok_or_else(|| format!("unknown kind: {kind}"))?,
                target: Uuid::parse_str(text("target")?).map_err(|e| e.to_string())?,
                field: text("field")?.to_string(),
                on_delete: OnDelete::parse(on_delete)
                    .ok_or_else(|| format!("unknown on_delete: {on_delete}"))?,
            })
        })
        .collect()
}

fn parse_kind(s: &str, idx: usize) -> rusqlite::Result<RecordKind> {
    RecordKind::parse(s).ok_or_else(|| conversion_error(idx, format!("unknown record kind: {s}")))
}

fn parse_uuid(s: &str, idx: usize) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_json(s: &str, idx: usize) -> rusqlite::Result<Value> {
    serde_json::from_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_references_survive_the_json_column() {
        let references = vec![
            Reference::protect(RecordKind::Vehicle, Uuid::new_v4(), "/vehicle"),
            Reference::new(
                RecordKind::Croo,
                Uuid::new_v4(),
                "/croo_supplement/assigned_croo",
                OnDelete::SetNull,
            ),
        ];
        let raw = references_to_json(&references);
        assert_eq!(json_to_references(&raw).unwrap(), references);
    }

    #[test]
    fn test_json_to_references_rejects_unknown_kind() {
        let raw = format!(
            r#"[{{"kind":"spaceship","target":"{}","field":"/x","on_delete":"PROTECT"}}]"#,
            Uuid::new_v4()
        );
        let err = json_to_references(&raw).unwrap_err();
        assert!(err.contains("spaceship"));
    }

    #[test]
    fn test_json_to_references_empty() {
        assert!(json_to_references("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_uuid_invalid() {
        assert!(parse_uuid("not-a-uuid", 0).is_err());
    }
}
