//! Copying reusable records into the next trips year.
//!
//! Stops, routes, templates and the like rarely change from one season to the
//! next, so they are cloned into the new year with fresh ids. References are
//! rewritten through an old-to-new id map, which is why kinds are processed
//! in dependency order.

use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

use crate::applications::GeneralApplication;
use crate::incoming::{IncomingStudent, Registration};
use crate::record::{OnDelete, Record, RecordKind, StoredRecord};

use super::ForwardError;

/// Kinds copied into the next year, in dependency order.
pub const FORWARD_ORDER: [RecordKind; 12] = [
    RecordKind::Vehicle,
    RecordKind::Route,
    RecordKind::Stop,
    RecordKind::TransportConfig,
    RecordKind::TripType,
    RecordKind::Campsite,
    RecordKind::TripTemplate,
    RecordKind::Croo,
    RecordKind::IncomingSettings,
    RecordKind::ApplicationInfo,
    RecordKind::PortalContent,
    RecordKind::RaidInfo,
];

/// Copies `records` into `next_year`.
///
/// `records` must be ordered so every reference target comes before the
/// records pointing at it (see [`FORWARD_ORDER`]).
pub fn forward_records(
    records: &[StoredRecord],
    next_year: i32,
) -> Result<Vec<StoredRecord>, ForwardError> {
    let mut ids: HashMap<Uuid, Uuid> = HashMap::new();
    let mut copies = Vec::with_capacity(records.len());

    for record in records {
        let new_id = Uuid::new_v4();
        let mut copy = record.clone();
        copy.id = new_id;
        copy.trips_year = next_year;
        set_field(&mut copy, "/id", Value::String(new_id.to_string()))?;
        set_field(&mut copy, "/trips_year", Value::from(next_year))?;

        for reference in copy.references.iter_mut() {
            if reference.on_delete == OnDelete::Remove {
                return Err(ForwardError::ManyToManyUnsupported {
                    kind: record.kind,
                    field: reference.field.clone(),
                });
            }
            let target = *ids
                .get(&reference.target)
                .ok_or(ForwardError::MissingReference {
                    kind: record.kind,
                    id: reference.target,
                })?;
            let slot = copy.data.pointer_mut(&reference.field).ok_or_else(|| {
                ForwardError::MalformedDocument {
                    kind: record.kind,
                    reason: format!("missing field {}", reference.field),
                }
            })?;
            *slot = Value::String(target.to_string());
            reference.target = target;
        }

        if let Some(key) = copy.unique_key.as_mut() {
            for (old, new) in &ids {
                *key = key.replace(&old.to_string(), &new.to_string());
            }
        }

        ids.insert(record.id, new_id);
        copies.push(copy);
    }

    Ok(copies)
}

/// Kinds holding health information that is erased from a retired year.
pub const MEDICAL_KINDS: [RecordKind; 3] = [
    RecordKind::IncomingStudent,
    RecordKind::Registration,
    RecordKind::Application,
];

/// Returns copies of `records` with their medical information blanked.
///
/// Records of kinds outside [`MEDICAL_KINDS`] are passed through unchanged.
pub fn scrub_medical_info(records: &[StoredRecord]) -> Result<Vec<StoredRecord>, ForwardError> {
    records
        .iter()
        .map(|record| match record.kind {
            RecordKind::IncomingStudent => {
                scrub::<IncomingStudent>(record, IncomingStudent::clear_medical_info)
            }
            RecordKind::Registration => scrub::<Registration>(record, Registration::clear_medical_info),
            RecordKind::Application => {
                scrub::<GeneralApplication>(record, GeneralApplication::clear_medical_info)
            }
            _ => Ok(record.clone()),
        })
        .collect()
}

fn scrub<T: Record>(record: &StoredRecord, clear: fn(&mut T)) -> Result<StoredRecord, ForwardError> {
    let malformed = |e: crate::storage::RepositoryError| ForwardError::MalformedDocument {
        kind: record.kind,
        reason: e.to_string(),
    };
    let mut value: T = record.decode().map_err(malformed)?;
    clear(&mut value);
    StoredRecord::encode(&value).map_err(malformed)
}

fn set_field(record: &mut StoredRecord, pointer: &str, value: Value) -> Result<(), ForwardError> {
    let kind = record.kind;
    let slot = record
        .data
        .pointer_mut(pointer)
        .ok_or_else(|| ForwardError::MalformedDocument {
            kind,
            reason: format!("missing field {pointer}"),
        })?;
    *slot = value;
    Ok(())
}
