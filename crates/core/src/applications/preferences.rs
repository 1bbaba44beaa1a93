//! Which trips a leader applicant wants, or is willing, to lead.

use std::collections::HashMap;

use uuid::Uuid;

use crate::trips::{Trip, TripTemplate};

use super::LeaderSupplement;

fn with_triptypes<'a>(
    trips: &'a [Trip],
    templates: &[TripTemplate],
) -> impl Iterator<Item = (&'a Trip, Uuid)> {
    let triptypes: HashMap<Uuid, Uuid> = templates.iter().map(|t| (t.id, t.triptype)).collect();
    trips
        .iter()
        .filter_map(move |trip| triptypes.get(&trip.template).map(|tt| (trip, *tt)))
}

/// Trips in a preferred section with a preferred trip type.
pub fn preferred_trips<'a>(
    supplement: &LeaderSupplement,
    trips: &'a [Trip],
    templates: &[TripTemplate],
) -> Vec<&'a Trip> {
    with_triptypes(trips, templates)
        .filter(|(trip, triptype)| {
            supplement.preferred_sections.contains(&trip.section)
                && supplement.preferred_triptypes.contains(triptype)
        })
        .map(|(trip, _)| trip)
        .collect()
}

/// Every combination of preferred or available sections and trip types,
/// excluding the preferred trips.
pub fn available_trips<'a>(
    supplement: &LeaderSupplement,
    trips: &'a [Trip],
    templates: &[TripTemplate],
) -> Vec<&'a Trip> {
    let preferred: Vec<Uuid> = preferred_trips(supplement, trips, templates)
        .iter()
        .map(|t| t.id)
        .collect();
    let section_ok = |section: &Uuid| {
        supplement.preferred_sections.contains(section)
            || supplement.available_sections.contains(section)
    };
    let triptype_ok = |triptype: &Uuid| {
        supplement.preferred_triptypes.contains(triptype)
            || supplement.available_triptypes.contains(triptype)
    };

    with_triptypes(trips, templates)
        .filter(|(trip, triptype)| section_ok(&trip.section) && triptype_ok(triptype))
        .filter(|(trip, _)| !preferred.contains(&trip.id))
        .map(|(trip, _)| trip)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_and_available_trips() {
        let (pref_section, avail_section, other_section) =
            (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let (pref_type, avail_type) = (Uuid::new_v4(), Uuid::new_v4());

        let hiking = TripTemplate::new(2024, 1, pref_type, 8);
        let canoe = TripTemplate::new(2024, 2, avail_type, 8);
        let templates = vec![hiking.clone(), canoe.clone()];

        let t1 = Trip::new(2024, hiking.id, pref_section);
        let t2 = Trip::new(2024, canoe.id, pref_section);
        let t3 = Trip::new(2024, hiking.id, avail_section);
        let t4 = Trip::new(2024, hiking.id, other_section);
        let trips = vec![t1.clone(), t2.clone(), t3.clone(), t4];

        let supplement = LeaderSupplement {
            preferred_sections: vec![pref_section],
            available_sections: vec![avail_section],
            preferred_triptypes: vec![pref_type],
            available_triptypes: vec![avail_type],
            ..Default::default()
        };

        let preferred: Vec<Uuid> = preferred_trips(&supplement, &trips, &templates)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(preferred, vec![t1.id]);

        let available: Vec<Uuid> = available_trips(&supplement, &trips, &templates)
            .iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(available, vec![t2.id, t3.id]);
    }

    #[test]
    fn test_no_preferences_means_no_trips() {
        let template = TripTemplate::new(2024, 1, Uuid::new_v4(), 8);
        let trips = vec![Trip::new(2024, template.id, Uuid::new_v4())];
        let supplement = LeaderSupplement::default();
        assert!(preferred_trips(&supplement, &trips, &[template.clone()]).is_empty());
        assert!(available_trips(&supplement, &trips, &[template]).is_empty());
    }
}
