//! Derived views over scheduled trips.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::matrix::OrderedMatrix;
use crate::transport::Stop;

use super::{Section, Trip, TripTemplate};

/// Template x section grid of scheduled trips.
pub type TripMatrix = OrderedMatrix<Uuid, Uuid, Option<Trip>>;

/// Display label of a trip, e.g. `A12`.
pub fn trip_label(section: &Section, template: &TripTemplate) -> String {
    format!("{}{}", section.name, template.name)
}

/// Orders trips by section name, then template name.
pub fn trip_sort_key(section: &Section, template: &TripTemplate) -> String {
    format!("{}{:03}", section.name, template.name)
}

/// The transport dates of a trip, fixed by its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TripDates {
    pub dropoff: NaiveDate,
    pub pickup: NaiveDate,
    pub return_to_campus: NaiveDate,
}

impl TripDates {
    pub fn for_section(section: &Section) -> Self {
        Self {
            dropoff: section.at_campsite1(),
            pickup: section.arrive_at_lodge(),
            return_to_campus: section.return_to_campus(),
        }
    }
}

/// The routes a trip actually rides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EffectiveRoutes {
    pub dropoff: Option<Uuid>,
    pub pickup: Option<Uuid>,
    pub return_route: Option<Uuid>,
}

impl EffectiveRoutes {
    /// Trip overrides win; otherwise the stop's route, or the template's
    /// return route.
    pub fn resolve(
        trip: &Trip,
        template: &TripTemplate,
        dropoff_stop: Option<&Stop>,
        pickup_stop: Option<&Stop>,
    ) -> Self {
        Self {
            dropoff: trip
                .dropoff_route
                .or_else(|| dropoff_stop.and_then(|s| s.route)),
            pickup: trip
                .pickup_route
                .or_else(|| pickup_stop.and_then(|s| s.route)),
            return_route: trip.return_route.or(template.return_route),
        }
    }
}

/// Builds the trip matrix. Rows and columns follow the order of the
/// given templates and sections.
pub fn trip_matrix(templates: &[TripTemplate], sections: &[Section], trips: &[Trip]) -> TripMatrix {
    let mut matrix = OrderedMatrix::new(
        templates.iter().map(|t| t.id).collect(),
        sections.iter().map(|s| s.id).collect(),
        || None,
    );
    for trip in trips {
        matrix.set(&trip.template, &trip.section, Some(trip.clone()));
    }
    matrix
}

/// Every section paired with the trip scheduled for `template` in it, if any.
pub fn sections_for_template<'a>(
    template: Uuid,
    sections: &'a [Section],
    trips: &[Trip],
) -> Vec<(&'a Section, Option<Trip>)> {
    let by_section: HashMap<Uuid, &Trip> = trips
        .iter()
        .filter(|t| t.template == template)
        .map(|t| (t.section, t))
        .collect();

    sections
        .iter()
        .map(|section| (section, by_section.get(&section.id).map(|t| (*t).clone())))
        .collect()
}

/// The trips staying at a campsite on one night.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CampsiteNight {
    pub date: NaiveDate,
    pub trips: Vec<Uuid>,
    /// Sum of `max_trippees` over the resident trips.
    pub num_people: u32,
}

/// Occupancy of a campsite for every camping date of the year.
pub fn campsite_occupancy(
    campsite: Uuid,
    sections: &[Section],
    templates: &[TripTemplate],
    trips: &[Trip],
) -> Vec<CampsiteNight> {
    let mut nights: BTreeMap<NaiveDate, CampsiteNight> = sections
        .iter()
        .flat_map(|s| s.nights_camping())
        .map(|date| {
            (
                date,
                CampsiteNight {
                    date,
                    trips: Vec::new(),
                    num_people: 0,
                },
            )
        })
        .collect();

    let sections: HashMap<Uuid, &Section> = sections.iter().map(|s| (s.id, s)).collect();
    let templates: HashMap<Uuid, &TripTemplate> = templates.iter().map(|t| (t.id, t)).collect();

    for trip in trips {
        let (Some(section), Some(template)) =
            (sections.get(&trip.section), templates.get(&trip.template))
        else {
            continue;
        };
        let stays = [
            (template.campsite1, section.at_campsite1()),
            (template.campsite2, section.at_campsite2()),
        ];
        for (site, date) in stays {
            if site != campsite {
                continue;
            }
            if let Some(night) = nights.get_mut(&date) {
                night.trips.push(trip.id);
                night.num_people += template.max_trippees;
            }
        }
    }

    nights.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Stop;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, day).unwrap()
    }

    #[test]
    fn test_trip_label_and_dates() {
        let section = Section::new(2024, "B", date(10));
        let template = TripTemplate::new(2024, 12, Uuid::new_v4(), 8);
        assert_eq!(trip_label(&section, &template), "B12");
        assert_eq!(trip_sort_key(&section, &template), "B012");

        let dates = TripDates::for_section(&section);
        assert_eq!(dates.dropoff, date(12));
        assert_eq!(dates.pickup, date(14));
        assert_eq!(dates.return_to_campus, date(15));
    }

    #[test]
    fn test_effective_routes_prefer_overrides() {
        let stop_route = Uuid::new_v4();
        let template_return = Uuid::new_v4();
        let override_route = Uuid::new_v4();

        let mut stop = Stop::new(2024, "Lyme", 10);
        stop.route = Some(stop_route);
        let template = TripTemplate::new(2024, 1, Uuid::new_v4(), 8)
            .with_return_route(template_return);
        let mut trip = Trip::new(2024, template.id, Uuid::new_v4());

        let routes = EffectiveRoutes::resolve(&trip, &template, Some(&stop), Some(&stop));
        assert_eq!(routes.dropoff, Some(stop_route));
        assert_eq!(routes.pickup, Some(stop_route));
        assert_eq!(routes.return_route, Some(template_return));

        trip.pickup_route = Some(override_route);
        trip.return_route = Some(override_route);
        let routes = EffectiveRoutes::resolve(&trip, &template, Some(&stop), Some(&stop));
        assert_eq!(routes.dropoff, Some(stop_route));
        assert_eq!(routes.pickup, Some(override_route));
        assert_eq!(routes.return_route, Some(override_route));
    }

    #[test]
    fn test_trip_matrix_places_trips() {
        let a = Section::new(2024, "A", date(10));
        let b = Section::new(2024, "B", date(12));
        let t1 = TripTemplate::new(2024, 1, Uuid::new_v4(), 8);
        let t2 = TripTemplate::new(2024, 2, Uuid::new_v4(), 8);
        let trip = Trip::new(2024, t2.id, b.id);

        let matrix = trip_matrix(&[t1.clone(), t2.clone()], &[a.clone(), b.clone()], &[trip.clone()]);
        assert_eq!(matrix.get(&t2.id, &b.id), Some(&Some(trip)));
        assert_eq!(matrix.get(&t1.id, &a.id), Some(&None));
        assert_eq!(matrix.rows(), &[t1.id, t2.id]);

        let sections = [a, b];
        let pairs = sections_for_template(t1.id, &sections, &[]);
        assert!(pairs.iter().all(|(_, trip)| trip.is_none()));
    }

    #[test]
    fn test_campsite_occupancy() {
        let site = Uuid::new_v4();
        let other = Uuid::new_v4();
        let a = Section::new(2024, "A", date(10));
        let b = Section::new(2024, "B", date(11));
        let first = TripTemplate::new(2024, 1, Uuid::new_v4(), 8).with_campsites(site, other);
        let second = TripTemplate::new(2024, 2, Uuid::new_v4(), 6).with_campsites(other, site);
        let t1 = Trip::new(2024, first.id, a.id);
        let t2 = Trip::new(2024, second.id, a.id);
        let t3 = Trip::new(2024, first.id, b.id);

        let nights = campsite_occupancy(
            site,
            &[a, b],
            &[first, second],
            &[t1.clone(), t2.clone(), t3.clone()],
        );
        // A camps on the 12th and 13th, B on the 13th and 14th
        let dates: Vec<_> = nights.iter().map(|n| n.date).collect();
        assert_eq!(dates, vec![date(12), date(13), date(14)]);

        assert_eq!(nights[0].trips, vec![t1.id]);
        assert_eq!(nights[0].num_people, 8);
        assert_eq!(nights[1].trips, vec![t2.id, t3.id]);
        assert_eq!(nights[1].num_people, 14);
        assert!(nights[2].trips.is_empty());
    }
}
