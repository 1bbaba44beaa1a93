//! Choosing the next application to grade, and grading progress.

use std::collections::{HashMap, HashSet};

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ApplicationError, ApplicationStatus, CrooGrade, GeneralApplication, LeaderGrade};

/// Times each leader application should be graded.
pub const NUMBER_OF_LEADER_GRADES: usize = 2;

/// Times each croo application should be graded.
pub const NUMBER_OF_CROO_GRADES: usize = 3;

/// Common view of leader and croo grades.
pub trait Grade {
    fn application(&self) -> Uuid;
    fn grader(&self) -> Uuid;
}

impl Grade for LeaderGrade {
    fn application(&self) -> Uuid {
        self.application
    }

    fn grader(&self) -> Uuid {
        self.grader
    }
}

impl Grade for CrooGrade {
    fn application(&self) -> Uuid {
        self.application
    }

    fn grader(&self) -> Uuid {
        self.grader
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeKind {
    Leader,
    Croo,
}

impl GradeKind {
    /// Parses the plural path segment, `leaders` or `croos`.
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "leaders" => Some(Self::Leader),
            "croos" => Some(Self::Croo),
            _ => None,
        }
    }

    pub fn as_path(&self) -> &'static str {
        match self {
            Self::Leader => "leaders",
            Self::Croo => "croos",
        }
    }

    pub fn required_grades(&self) -> usize {
        match self {
            Self::Leader => NUMBER_OF_LEADER_GRADES,
            Self::Croo => NUMBER_OF_CROO_GRADES,
        }
    }

    pub fn is_complete(&self, application: &GeneralApplication) -> bool {
        match self {
            Self::Leader => application.leader_application_complete(),
            Self::Croo => application.croo_application_complete(),
        }
    }
}

/// Pending, complete applications of `trips_year` that `grader` has not
/// graded yet, with their current grade counts.
fn candidates<'a, G: Grade>(
    kind: GradeKind,
    applications: &'a [GeneralApplication],
    trips_year: i32,
    grades: &[G],
    grader: Uuid,
) -> Vec<(&'a GeneralApplication, usize)> {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    let mut graded_by_grader: HashSet<Uuid> = HashSet::new();
    for grade in grades {
        *counts.entry(grade.application()).or_default() += 1;
        if grade.grader() == grader {
            graded_by_grader.insert(grade.application());
        }
    }

    applications
        .iter()
        .filter(|a| a.trips_year == trips_year)
        .filter(|a| a.status == ApplicationStatus::Pending)
        .filter(|a| kind.is_complete(a))
        .filter(|a| !graded_by_grader.contains(&a.id))
        .map(|a| (a, counts.get(&a.id).copied().unwrap_or(0)))
        .collect()
}

/// Picks the next application for `grader`.
///
/// Ungraded applications come first; once every candidate has a grade,
/// applications with one grade are chosen, and so on up to the number of
/// grades each application needs. Ties are broken at random.
pub fn next_to_grade<'a, G: Grade, R: Rng + ?Sized>(
    kind: GradeKind,
    applications: &'a [GeneralApplication],
    trips_year: i32,
    grades: &[G],
    grader: Uuid,
    rng: &mut R,
) -> Option<&'a GeneralApplication> {
    let candidates = candidates(kind, applications, trips_year, grades, grader);

    for i in 0..kind.required_grades() {
        let pool: Vec<&GeneralApplication> = candidates
            .iter()
            .filter(|(_, count)| *count <= i)
            .map(|(app, _)| *app)
            .collect();
        if let Some(app) = pool.choose(rng) {
            return Some(*app);
        }
    }
    None
}

/// Picks a croo application that another grader tagged as a potential
/// member of `croo`. There is no limit on how often these are graded.
pub fn next_croo_to_grade_for<'a, R: Rng + ?Sized>(
    croo: Uuid,
    applications: &'a [GeneralApplication],
    trips_year: i32,
    grades: &[CrooGrade],
    grader: Uuid,
    rng: &mut R,
) -> Option<&'a GeneralApplication> {
    let tagged: HashSet<Uuid> = grades
        .iter()
        .filter(|g| g.potential_croos.contains(&croo))
        .map(|g| g.application)
        .collect();

    let pool: Vec<&GeneralApplication> =
        candidates(GradeKind::Croo, applications, trips_year, grades, grader)
            .into_iter()
            .map(|(app, _)| app)
            .filter(|app| tagged.contains(&app.id))
            .collect();
    pool.choose(rng).copied()
}

/// Fails if `grader` already graded `application`.
pub fn ensure_not_graded<G: Grade>(
    grades: &[G],
    application: Uuid,
    grader: Uuid,
) -> Result<(), ApplicationError> {
    if grades
        .iter()
        .any(|g| g.application() == application && g.grader() == grader)
    {
        Err(ApplicationError::AlreadyGraded)
    } else {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GradeProgress {
    pub complete: usize,
    pub total: usize,
    pub percentage: usize,
}

/// Grades given so far against grades needed. Extra grades on one
/// application do not count toward another.
pub fn grade_progress<G: Grade>(
    kind: GradeKind,
    applications: &[GeneralApplication],
    grades: &[G],
) -> GradeProgress {
    let mut counts: HashMap<Uuid, usize> = HashMap::new();
    for grade in grades {
        *counts.entry(grade.application()).or_default() += 1;
    }

    let required = kind.required_grades();
    let complete_apps: Vec<&GeneralApplication> =
        applications.iter().filter(|a| kind.is_complete(a)).collect();
    let total = complete_apps.len() * required;
    let complete = complete_apps
        .iter()
        .map(|a| counts.get(&a.id).copied().unwrap_or(0).min(required))
        .sum();
    let percentage = if total == 0 {
        100
    } else {
        (complete * 100 + total / 2) / total
    };

    GradeProgress {
        complete,
        total,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::applications::TshirtSize;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn leader_app(year: i32) -> GeneralApplication {
        let mut app = GeneralApplication::new(year, Uuid::new_v4(), "Applicant", "a", TshirtSize::M);
        app.leader_supplement.document = "answers".to_string();
        app
    }

    fn croo_app(year: i32) -> GeneralApplication {
        let mut app = GeneralApplication::new(year, Uuid::new_v4(), "Applicant", "c", TshirtSize::L);
        app.croo_supplement.document = "answers".to_string();
        app
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_ungraded_applications_come_first() {
        let apps = vec![leader_app(2024), leader_app(2024)];
        let grades = vec![LeaderGrade::new(2024, apps[0].id, Uuid::new_v4(), 4)];
        let grader = Uuid::new_v4();

        for _ in 0..10 {
            let next = next_to_grade(GradeKind::Leader, &apps, 2024, &grades, grader, &mut rng());
            assert_eq!(next.map(|a| a.id), Some(apps[1].id));
        }
    }

    #[test]
    fn test_skips_own_grades_other_years_and_non_pending() {
        let grader = Uuid::new_v4();
        let mut rejected = leader_app(2024);
        rejected.status = ApplicationStatus::Rejected;
        let old = leader_app(2023);
        let incomplete = GeneralApplication::new(2024, Uuid::new_v4(), "x", "x", TshirtSize::S);
        let mine = leader_app(2024);
        let apps = vec![rejected, old, incomplete, mine.clone()];
        let grades = vec![LeaderGrade::new(2024, mine.id, grader, 5)];

        assert!(next_to_grade(GradeKind::Leader, &apps, 2024, &grades, grader, &mut rng()).is_none());
    }

    #[test]
    fn test_fully_graded_applications_are_done() {
        let app = leader_app(2024);
        let grades: Vec<LeaderGrade> = (0..NUMBER_OF_LEADER_GRADES)
            .map(|_| LeaderGrade::new(2024, app.id, Uuid::new_v4(), 3))
            .collect();
        let apps = vec![app];
        assert!(next_to_grade(GradeKind::Leader, &apps, 2024, &grades, Uuid::new_v4(), &mut rng()).is_none());
    }

    #[test]
    fn test_croo_applications_get_three_grades() {
        let app = croo_app(2024);
        let grades: Vec<CrooGrade> = (0..2)
            .map(|_| CrooGrade::new(2024, app.id, Uuid::new_v4(), 3))
            .collect();
        let apps = vec![app.clone()];
        let next = next_to_grade(GradeKind::Croo, &apps, 2024, &grades, Uuid::new_v4(), &mut rng());
        assert_eq!(next.map(|a| a.id), Some(app.id));
    }

    #[test]
    fn test_next_for_croo_uses_tags() {
        let croo = Uuid::new_v4();
        let tagged = croo_app(2024);
        let untagged = croo_app(2024);
        let mut grade = CrooGrade::new(2024, tagged.id, Uuid::new_v4(), 5);
        grade.potential_croos = vec![croo];
        let grades = vec![grade, CrooGrade::new(2024, untagged.id, Uuid::new_v4(), 5)];
        let apps = vec![untagged, tagged.clone()];

        let next = next_croo_to_grade_for(croo, &apps, 2024, &grades, Uuid::new_v4(), &mut rng());
        assert_eq!(next.map(|a| a.id), Some(tagged.id));
        assert!(next_croo_to_grade_for(Uuid::new_v4(), &apps, 2024, &grades, Uuid::new_v4(), &mut rng()).is_none());
    }

    #[test]
    fn test_ensure_not_graded() {
        let grader = Uuid::new_v4();
        let app = Uuid::new_v4();
        let grades = vec![LeaderGrade::new(2024, app, grader, 2)];
        assert_eq!(
            ensure_not_graded(&grades, app, grader),
            Err(ApplicationError::AlreadyGraded)
        );
        assert!(ensure_not_graded(&grades, app, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_grade_progress() {
        let apps = vec![leader_app(2024), leader_app(2024), croo_app(2024)];
        let grades = vec![
            LeaderGrade::new(2024, apps[0].id, Uuid::new_v4(), 3),
            LeaderGrade::new(2024, apps[0].id, Uuid::new_v4(), 3),
            LeaderGrade::new(2024, apps[0].id, Uuid::new_v4(), 3),
            LeaderGrade::new(2024, apps[1].id, Uuid::new_v4(), 3),
        ];
        let progress = grade_progress(GradeKind::Leader, &apps, &grades);
        assert_eq!(progress.complete, 3);
        assert_eq!(progress.total, 4);
        assert_eq!(progress.percentage, 75);

        let empty = grade_progress::<LeaderGrade>(GradeKind::Leader, &[], &[]);
        assert_eq!(empty.percentage, 100);
    }
}
