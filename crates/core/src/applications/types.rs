use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{OnDelete, Record, RecordKind, Reference, References, ValidationError};

use super::ApplicationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Croo,
    Leader,
    LeaderWaitlist,
    Rejected,
    Canceled,
}

impl ApplicationStatus {
    pub fn parse(s: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TshirtSize {
    S,
    M,
    L,
    XL,
}

impl TshirtSize {
    pub const ALL: [TshirtSize; 4] = [TshirtSize::S, TshirtSize::M, TshirtSize::L, TshirtSize::XL];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum YesNo {
    Yes,
    #[default]
    No,
}

impl YesNo {
    pub fn is_yes(&self) -> bool {
        *self == YesNo::Yes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RolePreference {
    #[serde(rename = "PREFER_LEADER")]
    PreferLeader,
    #[serde(rename = "PREFER_CROO")]
    PreferCroo,
    #[default]
    #[serde(rename = "N/A")]
    NotApplicable,
}

/// The leader half of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderSupplement {
    /// Answers to the leader questions.
    pub document: String,
    pub preferred_sections: Vec<Uuid>,
    pub available_sections: Vec<Uuid>,
    pub preferred_triptypes: Vec<Uuid>,
    pub available_triptypes: Vec<Uuid>,
    pub trip_preference_comments: String,
    pub cannot_participate_in: String,
    pub relevant_experience: String,
    #[serde(deserialize_with = "crate::serde::optional_uuid")]
    pub assigned_trip: Option<Uuid>,
    #[serde(deserialize_with = "crate::serde::optional_date")]
    pub community_building: Option<NaiveDate>,
    #[serde(deserialize_with = "crate::serde::optional_date")]
    pub risk_management: Option<NaiveDate>,
    #[serde(deserialize_with = "crate::serde::optional_date")]
    pub wilderness_skills: Option<NaiveDate>,
    #[serde(deserialize_with = "crate::serde::optional_date")]
    pub first_aid: Option<NaiveDate>,
}

/// The croo half of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrooSupplement {
    pub document: String,
    pub safety_lead_willing: bool,
    pub kitchen_lead_willing: bool,
    pub kitchen_lead_qualifications: String,
    #[serde(deserialize_with = "crate::serde::optional_uuid")]
    pub assigned_croo: Option<Uuid>,
    pub potential_croos: Vec<Uuid>,
    pub safety_lead_qualified: bool,
    pub safety_lead: bool,
    pub kitchen_lead_qualified: bool,
    pub kitchen_lead: bool,
}

/// A volunteer application, shared by the leader and croo halves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralApplication {
    pub id: Uuid,
    pub trips_year: i32,
    /// User id of the applicant.
    pub applicant: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub netid: String,
    #[serde(default)]
    pub status: ApplicationStatus,
    #[serde(default)]
    pub class_year: u32,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub race_ethnicity: String,
    #[serde(default)]
    pub hinman_box: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub summer_address: String,
    pub tshirt_size: TshirtSize,
    #[serde(default)]
    pub from_where: String,
    #[serde(default)]
    pub what_do_you_like_to_study: String,
    #[serde(default)]
    pub personal_activities: String,
    #[serde(default)]
    pub feedback: String,
    #[serde(default)]
    pub hanover_in_fall: YesNo,
    #[serde(default)]
    pub role_preference: RolePreference,
    #[serde(default)]
    pub dietary_restrictions: String,
    #[serde(default)]
    pub allergen_information: String,
    #[serde(default)]
    pub medical_certifications: String,
    #[serde(default)]
    pub medical_experience: String,
    #[serde(default)]
    pub peer_training: String,
    #[serde(default)]
    pub trippee_confidentiality: bool,
    #[serde(default)]
    pub in_goodstanding_with_college: bool,
    #[serde(default)]
    pub trainings: bool,
    #[serde(default)]
    pub spring_training_ok: bool,
    #[serde(default)]
    pub summer_training_ok: bool,
    #[serde(default)]
    pub leader_supplement: LeaderSupplement,
    #[serde(default)]
    pub croo_supplement: CrooSupplement,
}

impl GeneralApplication {
    pub fn new(
        trips_year: i32,
        applicant: Uuid,
        name: impl Into<String>,
        netid: impl Into<String>,
        tshirt_size: TshirtSize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            applicant,
            name: name.into(),
            netid: netid.into(),
            status: ApplicationStatus::Pending,
            class_year: 0,
            gender: String::new(),
            race_ethnicity: String::new(),
            hinman_box: String::new(),
            phone: String::new(),
            summer_address: String::new(),
            tshirt_size,
            from_where: String::new(),
            what_do_you_like_to_study: String::new(),
            personal_activities: String::new(),
            feedback: String::new(),
            hanover_in_fall: YesNo::No,
            role_preference: RolePreference::NotApplicable,
            dietary_restrictions: String::new(),
            allergen_information: String::new(),
            medical_certifications: String::new(),
            medical_experience: String::new(),
            peer_training: String::new(),
            trippee_confidentiality: false,
            in_goodstanding_with_college: false,
            trainings: false,
            spring_training_ok: false,
            summer_training_ok: false,
            leader_supplement: LeaderSupplement::default(),
            croo_supplement: CrooSupplement::default(),
        }
    }

    pub fn leader_application_complete(&self) -> bool {
        !self.leader_supplement.document.trim().is_empty()
    }

    pub fn croo_application_complete(&self) -> bool {
        !self.croo_supplement.document.trim().is_empty()
    }

    /// Assigns or clears the leader trip. Assigning makes the applicant a leader.
    pub fn assign_trip(&mut self, trip: Option<Uuid>) {
        self.leader_supplement.assigned_trip = trip;
        if trip.is_some() {
            self.status = ApplicationStatus::Leader;
        }
    }

    /// Assigns or clears the croo. Assigning makes the applicant a croo member.
    pub fn assign_croo(&mut self, croo: Option<Uuid>) {
        self.croo_supplement.assigned_croo = croo;
        if croo.is_some() {
            self.status = ApplicationStatus::Croo;
        }
    }

    /// Blanks the applicant's dietary and allergy answers.
    pub fn clear_medical_info(&mut self) {
        self.dietary_restrictions.clear();
        self.allergen_information.clear();
    }
}

impl Record for GeneralApplication {
    const KIND: RecordKind = RecordKind::Application;
    const UNIQUE_FIELDS: &'static str = "applicant";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        if self.name.is_empty() {
            self.netid.clone()
        } else {
            self.name.clone()
        }
    }

    fn unique_key(&self) -> Option<String> {
        Some(self.applicant.to_string())
    }

    fn references(&self) -> Vec<Reference> {
        let leader = &self.leader_supplement;
        let croo = &self.croo_supplement;
        References::new()
            .many(RecordKind::Section, &leader.preferred_sections, "/leader_supplement/preferred_sections")
            .many(RecordKind::Section, &leader.available_sections, "/leader_supplement/available_sections")
            .many(RecordKind::TripType, &leader.preferred_triptypes, "/leader_supplement/preferred_triptypes")
            .many(RecordKind::TripType, &leader.available_triptypes, "/leader_supplement/available_triptypes")
            .maybe(
                RecordKind::Trip,
                leader.assigned_trip,
                "/leader_supplement/assigned_trip",
                OnDelete::Protect,
            )
            .maybe(
                RecordKind::Croo,
                croo.assigned_croo,
                "/croo_supplement/assigned_croo",
                OnDelete::SetNull,
            )
            .many(RecordKind::Croo, &croo.potential_croos, "/croo_supplement/potential_croos")
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Croo {
    pub id: Uuid,
    pub trips_year: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Croo {
    pub fn new(trips_year: i32, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            name: name.into(),
            description: String::new(),
        }
    }
}

impl Record for Croo {
    const KIND: RecordKind = RecordKind::Croo;

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        self.name.clone()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ApplicationError::EmptyCrooName.into());
        }
        Ok(())
    }
}

pub const MIN_GRADE: u8 = 1;
pub const MAX_GRADE: u8 = 6;

fn check_grade(grade: u8) -> Result<(), ValidationError> {
    if (MIN_GRADE..=MAX_GRADE).contains(&grade) {
        Ok(())
    } else {
        Err(ApplicationError::GradeOutOfRange(grade).into())
    }
}

/// A grader's score for the leader half of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderGrade {
    pub id: Uuid,
    pub trips_year: i32,
    pub application: Uuid,
    pub grader: Uuid,
    pub grade: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub hard_skills: bool,
    #[serde(default)]
    pub soft_skills: bool,
}

/// A grader's score for the croo half of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrooGrade {
    pub id: Uuid,
    pub trips_year: i32,
    pub application: Uuid,
    pub grader: Uuid,
    pub grade: u8,
    #[serde(default)]
    pub comment: String,
    /// Croos the grader thinks the applicant would do well on.
    #[serde(default)]
    pub potential_croos: Vec<Uuid>,
}

impl LeaderGrade {
    pub fn new(trips_year: i32, application: Uuid, grader: Uuid, grade: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            application,
            grader,
            grade,
            comment: String::new(),
            hard_skills: false,
            soft_skills: false,
        }
    }
}

impl CrooGrade {
    pub fn new(trips_year: i32, application: Uuid, grader: Uuid, grade: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            application,
            grader,
            grade,
            comment: String::new(),
            potential_croos: Vec::new(),
        }
    }
}

impl Record for LeaderGrade {
    const KIND: RecordKind = RecordKind::LeaderGrade;
    const UNIQUE_FIELDS: &'static str = "application and grader";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Grade of {}", self.grade)
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.application, self.grader))
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference::new(
            RecordKind::Application,
            self.application,
            "/application",
            OnDelete::Cascade,
        )]
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_grade(self.grade)
    }
}

impl Record for CrooGrade {
    const KIND: RecordKind = RecordKind::CrooGrade;
    const UNIQUE_FIELDS: &'static str = "application and grader";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Grade of {}", self.grade)
    }

    fn unique_key(&self) -> Option<String> {
        Some(format!("{}:{}", self.application, self.grader))
    }

    fn references(&self) -> Vec<Reference> {
        References::new()
            .one(RecordKind::Application, self.application, "/application", OnDelete::Cascade)
            .many(RecordKind::Croo, &self.potential_croos, "/potential_croos")
            .build()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        check_grade(self.grade)
    }
}
