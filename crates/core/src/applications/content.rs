use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::record::{Record, RecordKind};

use super::ApplicationStatus;

/// Text shown at the top of every application page; one per year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationInfo {
    pub id: Uuid,
    pub trips_year: i32,
    #[serde(default)]
    pub application_header: String,
    /// Link to the application questions document.
    #[serde(default)]
    pub application_questions: String,
}

impl Record for ApplicationInfo {
    const KIND: RecordKind = RecordKind::ApplicationInfo;
    const UNIQUE_FIELDS: &'static str = "trips year";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Application info for {}", self.trips_year)
    }

    fn unique_key(&self) -> Option<String> {
        Some("application_info".to_string())
    }
}

/// What the volunteer portal says to applicants in each status, and the
/// schedule blurbs for leaders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalContent {
    pub id: Uuid,
    pub trips_year: i32,
    #[serde(rename = "PENDING_description")]
    pub pending_description: String,
    #[serde(rename = "CROO_description")]
    pub croo_description: String,
    #[serde(rename = "LEADER_description")]
    pub leader_description: String,
    #[serde(rename = "LEADER_WAITLIST_description")]
    pub leader_waitlist_description: String,
    #[serde(rename = "REJECTED_description")]
    pub rejected_description: String,
    #[serde(rename = "CANCELED_description")]
    pub canceled_description: String,
    /// Leaders' first day, Gilman Island, etc.
    pub day0_description: String,
    /// Trippee arrival, swim test, safety talk, etc.
    pub day1_description: String,
    /// Return to campus.
    pub day5_description: String,
}

impl PortalContent {
    pub fn new(trips_year: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            trips_year,
            ..Self::default()
        }
    }

    pub fn status_description(&self, status: ApplicationStatus) -> &str {
        match status {
            ApplicationStatus::Pending => &self.pending_description,
            ApplicationStatus::Croo => &self.croo_description,
            ApplicationStatus::Leader => &self.leader_description,
            ApplicationStatus::LeaderWaitlist => &self.leader_waitlist_description,
            ApplicationStatus::Rejected => &self.rejected_description,
            ApplicationStatus::Canceled => &self.canceled_description,
        }
    }
}

impl Record for PortalContent {
    const KIND: RecordKind = RecordKind::PortalContent;
    const UNIQUE_FIELDS: &'static str = "trips year";

    fn id(&self) -> Uuid {
        self.id
    }

    fn trips_year(&self) -> i32 {
        self.trips_year
    }

    fn label(&self) -> String {
        format!("Portal content for {}", self.trips_year)
    }

    fn unique_key(&self) -> Option<String> {
        Some("portal_content".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_description_follows_application_status() {
        let content: PortalContent = serde_json::from_value(json!({
            "id": Uuid::new_v4(),
            "trips_year": 2024,
            "LEADER_description": "You're a leader!",
            "LEADER_WAITLIST_description": "Hang tight"
        }))
        .unwrap();
        assert_eq!(content.status_description(ApplicationStatus::Leader), "You're a leader!");
        assert_eq!(content.status_description(ApplicationStatus::LeaderWaitlist), "Hang tight");
        assert_eq!(content.status_description(ApplicationStatus::Rejected), "");
    }

    #[test]
    fn test_one_per_year() {
        assert_eq!(PortalContent::new(2024).unique_key(), PortalContent::new(2025).unique_key());
        assert_eq!(PortalContent::UNIQUE_FIELDS, "trips year");
    }
}
