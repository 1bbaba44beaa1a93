//! Site permissions, the groups that grant them, and user accounts.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A capability checked by handlers before touching the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    SetAccess,
    ViewDb,
    EditDb,
    EditTimetable,
    CreateApplications,
    GradeLeaderApplications,
    GradeCrooApplications,
    EditApplicationsAndAssignLeaders,
    EditTrainings,
    ReportIncidents,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SetAccess => "can_set_access",
            Self::ViewDb => "can_view_db",
            Self::EditDb => "can_edit_db",
            Self::EditTimetable => "can_edit_timetable",
            Self::CreateApplications => "can_create_applications",
            Self::GradeLeaderApplications => "can_grade_leader_applications",
            Self::GradeCrooApplications => "can_grade_croo_applications",
            Self::EditApplicationsAndAssignLeaders => {
                "can_edit_applications_and_assign_leaders"
            }
            Self::EditTrainings => "can_edit_trainings",
            Self::ReportIncidents => "can_report_incidents",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Permission groups managed by the directors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Directors,
    Directorate,
    Tlts,
    SafetyLeads,
    Graders,
}

impl Group {
    pub const ALL: [Group; 5] = [
        Group::Directors,
        Group::Directorate,
        Group::Tlts,
        Group::SafetyLeads,
        Group::Graders,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directors => "directors",
            Self::Directorate => "directorate",
            Self::Tlts => "tlts",
            Self::SafetyLeads => "safety_leads",
            Self::Graders => "graders",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }

    /// Permissions granted to members of this group.
    pub fn permissions(&self) -> &'static [Permission] {
        use Permission::*;
        match self {
            Self::Directors => &[
                SetAccess,
                ViewDb,
                EditDb,
                EditTimetable,
                CreateApplications,
                GradeLeaderApplications,
                GradeCrooApplications,
                EditApplicationsAndAssignLeaders,
                EditTrainings,
                ReportIncidents,
            ],
            Self::Directorate => &[ViewDb, GradeLeaderApplications, GradeCrooApplications],
            Self::Tlts => &[
                ViewDb,
                GradeLeaderApplications,
                EditApplicationsAndAssignLeaders,
                EditTrainings,
            ],
            Self::SafetyLeads => &[ReportIncidents, EditTrainings],
            Self::Graders => &[GradeLeaderApplications],
        }
    }
}

/// A user account, identified on campus by netid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub netid: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_superuser: bool,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl User {
    pub fn new(netid: impl Into<String>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            netid: netid.into(),
            name: name.into(),
            email: email.into(),
            is_superuser: false,
            groups: Vec::new(),
        }
    }

    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.set_groups(groups);
        self
    }

    /// Replaces the groups, dropping duplicates.
    pub fn set_groups(&mut self, mut groups: Vec<Group>) {
        groups.sort();
        groups.dedup();
        self.groups = groups;
    }

    pub fn has_perm(&self, permission: Permission) -> bool {
        self.is_superuser
            || self
                .groups
                .iter()
                .any(|group| group.permissions().contains(&permission))
    }
}
