//! Importing incoming students from the registrar's spreadsheet.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{registration_for_student, IncomingError, IncomingStudent, Registration};

/// One row of the registrar export. Unknown columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct RegistrarRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Formatted Fml Name")]
    name: String,
    #[serde(rename = "Class Year")]
    class_year: String,
    #[serde(rename = "Gender")]
    gender: String,
    #[serde(rename = "Birthday")]
    birthday: String,
    #[serde(rename = "Fine Ethnic Code")]
    ethnic_code: String,
    #[serde(rename = "EMail", alias = "Email")]
    email: String,
    #[serde(rename = "Blitz")]
    blitz: String,
    #[serde(rename = "PR Phone")]
    phone: String,
    #[serde(rename = "PR Street 1")]
    street1: String,
    #[serde(rename = "PR Street 2")]
    street2: String,
    #[serde(rename = "PR City")]
    city: String,
    #[serde(rename = "PR State")]
    state: String,
    #[serde(rename = "PR Zip")]
    zip: String,
    #[serde(rename = "Pr Nation Name")]
    nation: String,
    #[serde(rename = "Medical Info")]
    med_info: String,
    #[serde(rename = "Notes")]
    notes: String,
}

impl RegistrarRow {
    /// Mailing address with a "City, ST Zip" line.
    fn address(&self) -> String {
        let state_zip = [self.state.trim(), self.zip.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        let city = self.city.trim();
        let city_line = match (city.is_empty(), state_zip.is_empty()) {
            (false, false) => format!("{city}, {state_zip}"),
            (false, true) => city.to_string(),
            (true, _) => state_zip,
        };
        [self.street1.trim(), self.street2.trim(), city_line.as_str(), self.nation.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn into_student(self, trips_year: i32) -> IncomingStudent {
        let address = self.address();
        let mut student = IncomingStudent::new(trips_year, self.name.trim(), self.id.trim());
        student.class_year = self.class_year;
        student.gender = self.gender;
        student.birthday = self.birthday;
        student.ethnic_code = self.ethnic_code;
        student.email = self.email;
        student.blitz = self.blitz;
        student.phone = self.phone;
        student.address = address;
        student.med_info = self.med_info;
        student.notes = self.notes;
        student
    }
}

/// Students to create, and netids skipped because they already exist.
#[derive(Debug, Clone, Default)]
pub struct RegistrarImport {
    pub created: Vec<IncomingStudent>,
    pub ignored: Vec<String>,
}

/// Netids of an import, as returned to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub created: Vec<String>,
    pub ignored: Vec<String>,
}

impl RegistrarImport {
    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            created: self.created.iter().map(|s| s.netid.clone()).collect(),
            ignored: self.ignored.clone(),
        }
    }
}

/// Parses a registrar CSV export into new students for `trips_year`.
///
/// Rows without an Id are skipped. Netids already in `existing`, or
/// repeated in the file, are ignored. New students are linked to a
/// matching registration.
pub fn parse_registrar_csv(
    data: &[u8],
    trips_year: i32,
    existing: &[IncomingStudent],
    registrations: &[Registration],
) -> Result<RegistrarImport, IncomingError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    if !headers.iter().any(|h| h == "Id") {
        return Err(IncomingError::Import("missing column \"Id\"".to_string()));
    }

    let mut seen: HashSet<String> = existing
        .iter()
        .filter(|s| s.trips_year == trips_year)
        .map(|s| s.netid.to_lowercase())
        .collect();
    let mut import = RegistrarImport::default();

    for row in reader.deserialize::<RegistrarRow>() {
        let row = row?;
        let netid = row.id.trim().to_string();
        if netid.is_empty() {
            continue;
        }
        if !seen.insert(netid.to_lowercase()) {
            import.ignored.push(netid);
            continue;
        }
        let mut student = row.into_student(trips_year);
        student.registration = registration_for_student(&student, registrations).map(|r| r.id);
        import.created.push(student);
    }

    Ok(import)
}

#[derive(Debug, Deserialize)]
struct HinmanRow {
    netid: String,
    #[serde(rename = "hinman box")]
    hinman_box: String,
}

/// Students whose hinman box changed, and netids with no student this year.
#[derive(Debug, Clone, Default)]
pub struct HinmanImport {
    pub updated: Vec<IncomingStudent>,
    pub not_found: Vec<String>,
}

/// Netids of a hinman box import, as returned to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HinmanSummary {
    pub updated: Vec<String>,
    pub not_found: Vec<String>,
}

impl HinmanImport {
    pub fn summary(&self) -> HinmanSummary {
        HinmanSummary {
            updated: self.updated.iter().map(|s| s.netid.clone()).collect(),
            not_found: self.not_found.clone(),
        }
    }
}

/// Parses a sheet with `netid` and `hinman box` columns and sets the box of
/// each matching student of `trips_year`.
pub fn parse_hinman_boxes(
    data: &[u8],
    trips_year: i32,
    students: &[IncomingStudent],
) -> Result<HinmanImport, IncomingError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    for column in ["netid", "hinman box"] {
        if !headers.iter().any(|h| h == column) {
            return Err(IncomingError::Import(format!("missing column \"{column}\"")));
        }
    }

    let mut import = HinmanImport::default();
    for row in reader.deserialize::<HinmanRow>() {
        let row = row?;
        let student = students
            .iter()
            .find(|s| s.trips_year == trips_year && s.netid.eq_ignore_ascii_case(&row.netid));
        match student {
            Some(student) => {
                let mut student = student.clone();
                student.hinman_box = row.hinman_box;
                import.updated.push(student);
            }
            None => import.not_found.push(row.netid),
        }
    }
    Ok(import)
}
