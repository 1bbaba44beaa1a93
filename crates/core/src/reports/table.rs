use super::ReportError;

/// A header row plus data rows, ready to be written as CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub header: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(header: Vec<&'static str>) -> Self {
        Self {
            header,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, ReportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }
}

pub fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

/// `yes` when set, blank otherwise.
pub fn yes_blank(value: bool) -> String {
    if value { "yes" } else { "" }.to_string()
}

/// Dollars with two decimals.
pub fn dollars(cents: u32) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// Dollars with two decimals, blank for zero.
pub fn dollars_or_blank(cents: u32) -> String {
    if cents == 0 {
        String::new()
    } else {
        dollars(cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(dollars(25_000), "250.00");
        assert_eq!(dollars(1_005), "10.05");
        assert_eq!(dollars(0), "0.00");
        assert_eq!(dollars_or_blank(0), "");
        assert_eq!(dollars_or_blank(99), "0.99");
    }

    #[test]
    fn test_csv_quotes_fields() {
        let mut table = CsvTable::new(vec!["name", "notes"]);
        table.push(vec!["Jane".to_string(), "likes, commas".to_string()]);
        let out = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(out, "name,notes\nJane,\"likes, commas\"\n");
    }
}
