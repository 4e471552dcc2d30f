use serde::{Deserialize, Deserializer};
use std::io::Read;

/// One row of the HR new-starter export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewHireRow {
    #[serde(rename = "Employee Id", default, deserialize_with = "trimmed")]
    pub employee_id: String,
    #[serde(rename = "First Name", default, deserialize_with = "trimmed")]
    pub first_name: String,
    #[serde(rename = "Last Name", default, deserialize_with = "trimmed")]
    pub last_name: String,
    #[serde(rename = "Work Email", default, deserialize_with = "trimmed")]
    pub work_email: String,
    #[serde(rename = "Start Date", default, deserialize_with = "trimmed")]
    pub start_date: String,
    #[serde(rename = "Job Role", default, deserialize_with = "trimmed")]
    pub job_role: String,
    #[serde(rename = "Department", default, deserialize_with = "trimmed")]
    pub department: String,
    #[serde(rename = "Post Code", default, deserialize_with = "trimmed")]
    pub post_code: String,
}

impl NewHireRow {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|text| text.trim().to_string()).unwrap_or_default())
}

pub fn parse_rows<R: Read>(reader: R) -> Result<Vec<NewHireRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.deserialize::<NewHireRow>().collect()
}
