use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

/// Registration details printed on the card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateRecord {
    pub name: String,
    pub exam_name: String,
    pub date_of_birth: NaiveDate,
    pub exam_date: NaiveDate,
    pub exam_time: NaiveTime,
    pub city: String,
    pub state: String,
    pub exam_center: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in all the details to generate the admit card ({0} is empty).")]
    MissingField(&'static str),
}

impl CandidateRecord {
    /// Rejects the record if any text field is empty or only whitespace.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("name", &self.name),
            ("exam name", &self.exam_name),
            ("city", &self.city),
            ("state", &self.state),
            ("exam center", &self.exam_center),
        ];

        match fields.into_iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ValidationError::MissingField(field)),
            None => Ok(()),
        }
    }

    pub fn header(&self) -> String {
        format!("Admit Card for {}", self.exam_name)
    }

    pub fn name_line(&self) -> String {
        format!("Name: {}", self.name)
    }

    pub fn exam_date_line(&self) -> String {
        format!("Exam Date: {}", long_date(self.exam_date))
    }

    pub fn exam_time_line(&self) -> String {
        format!("Exam Time: {}", self.exam_time.format("%I:%M %p"))
    }

    pub fn date_of_birth_line(&self) -> String {
        format!("Date of Birth: {}", long_date(self.date_of_birth))
    }

    pub fn city_line(&self) -> String {
        format!("City: {}", self.city)
    }

    pub fn state_line(&self) -> String {
        format!("State: {}", self.state)
    }

    pub fn exam_center_line(&self) -> String {
        format!("Exam Center: {}", self.exam_center)
    }
}

/// `June 10, 2024`
fn long_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

#[cfg(test)]
pub(crate) fn sample_record() -> CandidateRecord {
    CandidateRecord {
        name: "Asha Rao".into(),
        exam_name: "National Aptitude Test".into(),
        date_of_birth: NaiveDate::from_ymd_opt(2000, 1, 15).unwrap(),
        exam_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        exam_time: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        city: "Pune".into(),
        state: "Maharashtra".into(),
        exam_center: "Center 12".into(),
    }
}
