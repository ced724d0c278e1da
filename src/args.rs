use chrono::{NaiveDate, NaiveTime};
use clap::Parser;
use std::path::PathBuf;

use admit_card::CandidateRecord;

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|e| format!("expected HH:MM (24-hour): {e}"))
}

#[derive(Parser)]
#[command(name = "admit-card")]
#[command(about = "Generate an exam admit card with photo, signature and exam-centre QR code")]
pub struct Args {
    /// Candidate name
    #[arg(short, long)]
    pub name: String,

    /// Exam name, shown in the header
    #[arg(short = 'x', long)]
    pub exam_name: String,

    /// Date of birth (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub dob: NaiveDate,

    /// Exam date (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub exam_date: NaiveDate,

    /// Exam time (HH:MM, 24-hour)
    #[arg(long, value_parser = parse_time)]
    pub exam_time: NaiveTime,

    #[arg(long)]
    pub city: String,

    #[arg(long)]
    pub state: String,

    #[arg(short = 'c', long)]
    pub exam_center: String,

    /// Profile photo (JPEG or PNG)
    #[arg(short, long)]
    pub photo: PathBuf,

    /// Signature image (JPEG or PNG)
    #[arg(short, long)]
    pub signature: PathBuf,

    /// Output PNG path
    #[arg(short, long, default_value = "admit_card.png")]
    pub output: PathBuf,

    /// TrueType/OpenType font (default: $ADMIT_CARD_FONT, then system fonts)
    #[arg(short, long)]
    pub font: Option<PathBuf>,
}

impl Args {
    pub fn record(&self) -> CandidateRecord {
        CandidateRecord {
            name: self.name.clone(),
            exam_name: self.exam_name.clone(),
            date_of_birth: self.dob,
            exam_date: self.exam_date,
            exam_time: self.exam_time,
            city: self.city.clone(),
            state: self.state.clone(),
            exam_center: self.exam_center.clone(),
        }
    }
}
