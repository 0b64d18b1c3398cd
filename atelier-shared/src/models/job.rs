/// Job openings and candidate applications

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::store::Document;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Open,
    Closed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,

    pub description: Option<String>,
    pub required_skills: Vec<String>,
    pub responsibilities: Vec<String>,
    pub location: Option<String>,
    pub experience: Option<String>,

    pub status: JobStatus,
}

impl Document for Job {
    const COLLECTION: &'static str = "jobs";
    const ENTITY: &'static str = "Job";
    const SEARCHABLE: &'static [&'static str] = &["title", "description"];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Reviewed,
    Rejected,
    Accepted,
}

/// A candidate's application for a [`Job`], linked by `job_id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct Application {
    #[validate(length(min = 1, message = "jobId is required"))]
    pub job_id: String,

    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,

    #[validate(email(message = "a valid email is required"))]
    pub email: String,

    #[validate(length(min = 1, message = "resumeUrl is required"))]
    pub resume_url: String,

    pub message: Option<String>,
    pub status: ApplicationStatus,
}

impl Document for Application {
    const COLLECTION: &'static str = "applications";
    const ENTITY: &'static str = "Application";
    const SEARCHABLE: &'static [&'static str] = &["name", "email"];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_requires_valid_email() {
        let app = Application {
            job_id: "a".to_string(),
            name: "Sam".to_string(),
            email: "not-an-email".to_string(),
            resume_url: "https://example.com/cv.pdf".to_string(),
            ..Default::default()
        };
        assert!(app.validate().is_err());
    }

    #[test]
    fn test_application_defaults_to_pending() {
        let app: Application = serde_json::from_str(
            r#"{"jobId":"a","name":"Sam","email":"sam@example.com","resumeUrl":"u"}"#,
        )
        .unwrap();
        assert_eq!(app.status, ApplicationStatus::Pending);
    }

    #[test]
    fn test_job_defaults_to_open() {
        let job: Job = serde_json::from_str(r#"{"title":"Rust Engineer"}"#).unwrap();
        assert_eq!(job.status, JobStatus::Open);
    }
}
