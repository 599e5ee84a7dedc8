//! Request DTOs with edge validation.

use axum::extract::{FromRequest, Request};
use derive_more::{Deref, DerefMut, From};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use vitae_core::ErrorKind;
use vitae_core::model::Resume;
use vitae_pool::JobOptions;

use crate::handler::error::Error;

/// JSON extractor that runs `validator` rules after deserialization.
///
/// Parse failures surface as `invalid_request`, constraint failures as
/// `validation_failed`; in both cases no task is created.
#[must_use]
#[derive(Debug, Clone, Copy, Default, Deref, DerefMut, From)]
pub struct ValidateJson<T>(pub T);

impl<T> ValidateJson<T> {
    /// Returns the inner validated value.
    #[inline]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, S> FromRequest<S> for ValidateJson<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(data) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                Error::new(ErrorKind::InvalidRequest, rejection.body_text())
            })?;

        data.validate()?;
        Ok(Self(data))
    }
}

/// Body of `POST /api/v1/scrape`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_scrape_target"))]
pub struct ScrapeRequest {
    /// Posting URL; mutually exclusive with `description`.
    #[validate(url(message = "must be a valid URL"))]
    pub url: Option<String>,
    /// Raw posting text; mutually exclusive with `url`.
    pub description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub options: Option<ScrapeOptionsDto>,
}

/// Optional scrape tuning knobs.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct ScrapeOptionsDto {
    /// Extraction deadline in seconds.
    #[validate(range(min = 1, max = 300, message = "must be between 1 and 300 seconds"))]
    pub timeout_secs: Option<u64>,
    /// Preferred engine, advisory only.
    pub engine: Option<String>,
}

impl From<ScrapeOptionsDto> for JobOptions {
    fn from(dto: ScrapeOptionsDto) -> Self {
        Self {
            timeout_secs: dto.timeout_secs,
            engine: dto.engine,
        }
    }
}

/// Exactly one of `url` and `description` must be present.
fn validate_scrape_target(request: &ScrapeRequest) -> Result<(), ValidationError> {
    let has_url = request.url.as_deref().is_some_and(|url| !url.trim().is_empty());
    let has_description = request
        .description
        .as_deref()
        .is_some_and(|text| !text.trim().is_empty());

    match (has_url, has_description) {
        (true, false) | (false, true) => Ok(()),
        (true, true) => Err(ValidationError::new("target")
            .with_message("url and description are mutually exclusive".into())),
        (false, false) => Err(ValidationError::new("target")
            .with_message("either url or description is required".into())),
    }
}

/// Job details a tailoring run targets.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TailorJobDto {
    #[validate(length(min = 1, message = "is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "is required"))]
    pub company_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Body of `POST /api/v1/resume/tailor`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TailorRequest {
    #[validate(nested)]
    pub base_resume: BaseResumeDto,
    #[validate(nested)]
    pub job: TailorJobDto,
    #[validate(length(min = 1, message = "is required"))]
    pub resume_id: String,
}

/// Base resume payload; sections pass through untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BaseResumeDto {
    #[validate(length(min = 1, message = "is required"))]
    pub id: String,
    #[serde(flatten)]
    pub resume: serde_json::Map<String, serde_json::Value>,
}

impl BaseResumeDto {
    /// Rebuilds the full resume from the id plus passthrough fields.
    pub fn into_resume(self) -> Result<Resume, Error> {
        let mut value = serde_json::Value::Object(self.resume);
        value["id"] = serde_json::Value::String(self.id);

        serde_json::from_value(value).map_err(|error| {
            Error::new(
                ErrorKind::ValidationFailed,
                format!("base_resume is not a valid resume: {error}"),
            )
        })
    }
}

/// Body of `POST /api/v1/resume/screenshot`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScreenshotRequest {
    #[validate(length(min = 1, message = "is required"))]
    pub resume_id: String,
}

/// Body of an export submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExportRequest {
    #[validate(nested)]
    pub resume: BaseResumeDto,
    #[validate(length(min = 1, message = "is required"))]
    pub theme: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrape_requires_exactly_one_target() {
        let both = ScrapeRequest {
            url: Some("https://example.com/j/1".into()),
            description: Some("text".into()),
            options: None,
        };
        assert!(both.validate().is_err());

        let neither = ScrapeRequest {
            url: None,
            description: None,
            options: None,
        };
        assert!(neither.validate().is_err());

        let url_only = ScrapeRequest {
            url: Some("https://example.com/j/1".into()),
            description: None,
            options: None,
        };
        assert!(url_only.validate().is_ok());

        let description_only = ScrapeRequest {
            url: None,
            description: Some("Senior Engineer at Acme".into()),
            options: None,
        };
        assert!(description_only.validate().is_ok());
    }

    #[test]
    fn scrape_rejects_malformed_urls() {
        let request = ScrapeRequest {
            url: Some("not a url".into()),
            description: None,
            options: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn tailor_requires_job_fields() {
        let request: TailorRequest = serde_json::from_value(serde_json::json!({
            "base_resume": {"id": "res_1", "sections": []},
            "job": {"title": "", "company_name": "Acme"},
            "resume_id": "res_1"
        }))
        .expect("deserializes");
        assert!(request.validate().is_err());
    }

    #[test]
    fn base_resume_round_trips_extra_fields() -> anyhow::Result<()> {
        let dto: BaseResumeDto = serde_json::from_value(serde_json::json!({
            "id": "res_1",
            "name": "Ada",
            "sections": [{"type": "summary", "text": "Engineer."}]
        }))?;

        let resume = dto.into_resume().expect("valid resume");
        assert_eq!(resume.id, "res_1");
        assert_eq!(resume.name.as_deref(), Some("Ada"));
        assert_eq!(resume.sections.len(), 1);
        Ok(())
    }
}
