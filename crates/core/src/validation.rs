//! Boundary validation for publish, comment and edit inputs.
//!
//! Inputs are trimmed on construction and then checked with `validator`
//! rules. Every operation runs these checks before touching storage or a
//! collaborator, so a rejected request leaves no partial writes behind.

use validator::{Validate, ValidateUrl, ValidationErrors};

use crate::error::CoreError;

/// Fields required to finalize a video record.
#[derive(Debug, Clone, Validate)]
pub struct PublishFields {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "file id is required"))]
    pub file_id: String,
}

impl PublishFields {
    pub fn new(title: &str, description: &str, file_id: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            file_id: file_id.trim().to_string(),
        }
    }

    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(into_core_error)
    }
}

/// Fields required to start a remote ingestion that publishes on success.
#[derive(Debug, Clone, Validate)]
pub struct RemoteSubmission {
    #[validate(length(min = 1, message = "title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,
    #[validate(
        length(min = 1, message = "video url is required"),
        url(message = "video url is not a valid URL")
    )]
    pub video_url: String,
}

impl RemoteSubmission {
    pub fn new(title: &str, description: &str, video_url: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            video_url: video_url.trim().to_string(),
        }
    }

    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(into_core_error)
    }
}

/// Body of a new comment.
#[derive(Debug, Clone, Validate)]
pub struct CommentText {
    #[validate(length(min = 1, message = "comment text is required"))]
    pub text: String,
}

impl CommentText {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.trim().to_string(),
        }
    }

    pub fn check(&self) -> Result<(), CoreError> {
        self.validate().map_err(into_core_error)
    }
}

/// Owner edit of title and/or description. Absent fields are left as-is.
#[derive(Debug, Clone, Validate)]
pub struct VideoEdit {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: Option<String>,
    pub description: Option<String>,
}

impl VideoEdit {
    pub fn new(title: Option<&str>, description: Option<&str>) -> Self {
        Self {
            title: title.map(|t| t.trim().to_string()),
            description: description.map(|d| d.trim().to_string()),
        }
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if self.title.is_none() && self.description.is_none() {
            return Err(CoreError::Validation(
                "nothing to update: provide a title or a description".into(),
            ));
        }
        self.validate().map_err(into_core_error)
    }
}

/// Check a remote source URL: non-empty and syntactically a URL.
pub fn validate_source_url(url: &str) -> Result<(), CoreError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(CoreError::Validation("video url is required".into()));
    }
    if !url.validate_url() {
        return Err(CoreError::Validation(format!(
            "video url '{url}' is not a valid URL"
        )));
    }
    Ok(())
}

/// Flatten `validator` errors into one readable, deterministic message.
fn into_core_error(errors: ValidationErrors) -> CoreError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    messages.dedup();
    CoreError::Validation(messages.join("; "))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
