//! Request schemas, checked before a request reaches the domain

use std::borrow::Cow;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::communication::{
    email_addresses::EmailAddress,
    mailer::{Attachment, AttachmentContent, EmailFields, MAX_SUBJECT_LENGTH},
};

use super::errors::ApiError;

/// Key `validator` files struct-level errors under
const SCHEMA_ERRORS: &str = "__all__";

/// A request body with a fixed order in which its violations are reported
pub trait RequestSchema: DeserializeOwned + Validate {
    /// Field names in reporting order
    const FIELD_ORDER: &'static [&'static str];
}

/// JSON body that has passed its schema.
///
/// Unknown fields are dropped during deserialisation. A body that does not parse, or
/// breaks any rule, is rejected with a 400 listing every violation.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: RequestSchema,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;

        value.validate().map_err(|errors| {
            debug!("request failed schema validation: {errors}");

            ApiError::new_400(violation_messages(&errors, T::FIELD_ORDER))
        })?;

        Ok(ValidatedJson(value))
    }
}

/// Flattens `errors` into messages, field by field in `order`, schema errors last.
fn violation_messages(errors: &ValidationErrors, order: &[&str]) -> Vec<String> {
    let field_errors = errors.field_errors();

    order
        .iter()
        .chain(std::iter::once(&SCHEMA_ERRORS))
        .filter_map(|field| field_errors.get(*field).map(|errors| (*field, errors)))
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| format!("{field} is invalid ({})", error.code))
            })
        })
        .collect()
}

/// An attachment as sent by a client
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentBody {
    /// The file name shown to the recipient
    #[schema(example = "document.pdf")]
    pub filename: Option<String>,

    /// Text (optionally base64-encoded) or an array of bytes
    pub content: Option<AttachmentContent>,

    /// MIME type
    #[schema(example = "application/pdf")]
    pub content_type: Option<String>,

    /// `base64` when `content` is base64-encoded text
    #[schema(example = "base64")]
    pub encoding: Option<String>,
}

/// Send email request body
#[derive(Clone, Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_content", skip_on_field_errors = false))]
pub struct SendEmailBody {
    /// Recipient addresses
    #[schema(example = json!(["recipient@example.com"]))]
    #[validate(
        required(message = "Recipients are required"),
        length(min = 1, message = "At least one recipient is required"),
        custom(function = "validate_recipients")
    )]
    pub to: Option<Vec<String>>,

    /// Subject line, at most 200 characters
    #[schema(example = "Test Email Subject", max_length = 200)]
    #[validate(
        required(message = "Subject is required"),
        custom(function = "validate_subject")
    )]
    pub subject: Option<String>,

    /// Plain text content
    #[schema(example = "This is the plain text content of the email.")]
    pub text: Option<String>,

    /// HTML content
    #[schema(example = "<h1>Hello</h1><p>This is HTML content.</p>")]
    pub html: Option<String>,

    /// Sender address, the service account when absent
    #[schema(example = "sender@example.com")]
    #[validate(custom(function = "validate_sender"))]
    pub from: Option<String>,

    /// Carbon-copy addresses
    #[schema(example = json!(["cc@example.com"]))]
    #[validate(custom(function = "validate_cc"))]
    pub cc: Option<Vec<String>>,

    /// Blind carbon-copy addresses
    #[schema(example = json!(["bcc@example.com"]))]
    #[validate(custom(function = "validate_bcc"))]
    pub bcc: Option<Vec<String>>,

    /// Attached files
    #[validate(custom(function = "validate_attachments"))]
    pub attachments: Option<Vec<AttachmentBody>>,
}

impl RequestSchema for SendEmailBody {
    const FIELD_ORDER: &'static [&'static str] = &[
        "to",
        "subject",
        "text",
        "html",
        "from",
        "cc",
        "bcc",
        "attachments",
    ];
}

impl From<SendEmailBody> for EmailFields {
    fn from(body: SendEmailBody) -> Self {
        Self {
            to: body.to.unwrap_or_default(),
            subject: body.subject.unwrap_or_default(),
            text: body.text,
            html: body.html,
            from: body.from,
            cc: body.cc,
            bcc: body.bcc,
            attachments: body.attachments.map(|attachments| {
                attachments
                    .into_iter()
                    .map(|attachment| Attachment {
                        filename: attachment.filename.unwrap_or_default(),
                        content: attachment
                            .content
                            .unwrap_or_else(|| AttachmentContent::Text(String::new())),
                        content_type: attachment.content_type,
                        encoding: attachment.encoding,
                    })
                    .collect()
            }),
        }
    }
}

fn invalid(code: &'static str, message: String) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Owned(message))
}

fn validate_address_list(
    addresses: &[String],
    label: &str,
    code: &'static str,
) -> Result<(), ValidationError> {
    let problems: Vec<String> = addresses
        .iter()
        .enumerate()
        .filter(|(_, address)| !EmailAddress::is_valid(address))
        .map(|(index, address)| {
            format!("{label} at index {index} must be a valid email: {address}")
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(invalid(code, problems.join("; ")))
    }
}

fn validate_recipients(to: &[String]) -> Result<(), ValidationError> {
    validate_address_list(to, "Recipient", "invalid_recipient")
}

fn validate_cc(cc: &[String]) -> Result<(), ValidationError> {
    validate_address_list(cc, "CC recipient", "invalid_cc")
}

fn validate_bcc(bcc: &[String]) -> Result<(), ValidationError> {
    validate_address_list(bcc, "BCC recipient", "invalid_bcc")
}

fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    if subject.trim().is_empty() {
        return Err(invalid("empty_subject", "Subject cannot be empty".to_string()));
    }

    if subject.chars().count() > MAX_SUBJECT_LENGTH {
        return Err(invalid(
            "subject_too_long",
            format!("Subject cannot exceed {MAX_SUBJECT_LENGTH} characters"),
        ));
    }

    Ok(())
}

fn validate_sender(from: &str) -> Result<(), ValidationError> {
    if EmailAddress::is_valid(from) {
        Ok(())
    } else {
        Err(invalid(
            "invalid_sender",
            format!("Sender must be a valid email: {from}"),
        ))
    }
}

fn validate_attachments(attachments: &[AttachmentBody]) -> Result<(), ValidationError> {
    let problems: Vec<String> = attachments
        .iter()
        .enumerate()
        .flat_map(|(index, attachment)| {
            let mut problems = Vec::new();

            if attachment.filename.as_deref().map_or(true, str::is_empty) {
                problems.push(format!("Attachment at index {index} requires a filename"));
            }

            if attachment.content.is_none() {
                problems.push(format!("Attachment at index {index} requires content"));
            }

            problems
        })
        .collect();

    if problems.is_empty() {
        Ok(())
    } else {
        Err(invalid("invalid_attachment", problems.join("; ")))
    }
}

fn validate_content(body: &SendEmailBody) -> Result<(), ValidationError> {
    let blank = |content: &Option<String>| content.as_deref().map_or(true, str::is_empty);

    if blank(&body.text) && blank(&body.html) {
        return Err(invalid(
            "missing_content",
            "Either text or html content must be provided".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn messages(body: serde_json::Value) -> Result<Vec<String>, serde_json::Error> {
        let body: SendEmailBody = serde_json::from_value(body)?;

        Ok(match body.validate() {
            Ok(()) => vec![],
            Err(errors) => violation_messages(&errors, SendEmailBody::FIELD_ORDER),
        })
    }

    #[test]
    fn test_valid_body() -> TestResult {
        let errors = messages(json!({
            "to": ["a@b.com"],
            "subject": "Hi",
            "text": "hello",
            "cc": ["c@d.com"],
            "attachments": [{"filename": "a.txt", "content": "hi"}]
        }))?;

        assert!(errors.is_empty(), "unexpected errors: {errors:?}");

        Ok(())
    }

    #[test]
    fn test_empty_body_collects_everything() -> TestResult {
        let errors = messages(json!({}))?;

        assert_eq!(
            errors,
            vec![
                "Recipients are required",
                "Subject is required",
                "Either text or html content must be provided",
            ]
        );

        Ok(())
    }

    #[test]
    fn test_empty_recipients() -> TestResult {
        let errors = messages(json!({"to": [], "subject": "Hi", "text": "hello"}))?;

        assert_eq!(errors, vec!["At least one recipient is required"]);

        Ok(())
    }

    #[test]
    fn test_address_errors_name_every_offender() -> TestResult {
        let errors = messages(json!({
            "to": ["ok@example.com", "nope"],
            "subject": "Hi",
            "html": "<p>hi</p>",
            "from": "sender",
            "cc": ["c@d"],
            "bcc": ["x y@z.com", "also bad"]
        }))?;

        assert_eq!(
            errors,
            vec![
                "Recipient at index 1 must be a valid email: nope",
                "Sender must be a valid email: sender",
                "CC recipient at index 0 must be a valid email: c@d",
                "BCC recipient at index 0 must be a valid email: x y@z.com; \
                 BCC recipient at index 1 must be a valid email: also bad",
            ]
        );

        Ok(())
    }

    #[test]
    fn test_subject_rules() -> TestResult {
        let blank = messages(json!({"to": ["a@b.com"], "subject": " ", "text": "x"}))?;
        let long = messages(json!({"to": ["a@b.com"], "subject": "x".repeat(201), "text": "x"}))?;
        let at_limit =
            messages(json!({"to": ["a@b.com"], "subject": "x".repeat(200), "text": "x"}))?;

        assert_eq!(blank, vec!["Subject cannot be empty"]);
        assert_eq!(long, vec!["Subject cannot exceed 200 characters"]);
        assert!(at_limit.is_empty());

        Ok(())
    }

    #[test]
    fn test_empty_text_and_html_count_as_missing() -> TestResult {
        let errors = messages(json!({"to": ["a@b.com"], "subject": "Hi", "text": "", "html": ""}))?;

        assert_eq!(errors, vec!["Either text or html content must be provided"]);

        Ok(())
    }

    #[test]
    fn test_attachment_rules() -> TestResult {
        let errors = messages(json!({
            "to": ["a@b.com"],
            "subject": "Hi",
            "text": "x",
            "attachments": [
                {"contentType": "text/plain"},
                {"filename": "ok.txt", "content": [1, 2]}
            ]
        }))?;

        assert_eq!(
            errors,
            vec![
                "Attachment at index 0 requires a filename; Attachment at index 0 requires content"
            ]
        );

        Ok(())
    }

    #[test]
    fn test_unknown_fields_are_dropped() -> TestResult {
        let body: SendEmailBody = serde_json::from_value(json!({
            "to": ["a@b.com"],
            "subject": "Hi",
            "text": "x",
            "priority": "high"
        }))?;

        assert!(body.validate().is_ok());

        Ok(())
    }

    #[test]
    fn test_into_email_fields() {
        let fields = EmailFields::from(SendEmailBody {
            to: Some(vec!["a@b.com".to_string()]),
            subject: Some("Hi".to_string()),
            html: Some("<p>x</p>".to_string()),
            attachments: Some(vec![AttachmentBody {
                filename: Some("a.txt".to_string()),
                content: Some(AttachmentContent::Text("aGk=".to_string())),
                content_type: None,
                encoding: Some("base64".to_string()),
            }]),
            ..SendEmailBody::default()
        });

        let attachments = fields.attachments.unwrap_or_default();

        assert_eq!(fields.to, vec!["a@b.com"]);
        assert_eq!(fields.subject, "Hi");
        assert_eq!(fields.text, None);
        assert_eq!(attachments.len(), 1);
        assert_eq!(attachments[0].filename, "a.txt");
        assert_eq!(attachments[0].encoding.as_deref(), Some("base64"));
    }
}
