//! Email message

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::communication::email_addresses::EmailAddress;

use super::MailerError;

/// Longest subject we accept, in characters
pub const MAX_SUBJECT_LENGTH: usize = 200;

/// Attachment body, either text (possibly encoded) or raw bytes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum AttachmentContent {
    /// Text content, interpreted according to the attachment's `encoding`
    Text(String),

    /// Raw bytes, sent as a JSON array of numbers
    Binary(Vec<u8>),
}

/// A file attached to an outbound email
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// The file name shown to the recipient
    #[schema(example = "document.pdf")]
    pub filename: String,

    /// The file content
    pub content: AttachmentContent,

    /// MIME type, `application/octet-stream` when absent
    #[schema(example = "application/pdf")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// How text content is encoded; only `base64` changes anything
    #[schema(example = "base64")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

impl Attachment {
    /// The bytes to put on the wire, after undoing any declared encoding.
    pub fn decoded_content(&self) -> Result<Vec<u8>, MailerError> {
        let encoding = self.encoding.as_deref().map(str::to_ascii_lowercase);

        match (&self.content, encoding.as_deref()) {
            (AttachmentContent::Binary(bytes), _) => Ok(bytes.clone()),
            (AttachmentContent::Text(text), Some("base64")) => STANDARD
                .decode(text.trim())
                .map_err(|e| {
                    MailerError::InvalidMessage(format!(
                        "attachment \"{}\" is not valid base64: {e}",
                        self.filename
                    ))
                }),
            (AttachmentContent::Text(text), None | Some("utf8" | "utf-8" | "binary")) => {
                Ok(text.as_bytes().to_vec())
            }
            (AttachmentContent::Text(_), Some(other)) => Err(MailerError::InvalidMessage(format!(
                "attachment \"{}\" uses unsupported encoding \"{other}\"",
                self.filename
            ))),
        }
    }
}

/// The fields of an email as supplied by a caller, before any checking
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmailFields {
    /// Recipients
    pub to: Vec<String>,

    /// Subject line
    pub subject: String,

    /// Plain text body
    pub text: Option<String>,

    /// HTML body
    pub html: Option<String>,

    /// Sender, the transport account when absent
    pub from: Option<String>,

    /// Carbon-copy recipients
    pub cc: Option<Vec<String>>,

    /// Blind carbon-copy recipients
    pub bcc: Option<Vec<String>>,

    /// Attached files
    pub attachments: Option<Vec<Attachment>>,
}

/// The outcome of [`EmailMessage::validate`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    /// Whether every check passed
    pub is_valid: bool,

    /// Every failed check, in a fixed order
    pub errors: Vec<String>,
}

/// One outbound email
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    to: Vec<String>,
    subject: String,
    text: Option<String>,
    html: Option<String>,
    from: Option<String>,
    cc: Vec<String>,
    bcc: Vec<String>,
    attachments: Vec<Attachment>,
    created_at: DateTime<Utc>,
}

impl EmailMessage {
    /// Builds a message from `fields` as given; only the creation time is filled in.
    pub fn new(fields: EmailFields) -> Self {
        Self {
            to: fields.to,
            subject: fields.subject,
            text: fields.text,
            html: fields.html,
            from: fields.from,
            cc: fields.cc.unwrap_or_default(),
            bcc: fields.bcc.unwrap_or_default(),
            attachments: fields.attachments.unwrap_or_default(),
            created_at: Utc::now(),
        }
    }

    /// Runs every check and reports all failures at once.
    ///
    /// Order: recipients, subject, content, then the address format of each `to`, `cc`
    /// and `bcc` entry in turn.
    pub fn validate(&self) -> Validation {
        let mut errors = Vec::new();

        if self.to.is_empty() {
            errors.push("Recipients (to) are required and must be a non-empty array".to_string());
        }

        if self.subject.trim().is_empty() {
            errors.push("Subject is required".to_string());
        } else if self.subject.chars().count() > MAX_SUBJECT_LENGTH {
            errors.push(format!("Subject cannot exceed {MAX_SUBJECT_LENGTH} characters"));
        }

        if is_blank(&self.text) && is_blank(&self.html) {
            errors.push("Either text or html content is required".to_string());
        }

        for (label, addresses) in [("", &self.to), ("CC ", &self.cc), ("BCC ", &self.bcc)] {
            for (index, address) in addresses.iter().enumerate() {
                if !EmailAddress::is_valid(address) {
                    errors.push(format!(
                        "Invalid {label}email format at index {index}: {address}"
                    ));
                }
            }
        }

        Validation {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    /// Recipients
    pub fn to(&self) -> &[String] {
        &self.to
    }

    /// Subject line
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Plain text body, if any
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    /// HTML body, if any
    pub fn html(&self) -> Option<&str> {
        self.html.as_deref().filter(|html| !html.is_empty())
    }

    /// Explicit sender, if any
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Carbon-copy recipients, empty when none were given
    pub fn cc(&self) -> &[String] {
        &self.cc
    }

    /// Blind carbon-copy recipients, empty when none were given
    pub fn bcc(&self) -> &[String] {
        &self.bcc
    }

    /// Attached files, empty when none were given
    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// When the message was constructed
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn is_blank(content: &Option<String>) -> bool {
    content.as_deref().map_or(true, str::is_empty)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    fn valid_fields() -> EmailFields {
        EmailFields {
            to: vec!["a@b.com".to_string()],
            subject: "Hi".to_string(),
            text: Some("hello".to_string()),
            ..EmailFields::default()
        }
    }

    #[test]
    fn test_new_copies_fields() {
        let before = Utc::now();
        let message = EmailMessage::new(EmailFields {
            from: Some("sender@example.com".to_string()),
            cc: Some(vec!["cc@example.com".to_string()]),
            ..valid_fields()
        });

        assert_eq!(message.to(), ["a@b.com".to_string()]);
        assert_eq!(message.subject(), "Hi");
        assert_eq!(message.text(), Some("hello"));
        assert_eq!(message.html(), None);
        assert_eq!(message.from(), Some("sender@example.com"));
        assert_eq!(message.cc(), ["cc@example.com".to_string()]);
        assert!(message.bcc().is_empty());
        assert!(message.attachments().is_empty());
        assert!(message.created_at() >= before);
    }

    #[test]
    fn test_valid_message() {
        let validation = EmailMessage::new(valid_fields()).validate();

        assert!(validation.is_valid);
        assert!(validation.errors.is_empty());
    }

    #[test]
    fn test_empty_recipients() {
        let validation = EmailMessage::new(EmailFields {
            to: vec![],
            ..valid_fields()
        })
        .validate();

        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors,
            vec!["Recipients (to) are required and must be a non-empty array"]
        );
    }

    #[test]
    fn test_missing_content_is_flagged_even_when_everything_else_is_valid() {
        for (text, html) in [
            (None, None),
            (Some(String::new()), None),
            (None, Some(String::new())),
            (Some(String::new()), Some(String::new())),
        ] {
            let validation = EmailMessage::new(EmailFields {
                text,
                html,
                ..valid_fields()
            })
            .validate();

            assert_eq!(validation.errors, vec!["Either text or html content is required"]);
        }
    }

    #[test]
    fn test_html_alone_is_enough() {
        let validation = EmailMessage::new(EmailFields {
            text: None,
            html: Some("<p>hello</p>".to_string()),
            ..valid_fields()
        })
        .validate();

        assert!(validation.is_valid);
    }

    #[test]
    fn test_blank_subject() {
        let validation = EmailMessage::new(EmailFields {
            subject: "   ".to_string(),
            ..valid_fields()
        })
        .validate();

        assert_eq!(validation.errors, vec!["Subject is required"]);
    }

    #[test]
    fn test_subject_length_bound() {
        let at_limit = EmailMessage::new(EmailFields {
            subject: "é".repeat(MAX_SUBJECT_LENGTH),
            ..valid_fields()
        })
        .validate();

        let over_limit = EmailMessage::new(EmailFields {
            subject: "x".repeat(MAX_SUBJECT_LENGTH + 1),
            ..valid_fields()
        })
        .validate();

        assert!(at_limit.is_valid);
        assert_eq!(
            over_limit.errors,
            vec!["Subject cannot exceed 200 characters"]
        );
    }

    #[test]
    fn test_every_error_is_reported_in_order() {
        let validation = EmailMessage::new(EmailFields {
            to: vec!["ok@example.com".to_string(), "broken".to_string()],
            subject: String::new(),
            text: None,
            html: None,
            cc: Some(vec!["cc@nowhere".to_string()]),
            bcc: Some(vec!["fine@example.com".to_string(), "b c@x.io".to_string()]),
            ..EmailFields::default()
        })
        .validate();

        assert!(!validation.is_valid);
        assert_eq!(
            validation.errors,
            vec![
                "Subject is required",
                "Either text or html content is required",
                "Invalid email format at index 1: broken",
                "Invalid CC email format at index 0: cc@nowhere",
                "Invalid BCC email format at index 1: b c@x.io",
            ]
        );
    }

    #[test]
    fn test_decoded_content() -> TestResult {
        let plain = Attachment {
            filename: "a.txt".to_string(),
            content: AttachmentContent::Text("hello".to_string()),
            content_type: None,
            encoding: None,
        };

        let encoded = Attachment {
            content: AttachmentContent::Text("aGVsbG8=".to_string()),
            encoding: Some("BASE64".to_string()),
            ..plain.clone()
        };

        let binary = Attachment {
            content: AttachmentContent::Binary(vec![104, 105]),
            ..plain.clone()
        };

        assert_eq!(plain.decoded_content()?, b"hello");
        assert_eq!(encoded.decoded_content()?, b"hello");
        assert_eq!(binary.decoded_content()?, b"hi");

        Ok(())
    }

    #[test]
    fn test_decoded_content_rejects_bad_input() {
        let bad_base64 = Attachment {
            filename: "a.bin".to_string(),
            content: AttachmentContent::Text("not base64!".to_string()),
            content_type: None,
            encoding: Some("base64".to_string()),
        };

        let unknown = Attachment {
            encoding: Some("rot13".to_string()),
            ..bad_base64.clone()
        };

        assert!(matches!(
            bad_base64.decoded_content(),
            Err(MailerError::InvalidMessage(_))
        ));
        assert!(matches!(
            unknown.decoded_content(),
            Err(MailerError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_fields_deserialize_with_camel_case_and_defaults() -> TestResult {
        let fields: EmailFields = serde_json::from_str(
            r#"{
                "to": ["a@b.com"],
                "subject": "Hi",
                "attachments": [
                    {
                        "filename": "a.txt",
                        "content": "aGk=",
                        "contentType": "text/plain",
                        "encoding": "base64"
                    },
                    {"filename": "b.bin", "content": [1, 2, 3]}
                ],
                "unknown": true
            }"#,
        )?;

        let attachments = fields.attachments.unwrap_or_default();

        assert_eq!(fields.text, None);
        assert_eq!(attachments[0].content_type.as_deref(), Some("text/plain"));
        assert_eq!(attachments[1].content, AttachmentContent::Binary(vec![1, 2, 3]));

        Ok(())
    }
}
