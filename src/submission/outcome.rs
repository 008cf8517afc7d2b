use serde::Serialize;

use crate::models::Submission;
use crate::sheets::SinkOutcome;

/// Which writers succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    BothFailed,
    PrimaryOnly,
    SecondaryOnly,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriterStatus {
    Success,
    Skipped,
    Failed,
}

/// Response body of an accepted submission.
#[derive(Debug, Serialize)]
pub struct Accepted {
    pub success: bool,
    pub data: Option<Submission>,
    #[serde(rename = "supabaseStatus")]
    pub primary_status: WriterStatus,
    #[serde(rename = "sheetsStatus")]
    pub sheets_status: WriterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug)]
pub enum Outcome {
    Accepted(Accepted),
    /// Both writers failed; the message names both errors.
    Failed(String),
}

pub fn state(primary: &Result<Submission, String>, secondary: &SinkOutcome) -> WriteState {
    match (primary.is_ok(), secondary.is_success()) {
        (true, true) => WriteState::Both,
        (true, false) => WriteState::PrimaryOnly,
        (false, true) => WriteState::SecondaryOnly,
        (false, false) => WriteState::BothFailed,
    }
}

/// Combine the two writers' results. Success if either writer succeeded.
/// A sink that timed out or could not be reached after a successful primary
/// write is reported as skipped rather than failed.
pub fn aggregate(primary: Result<Submission, String>, secondary: SinkOutcome) -> Outcome {
    match state(&primary, &secondary) {
        WriteState::BothFailed => {
            let db_err = primary.err().unwrap_or_default();
            let sheets_err = secondary.error().unwrap_or_default();
            Outcome::Failed(format!("Database: {db_err}, Sheets: {sheets_err}"))
        }
        WriteState::Both => Outcome::Accepted(Accepted {
            success: true,
            data: primary.ok(),
            primary_status: WriterStatus::Success,
            sheets_status: WriterStatus::Success,
            message: None,
        }),
        WriteState::SecondaryOnly => {
            if let Err(e) = &primary {
                tracing::error!("Submission reached the spreadsheet only: {e}");
            }
            Outcome::Accepted(Accepted {
                success: true,
                data: None,
                primary_status: WriterStatus::Failed,
                sheets_status: WriterStatus::Success,
                message: None,
            })
        }
        WriteState::PrimaryOnly => {
            let skipped = matches!(
                secondary,
                SinkOutcome::TimedOut | SinkOutcome::Unreachable(_)
            );
            if let Some(e) = secondary.error() {
                tracing::warn!("Spreadsheet append failed, submission kept in database: {e}");
            }
            Outcome::Accepted(Accepted {
                success: true,
                data: primary.ok(),
                primary_status: WriterStatus::Success,
                sheets_status: if skipped {
                    WriterStatus::Skipped
                } else {
                    WriterStatus::Failed
                },
                message: skipped.then(|| {
                    "Form submitted successfully but the spreadsheet update was skipped"
                        .to_string()
                }),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormVariant;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn stored() -> Submission {
        Submission {
            id: Uuid::new_v4(),
            form_type: FormVariant::General,
            email_address: Some("a@b.co".into()),
            full_name: None,
            whatsapp_number: None,
            form_data: json!({}),
            occupation: None,
            recommendation: None,
            income: None,
            frontend_interest: None,
            created_at: Utc::now(),
        }
    }

    fn accepted(outcome: Outcome) -> Accepted {
        match outcome {
            Outcome::Accepted(a) => a,
            Outcome::Failed(e) => panic!("expected success, got {e}"),
        }
    }

    #[test]
    fn both_writers_succeed() {
        let out = accepted(aggregate(Ok(stored()), SinkOutcome::Appended));
        assert_eq!(out.primary_status, WriterStatus::Success);
        assert_eq!(out.sheets_status, WriterStatus::Success);
        assert!(out.data.is_some());
        assert!(out.message.is_none());
    }

    #[test]
    fn timeout_after_primary_is_skipped() {
        let out = accepted(aggregate(Ok(stored()), SinkOutcome::TimedOut));
        assert_eq!(out.primary_status, WriterStatus::Success);
        assert_eq!(out.sheets_status, WriterStatus::Skipped);
        assert!(out.message.unwrap().contains("skipped"));
    }

    #[test]
    fn rejection_after_primary_is_failed_but_accepted() {
        let out = accepted(aggregate(
            Ok(stored()),
            SinkOutcome::Rejected("Permission denied".into()),
        ));
        assert!(out.success);
        assert_eq!(out.primary_status, WriterStatus::Success);
        assert_eq!(out.sheets_status, WriterStatus::Failed);
        assert!(out.message.is_none());
    }

    #[test]
    fn secondary_only_is_accepted() {
        let out = accepted(aggregate(Err("connection refused".into()), SinkOutcome::Appended));
        assert_eq!(out.primary_status, WriterStatus::Failed);
        assert_eq!(out.sheets_status, WriterStatus::Success);
        assert!(out.data.is_none());
    }

    #[test]
    fn both_failed_concatenates_errors() {
        match aggregate(
            Err("pool timed out".into()),
            SinkOutcome::Unreachable("Fetch error: dns".into()),
        ) {
            Outcome::Failed(msg) => {
                assert!(msg.contains("pool timed out"));
                assert!(msg.contains("Fetch error: dns"));
            }
            Outcome::Accepted(_) => panic!("expected failure"),
        }
    }

    #[test]
    fn state_table() {
        let ok: Result<Submission, String> = Ok(stored());
        let err: Result<Submission, String> = Err("x".into());
        assert_eq!(state(&ok, &SinkOutcome::Appended), WriteState::Both);
        assert_eq!(state(&ok, &SinkOutcome::TimedOut), WriteState::PrimaryOnly);
        assert_eq!(state(&err, &SinkOutcome::Appended), WriteState::SecondaryOnly);
        assert_eq!(state(&err, &SinkOutcome::TimedOut), WriteState::BothFailed);
    }

    #[test]
    fn serializes_wire_names() {
        let out = accepted(aggregate(Ok(stored()), SinkOutcome::TimedOut));
        let v = serde_json::to_value(&out).unwrap();
        assert_eq!(v["supabaseStatus"], "success");
        assert_eq!(v["sheetsStatus"], "skipped");
        assert_eq!(v["success"], true);
    }
}
