//! Request/offer draft manager: field entry, attachment list with a
//! confirmation gate on removal, date normalization and submit validation.
//!
//! One [`DraftSession`] backs both the "request a commission" and the
//! "offer a commission" forms; the [`SubmissionIntent`] only changes labels.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lumi_core::{ImageRef, SubmissionIntent};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const CRATE_NAME: &str = "lumi-draft";

/// Layout of `RequestDraft::date_requested`, e.g. `03/03/2025`.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all required fields.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftField {
    CommissionName,
    Description,
    DateRequested,
    Category,
    ContactInfo,
}

impl DraftField {
    /// Required fields in the order they are checked on submit.
    pub const REQUIRED: [DraftField; 4] = [
        DraftField::CommissionName,
        DraftField::Description,
        DraftField::DateRequested,
        DraftField::ContactInfo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DraftField::CommissionName => "commission_name",
            DraftField::Description => "description",
            DraftField::DateRequested => "date_requested",
            DraftField::Category => "category",
            DraftField::ContactInfo => "contact_info",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DraftField::CommissionName => "Commission Name",
            DraftField::Description => "Description",
            DraftField::DateRequested => "Date Requested",
            DraftField::Category => "Category",
            DraftField::ContactInfo => "Contact Information",
        }
    }

    pub fn is_required(self) -> bool {
        !matches!(self, DraftField::Category)
    }
}

/// In-progress request or offer form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RequestDraft {
    pub commission_name: String,
    pub description: String,
    pub date_requested: String,
    pub category: String,
    pub contact_info: String,
    pub attachments: Vec<ImageRef>,
}

impl RequestDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, field: DraftField) -> &str {
        match field {
            DraftField::CommissionName => &self.commission_name,
            DraftField::Description => &self.description,
            DraftField::DateRequested => &self.date_requested,
            DraftField::Category => &self.category,
            DraftField::ContactInfo => &self.contact_info,
        }
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        let slot = match field {
            DraftField::CommissionName => &mut self.commission_name,
            DraftField::Description => &mut self.description,
            DraftField::DateRequested => &mut self.date_requested,
            DraftField::Category => &mut self.category,
            DraftField::ContactInfo => &mut self.contact_info,
        };
        *slot = value.into();
    }

    /// Appends without deduplication or a size cap.
    pub fn add_attachment(&mut self, image: impl Into<ImageRef>) {
        self.attachments.push(image.into());
    }

    /// Removes the attachment at `index`, shifting later ones down.
    pub fn remove_attachment(&mut self, index: usize) -> Result<ImageRef, DraftError> {
        let len = self.attachments.len();
        if index >= len {
            return Err(DraftError::IndexOutOfRange { index, len });
        }
        Ok(self.attachments.remove(index))
    }

    pub fn apply_selected_date(&mut self, date: NaiveDate) {
        self.date_requested = format_requested_date(date);
    }

    /// Presence-only check of the required fields after trimming.
    pub fn validate_for_submit(&self) -> ValidationResult {
        let missing = DraftField::REQUIRED
            .into_iter()
            .filter(|field| self.field(*field).trim().is_empty())
            .collect::<Vec<_>>();
        let Some(&first) = missing.first() else {
            return ValidationResult::Valid;
        };
        ValidationResult::MissingFields(MissingFields { first, missing })
    }

    pub fn submit(&self, intent: SubmissionIntent) -> SubmitOutcome {
        match self.validate_for_submit() {
            ValidationResult::MissingFields(missing) => SubmitOutcome::MissingFields(missing),
            ValidationResult::Valid => SubmitOutcome::Submitted(DraftSnapshot {
                submission_id: Uuid::new_v4(),
                intent,
                submitted_at: Utc::now(),
                draft: self.clone(),
            }),
        }
    }
}

/// Formats a calendar date as `MM/DD/YYYY`, using its fields verbatim.
pub fn format_requested_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingFields {
    /// First deficiency in the fixed check order.
    pub first: DraftField,
    pub missing: Vec<DraftField>,
}

impl MissingFields {
    pub fn message(&self) -> &'static str {
        MISSING_FIELDS_MESSAGE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationResult {
    Valid,
    MissingFields(MissingFields),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

/// Immutable copy of a draft handed to the submission sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSnapshot {
    pub submission_id: Uuid,
    pub intent: SubmissionIntent,
    pub submitted_at: DateTime<Utc>,
    pub draft: RequestDraft,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SubmitOutcome {
    Submitted(DraftSnapshot),
    MissingFields(MissingFields),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquireError {
    #[error("permission required")]
    PermissionDenied,
    #[error("cancelled by user")]
    UserCancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("attachment index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no attachment removal is pending")]
    NoPendingRemoval,
    #[error("draft session has already ended")]
    SessionEnded,
    #[error(transparent)]
    Acquire(#[from] AcquireError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireVia {
    Library,
    Camera,
}

/// Platform photo picker. Implementations own permission prompts.
#[async_trait]
pub trait AttachmentSource: Send + Sync {
    async fn pick_from_library(&self) -> Result<ImageRef, AcquireError>;
    async fn capture_from_camera(&self) -> Result<ImageRef, AcquireError>;
}

/// Receives submitted drafts; persistence and transport are its business.
pub trait SubmissionSink: Send + Sync {
    fn hand_off(&self, snapshot: DraftSnapshot);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalState {
    Idle,
    PendingConfirm(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEnd {
    Submitted,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Ended(SessionEnd),
}

/// One open request/offer form owning its draft exclusively.
#[derive(Debug, Clone)]
pub struct DraftSession {
    id: Uuid,
    intent: SubmissionIntent,
    draft: RequestDraft,
    removal: RemovalState,
    state: SessionState,
}

impl DraftSession {
    pub fn new(intent: SubmissionIntent) -> Self {
        let id = Uuid::new_v4();
        debug!(session_id = %id, %intent, "draft session started");
        Self {
            id,
            intent,
            draft: RequestDraft::default(),
            removal: RemovalState::Idle,
            state: SessionState::Open,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn intent(&self) -> SubmissionIntent {
        self.intent
    }

    pub fn draft(&self) -> &RequestDraft {
        &self.draft
    }

    pub fn removal_state(&self) -> RemovalState {
        self.removal
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    fn ensure_open(&self) -> Result<(), DraftError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(DraftError::SessionEnded)
        }
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) -> Result<(), DraftError> {
        self.ensure_open()?;
        self.draft.set_field(field, value);
        Ok(())
    }

    pub fn add_attachment(&mut self, image: impl Into<ImageRef>) -> Result<(), DraftError> {
        self.ensure_open()?;
        self.draft.add_attachment(image);
        Ok(())
    }

    /// Applies the result of a picker round-trip. A denial or cancellation
    /// leaves the draft untouched and is handed back to the caller.
    pub fn apply_acquisition(&mut self, outcome: Result<ImageRef, AcquireError>) -> Result<(), DraftError> {
        self.ensure_open()?;
        match outcome {
            Ok(image) => {
                self.draft.add_attachment(image);
                Ok(())
            }
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "attachment not acquired");
                Err(err.into())
            }
        }
    }

    pub async fn acquire(&mut self, source: &dyn AttachmentSource, via: AcquireVia) -> Result<(), DraftError> {
        self.ensure_open()?;
        let outcome = match via {
            AcquireVia::Library => source.pick_from_library().await,
            AcquireVia::Camera => source.capture_from_camera().await,
        };
        self.apply_acquisition(outcome)
    }

    /// Marks `index` for removal. A newer request replaces a pending one.
    pub fn request_removal(&mut self, index: usize) -> Result<(), DraftError> {
        self.ensure_open()?;
        self.removal = RemovalState::PendingConfirm(index);
        Ok(())
    }

    pub fn cancel_removal(&mut self) {
        self.removal = RemovalState::Idle;
    }

    /// Removes the pending attachment. The gate returns to `Idle` whether or
    /// not the index was still in range.
    pub fn confirm_removal(&mut self) -> Result<ImageRef, DraftError> {
        self.ensure_open()?;
        let RemovalState::PendingConfirm(index) = self.removal else {
            return Err(DraftError::NoPendingRemoval);
        };
        self.removal = RemovalState::Idle;
        self.draft.remove_attachment(index)
    }

    pub fn apply_selected_date(&mut self, date: NaiveDate) -> Result<(), DraftError> {
        self.ensure_open()?;
        self.draft.apply_selected_date(date);
        Ok(())
    }

    /// `None` is a dismissed picker and keeps the previous date.
    pub fn apply_date_selection(&mut self, date: Option<NaiveDate>) -> Result<(), DraftError> {
        match date {
            Some(date) => self.apply_selected_date(date),
            None => self.ensure_open(),
        }
    }

    pub fn validate(&self) -> ValidationResult {
        self.draft.validate_for_submit()
    }

    /// On success the session ends and the live draft is reset; on missing
    /// fields nothing changes.
    pub fn submit(&mut self) -> Result<SubmitOutcome, DraftError> {
        self.ensure_open()?;
        let outcome = self.draft.submit(self.intent);
        match &outcome {
            SubmitOutcome::Submitted(snapshot) => {
                info!(
                    session_id = %self.id,
                    submission_id = %snapshot.submission_id,
                    intent = %self.intent,
                    attachments = snapshot.draft.attachments.len(),
                    "draft submitted"
                );
                self.draft = RequestDraft::default();
                self.removal = RemovalState::Idle;
                self.state = SessionState::Ended(SessionEnd::Submitted);
            }
            SubmitOutcome::MissingFields(missing) => {
                debug!(session_id = %self.id, first = missing.first.as_str(), "draft incomplete");
            }
        }
        Ok(outcome)
    }

    pub fn submit_to(&mut self, sink: &dyn SubmissionSink) -> Result<SubmitOutcome, DraftError> {
        let outcome = self.submit()?;
        if let SubmitOutcome::Submitted(snapshot) = &outcome {
            sink.hand_off(snapshot.clone());
        }
        Ok(outcome)
    }

    pub fn cancel(&mut self) -> Result<SessionEnd, DraftError> {
        self.ensure_open()?;
        info!(session_id = %self.id, intent = %self.intent, "draft session cancelled");
        self.draft = RequestDraft::default();
        self.removal = RemovalState::Idle;
        self.state = SessionState::Ended(SessionEnd::Cancelled);
        Ok(SessionEnd::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn filled_session(intent: SubmissionIntent) -> DraftSession {
        let mut session = DraftSession::new(intent);
        session.set_field(DraftField::CommissionName, "Aurora Portrait").unwrap();
        session.set_field(DraftField::Description, "Full body, night sky").unwrap();
        session
            .apply_selected_date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
            .unwrap();
        session.set_field(DraftField::ContactInfo, "mika@example.com").unwrap();
        session
    }

    fn with_photos(names: &[&str]) -> DraftSession {
        let mut session = DraftSession::new(SubmissionIntent::Request);
        for name in names {
            session.add_attachment(*name).unwrap();
        }
        session
    }

    fn attachment_names(session: &DraftSession) -> Vec<&str> {
        session.draft().attachments.iter().map(ImageRef::as_str).collect()
    }

    struct ScriptedSource {
        library: Result<ImageRef, AcquireError>,
        camera: Result<ImageRef, AcquireError>,
    }

    #[async_trait]
    impl AttachmentSource for ScriptedSource {
        async fn pick_from_library(&self) -> Result<ImageRef, AcquireError> {
            self.library.clone()
        }

        async fn capture_from_camera(&self) -> Result<ImageRef, AcquireError> {
            self.camera.clone()
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        received: Mutex<Vec<DraftSnapshot>>,
    }

    impl SubmissionSink for RecordingSink {
        fn hand_off(&self, snapshot: DraftSnapshot) {
            self.received.lock().unwrap().push(snapshot);
        }
    }

    #[test]
    fn march_third_formats_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        assert_eq!(format_requested_date(date), "03/03/2025");
        let date = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        assert_eq!(format_requested_date(date), "12/25/2024");
    }

    #[test]
    fn dismissed_picker_keeps_date() {
        let mut session = filled_session(SubmissionIntent::Offer);
        session.apply_date_selection(None).unwrap();
        assert_eq!(session.draft().date_requested, "03/03/2025");
        session
            .apply_date_selection(NaiveDate::from_ymd_opt(2026, 1, 9))
            .unwrap();
        assert_eq!(session.draft().date_requested, "01/09/2026");
    }

    #[test]
    fn fields_can_be_set_in_any_order_and_overwritten() {
        let mut draft = RequestDraft::new();
        draft.set_field(DraftField::ContactInfo, "a@b.c");
        draft.set_field(DraftField::Category, "Portrait");
        draft.set_field(DraftField::ContactInfo, "x@y.z");
        assert_eq!(draft.field(DraftField::ContactInfo), "x@y.z");
        assert_eq!(draft.field(DraftField::Category), "Portrait");
    }

    #[test]
    fn attachments_keep_order_and_duplicates() {
        let session = with_photos(&["a.jpg", "b.jpg", "a.jpg"]);
        assert_eq!(attachment_names(&session), vec!["a.jpg", "b.jpg", "a.jpg"]);
    }

    #[test]
    fn cancelled_removal_leaves_list_unchanged() {
        let mut session = with_photos(&["a.jpg", "b.jpg"]);
        session.request_removal(0).unwrap();
        assert_eq!(session.removal_state(), RemovalState::PendingConfirm(0));
        session.cancel_removal();
        assert_eq!(session.removal_state(), RemovalState::Idle);
        assert_eq!(attachment_names(&session), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn confirmed_removal_shifts_rest_down() {
        let mut session = with_photos(&["a.jpg", "b.jpg", "c.jpg"]);
        session.request_removal(0).unwrap();
        let removed = session.confirm_removal().unwrap();
        assert_eq!(removed.as_str(), "a.jpg");
        assert_eq!(attachment_names(&session), vec!["b.jpg", "c.jpg"]);
        assert_eq!(session.removal_state(), RemovalState::Idle);
    }

    #[test]
    fn second_request_replaces_pending_index() {
        let mut session = with_photos(&["a.jpg", "b.jpg", "c.jpg"]);
        session.request_removal(0).unwrap();
        session.request_removal(2).unwrap();
        session.confirm_removal().unwrap();
        assert_eq!(attachment_names(&session), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn out_of_range_removal_is_a_no_op() {
        let mut session = with_photos(&["a.jpg", "b.jpg"]);
        let before = session.draft().clone();
        session.request_removal(2).unwrap();
        assert_eq!(
            session.confirm_removal(),
            Err(DraftError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(session.draft(), &before);
        assert_eq!(session.removal_state(), RemovalState::Idle);

        let mut draft = before.clone();
        assert!(draft.remove_attachment(5).is_err());
        assert_eq!(draft, before);
    }

    #[test]
    fn confirm_without_request_fails() {
        let mut session = with_photos(&["a.jpg"]);
        assert_eq!(session.confirm_removal(), Err(DraftError::NoPendingRemoval));
        assert_eq!(attachment_names(&session), vec!["a.jpg"]);
    }

    #[test]
    fn empty_name_is_first_deficiency() {
        let mut session = filled_session(SubmissionIntent::Request);
        session.set_field(DraftField::CommissionName, "").unwrap();
        match session.validate() {
            ValidationResult::MissingFields(missing) => {
                assert_eq!(missing.first, DraftField::CommissionName);
                assert_eq!(missing.missing, vec![DraftField::CommissionName]);
                assert_eq!(missing.message(), "Please fill in all required fields.");
            }
            ValidationResult::Valid => panic!("expected missing fields"),
        }
    }

    #[test]
    fn whitespace_counts_as_missing_and_order_is_fixed() {
        let mut draft = RequestDraft::new();
        draft.set_field(DraftField::ContactInfo, "   ");
        draft.set_field(DraftField::Description, "ok");
        let ValidationResult::MissingFields(missing) = draft.validate_for_submit() else {
            panic!("expected missing fields");
        };
        assert_eq!(missing.first, DraftField::CommissionName);
        assert_eq!(
            missing.missing,
            vec![
                DraftField::CommissionName,
                DraftField::DateRequested,
                DraftField::ContactInfo
            ]
        );
    }

    #[test]
    fn validation_ignores_category_attachments_and_formats() {
        let mut session = filled_session(SubmissionIntent::Request);
        session.set_field(DraftField::ContactInfo, "not an email").unwrap();
        session.set_field(DraftField::DateRequested, "someday").unwrap();
        assert!(session.validate().is_valid());
    }

    #[test]
    fn incomplete_submit_does_not_touch_draft() {
        let mut session = filled_session(SubmissionIntent::Request);
        session.set_field(DraftField::Description, "").unwrap();
        session.add_attachment("ref.png").unwrap();
        let before = session.draft().clone();

        let outcome = session.submit().unwrap();
        assert!(matches!(outcome, SubmitOutcome::MissingFields(ref m) if m.first == DraftField::Description));
        assert_eq!(session.draft(), &before);
        assert!(session.is_open());
    }

    #[test]
    fn submit_hands_snapshot_to_sink_and_ends_session() {
        let sink = RecordingSink::default();
        let mut session = filled_session(SubmissionIntent::Offer);
        session.add_attachment("product.png").unwrap();

        let outcome = session.submit_to(&sink).unwrap();
        let SubmitOutcome::Submitted(snapshot) = outcome else {
            panic!("expected submission");
        };
        assert_eq!(snapshot.intent, SubmissionIntent::Offer);
        assert_eq!(snapshot.draft.commission_name, "Aurora Portrait");
        assert_eq!(snapshot.draft.attachments.len(), 1);

        assert_eq!(session.state(), SessionState::Ended(SessionEnd::Submitted));
        assert_eq!(session.draft(), &RequestDraft::default());
        assert_eq!(sink.received.lock().unwrap().as_slice(), &[snapshot]);

        assert_eq!(session.submit(), Err(DraftError::SessionEnded));
        assert_eq!(
            session.set_field(DraftField::CommissionName, "again"),
            Err(DraftError::SessionEnded)
        );
    }

    #[test]
    fn cancel_ends_session_and_discards_draft() {
        let mut session = filled_session(SubmissionIntent::Request);
        assert_eq!(session.cancel(), Ok(SessionEnd::Cancelled));
        assert_eq!(session.state(), SessionState::Ended(SessionEnd::Cancelled));
        assert!(session.draft().commission_name.is_empty());
        assert_eq!(session.cancel(), Err(DraftError::SessionEnded));
    }

    #[test]
    fn intent_drives_labels() {
        assert_eq!(SubmissionIntent::Request.sent_title(), "Request Sent!");
        assert_eq!(SubmissionIntent::Offer.add_photo_title(), "Add Product Photo");
    }

    #[tokio::test]
    async fn acquisition_appends_on_success() {
        let source = ScriptedSource {
            library: Ok(ImageRef::new("file:///gallery/1.jpg")),
            camera: Ok(ImageRef::new("file:///camera/2.jpg")),
        };
        let mut session = DraftSession::new(SubmissionIntent::Request);
        session.acquire(&source, AcquireVia::Library).await.unwrap();
        session.acquire(&source, AcquireVia::Camera).await.unwrap();
        assert_eq!(
            attachment_names(&session),
            vec!["file:///gallery/1.jpg", "file:///camera/2.jpg"]
        );
    }

    #[tokio::test]
    async fn denied_or_cancelled_acquisition_leaves_draft() {
        let source = ScriptedSource {
            library: Err(AcquireError::PermissionDenied),
            camera: Err(AcquireError::UserCancelled),
        };
        let mut session = with_photos(&["keep.jpg"]);
        assert_eq!(
            session.acquire(&source, AcquireVia::Library).await,
            Err(DraftError::Acquire(AcquireError::PermissionDenied))
        );
        assert_eq!(
            session.acquire(&source, AcquireVia::Camera).await,
            Err(DraftError::Acquire(AcquireError::UserCancelled))
        );
        assert_eq!(attachment_names(&session), vec!["keep.jpg"]);
    }

    #[test]
    fn snapshot_serializes_with_formatted_date() {
        let mut session = filled_session(SubmissionIntent::Request);
        let SubmitOutcome::Submitted(snapshot) = session.submit().unwrap() else {
            panic!("expected submission");
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["intent"], "request");
        assert_eq!(json["draft"]["date_requested"], "03/03/2025");
    }
}
