//! Submission.
//!
//! [`Form::submit`] gathers a [`Bag`] from one snapshot, checks the validity
//! flag selected by [`FormConfig::validity`](crate::config::FormConfig), and
//! then takes exactly one of two paths:
//!
//! * invalid: every leaf is marked touched and touched-after-submit, then
//!   [`SubmitHandler::on_invalid`] runs once with a bag read after that
//!   write. The submission state is left
//!   alone and the call returns [`SubmitOutcome::Invalid`].
//! * valid: the state goes `Pending`, [`SubmitHandler::on_submit`] is
//!   awaited, and the state settles to `Success` or `Failed`.
//!
//! No lock is held while a handler runs, so handlers may freely read and
//! mutate the form through `bag.form`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use handle_trait::Handle;

use super::{Form, FormError, SubmissionState, SubmitResult};
use crate::{
    Result,
    aggregate::{FormDirty, FormValidation},
    value::Value,
};

/// Error returned by a failing submit handler.
pub type SubmitError = Box<dyn std::error::Error + Send + Sync>;

/// Everything a submit handler gets to see, read from one snapshot.
#[derive(Debug, Clone)]
pub struct Bag {
    pub values: Value,
    pub all_values: Value,
    pub initial_values: Value,
    pub touched: BTreeMap<String, bool>,
    pub field_ids: Vec<String>,
    pub validation: FormValidation,
    pub dirty: FormDirty,
    /// The form itself, for `set_values`, `set_errors`, `reset` and friends.
    pub form: Form,
    /// Store version the bag was read at.
    pub version: u64,
}

/// Receives submissions.
#[async_trait]
pub trait SubmitHandler: Send + Sync {
    /// Called with a valid form. The returned value settles the submission.
    async fn on_submit(&self, bag: &Bag, args: &Value) -> std::result::Result<Value, SubmitError>;

    /// Called once when a submission is rejected as invalid.
    async fn on_invalid(&self, bag: &Bag, args: &Value) {
        let _ = (bag, args);
    }
}

/// Result of [`Form::submit`].
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The handler accepted the submission and returned this value.
    Submitted(Value),
    /// Validation failed; `on_invalid` was called instead.
    Invalid,
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

/// The host event that triggered a submission.
pub trait SubmitEvent {
    /// Suppresses the host's default handling of the event.
    fn prevent_default(&mut self);
}

impl Form {
    /// Reads the current bag.
    pub fn bag(&self) -> Bag {
        let snapshot = self.snapshot();
        Bag {
            values: snapshot.values(),
            all_values: snapshot.all_values(),
            initial_values: snapshot.initial_values(),
            touched: snapshot.touched(),
            field_ids: snapshot.field_ids().to_vec(),
            validation: snapshot.validation(),
            dirty: snapshot.dirty(),
            form: self.handle(),
            version: snapshot.version(),
        }
    }

    /// Submits through the handler configured on the builder.
    ///
    /// # Errors
    /// [`FormError::NoSubmitHandler`] without a handler, otherwise as
    /// [`submit_with`](Self::submit_with).
    pub async fn submit(&self, args: Value) -> Result<SubmitOutcome> {
        let handler = self.handler().cloned().ok_or_else(|| FormError::NoSubmitHandler {
            form: self.id().to_string(),
        })?;
        self.submit_with(handler.as_ref(), args).await
    }

    /// Submits through `handler`.
    ///
    /// # Errors
    /// [`FormError::SubmitFailed`] if `on_submit` fails; the submission then
    /// settles as `Failed`.
    pub async fn submit_with(
        &self,
        handler: &dyn SubmitHandler,
        args: Value,
    ) -> Result<SubmitOutcome> {
        let bag = self.bag();
        let mode = self.config().validity;

        if !bag.validation.is_valid_for(mode) {
            let bag = if self.config().touch_on_invalid_submit {
                self.touch_all_after_submit()?;
                self.bag()
            } else {
                bag
            };
            tracing::info!(
                form = %self.id(),
                failing = ?bag.validation.failing(mode),
                "Submission rejected as invalid"
            );
            handler.on_invalid(&bag, &args).await;
            return Ok(SubmitOutcome::Invalid);
        }

        self.set_submission(SubmissionState::Pending)?;
        tracing::debug!(form = %self.id(), "Submission pending");

        match handler.on_submit(&bag, &args).await {
            Ok(value) => {
                self.set_submission(SubmissionState::Settled(SubmitResult::Success(
                    value.clone(),
                )))?;
                tracing::info!(form = %self.id(), "Submission succeeded");
                Ok(SubmitOutcome::Submitted(value))
            }
            Err(err) => {
                let reason = err.to_string();
                self.set_submission(SubmissionState::Settled(SubmitResult::Failed(
                    reason.clone(),
                )))?;
                tracing::info!(form = %self.id(), reason = %reason, "Submission failed");
                Err(FormError::SubmitFailed {
                    form: self.id().to_string(),
                    reason,
                }
                .into())
            }
        }
    }

    /// Calls `event.prevent_default()` and submits.
    pub async fn handle_submit<E>(&self, event: &mut E, args: Value) -> Result<SubmitOutcome>
    where
        E: SubmitEvent + ?Sized,
    {
        event.prevent_default();
        self.submit(args).await
    }

    fn set_submission(&self, submission: SubmissionState) -> Result<()> {
        self.store().atomic(|tx| {
            tx.update_form(self.id(), |state| state.submission = submission);
            Ok(())
        })
    }
}
