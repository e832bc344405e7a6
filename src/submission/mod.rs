//! Submission bridge: validate the whole form once, then hand the structured
//! value to the rendering service.
//!
//! Validation is synchronous and sees the state exactly as it was when submit
//! was triggered. The only suspension point is the single render call, and at
//! most one such call is outstanding per bridge.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

pub use crate::schema::StructuredValue;

use crate::client::{RenderRequest, TemplateService, TransportError};
use crate::form::{Form, FormState};
use crate::schema::{ValidationErrors, ValidationSchema};

/// Runs the full schema against the current state in one pass.
pub fn submit(state: &FormState, schema: &ValidationSchema) -> Result<StructuredValue, ValidationErrors> {
    schema.validate(&state.snapshot())
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("{0}")]
    Validation(ValidationErrors),
    #[error("a submission is already in progress")]
    InFlight,
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Owns the at-most-one-in-flight flag for one form.
#[derive(Clone)]
pub struct SubmissionBridge {
    service: Arc<dyn TemplateService>,
    in_flight: Arc<AtomicBool>,
}

impl SubmissionBridge {
    pub fn new(service: Arc<dyn TemplateService>) -> Self {
        Self {
            service,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Synchronous half of a submission: claims the in-flight slot and
    /// validates. Field errors are stored on the form for display. The slot is
    /// released again unless a [`PendingRender`] is returned.
    pub fn prepare(&self, form: &mut Form, template_id: &str) -> Result<PendingRender, SubmitError> {
        let guard = InFlightGuard::acquire(&self.in_flight).ok_or(SubmitError::InFlight)?;
        let data = form.validate().map_err(SubmitError::Validation)?;

        Ok(PendingRender {
            service: self.service.clone(),
            request: RenderRequest::new(template_id, data),
            _guard: guard,
        })
    }

    /// Validates and renders. Exactly one render call is made per successful
    /// validation; a failed call is reported, never retried.
    pub async fn submit(&self, form: &mut Form, template_id: &str) -> Result<Vec<u8>, SubmitError> {
        let pending = self.prepare(form, template_id)?;
        pending.send().await
    }
}

/// Validated submission waiting for its render call. Holds the in-flight slot
/// until it is sent or dropped.
pub struct PendingRender {
    service: Arc<dyn TemplateService>,
    request: RenderRequest,
    _guard: InFlightGuard,
}

impl PendingRender {
    pub async fn send(self) -> Result<Vec<u8>, SubmitError> {
        log::info!("Rendering template {}", self.request.template_id);
        let document = self.service.render(&self.request).await.map_err(|e| {
            log::error!("Render of template {} failed: {}", self.request.template_id, e);
            SubmitError::Transport(e)
        })?;
        log::info!(
            "Rendered template {} ({} bytes)",
            self.request.template_id,
            document.len()
        );
        Ok(document)
    }
}

struct InFlightGuard(Arc<AtomicBool>);

impl InFlightGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(flag.clone()))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
