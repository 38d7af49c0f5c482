//! crates/vytal_core/src/booking.rs
//!
//! Drives one booking attempt from a chosen slot to a confirmed appointment,
//! optionally gated by payment. Every failure is attributed to the stage that
//! produced it. Nothing here retries; a retry is the user running the whole
//! flow again.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{BookingRequest, SlotSelection};
use crate::ports::{BookingService, PaymentAuthorizer, PaymentService, PortError};
use crate::session::SessionManager;

//=========================================================================================
// Errors
//=========================================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BookingError {
    #[error("Please select a date and time slot.")]
    IncompleteSelection,
    #[error("Please add an address for the appointment.")]
    MissingAddress,
    #[error("Please sign in to book an appointment.")]
    NotAuthenticated,
    #[error("{0}")]
    OrderCreationFailed(String),
    #[error("{0}")]
    PaymentNotCompleted(String),
    #[error("{0}")]
    PaymentVerificationFailed(String),
    #[error("{0}")]
    BookingFailed(String),
    /// Payment was captured and verified but the appointment was not recorded.
    #[error("Payment {payment_id} succeeded but the booking was not saved: {message}")]
    BookingFinalizationFailed { payment_id: String, message: String },
}

impl BookingError {
    /// Remote failures the user may fix by starting the flow again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::OrderCreationFailed(_)
                | BookingError::PaymentNotCompleted(_)
                | BookingError::PaymentVerificationFailed(_)
                | BookingError::BookingFailed(_)
        )
    }

    /// Money may have moved without an appointment; only support can resolve it.
    pub fn requires_support(&self) -> bool {
        matches!(self, BookingError::BookingFinalizationFailed { .. })
    }

    /// The text to show the user.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::BookingFinalizationFailed { payment_id, .. } => format!(
                "Your payment was received but we could not confirm your appointment. \
                 Please contact support with payment reference {}.",
                payment_id
            ),
            other => other.to_string(),
        }
    }
}

fn message_or(error: &PortError, fallback: &str) -> String {
    error
        .server_message()
        .map(str::to_string)
        .unwrap_or_else(|| fallback.to_string())
}

//=========================================================================================
// Request and Outcome Types
//=========================================================================================

/// Whether the service is paid for before it is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    Direct,
    /// Amount in the smallest currency unit.
    Paid { amount: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingPlan {
    pub service_id: String,
    pub selection: SlotSelection,
    pub notes: Option<String>,
    pub mode: PaymentMode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingOutcome {
    /// The record returned by the backend.
    pub booking: serde_json::Value,
    pub payment_id: Option<String>,
}

//=========================================================================================
// The Coordinator
//=========================================================================================

pub struct BookingFlow {
    session: Arc<SessionManager>,
    bookings: Arc<dyn BookingService>,
    payments: Arc<dyn PaymentService>,
    authorizer: Arc<dyn PaymentAuthorizer>,
}

impl BookingFlow {
    pub fn new(
        session: Arc<SessionManager>,
        bookings: Arc<dyn BookingService>,
        payments: Arc<dyn PaymentService>,
        authorizer: Arc<dyn PaymentAuthorizer>,
    ) -> Self {
        Self {
            session,
            bookings,
            payments,
            authorizer,
        }
    }

    /// Runs a booking attempt to completion.
    pub async fn book(&self, plan: BookingPlan) -> Result<BookingOutcome, BookingError> {
        let (token, request) = self.prepare(&plan)?;

        match plan.mode {
            PaymentMode::Direct => self.book_direct(&token, request).await,
            PaymentMode::Paid { amount } => self.book_paid(&token, request, amount).await,
        }
    }

    /// Checks everything that can be checked locally and builds the request.
    fn prepare(&self, plan: &BookingPlan) -> Result<(String, BookingRequest), BookingError> {
        let (Some(date), Some(time_slot)) = (
            plan.selection.date,
            plan.selection
                .time_slot
                .as_deref()
                .filter(|slot| !slot.trim().is_empty()),
        ) else {
            return Err(BookingError::IncompleteSelection);
        };

        let session = self.session.snapshot();
        let user = session.user.ok_or(BookingError::NotAuthenticated)?;
        let address = user
            .address()
            .filter(|a| a.is_deliverable())
            .cloned()
            .ok_or(BookingError::MissingAddress)?;
        let token = session
            .token
            .filter(|t| !t.is_empty())
            .ok_or(BookingError::NotAuthenticated)?;

        let request = BookingRequest {
            service_id: plan.service_id.clone(),
            preferred_date: date,
            preferred_time_slot: time_slot.to_string(),
            address,
            notes: plan.notes.clone().filter(|n| !n.trim().is_empty()),
            payment_id: None,
        };
        Ok((token, request))
    }

    async fn book_direct(
        &self,
        token: &str,
        request: BookingRequest,
    ) -> Result<BookingOutcome, BookingError> {
        info!(service_id = %request.service_id, slot = %request.preferred_time_slot, "Creating booking");
        let booking = self
            .bookings
            .create_booking(token, &request)
            .await
            .map_err(|e| {
                warn!(error = %e, "Booking request failed");
                BookingError::BookingFailed(message_or(&e, "Failed to create booking"))
            })?;
        info!(service_id = %request.service_id, "Booking created");
        Ok(BookingOutcome {
            booking,
            payment_id: None,
        })
    }

    async fn book_paid(
        &self,
        token: &str,
        mut request: BookingRequest,
        amount: u64,
    ) -> Result<BookingOutcome, BookingError> {
        // 1. Order
        info!(service_id = %request.service_id, amount, "Creating payment order");
        let order = self.payments.create_order(token, amount).await.map_err(|e| {
            warn!(error = %e, "Payment order creation failed");
            BookingError::OrderCreationFailed(message_or(&e, "Failed to create payment order"))
        })?;

        // 2. Authorization
        let authorization = self.authorizer.authorize(&order).await.map_err(|e| {
            info!(order_id = %order.order.id, error = %e, "Payment not completed");
            let message = match e {
                PortError::Cancelled => "Payment was cancelled.".to_string(),
                other => message_or(&other, "Payment was not completed."),
            };
            BookingError::PaymentNotCompleted(message)
        })?;

        // 3. Verification, then the booking itself
        self.payments
            .verify_payment(token, &authorization)
            .await
            .map_err(|e| {
                warn!(
                    order_id = %authorization.order_id,
                    payment_id = %authorization.payment_id,
                    error = %e,
                    "Payment verification failed"
                );
                BookingError::PaymentVerificationFailed(message_or(&e, "Failed to verify payment"))
            })?;

        request.payment_id = Some(authorization.payment_id.clone());
        match self.bookings.create_booking(token, &request).await {
            Ok(booking) => {
                info!(payment_id = %authorization.payment_id, "Paid booking created");
                Ok(BookingOutcome {
                    booking,
                    payment_id: Some(authorization.payment_id),
                })
            }
            Err(e) => {
                error!(
                    order_id = %authorization.order_id,
                    payment_id = %authorization.payment_id,
                    service_id = %request.service_id,
                    error = %e,
                    "Payment captured but booking was not recorded"
                );
                Err(BookingError::BookingFinalizationFailed {
                    payment_id: authorization.payment_id,
                    message: message_or(&e, "Failed to create booking"),
                })
            }
        }
    }
}
