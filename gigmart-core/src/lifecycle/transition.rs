//! Transition rules of the order state machine.
//!
//! ```text
//! Pending ──confirm──▶ Paid ──complete──▶ Completed
//!    │
//!    └──cancel──▶ Canceled     (Paid/Completed cancel rejected: already_paid)
//! ```
//!
//! Functions here are pure: they judge a transition against one snapshot of
//! an order and produce the next record. Persisting it atomically is the
//! caller's job.

use super::{ForbiddenReason, OrderError, PreconditionReason};
use crate::entities::order_records::{OrderRecord, OrderStatus};
use gigmart_sdk::objects::UserRole;
use gigmart_sdk::token::Principal;

/// A mutation of an existing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A worker takes the order.
    Accept,
    /// Record the intent of a new payment attempt. `replacing` is the
    /// reference the caller observed; the attach fails if it moved.
    AttachPayment {
        reference: String,
        replacing: Option<String>,
    },
    /// The provider reported the intent succeeded.
    ConfirmPayment { reference: String },
    /// The provider canceled the intent.
    CancelPayment { reference: String },
    /// The assigned worker delivers.
    Complete,
}

impl Transition {
    pub fn name(&self) -> &'static str {
        match self {
            Transition::Accept => "accept",
            Transition::AttachPayment { .. } => "payment-create",
            Transition::ConfirmPayment { .. } => "payment-confirm",
            Transition::CancelPayment { .. } => "payment-cancel",
            Transition::Complete => "complete",
        }
    }
}

fn precondition(reason: PreconditionReason) -> OrderError {
    OrderError::PreconditionFailed(reason)
}

pub fn require_order_client(order: &OrderRecord, actor: &Principal) -> Result<(), OrderError> {
    if actor.role == UserRole::Client && actor.identity == order.client_id {
        Ok(())
    } else {
        Err(OrderError::Forbidden(ForbiddenReason::NotOrderClient))
    }
}

/// Guard for starting a payment attempt.
pub fn check_payment_start(order: &OrderRecord, actor: &Principal) -> Result<(), OrderError> {
    require_order_client(order, actor)?;
    if order.status != OrderStatus::Pending {
        return Err(precondition(PreconditionReason::NotPending));
    }
    Ok(())
}

fn check_reference(order: &OrderRecord, reference: &str) -> Result<(), OrderError> {
    if order.payment_reference.as_deref() == Some(reference) {
        Ok(())
    } else {
        Err(precondition(PreconditionReason::PaymentReferenceMismatch))
    }
}

/// Guard for confirming `reference`. Already-paid orders pass so a repeated
/// confirm can succeed without effect.
pub fn check_payment_confirm(
    order: &OrderRecord,
    actor: &Principal,
    reference: &str,
) -> Result<(), OrderError> {
    require_order_client(order, actor)?;
    check_reference(order, reference)?;
    if order.status == OrderStatus::Canceled {
        return Err(precondition(PreconditionReason::NotPending));
    }
    Ok(())
}

/// Guard for canceling `reference`. Payment on a paid order is final.
pub fn check_payment_cancel(
    order: &OrderRecord,
    actor: &Principal,
    reference: &str,
) -> Result<(), OrderError> {
    require_order_client(order, actor)?;
    check_reference(order, reference)?;
    match order.status {
        OrderStatus::Pending => Ok(()),
        OrderStatus::Paid | OrderStatus::Completed => {
            Err(precondition(PreconditionReason::AlreadyPaid))
        }
        OrderStatus::Canceled => Err(precondition(PreconditionReason::NotPending)),
    }
}

/// Apply `transition` by `actor` to `order`.
///
/// Returns the next record (version untouched, `updated_at` set to `now`),
/// or `None` when the order already reflects the transition.
pub fn apply(
    order: &OrderRecord,
    actor: &Principal,
    transition: &Transition,
    now: time::PrimitiveDateTime,
) -> Result<Option<OrderRecord>, OrderError> {
    let mut next = order.clone();
    match transition {
        Transition::Accept => {
            if actor.role != UserRole::Worker {
                return Err(OrderError::Forbidden(ForbiddenReason::NotWorker));
            }
            if order.status.is_terminal() {
                return Err(precondition(PreconditionReason::OrderClosed));
            }
            if order.worker_id.is_some() {
                return Err(precondition(PreconditionReason::AlreadyAssigned));
            }
            next.worker_id = Some(actor.identity);
        }
        Transition::AttachPayment {
            reference,
            replacing,
        } => {
            check_payment_start(order, actor)?;
            if order.payment_reference != *replacing {
                return Err(precondition(PreconditionReason::Contended));
            }
            next.payment_reference = Some(reference.clone());
        }
        Transition::ConfirmPayment { reference } => {
            check_payment_confirm(order, actor, reference)?;
            if order.status != OrderStatus::Pending {
                return Ok(None);
            }
            next.status = OrderStatus::Paid;
        }
        Transition::CancelPayment { reference } => {
            check_payment_cancel(order, actor, reference)?;
            next.status = OrderStatus::Canceled;
        }
        Transition::Complete => {
            if actor.role != UserRole::Worker || order.worker_id != Some(actor.identity) {
                return Err(OrderError::Forbidden(ForbiddenReason::NotAssignedWorker));
            }
            match order.status {
                OrderStatus::Paid => next.status = OrderStatus::Completed,
                OrderStatus::Pending => return Err(precondition(PreconditionReason::NotPaid)),
                OrderStatus::Canceled | OrderStatus::Completed => {
                    return Err(precondition(PreconditionReason::OrderClosed));
                }
            }
        }
    }
    next.updated_at = now;
    Ok(Some(next))
}
