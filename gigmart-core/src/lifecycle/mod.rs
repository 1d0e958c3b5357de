//! The order state machine.
//!
//! [`transition`] holds the pure rules; [`OrderLifecycle`] evaluates them
//! against the freshest stored record and persists the result with a
//! compare-and-swap, so concurrent attempts on one order serialize and the
//! loser re-evaluates against the winner's write.

mod actions;
pub mod transition;

pub use actions::{AcceptOrder, CompleteOrder, CreateOrder, GetVisibleOrder, ListVisibleOrders};
pub use transition::Transition;

use crate::entities::order_records::OrderRecord;
use crate::error::ErrorKind;
use crate::notify::NotificationBroker;
use crate::store::{OrderStore, ServiceCatalog, StoreError};
use crate::utils::clock::now_utc_primitive;
use gigmart_sdk::token::Principal;
use std::sync::Arc;
use uuid::Uuid;

/// How many times a transition re-reads after losing a write race.
pub const MAX_TRANSITION_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Missing {
    Order(Uuid),
    Service(i64),
}

impl std::fmt::Display for Missing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Missing::Order(id) => write!(f, "order {id}"),
            Missing::Service(id) => write!(f, "service {id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForbiddenReason {
    NotClient,
    NotWorker,
    NotOrderClient,
    NotAssignedWorker,
}

impl ForbiddenReason {
    pub fn code(&self) -> &'static str {
        match self {
            ForbiddenReason::NotClient => "not_client",
            ForbiddenReason::NotWorker => "not_worker",
            ForbiddenReason::NotOrderClient => "not_order_client",
            ForbiddenReason::NotAssignedWorker => "not_assigned_worker",
        }
    }
}

impl std::fmt::Display for ForbiddenReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ForbiddenReason::NotClient => "actor is not a client",
            ForbiddenReason::NotWorker => "actor is not a worker",
            ForbiddenReason::NotOrderClient => "actor is not the order's client",
            ForbiddenReason::NotAssignedWorker => "actor is not the order's assigned worker",
        })
    }
}

/// Why a guard rejected a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreconditionReason {
    AlreadyAssigned,
    NotPending,
    NotPaid,
    AlreadyPaid,
    OrderClosed,
    ServiceInactive,
    PaymentReferenceMismatch,
    PaymentAlreadySucceeded,
    /// Concurrent writers kept moving the order.
    Contended,
}

impl PreconditionReason {
    /// Stable wire code.
    pub fn code(&self) -> &'static str {
        match self {
            PreconditionReason::AlreadyAssigned => "already_assigned",
            PreconditionReason::NotPending => "not_pending",
            PreconditionReason::NotPaid => "not_paid",
            PreconditionReason::AlreadyPaid => "already_paid",
            PreconditionReason::OrderClosed => "order_closed",
            PreconditionReason::ServiceInactive => "service_inactive",
            PreconditionReason::PaymentReferenceMismatch => "payment_reference_mismatch",
            PreconditionReason::PaymentAlreadySucceeded => "payment_already_succeeded",
            PreconditionReason::Contended => "contended",
        }
    }
}

impl std::fmt::Display for PreconditionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PreconditionReason::AlreadyAssigned => "already assigned",
            PreconditionReason::NotPending => "not pending",
            PreconditionReason::NotPaid => "not paid",
            PreconditionReason::AlreadyPaid => "already paid",
            PreconditionReason::OrderClosed => "order closed",
            PreconditionReason::ServiceInactive => "service inactive",
            PreconditionReason::PaymentReferenceMismatch => "payment reference mismatch",
            PreconditionReason::PaymentAlreadySucceeded => "payment already succeeded",
            PreconditionReason::Contended => "order is being modified concurrently",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("{0} not found")]
    NotFound(Missing),
    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),
    #[error("precondition failed: {0}")]
    PreconditionFailed(PreconditionReason),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrderError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OrderError::NotFound(_) => ErrorKind::NotFound,
            OrderError::Forbidden(_) => ErrorKind::Forbidden,
            OrderError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            OrderError::Store(e) => e.kind(),
        }
    }

    /// Caller-facing detail; codes for guard failures, never store internals.
    pub fn reason(&self) -> String {
        match self {
            OrderError::NotFound(missing) => missing.to_string(),
            OrderError::Forbidden(reason) => reason.code().to_string(),
            OrderError::PreconditionFailed(reason) => reason.code().to_string(),
            OrderError::Store(_) => "record store unavailable".to_string(),
        }
    }
}

/// Result of a persisted transition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub order: OrderRecord,
    /// `false` when the order already reflected the transition.
    pub changed: bool,
}

/// Entry point for every order mutation.
#[derive(Clone)]
pub struct OrderLifecycle {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn ServiceCatalog>,
    broker: NotificationBroker,
}

impl OrderLifecycle {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn ServiceCatalog>,
        broker: NotificationBroker,
    ) -> Self {
        Self {
            orders,
            catalog,
            broker,
        }
    }

    pub fn orders(&self) -> &Arc<dyn OrderStore> {
        &self.orders
    }

    pub fn catalog(&self) -> &Arc<dyn ServiceCatalog> {
        &self.catalog
    }

    pub fn broker(&self) -> &NotificationBroker {
        &self.broker
    }

    pub async fn load(&self, order_id: Uuid) -> Result<OrderRecord, OrderError> {
        self.orders
            .get(order_id)
            .await?
            .ok_or(OrderError::NotFound(Missing::Order(order_id)))
    }

    /// Evaluate and persist `transition` on `order_id`.
    ///
    /// Each attempt reads the stored record, applies the rules and writes
    /// back conditioned on the version it read. A lost race re-reads, so a
    /// guard that the winner's write invalidated is reported to the loser.
    pub async fn transition(
        &self,
        order_id: Uuid,
        actor: &Principal,
        transition: &Transition,
    ) -> Result<TransitionOutcome, OrderError> {
        for attempt in 1..=MAX_TRANSITION_ATTEMPTS {
            let current = self.load(order_id).await?;
            let Some(next) = transition::apply(&current, actor, transition, now_utc_primitive())?
            else {
                return Ok(TransitionOutcome {
                    order: current,
                    changed: false,
                });
            };
            match self.orders.update(next).await? {
                Some(saved) => {
                    tracing::info!(
                        order_id = %order_id,
                        transition = transition.name(),
                        status = %saved.status,
                        actor = actor.identity,
                        "Order transitioned"
                    );
                    return Ok(TransitionOutcome {
                        order: saved,
                        changed: true,
                    });
                }
                None => {
                    tracing::debug!(
                        order_id = %order_id,
                        transition = transition.name(),
                        attempt,
                        "Order version moved, retrying"
                    );
                }
            }
        }
        tracing::warn!(order_id = %order_id, transition = transition.name(), "Transition gave up under contention");
        Err(OrderError::PreconditionFailed(PreconditionReason::Contended))
    }
}
