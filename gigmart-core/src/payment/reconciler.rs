//! Payment reconciliation.
//!
//! Orders only move after the oracle has confirmed the relevant fact: an
//! intent exists, an intent succeeded, an intent was canceled. An oracle
//! failure or timeout therefore never leaves a half-applied order.

use super::amount::{AmountError, to_minor_units};
use super::{IntentRequest, IntentStatus, OracleError, PaymentIntent, PaymentOracle};
use crate::config::PaymentConfig;
use crate::entities::order_records::OrderRecord;
use crate::error::ErrorKind;
use crate::lifecycle::transition::{
    check_payment_cancel, check_payment_confirm, check_payment_start,
};
use crate::lifecycle::{OrderError, OrderLifecycle, PreconditionReason, Transition};
use gigmart_sdk::objects::PaymentStatusKind;
use gigmart_sdk::token::Principal;
use kanau::processor::Processor;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("invalid order amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("payment creation failed: {0}")]
    PaymentCreationFailed(OracleError),
    #[error("payment retrieval failed: {0}")]
    PaymentRetrievalFailed(OracleError),
    #[error("payment {intent_id} is not successful (status: {status})")]
    PaymentNotSuccessful {
        intent_id: String,
        status: IntentStatus,
    },
    #[error("no order references payment {intent_id}")]
    OrderNotFound { intent_id: String },
    #[error("payment cancellation failed: {0}")]
    PaymentCancellationFailed(OracleError),
}

impl PaymentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PaymentError::Order(e) => e.kind(),
            PaymentError::InvalidAmount(_) => ErrorKind::Internal,
            PaymentError::PaymentCreationFailed(_)
            | PaymentError::PaymentRetrievalFailed(_)
            | PaymentError::PaymentCancellationFailed(_) => ErrorKind::UpstreamFailure,
            PaymentError::PaymentNotSuccessful { .. } => ErrorKind::PreconditionFailed,
            PaymentError::OrderNotFound { .. } => ErrorKind::NotFound,
        }
    }

    pub fn reason(&self) -> String {
        match self {
            PaymentError::Order(e) => e.reason(),
            PaymentError::PaymentNotSuccessful { status, .. } => {
                format!("payment_not_successful: {status}")
            }
            PaymentError::OrderNotFound { intent_id } => format!("payment {intent_id}"),
            other => other.to_string(),
        }
    }
}

/// What a client needs to complete a payment with the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub order: OrderRecord,
    pub intent_id: String,
    pub client_secret: String,
}

#[derive(Clone)]
pub struct PaymentReconciler {
    oracle: Arc<dyn PaymentOracle>,
    lifecycle: OrderLifecycle,
    config: Arc<RwLock<PaymentConfig>>,
}

impl PaymentReconciler {
    pub fn new(
        oracle: Arc<dyn PaymentOracle>,
        lifecycle: OrderLifecycle,
        config: Arc<RwLock<PaymentConfig>>,
    ) -> Self {
        Self {
            oracle,
            lifecycle,
            config,
        }
    }

    // The provider client has its own timeout; this bounds any oracle.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, OracleError>>,
    ) -> Result<T, OracleError> {
        let limit = self.config.read().await.timeout;
        tokio::time::timeout(limit, call)
            .await
            .map_err(|_| OracleError::Timeout(limit))?
    }

    async fn order_for_intent(
        &self,
        intent_id: &str,
        expected: Option<Uuid>,
    ) -> Result<OrderRecord, PaymentError> {
        let order = self
            .lifecycle
            .orders()
            .find_by_payment_reference(intent_id)
            .await
            .map_err(OrderError::from)?;
        let Some(order) = order else {
            error!(intent_id, "No order references payment intent");
            return Err(PaymentError::OrderNotFound {
                intent_id: intent_id.to_string(),
            });
        };
        if expected.is_some_and(|id| id != order.order_id) {
            return Err(OrderError::PreconditionFailed(
                PreconditionReason::PaymentReferenceMismatch,
            )
            .into());
        }
        Ok(order)
    }

    /// Retire the intent of an earlier attempt before a new one replaces it.
    async fn retire_previous(&self, order: &OrderRecord, previous: &str) -> Result<(), PaymentError> {
        let intent = self
            .bounded(self.oracle.retrieve_intent(previous))
            .await
            .map_err(PaymentError::PaymentRetrievalFailed)?;
        match intent.status {
            IntentStatus::Succeeded => Err(OrderError::PreconditionFailed(
                PreconditionReason::PaymentAlreadySucceeded,
            )
            .into()),
            IntentStatus::Canceled => Ok(()),
            _ => {
                self.bounded(self.oracle.cancel_intent(previous))
                    .await
                    .map_err(PaymentError::PaymentCancellationFailed)?;
                info!(order_id = %order.order_id, intent_id = previous, "Canceled superseded payment intent");
                Ok(())
            }
        }
    }

    async fn discard_intent(&self, intent: &PaymentIntent) {
        if let Err(e) = self.bounded(self.oracle.cancel_intent(&intent.id)).await {
            warn!(intent_id = %intent.id, error = %e, "Failed to cancel unattached payment intent");
        }
    }
}

/// Start a payment attempt on a pending order.
#[derive(Debug, Clone)]
pub struct BeginPayment {
    pub actor: Principal,
    pub order_id: Uuid,
}

impl Processor<BeginPayment> for PaymentReconciler {
    type Output = PaymentSession;
    type Error = PaymentError;
    async fn process(&self, cmd: BeginPayment) -> Result<PaymentSession, PaymentError> {
        let order = self.lifecycle.load(cmd.order_id).await?;
        check_payment_start(&order, &cmd.actor)?;
        let amount_minor = to_minor_units(order.amount)?;

        if let Some(previous) = order.payment_reference.as_deref() {
            self.retire_previous(&order, previous).await?;
        }

        let currency = self.config.read().await.currency.clone();
        let intent = self
            .bounded(self.oracle.create_intent(IntentRequest {
                amount_minor,
                currency,
                order_id: order.order_id,
            }))
            .await
            .map_err(|e| {
                warn!(order_id = %order.order_id, error = %e, "Payment intent creation failed");
                PaymentError::PaymentCreationFailed(e)
            })?;

        let Some(client_secret) = intent.client_secret.clone() else {
            self.discard_intent(&intent).await;
            return Err(PaymentError::PaymentCreationFailed(OracleError::Decode(
                "intent has no client secret".to_string(),
            )));
        };

        let attach = Transition::AttachPayment {
            reference: intent.id.clone(),
            replacing: order.payment_reference.clone(),
        };
        let outcome = match self.lifecycle.transition(order.order_id, &cmd.actor, &attach).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.discard_intent(&intent).await;
                return Err(e.into());
            }
        };

        self.lifecycle
            .broker()
            .payment_status(&outcome.order, PaymentStatusKind::PaymentCreated);
        Ok(PaymentSession {
            order: outcome.order,
            intent_id: intent.id,
            client_secret,
        })
    }
}

/// Settle an order after the client finished paying.
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    pub actor: Principal,
    pub intent_id: String,
    /// When given, the order the caller believes the intent belongs to.
    pub order_id: Option<Uuid>,
}

impl Processor<ConfirmPayment> for PaymentReconciler {
    type Output = OrderRecord;
    type Error = PaymentError;
    async fn process(&self, cmd: ConfirmPayment) -> Result<OrderRecord, PaymentError> {
        let order = self.order_for_intent(&cmd.intent_id, cmd.order_id).await?;
        check_payment_confirm(&order, &cmd.actor, &cmd.intent_id)?;

        let intent = self
            .bounded(self.oracle.retrieve_intent(&cmd.intent_id))
            .await
            .map_err(PaymentError::PaymentRetrievalFailed)?;
        if intent.status != IntentStatus::Succeeded {
            info!(order_id = %order.order_id, intent_id = %cmd.intent_id, status = %intent.status, "Payment not successful");
            return Err(PaymentError::PaymentNotSuccessful {
                intent_id: cmd.intent_id,
                status: intent.status,
            });
        }

        let outcome = self
            .lifecycle
            .transition(
                order.order_id,
                &cmd.actor,
                &Transition::ConfirmPayment {
                    reference: cmd.intent_id,
                },
            )
            .await?;
        if outcome.changed {
            self.lifecycle
                .broker()
                .payment_status(&outcome.order, PaymentStatusKind::Paid);
        }
        Ok(outcome.order)
    }
}

/// Abandon the current payment attempt and close the order.
#[derive(Debug, Clone)]
pub struct CancelPayment {
    pub actor: Principal,
    pub intent_id: String,
    pub order_id: Option<Uuid>,
}

impl Processor<CancelPayment> for PaymentReconciler {
    type Output = OrderRecord;
    type Error = PaymentError;
    async fn process(&self, cmd: CancelPayment) -> Result<OrderRecord, PaymentError> {
        let order = self.order_for_intent(&cmd.intent_id, cmd.order_id).await?;
        check_payment_cancel(&order, &cmd.actor, &cmd.intent_id)?;

        self.bounded(self.oracle.cancel_intent(&cmd.intent_id))
            .await
            .map_err(|e| {
                warn!(order_id = %order.order_id, error = %e, "Payment intent cancellation failed");
                PaymentError::PaymentCancellationFailed(e)
            })?;

        let outcome = self
            .lifecycle
            .transition(
                order.order_id,
                &cmd.actor,
                &Transition::CancelPayment {
                    reference: cmd.intent_id,
                },
            )
            .await?;
        if outcome.changed {
            self.lifecycle
                .broker()
                .payment_status(&outcome.order, PaymentStatusKind::Canceled);
        }
        Ok(outcome.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::order_records::OrderStatus;
    use crate::lifecycle::{AcceptOrder, CompleteOrder};
    use crate::store::OrderStore;
    use crate::testing::{Harness, client, worker};
    use gigmart_sdk::objects::{AudienceRole, PaymentStatusNotice, ServerEnvelope};
    use std::time::Duration;

    fn begin(order: &OrderRecord) -> BeginPayment {
        BeginPayment {
            actor: client(order.client_id),
            order_id: order.order_id,
        }
    }

    fn confirm(order: &OrderRecord, intent_id: &str) -> ConfirmPayment {
        ConfirmPayment {
            actor: client(order.client_id),
            intent_id: intent_id.to_string(),
            order_id: Some(order.order_id),
        }
    }

    fn cancel(order: &OrderRecord, intent_id: &str) -> CancelPayment {
        CancelPayment {
            actor: client(order.client_id),
            intent_id: intent_id.to_string(),
            order_id: Some(order.order_id),
        }
    }

    fn payment_status(envelope: &ServerEnvelope) -> PaymentStatusKind {
        match envelope {
            ServerEnvelope::PaymentStatus(PaymentStatusNotice { status, .. }) => *status,
            other => panic!("expected payment status, got {other:?}"),
        }
    }

    fn precondition(err: PaymentError) -> PreconditionReason {
        match err {
            PaymentError::Order(OrderError::PreconditionFailed(reason)) => reason,
            other => panic!("expected precondition failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_begin_and_confirm_scenario() {
        let h = Harness::new();
        let mut owner = h.listen(AudienceRole::Clients, 1);
        let order = h.create_order(1, 1).await;
        h.oracle.queue_id("pi_123");

        let session = h.reconciler.process(begin(&order)).await.unwrap();
        assert_eq!(session.intent_id, "pi_123");
        assert_eq!(session.client_secret, "pi_123_secret");
        assert_eq!(session.order.payment_reference.as_deref(), Some("pi_123"));
        assert_eq!(session.order.status, OrderStatus::Pending);
        let created = h.oracle.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].amount_minor, 50000);
        assert_eq!(created[0].currency, "usd");
        assert_eq!(created[0].order_id, order.order_id);
        assert_eq!(
            payment_status(&owner.try_recv().unwrap()),
            PaymentStatusKind::PaymentCreated
        );

        let err = h.reconciler.process(confirm(&order, "pi_123")).await.unwrap_err();
        assert!(matches!(
            &err,
            PaymentError::PaymentNotSuccessful { status: IntentStatus::RequiresPaymentMethod, .. }
        ));
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        let stored = h.lifecycle.load(order.order_id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);

        h.oracle.set_status("pi_123", IntentStatus::Succeeded);
        let paid = h.reconciler.process(confirm(&order, "pi_123")).await.unwrap();
        assert_eq!(paid.status, OrderStatus::Paid);
        assert_eq!(payment_status(&owner.try_recv().unwrap()), PaymentStatusKind::Paid);

        // A repeated confirm succeeds quietly.
        let again = h.reconciler.process(confirm(&order, "pi_123")).await.unwrap();
        assert_eq!(again.status, OrderStatus::Paid);
        assert_eq!(again.version, paid.version);
        assert!(owner.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_complete_requires_confirmed_payment() {
        let h = Harness::new();
        let order = h.create_order(1, 1).await;
        h.lifecycle
            .process(AcceptOrder {
                actor: worker(9),
                order_id: order.order_id,
            })
            .await
            .unwrap();
        let complete = CompleteOrder {
            actor: worker(9),
            order_id: order.order_id,
        };

        let err = h.lifecycle.process(complete.clone()).await.unwrap_err();
        assert!(matches!(
            err,
            OrderError::PreconditionFailed(PreconditionReason::NotPaid)
        ));
        assert_eq!(err.to_string(), "precondition failed: not paid");

        let session = h.reconciler.process(begin(&order)).await.unwrap();
        h.oracle.set_status(&session.intent_id, IntentStatus::Succeeded);
        h.reconciler
            .process(confirm(&order, &session.intent_id))
            .await
            .unwrap();

        let done = h.lifecycle.process(complete).await.unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        assert_eq!(done.worker_id, Some(9));
    }

    #[tokio::test]
    async fn test_cancel_on_paid_order_is_rejected() {
        let h = Harness::new();
        let order = h.create_order(1, 1).await;
        let session = h.reconciler.process(begin(&order)).await.unwrap();
        h.oracle.set_status(&session.intent_id, IntentStatus::Succeeded);
        h.reconciler
            .process(confirm(&order, &session.intent_id))
            .await
            .unwrap();

        let err = h
            .reconciler
            .process(cancel(&order, &session.intent_id))
            .await
            .unwrap_err();
        assert_eq!(precondition(err), PreconditionReason::AlreadyPaid);
        assert!(h.oracle.canceled().is_empty());
        let stored = h.lifecycle.load(order.order_id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn test_cancel_pending_payment() {
        let h = Harness::new();
        let mut owner = h.listen(AudienceRole::Clients, 1);
        let order = h.create_order(1, 1).await;
        let session = h.reconciler.process(begin(&order)).await.unwrap();
        owner.try_recv().unwrap();

        let canceled = h
            .reconciler
            .process(cancel(&order, &session.intent_id))
            .await
            .unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert_eq!(h.oracle.canceled(), vec![session.intent_id.clone()]);
        assert_eq!(
            payment_status(&owner.try_recv().unwrap()),
            PaymentStatusKind::Canceled
        );

        let err = h
            .reconciler
            .process(cancel(&order, &session.intent_id))
            .await
            .unwrap_err();
        assert_eq!(precondition(err), PreconditionReason::NotPending);

        let err = h.reconciler.process(begin(&order)).await.unwrap_err();
        assert_eq!(precondition(err), PreconditionReason::NotPending);
    }

    #[tokio::test]
    async fn test_oracle_failures_leave_order_untouched() {
        let h = Harness::new();
        let order = h.create_order(1, 1).await;

        h.oracle.fail_create(true);
        let err = h.reconciler.process(begin(&order)).await.unwrap_err();
        assert!(matches!(err, PaymentError::PaymentCreationFailed(_)));
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        let stored = h.lifecycle.load(order.order_id).await.unwrap();
        assert_eq!(stored.payment_reference, None);
        assert_eq!(stored.version, order.version);

        h.oracle.fail_create(false);
        let session = h.reconciler.process(begin(&order)).await.unwrap();
        h.oracle.fail_cancel(true);
        let err = h
            .reconciler
            .process(cancel(&order, &session.intent_id))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::PaymentCancellationFailed(_)));
        let stored = h.lifecycle.load(order.order_id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Pending);

        h.oracle.fail_retrieve(true);
        let err = h
            .reconciler
            .process(confirm(&order, &session.intent_id))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::PaymentRetrievalFailed(_)));
    }

    #[tokio::test]
    async fn test_oracle_timeout_is_upstream_failure() {
        let h = Harness::new();
        let order = h.create_order(1, 1).await;
        h.payment_config.write().await.timeout = Duration::from_millis(20);
        h.oracle.set_delay(Duration::from_millis(500));

        let err = h.reconciler.process(begin(&order)).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::PaymentCreationFailed(OracleError::Timeout(_))
        ));
        assert_eq!(err.kind(), ErrorKind::UpstreamFailure);
        let stored = h.lifecycle.load(order.order_id).await.unwrap();
        assert_eq!(stored.payment_reference, None);
    }

    #[tokio::test]
    async fn test_unknown_intent_is_reconciliation_error() {
        let h = Harness::new();
        let order = h.create_order(1, 1).await;
        let err = h
            .reconciler
            .process(ConfirmPayment {
                actor: client(1),
                intent_id: "pi_missing".to_string(),
                order_id: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::OrderNotFound { .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let session = h.reconciler.process(begin(&order)).await.unwrap();
        let other = h.create_order(1, 2).await;
        let err = h
            .reconciler
            .process(confirm(&other, &session.intent_id))
            .await
            .unwrap_err();
        assert_eq!(precondition(err), PreconditionReason::PaymentReferenceMismatch);
    }

    #[tokio::test]
    async fn test_only_order_client_may_pay() {
        let h = Harness::new();
        let order = h.create_order(1, 1).await;
        let err = h
            .reconciler
            .process(BeginPayment {
                actor: client(2),
                order_id: order.order_id,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(h.oracle.created().is_empty());
    }

    #[tokio::test]
    async fn test_new_attempt_replaces_previous_intent() {
        let h = Harness::new();
        let order = h.create_order(1, 2).await;
        let first = h.reconciler.process(begin(&order)).await.unwrap();
        let second = h.reconciler.process(begin(&order)).await.unwrap();
        assert_ne!(first.intent_id, second.intent_id);
        assert_eq!(h.oracle.canceled(), vec![first.intent_id.clone()]);
        assert_eq!(
            second.order.payment_reference.as_deref(),
            Some(second.intent_id.as_str())
        );
        assert_eq!(h.oracle.created()[1].amount_minor, 15050);

        // The old intent no longer settles this order.
        let err = h
            .reconciler
            .process(confirm(&order, &first.intent_id))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::OrderNotFound { .. }));

        h.oracle.set_status(&second.intent_id, IntentStatus::Succeeded);
        let err = h.reconciler.process(begin(&order)).await.unwrap_err();
        assert_eq!(precondition(err), PreconditionReason::PaymentAlreadySucceeded);
        assert_eq!(h.oracle.created().len(), 2);
        assert!(h.store.find_by_payment_reference(&second.intent_id).await.unwrap().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_attempts_cancel_the_losing_intent() {
        let h = Arc::new(Harness::new());
        let order = h.create_order(1, 1).await;
        // Both attempts read the unreferenced order before either attaches.
        h.oracle.set_delay(Duration::from_millis(50));

        let tasks: Vec<_> = (0..2)
            .map(|_| {
                let h = h.clone();
                let cmd = begin(&order);
                tokio::spawn(async move { h.reconciler.process(cmd).await })
            })
            .collect();
        let mut sessions = Vec::new();
        let mut losers = Vec::new();
        for task in tasks {
            match task.await.unwrap() {
                Ok(session) => sessions.push(session),
                Err(err) => losers.push(precondition(err)),
            }
        }
        assert_eq!(sessions.len(), 1);
        assert_eq!(losers, vec![PreconditionReason::Contended]);

        let winner = &sessions[0].intent_id;
        let created = h.oracle.created();
        assert_eq!(created.len(), 2);
        let canceled = h.oracle.canceled();
        assert_eq!(canceled.len(), 1);
        assert_ne!(&canceled[0], winner);
        assert_eq!(h.oracle.status(&canceled[0]), Some(IntentStatus::Canceled));

        let stored = h.store.get(order.order_id).await.unwrap().unwrap();
        assert_eq!(stored.payment_reference.as_deref(), Some(winner.as_str()));
        assert_eq!(stored.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_intent_without_secret_is_canceled() {
        let h = Harness::new();
        let order = h.create_order(1, 1).await;
        h.oracle.queue_id("pi_nosecret");
        h.oracle.withhold_secret(true);

        let err = h.reconciler.process(begin(&order)).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::PaymentCreationFailed(OracleError::Decode(_))
        ));
        assert_eq!(h.oracle.canceled(), vec!["pi_nosecret".to_string()]);
        let stored = h.store.get(order.order_id).await.unwrap().unwrap();
        assert_eq!(stored.payment_reference, None);
    }
}
