use super::registry::{ConnectionRegistry, Delivery};
use crate::entities::order_records::OrderRecord;
use crate::entities::service_listings::ServiceListing;
use gigmart_sdk::objects::{
    AudienceRole, NewOrderNotice, OrderAcceptedNotice, PaymentStatusKind, PaymentStatusNotice,
    ServerEnvelope,
};
use std::sync::Arc;

/// Announces order events to listeners.
///
/// Called only after the underlying change is persisted. Delivery problems
/// are absorbed by the registry and never reach the caller.
#[derive(Clone)]
pub struct NotificationBroker {
    registry: Arc<ConnectionRegistry>,
}

impl NotificationBroker {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// A new order is open for pickup: tell every worker.
    pub fn order_created(&self, order: &OrderRecord, service: &ServiceListing) -> Delivery {
        let envelope = ServerEnvelope::NewOrder(NewOrderNotice {
            order_id: order.order_id,
            service_id: service.id,
            service_name: service.name.clone(),
            category: service.category.clone(),
            amount: order.amount,
        });
        let delivery = self.registry.broadcast(AudienceRole::Workers, envelope);
        tracing::debug!(order_id = %order.order_id, ?delivery, "Announced new order");
        delivery
    }

    pub fn order_accepted(&self, order: &OrderRecord, worker_id: i64) -> Delivery {
        let envelope = ServerEnvelope::OrderAccepted(OrderAcceptedNotice {
            order_id: order.order_id,
            worker_id,
        });
        self.to_client(order, envelope)
    }

    pub fn payment_status(&self, order: &OrderRecord, status: PaymentStatusKind) -> Delivery {
        let envelope = ServerEnvelope::PaymentStatus(PaymentStatusNotice {
            order_id: order.order_id,
            status,
        });
        self.to_client(order, envelope)
    }

    fn to_client(&self, order: &OrderRecord, envelope: ServerEnvelope) -> Delivery {
        let kind = envelope.kind();
        let delivery =
            self.registry
                .send_to_identity(AudienceRole::Clients, order.client_id, envelope);
        tracing::debug!(order_id = %order.order_id, client_id = order.client_id, kind, ?delivery, "Notified client");
        delivery
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::order_records::NewOrder;
    use crate::notify::connection_channel;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn order(client_id: i64) -> OrderRecord {
        NewOrder {
            client_id,
            service_id: 1,
            amount: Decimal::new(50000, 2),
        }
        .into_record(Uuid::now_v7(), crate::utils::clock::now_utc_primitive())
    }

    #[test]
    fn test_payment_status_reaches_owning_client_only() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broker = NotificationBroker::new(registry.clone());
        let (owner_tx, mut owner_rx) = connection_channel();
        let (other_tx, mut other_rx) = connection_channel();
        registry.register_audience(AudienceRole::Clients, Some(1), owner_tx);
        registry.register_audience(AudienceRole::Clients, Some(2), other_tx);
        owner_rx.try_recv().unwrap();
        other_rx.try_recv().unwrap();

        let order = order(1);
        broker.payment_status(&order, PaymentStatusKind::Paid);

        let received = owner_rx.try_recv().unwrap();
        assert_eq!(
            received.as_ref(),
            &ServerEnvelope::PaymentStatus(PaymentStatusNotice {
                order_id: order.order_id,
                status: PaymentStatusKind::Paid,
            })
        );
        assert!(other_rx.try_recv().is_err());
    }

    #[test]
    fn test_new_order_goes_to_all_workers() {
        let registry = Arc::new(ConnectionRegistry::new());
        let broker = NotificationBroker::new(registry.clone());
        let mut workers = Vec::new();
        for id in 0..3 {
            let (tx, mut rx) = connection_channel();
            registry.register_audience(AudienceRole::Workers, Some(id), tx);
            rx.try_recv().unwrap();
            workers.push(rx);
        }
        let (client_tx, mut client_rx) = connection_channel();
        registry.register_audience(AudienceRole::Clients, Some(1), client_tx);
        client_rx.try_recv().unwrap();

        let service = ServiceListing {
            id: 1,
            name: "Web Development".to_string(),
            description: String::new(),
            price: Decimal::new(50000, 2),
            category: "Technology".to_string(),
            is_active: true,
        };
        let delivery = broker.order_created(&order(1), &service);
        assert_eq!(delivery.delivered, 3);
        for mut rx in workers {
            assert_eq!(rx.try_recv().unwrap().kind(), "new_order");
        }
        assert!(client_rx.try_recv().is_err());
    }
}
