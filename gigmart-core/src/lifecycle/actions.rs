use super::{
    ForbiddenReason, Missing, OrderError, OrderLifecycle, PreconditionReason, Transition,
};
use crate::entities::order_records::{NewOrder, OrderRecord};
use crate::store::{OrderFilter, Page};
use gigmart_sdk::objects::UserRole;
use gigmart_sdk::token::Principal;
use kanau::processor::Processor;
use uuid::Uuid;

/// A client posts an order for a catalog service.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub actor: Principal,
    pub service_id: i64,
}

impl Processor<CreateOrder> for OrderLifecycle {
    type Output = OrderRecord;
    type Error = OrderError;
    async fn process(&self, cmd: CreateOrder) -> Result<OrderRecord, OrderError> {
        if cmd.actor.role != UserRole::Client {
            return Err(OrderError::Forbidden(ForbiddenReason::NotClient));
        }
        let service = self
            .catalog
            .get_service(cmd.service_id)
            .await?
            .ok_or(OrderError::NotFound(Missing::Service(cmd.service_id)))?;
        if !service.is_active {
            return Err(OrderError::PreconditionFailed(
                PreconditionReason::ServiceInactive,
            ));
        }
        let order = self
            .orders
            .insert(NewOrder {
                client_id: cmd.actor.identity,
                service_id: service.id,
                amount: service.price,
            })
            .await?;
        tracing::info!(
            order_id = %order.order_id,
            client_id = order.client_id,
            service_id = service.id,
            amount = %order.amount,
            "Order created"
        );
        self.broker.order_created(&order, &service);
        Ok(order)
    }
}

/// A worker takes an unassigned order.
#[derive(Debug, Clone)]
pub struct AcceptOrder {
    pub actor: Principal,
    pub order_id: Uuid,
}

impl Processor<AcceptOrder> for OrderLifecycle {
    type Output = OrderRecord;
    type Error = OrderError;
    async fn process(&self, cmd: AcceptOrder) -> Result<OrderRecord, OrderError> {
        let outcome = self
            .transition(cmd.order_id, &cmd.actor, &Transition::Accept)
            .await?;
        if outcome.changed {
            self.broker.order_accepted(&outcome.order, cmd.actor.identity);
        }
        Ok(outcome.order)
    }
}

/// The assigned worker marks a paid order delivered.
#[derive(Debug, Clone)]
pub struct CompleteOrder {
    pub actor: Principal,
    pub order_id: Uuid,
}

impl Processor<CompleteOrder> for OrderLifecycle {
    type Output = OrderRecord;
    type Error = OrderError;
    async fn process(&self, cmd: CompleteOrder) -> Result<OrderRecord, OrderError> {
        let outcome = self
            .transition(cmd.order_id, &cmd.actor, &Transition::Complete)
            .await?;
        Ok(outcome.order)
    }
}

/// Read one order the actor is allowed to see.
#[derive(Debug, Clone)]
pub struct GetVisibleOrder {
    pub actor: Principal,
    pub order_id: Uuid,
}

impl Processor<GetVisibleOrder> for OrderLifecycle {
    type Output = OrderRecord;
    type Error = OrderError;
    async fn process(&self, query: GetVisibleOrder) -> Result<OrderRecord, OrderError> {
        let order = self.load(query.order_id).await?;
        let actor = query.actor;
        match actor.role {
            UserRole::Admin => Ok(order),
            UserRole::Client if order.client_id == actor.identity => Ok(order),
            UserRole::Client => Err(OrderError::Forbidden(ForbiddenReason::NotOrderClient)),
            UserRole::Worker if order.worker_id == Some(actor.identity) => Ok(order),
            UserRole::Worker => Err(OrderError::Forbidden(ForbiddenReason::NotAssignedWorker)),
        }
    }
}

/// List the orders visible to the actor, newest first.
#[derive(Debug, Clone)]
pub struct ListVisibleOrders {
    pub actor: Principal,
    pub page: Page,
}

impl Processor<ListVisibleOrders> for OrderLifecycle {
    type Output = Vec<OrderRecord>;
    type Error = OrderError;
    async fn process(&self, query: ListVisibleOrders) -> Result<Vec<OrderRecord>, OrderError> {
        let filter = match query.actor.role {
            UserRole::Admin => OrderFilter::All,
            UserRole::Client => OrderFilter::Client(query.actor.identity),
            UserRole::Worker => OrderFilter::Worker(query.actor.identity),
        };
        Ok(self.orders.list(filter, query.page).await?)
    }
}
