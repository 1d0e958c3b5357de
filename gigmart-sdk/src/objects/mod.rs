pub mod error;
pub mod order;
pub mod roles;
pub mod service;
pub mod ws;

pub use error::ApiErrorBody;
pub use order::{
    CreateOrderRequest, OrderResponse, OrderStatus, PageQuery, PaymentIntentRequest,
    PaymentSessionResponse,
};
pub use roles::{AudienceRole, UnknownAudience, UserRole};
pub use service::{ServiceQuery, ServiceResponse};
pub use ws::{
    ConnectionAck, NewOrderNotice, OrderAcceptedNotice, PaymentStatusKind, PaymentStatusNotice,
    ServerEnvelope, WsCloseCode,
};
