use sqlx::PgPool;

/// Executes record-store queries against the shared connection pool.
///
/// Each query is a plain struct with a `kanau::processor::Processor` impl
/// on this type, living next to the entity it reads or writes.
#[derive(Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
