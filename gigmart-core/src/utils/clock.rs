/// Current UTC wall-clock time without an offset, as stored in the record store.
pub fn now_utc_primitive() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}
