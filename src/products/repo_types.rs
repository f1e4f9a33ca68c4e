use sqlx::{types::Decimal, FromRow};
use time::OffsetDateTime;

/// Product row in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Product {
    pub id: i64,                      // BIGSERIAL, never reassigned
    pub name: String,
    pub description: String,
    pub price: Decimal,               // unconstrained NUMERIC, stored as sent
    pub stock: i64,                   // CHECK (stock >= 0)
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields a caller supplies when inserting; identity and timestamps come from the repository.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i64,
}
