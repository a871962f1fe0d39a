use sqlx::PgPool;

/// Runs `kanau` query processors against the connection pool.
#[derive(Debug, Clone)]
pub struct DatabaseProcessor {
    pub pool: PgPool,
}
