/// Database layer for ReviewFlow
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded schema migrations
///
/// Queries live next to the models in `crate::models`; the engine reaches
/// them only through `crate::directory::PgDirectory`.

pub mod migrations;
pub mod pool;
