//! Database dispatch macros for reducing code duplication.
//!
//! The pool, executor and schema modules all fan out over the three
//! `DbPool` variants. `impl_db_dispatch!` writes that match once.

/// Macro for generating database dispatch match arms.
///
/// Each arm binds the inner sqlx pool of one `DbPool` variant.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(pool, {
///     MySql(p) => mysql::list_tables(p).await,
///     Postgres(p) => postgres::list_tables(p).await,
///     SQLite(p) => sqlite::list_tables(p).await,
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($pool:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $pool {
            $(
                $crate::db::pool::DbPool::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
