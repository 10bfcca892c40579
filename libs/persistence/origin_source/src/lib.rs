//! Origin data access: the structured query model, the [`OriginSource`]
//! seam, a Postgres implementation and the identity provider.

pub mod error;
pub mod identity;
pub mod postgres;
pub mod query;
pub mod retry;
pub mod row;
pub mod source;

pub use error::{OriginError, OriginResult};
pub use identity::{IdentityError, IdentityProvider, SharedIdentity, StaticIdentity};
pub use postgres::{PgOrigin, PostgresOriginConfig, connect_pg_origin};
pub use query::{Filter, OriginQuery, Order};
pub use retry::{RetryConfig, RetryingOrigin};
pub use row::{Row, RowExt, decode_rows, value_as_text};
pub use source::{OriginSource, SharedOrigin};
