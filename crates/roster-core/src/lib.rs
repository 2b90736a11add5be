//! roster-core library: the subscriber list engine.
//!
//! Raw subscriptions and users are joined into [`SubscriberRecord`]s, then a
//! [`QueryState`] drives filtering, sorting and pagination. The state
//! round-trips through a URL fragment so any view can be shared or restored.
//!
//! # Conventions
//!
//! - **Errors**: The engine (join, pipeline, paginate, codec) is infallible.
//!   File and store boundaries use `anyhow::Result`; data loading uses
//!   [`error::LoadError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//!   Data-quality fallbacks warn on `roster::join` and `roster::codec`.

pub mod codec;
pub mod config;
pub mod debounce;
pub mod error;
pub mod join;
pub mod load;
pub mod model;
pub mod paginate;
pub mod pipeline;
pub mod query;
pub mod session;
pub mod stats;
pub mod store;

pub use join::{join, join_at};
pub use model::{Plan, PlanCode, Status, SubscriberRecord};
pub use query::{PlanFilter, QueryState, SortDirection, SortField, StatusFilter};
pub use session::{DashboardSession, DashboardView, SessionSettings};
