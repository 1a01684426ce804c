//! Siphon API
//!
//! HTTP surface for the dashboard UI and automation, built on Axum.
//!
//! # Endpoints
//!
//! ## Logs
//! - `GET /api/logs` - filtered, paginated listing
//! - `GET /api/logs/{id}` - single entry plus module display projection
//! - `GET /api/stats` - store stats merged with server counters
//! - `GET /api/eventtypes` - distinct classified event types
//! - `POST /api/clear` - purge all rows and reset counters
//!
//! ## Query
//! - `POST /api/query` - constrained query surface
//! - `POST /api/aggregate` - grouped aggregation
//! - `POST /api/timeseries` - time-bucketed aggregation
//!
//! ## Runtime configuration
//! - `GET|POST /api/listeners`, `PUT|DELETE /api/listeners/{id}` - listener
//!   CRUD; `PUT` with `enabled` toggles the live accept loop
//! - `GET|POST /api/devices`, `PUT|DELETE /api/devices/{id}` - device CRUD
//! - `GET|PUT /api/modules` - parser module enable flags
//! - `GET|PUT /api/severity-overrides` - event-type severity overrides

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, Result};
pub use routes::build_router;
pub use state::AppState;
