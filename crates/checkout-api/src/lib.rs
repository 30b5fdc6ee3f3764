//! # checkout-api
//!
//! HTTP API layer for checkout-edge.
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | POST | `/api/checkout/session` | Create checkout session for any price |
//! | POST | `/api/checkout/brand-session` | Create checkout session for an allow-listed brand price |
//! | POST | `/api/webhook/stripe` | Stripe webhook |

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use handlers::MAX_WEBHOOK_BODY_BYTES;
pub use routes::create_router;
pub use state::{AppConfig, AppState};
