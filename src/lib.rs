//! Subdomain Gateway Core
//!
//! Address resolution and origin isolation for a content-addressed
//! gateway: decode self-describing binary identifiers, translate between
//! path-form and subdomain-form gateway URLs, drive the first-hit
//! navigation state machine, and move user configuration across the
//! origin boundary that isolation creates.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │             NAVIGATION RESOLVER              │
//!     entry URL ────▶│  one decision per page load: render,         │
//!                    │  redirect, or move config across origins     │
//!                    └──────┬────────────────────────────┬──────────┘
//!                           │                            │
//!                           ▼                            ▼
//!                    ┌─────────────┐              ┌─────────────┐
//!                    │   gateway   │              │    sync     │
//!                    │ translator  │              │ bus/bridge/ │
//!                    │  + params   │              │  compress   │
//!                    └──────┬──────┘              └──────┬──────┘
//!                           │                            │
//!                           ▼                            ▼
//!                    ┌─────────────┐              ┌─────────────┐
//!                    │    codec    │              │   config    │
//!                    │ multibase + │              │ store +     │
//!                    │  CID parse  │              │ schema      │
//!                    └─────────────┘              └─────────────┘
//! ```
//!
//! The edge redirector daemon (`src/main.rs`) reuses the translator and
//! codec in front of the origin, so the edge and the in-browser worker
//! emit byte-identical redirect targets.

// Core protocol
pub mod codec;
pub mod gateway;
pub mod navigation;
pub mod sync;

// Edge daemon
pub mod config;
pub mod edge;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::{EdgeConfig, GatewayConfig};
pub use edge::EdgeServer;
pub use lifecycle::Shutdown;
