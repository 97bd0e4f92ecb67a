//! # AdminTable Test Suite
//!
//! Cross-crate flows that no single crate can test on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── list_flows.rs     # pipeline + resolver: paging, filters, sorting
//!     ├── live_flows.rs     # detail view live fields + live-data hub
//!     └── gateway_flows.rs  # HTTP surface over the demo runtime
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p at-tests
//! cargo test -p at-tests integration::live_flows::
//! ```

pub mod integration;
