//! Server tests.
//!
//! - `common` - Shared helpers: an in-memory app and a request driver
//! - `handlers` - HTTP handler tests, one module per resource


mod handlers;
