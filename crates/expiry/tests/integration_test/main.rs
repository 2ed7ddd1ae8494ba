//! Integration tests for dpr-expiry.
//!
//! Every pass runs against `MockStatementService` and an in-memory resolver,
//! so no AWS credentials are needed.

mod support;

mod batching;
mod scenarios;
