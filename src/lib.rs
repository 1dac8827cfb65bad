//! CRPT client - rate limited goods-tracking document submission
//!
//! This crate submits goods introduction documents to the CRPT API while
//! enforcing a cap on how many submissions are issued per time window. The
//! cap is held by a single in-process admission gate; submissions over the
//! cap are rejected immediately instead of being queued.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod ratelimit;
