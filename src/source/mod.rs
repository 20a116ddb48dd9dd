//! Scan event sources.
//!
//! Live sources (a torrent client plus a piece scanner) live outside this
//! crate and push [`ScanEvent`](crate::core::ScanEvent)s into an
//! [`EventFeed`](crate::manager::EventFeed). [`MockSource`] replays a
//! scripted session for tests and demos.

mod mock;

pub use mock::{verdict_for_risk, MockSource, MALICIOUS_RISK, SUSPICIOUS_RISK};
