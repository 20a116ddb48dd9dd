//! Display policy for scan sessions.
//!
//! Resolves how a session's state is presented: the risk gauge tier while
//! scanning and the final disposition once the terminal event arrives.

mod disposition;
mod risk;

pub use disposition::Disposition;
pub use risk::{RiskLevel, RiskThresholds};
