//! Presentation-side state. Rendering itself lives outside this crate.

pub mod session;

pub use session::{AlertCounts, AlertFilter, DashboardSession, Message, View};
