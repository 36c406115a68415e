//! # Event subscribers for the circuitvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out and
//! (behind the `logging` feature) a stdout [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   node task ── publish(Event) ──► Bus ──► subscriber listener ──► SubscriberSet::emit
//!                                                                       │
//!                                                         ┌─────────────┼─────────────┐
//!                                                         ▼             ▼             ▼
//!                                                     LogWriter      Metrics       Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
