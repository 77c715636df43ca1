//! Session core: the state machine behind one query/preview session.
//!
//! `SessionController` owns what is currently displayed, `NotificationChannel`
//! owns the transient feedback slot, and `CellInspector` owns the single
//! expanded cell value. The CLI layer only reads their state and calls their
//! operations; it never mutates shared state directly.

pub mod auth;
pub mod inspect;
pub mod notify;
pub mod session;
