//! Multi-step request flows
//!
//! Each flow makes at most a handful of provider calls and owns no state.
//! Database reads and writes stay in the route handlers.

pub mod checkout;
pub mod invoicing;
pub mod publishing;
