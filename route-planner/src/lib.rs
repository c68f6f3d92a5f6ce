//! Route planning session controller.
//!
//! Holds one user's choice of origin, destination and intermediate stops,
//! computes routes for several transport modes through a remote routing
//! service, and keeps a per-mode route cache consistent with the
//! selection while requests complete out of order.

pub mod cache;
pub mod domain;
pub mod geocoding;
pub mod routing;
pub mod selection;
pub mod session;
