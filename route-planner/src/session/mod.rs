//! The planning session.
//!
//! [`SessionController`] is the only mutator of the selection and the
//! route cache. It talks to the outside world through three ports:
//! - [`RouteClient`] computes routes and turn-by-turn steps
//! - [`GeocodeClient`] resolves free text and coordinates to places
//! - [`PresentationPort`] receives [`SessionEvent`]s to render
//!
//! Client failures never surface as errors; they become events and
//! outcome values. Only usage errors are returned as [`SessionError`].

mod config;
mod controller;
mod events;
mod ports;


pub use config::SessionConfig;
pub use controller::{
    GeocodeOutcome, PointRole, PreviewOutcome, RouteOutcome, SelectOutcome, SessionController,
    SessionError, SessionPhase, StepsOutcome,
};
pub use events::{ChannelPresenter, SessionEvent, TracingPresenter};
pub use ports::{GeocodeClient, PresentationPort, RouteClient};
