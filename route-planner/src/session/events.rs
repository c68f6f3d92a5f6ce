//! Notifications emitted toward the presentation layer.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{RouteResult, Step, TransportMode, format_distance, format_travel_time};
use crate::selection::Selection;

use super::ports::PresentationPort;

/// Something the presentation layer may want to render.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Points or the stops toggle changed, or a point gained a name.
    SelectionChanged(Selection),
    RouteReady { mode: TransportMode, route: RouteResult },
    RouteFailed { mode: TransportMode, reason: String },
    StepsReady { mode: TransportMode, steps: Vec<Step> },
    StepsUnavailable { mode: TransportMode },
    /// A point was picked while a full pair exists and stops are off.
    ConfirmationRequired,
}

/// Forwards events into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl ChannelPresenter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PresentationPort for ChannelPresenter {
    fn notify(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() {
            debug!("presentation channel closed, dropping event");
        }
    }
}

/// Writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingPresenter;

impl PresentationPort for TracingPresenter {
    fn notify(&self, event: SessionEvent) {
        match event {
            SessionEvent::SelectionChanged(selection) => {
                let label = |p: Option<&crate::domain::Point>| {
                    p.map(|p| p.label()).unwrap_or_else(|| "-".to_string())
                };
                info!(
                    origin = %label(selection.origin.as_ref()),
                    destination = %label(selection.destination.as_ref()),
                    stops = selection.stops.len(),
                    "selection changed"
                );
            }
            SessionEvent::RouteReady { mode, route } => info!(
                %mode,
                distance = %format_distance(route.distance_meters),
                eta = %format_travel_time(route.estimated_travel_time()),
                nodes = route.node_count,
                "route ready"
            ),
            SessionEvent::RouteFailed { mode, reason } => {
                warn!(%mode, %reason, "route computation failed")
            }
            SessionEvent::StepsReady { mode, steps } => {
                info!(%mode, steps = steps.len(), "turn-by-turn steps ready")
            }
            SessionEvent::StepsUnavailable { mode } => {
                info!(%mode, "turn-by-turn steps unavailable")
            }
            SessionEvent::ConfirmationRequired => {
                info!("origin and destination already set; confirm to start over")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_presenter_forwards_in_order() {
        let (presenter, mut rx) = ChannelPresenter::new();
        presenter.notify(SessionEvent::ConfirmationRequired);
        presenter.notify(SessionEvent::StepsUnavailable {
            mode: TransportMode::Cycling,
        });

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::ConfirmationRequired);
        assert_eq!(
            rx.try_recv().unwrap(),
            SessionEvent::StepsUnavailable {
                mode: TransportMode::Cycling
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (presenter, rx) = ChannelPresenter::new();
        drop(rx);
        presenter.notify(SessionEvent::ConfirmationRequired);
    }
}
