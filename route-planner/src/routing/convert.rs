//! Conversion between OSRM wire types and domain types.

use crate::domain::{Coordinates, Direction, RouteGeometry, Step, StepKind};

use super::error::RouteError;
use super::types::{OsrmResponse, OsrmRoute, OsrmStep};

/// Encode waypoints as OSRM's `lng,lat;lng,lat` path segment.
pub fn encode_waypoints(waypoints: &[Coordinates]) -> String {
    waypoints
        .iter()
        .map(|c| format!("{},{}", c.longitude, c.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

fn first_route(response: &OsrmResponse) -> Result<&OsrmRoute, RouteError> {
    if response.code != "Ok" {
        return Err(RouteError::NoRoute(
            response
                .message
                .clone()
                .unwrap_or_else(|| response.code.clone()),
        ));
    }
    response
        .routes
        .first()
        .ok_or_else(|| RouteError::NoRoute("service returned no routes".to_string()))
}

/// Extract the first route's geometry.
///
/// Malformed coordinate pairs are skipped; the node count is the number
/// of path points kept.
pub fn route_geometry(response: &OsrmResponse) -> Result<RouteGeometry, RouteError> {
    let route = first_route(response)?;

    let path: Vec<Coordinates> = route
        .geometry
        .iter()
        .flat_map(|g| g.coordinates.iter())
        .filter_map(|pair| match pair.as_slice() {
            [lng, lat, ..] => Coordinates::new(*lat, *lng).ok(),
            _ => None,
        })
        .collect();

    Ok(RouteGeometry {
        node_count: path.len(),
        path,
        distance_meters: route.distance,
        duration_seconds: route.duration,
    })
}

/// Flatten every leg's steps, in order, into domain steps.
pub fn route_steps(response: &OsrmResponse) -> Result<Vec<Step>, RouteError> {
    let route = first_route(response)?;
    Ok(route
        .legs
        .iter()
        .flat_map(|leg| leg.steps.iter())
        .map(convert_step)
        .collect())
}

/// OSRM spells multi-word values with spaces; accept underscores too.
fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('_', " ")
}

fn direction_of(modifier: &str) -> Option<Direction> {
    match modifier {
        "left" | "slight left" | "sharp left" => Some(Direction::Left),
        "right" | "slight right" | "sharp right" => Some(Direction::Right),
        _ => None,
    }
}

/// Instructions are Brazilian Portuguese, like the addresses they sit
/// beside.
fn turn_instruction(modifier: &str) -> &'static str {
    match modifier {
        "left" => "Vire à esquerda",
        "right" => "Vire à direita",
        "slight left" => "Curva leve à esquerda",
        "slight right" => "Curva leve à direita",
        "sharp left" => "Curva fechada à esquerda",
        "sharp right" => "Curva fechada à direita",
        "straight" => "Siga em frente",
        "uturn" => "Faça o retorno",
        _ => "Vire",
    }
}

pub(crate) fn convert_step(step: &OsrmStep) -> Step {
    let kind_raw = normalize(&step.maneuver.kind);
    let modifier = step.maneuver.modifier.as_deref().map(normalize);
    let modifier = modifier.as_deref().unwrap_or("");

    let (kind, base) = match kind_raw.as_str() {
        "depart" => (StepKind::Depart, "Iniciar"),
        "arrive" => (StepKind::Arrive, "Chegada ao destino"),
        "turn" | "end of road" => (StepKind::Turn, turn_instruction(modifier)),
        "roundabout" | "rotary" => (StepKind::Straight, "Rotatória"),
        "exit roundabout" | "exit rotary" => (StepKind::Straight, "Saia da rotatória"),
        "merge" => (StepKind::Straight, "Acesse a via"),
        "fork" => (StepKind::Straight, "Mantenha-se na bifurcação"),
        "on ramp" => (StepKind::Straight, "Entre no acesso"),
        "off ramp" => (StepKind::Straight, "Saia pelo acesso"),
        _ => (StepKind::Straight, "Siga"),
    };

    let instruction = if step.name.trim().is_empty() {
        base.to_string()
    } else {
        format!("{base} em {}", step.name.trim())
    };

    Step {
        kind,
        direction: direction_of(modifier),
        instruction,
        distance_meters: step.distance,
    }
}
