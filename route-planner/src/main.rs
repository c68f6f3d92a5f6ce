use std::process::ExitCode;

use futures::future::join_all;
use tracing_subscriber::EnvFilter;

use route_planner::domain::{
    Coordinates, Point, TransportMode, format_distance, format_travel_time,
};
use route_planner::geocoding::{
    CachedGeocoder, GeocodeCacheConfig, NominatimClient, NominatimConfig, PresetGeocoder,
    marica_presets,
};
use route_planner::routing::{MockRouteClient, OsrmClient, OsrmConfig};
use route_planner::session::{
    GeocodeClient, PointRole, RouteClient, SelectOutcome, SessionConfig, SessionController,
    SessionError, StepsOutcome, TracingPresenter,
};

const DEFAULT_USER_AGENT: &str = "route-planner/0.1";
const DEFAULT_SEARCH_AREA: &str = "Maricá, Rio de Janeiro, Brazil";

const USAGE: &str = "usage: route-planner ORIGIN DESTINATION [STOP...]

Each point is either \"lat, lng\", a preset name or a free-text place name.

Presets:
  Praia de Maricá, Lagoa de Maricá, Centro de Maricá, Barra de Maricá

Environment:
  ROUTE_MODE          driving (default), walking or cycling
  OSRM_URL            routing server base URL
  ROUTE_MOCK_DIR      serve routes from fixture files instead of OSRM
  NOMINATIM_URL       geocoding server base URL
  GEOCODE_USER_AGENT  User-Agent sent to the geocoder
  SEARCH_AREA         appended to place names when searching";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 2 {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }

    let mode = match std::env::var("ROUTE_MODE") {
        Ok(s) => match s.parse::<TransportMode>() {
            Ok(mode) => mode,
            Err(e) => {
                eprintln!("{e}");
                return ExitCode::from(2);
            }
        },
        Err(_) => TransportMode::default(),
    };
    let session_config = SessionConfig::default().with_default_mode(mode);

    let user_agent =
        std::env::var("GEOCODE_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());
    let search_area =
        std::env::var("SEARCH_AREA").unwrap_or_else(|_| DEFAULT_SEARCH_AREA.to_string());
    let mut nominatim_config = NominatimConfig::new(user_agent).with_search_area(search_area);
    if let Ok(url) = std::env::var("NOMINATIM_URL") {
        nominatim_config = nominatim_config.with_base_url(url);
    }
    let nominatim = match NominatimClient::new(nominatim_config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to create geocoding client: {e}");
            return ExitCode::FAILURE;
        }
    };
    let geocoder = PresetGeocoder::new(
        CachedGeocoder::new(nominatim, &GeocodeCacheConfig::default()),
        marica_presets(),
    );

    if let Ok(dir) = std::env::var("ROUTE_MOCK_DIR") {
        println!("Using route fixtures from {dir}");
        return match MockRouteClient::new(&dir) {
            Ok(routes) => plan(routes, geocoder, session_config, &args).await,
            Err(e) => {
                eprintln!("Failed to load route fixtures: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut osrm_config = OsrmConfig::default();
    if let Ok(url) = std::env::var("OSRM_URL") {
        osrm_config = osrm_config.with_base_url(url);
    }
    match OsrmClient::new(osrm_config) {
        Ok(routes) => plan(routes, geocoder, session_config, &args).await,
        Err(e) => {
            eprintln!("Failed to create routing client: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Select every point given on the command line, compare modes and
/// print directions for the active one.
async fn plan<R, G>(routes: R, geocoder: G, config: SessionConfig, args: &[String]) -> ExitCode
where
    R: RouteClient,
    G: GeocodeClient,
{
    let session = SessionController::new(routes, geocoder, TracingPresenter, config);

    let (endpoints, stops) = args.split_at(2);
    for arg in endpoints {
        if let Err(message) = select(&session, PointRole::Auto, arg).await {
            eprintln!("{message}");
            return ExitCode::FAILURE;
        }
    }
    if !stops.is_empty() {
        session.set_stops_enabled(true).await;
        for arg in stops {
            if let Err(message) = select(&session, PointRole::Stop, arg).await {
                eprintln!("{message}");
                return ExitCode::FAILURE;
            }
        }
    }

    // Name clicked points while the other modes are computed.
    let unnamed: Vec<_> = session
        .snapshot()
        .await
        .points()
        .filter(|p| p.display_name().is_none())
        .map(Point::id)
        .collect();
    let (_, comparison) = tokio::join!(
        join_all(unnamed.into_iter().map(|id| session.reverse_geocode(id))),
        session.compare_modes()
    );
    let summaries = match comparison {
        Ok(summaries) => summaries,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mode = session.active_mode().await;
    let steps = match session.fetch_steps(mode).await {
        Ok(StepsOutcome::Ready(steps)) => steps,
        Ok(_) | Err(SessionError::RouteNotCached(_)) => Vec::new(),
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let selection = session.snapshot().await;
    let mut points = selection.points();
    if let Some(origin) = points.next() {
        println!("From: {}", origin.label());
    }
    for point in points {
        println!("  to: {}", point.label());
    }

    println!();
    println!("Mode comparison:");
    for summary in &summaries {
        let marker = if summary.mode == mode { "*" } else { " " };
        println!(
            " {marker} {:<8} {:>9}  {:>9}  {} nodes",
            summary.mode.as_str(),
            format_distance(summary.distance_meters),
            format_travel_time(summary.estimated_travel_time),
            summary.node_count
        );
    }
    if summaries.is_empty() {
        println!("   no route found");
        return ExitCode::FAILURE;
    }

    if !steps.is_empty() {
        println!();
        println!("Directions ({mode}):");
        for (i, step) in steps.iter().enumerate() {
            match step.distance_meters {
                Some(d) if d > 0.0 => {
                    println!("  {:>2}. {} ({})", i + 1, step.instruction, format_distance(d))
                }
                _ => println!("  {:>2}. {}", i + 1, step.instruction),
            }
        }
    }

    ExitCode::SUCCESS
}

/// Select one command-line point, as coordinates or a place name.
async fn select<R, G>(
    session: &SessionController<R, G, TracingPresenter>,
    role: PointRole,
    arg: &str,
) -> Result<(), String>
where
    R: RouteClient,
    G: GeocodeClient,
{
    let outcome = match Coordinates::parse(arg) {
        Ok(coordinates) => session.select_point(role, coordinates).await,
        Err(_) => session.select_place(role, arg).await,
    }
    .map_err(|e| format!("{arg}: {e}"))?;

    match outcome {
        SelectOutcome::Unresolved(e) => Err(format!("{arg}: {e}")),
        SelectOutcome::ConfirmationRequired => Err(format!("{arg}: too many points")),
        _ => Ok(()),
    }
}
