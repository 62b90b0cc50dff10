//! HTTP-based [`Router`] using OSRM's Route API and Nominatim search.

use std::time::Duration;

use async_trait::async_trait;
use haulway_core::{
    Coordinate, GeocodeError, RouteBuild, RouteBuildError, RouteOptions, Router,
    sanitize_polyline,
};
use reqwest::{Client, StatusCode};
use thiserror::Error;

use super::nominatim::Place;
use super::osrm::{OsrmRoute, RouteResponse};

/// Error type for [`HttpRouter`] construction failures.
#[derive(Debug, Error)]
pub enum RouterBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Default user agent for routing and geocoding requests.
pub const DEFAULT_USER_AGENT: &str = "haulway-routing/0.1";

/// Default Nominatim instance.
pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// OSRM profile segment used in route URLs.
const OSRM_PROFILE: &str = "driving";

/// Configuration for [`HttpRouter`].
#[derive(Debug, Clone)]
pub struct HttpRouterConfig {
    /// Base URL for the OSRM service (e.g., `"http://localhost:5000"`).
    pub base_url: String,
    /// Base URL for the Nominatim service.
    pub geocoder_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpRouterConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_owned(),
            geocoder_url: DEFAULT_GEOCODER_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpRouterConfig {
    /// Create a new configuration with the given OSRM base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the geocoder base URL.
    #[must_use]
    pub fn with_geocoder_url(mut self, geocoder_url: impl Into<String>) -> Self {
        self.geocoder_url = geocoder_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Routes through an OSRM server and geocodes through Nominatim.
///
/// OSRM profiles are fixed server-side, so the vehicle constraints in
/// [`RouteOptions`] only select the number of alternatives requested.
#[derive(Debug)]
pub struct HttpRouter {
    client: Client,
    config: HttpRouterConfig,
}

impl HttpRouter {
    /// Create a new router with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RouterBuildError> {
        Self::with_config(HttpRouterConfig::new(base_url))
    }

    /// Create a new router with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpRouterConfig) -> Result<Self, RouterBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(RouterBuildError::HttpClient)?;
        Ok(Self { client, config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &HttpRouterConfig {
        &self.config
    }

    /// Build the OSRM Route API URL for the given waypoints.
    ///
    /// The URL format is: `{base_url}/route/v1/driving/{coordinates}`
    /// where coordinates are semicolon-separated `lon,lat` pairs.
    fn build_route_url(&self, waypoints: &[Coordinate]) -> String {
        let coords = waypoints
            .iter()
            .map(|point| format!("{},{}", point.lon, point.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{OSRM_PROFILE}/{coords}",
            self.config.base_url.trim_end_matches('/'),
        )
    }

    fn route_query(options: &RouteOptions) -> [(&'static str, String); 3] {
        let alternatives = if options.alternatives == 0 {
            "false".to_owned()
        } else {
            options.alternatives.to_string()
        };
        [
            ("overview", "full".to_owned()),
            ("geometries", "geojson".to_owned()),
            ("alternatives", alternatives),
        ]
    }

    fn build_search_url(&self) -> String {
        format!("{}/search", self.config.geocoder_url.trim_end_matches('/'))
    }

    /// Convert a reqwest error to a `RouteBuildError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> RouteBuildError {
        if error.is_timeout() {
            return RouteBuildError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RouteBuildError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: error.to_string(),
            };
        }

        RouteBuildError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }

    /// Convert an OSRM response to a [`RouteBuild`].
    fn convert_response(response: RouteResponse) -> Result<RouteBuild, RouteBuildError> {
        if !response.is_ok() {
            return Err(RouteBuildError::NoRoute {
                code: response.code,
                message: response.message.unwrap_or_default(),
            });
        }

        let mut routes = response.routes.unwrap_or_default().into_iter();
        let best = routes.next().ok_or_else(|| RouteBuildError::NoRoute {
            code: "NoRoute".to_owned(),
            message: "OSRM response contained no routes".to_owned(),
        })?;
        let primary = route_line(&best);
        if primary.len() < 2 {
            return Err(RouteBuildError::Parse {
                message: format!(
                    "route geometry has {} valid points, expected at least 2",
                    primary.len()
                ),
            });
        }
        let alternatives = routes
            .map(|route| route_line(&route))
            .filter(|line| line.len() >= 2)
            .collect();

        Ok(RouteBuild {
            primary,
            alternatives,
            distance_m: best.distance,
            duration_s: best.duration,
        })
    }
}

fn route_line(route: &OsrmRoute) -> Vec<Coordinate> {
    sanitize_polyline(
        route
            .geometry
            .coordinates
            .iter()
            .map(|&[lon, lat]| Coordinate::new(lat, lon)),
    )
}

fn parse_place(place: &Place) -> Result<Coordinate, GeocodeError> {
    let component = |label: &str, text: &str| {
        text.trim()
            .parse::<f64>()
            .map_err(|err| GeocodeError::Parse {
                message: format!("invalid {label} {text:?}: {err}"),
            })
    };
    let lat = component("latitude", &place.lat)?;
    let lon = component("longitude", &place.lon)?;
    Coordinate::try_new(lat, lon).map_err(|err| GeocodeError::Parse {
        message: err.to_string(),
    })
}

#[async_trait]
impl Router for HttpRouter {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let query = address.trim();
        if query.is_empty() {
            return Err(GeocodeError::NoMatch {
                address: address.to_owned(),
            });
        }

        let url = self.build_search_url();
        let network = |err: reqwest::Error| GeocodeError::Network {
            url: url.clone(),
            message: err.to_string(),
        };
        let places: Vec<Place> = self
            .client
            .get(&url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(network)?
            .error_for_status()
            .map_err(network)?
            .json()
            .await
            .map_err(|err| GeocodeError::Parse {
                message: err.to_string(),
            })?;

        let place = places.first().ok_or_else(|| GeocodeError::NoMatch {
            address: address.to_owned(),
        })?;
        let location = parse_place(place)?;
        log::debug!(
            "Geocoded {address:?} to {location} ({})",
            place.display_name.as_deref().unwrap_or("unnamed")
        );
        Ok(location)
    }

    async fn build(
        &self,
        waypoints: &[Coordinate],
        options: &RouteOptions,
    ) -> Result<RouteBuild, RouteBuildError> {
        if waypoints.len() < 2 {
            return Err(RouteBuildError::TooFewWaypoints(waypoints.len()));
        }

        let url = self.build_route_url(waypoints);
        let response = self
            .client
            .get(&url)
            .query(&Self::route_query(options))
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, &url))?;

        // OSRM reports NoRoute and InvalidQuery as 400 with a JSON body.
        let status = response.status();
        if !status.is_success() && status != StatusCode::BAD_REQUEST {
            return Err(RouteBuildError::Http {
                url,
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or("unexpected status").to_owned(),
            });
        }

        let route_response: RouteResponse =
            response
                .json()
                .await
                .map_err(|err| RouteBuildError::Parse {
                    message: err.to_string(),
                })?;

        let route = Self::convert_response(route_response)?;
        log::debug!(
            "OSRM route for {} waypoints ({}): {:.0} m, {} alternatives",
            waypoints.len(),
            options.profile,
            route.distance_m,
            route.alternatives.len()
        );
        Ok(route)
    }
}
