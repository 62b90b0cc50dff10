use thiserror::Error;

/// Errors from [`crate::router::Router::geocode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// The geocoder found no match for the address.
    #[error("no match found for address {address:?}")]
    NoMatch {
        /// Address that was looked up.
        address: String,
    },
    /// The request could not reach the geocoding service.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The geocoding service answered with something unreadable.
    #[error("failed to parse geocoder response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
}

/// Errors from [`crate::router::Router::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteBuildError {
    /// Fewer than two waypoints were supplied.
    ///
    /// A route needs an origin and a destination. Callers should check the
    /// waypoint list before calling the router.
    #[error("at least two waypoints are required, got {0}")]
    TooFewWaypoints(usize),
    /// The routing service found no path between the waypoints.
    #[error("routing service found no route ({code}): {message}")]
    NoRoute {
        /// Status code reported by the service.
        code: String,
        /// Message reported by the service.
        message: String,
    },
    /// The request timed out.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with an HTTP error status.
    #[error("HTTP {status} from {url}: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The service answered with something unreadable.
    #[error("failed to parse routing response: {message}")]
    Parse {
        /// Decoder error description.
        message: String,
    },
}
