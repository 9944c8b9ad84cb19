use thiserror::Error;

/// Errors from [`crate::routing::RouteProvider::compute_route`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The provider could not be reached or rejected the request outright.
    ///
    /// Discovery recovers from this locally by switching to straight-line
    /// geometry; it is never surfaced to the end caller.
    #[error("routing provider unavailable")]
    ProviderUnavailable,
    /// The provider answered but found no route between the endpoints.
    ///
    /// Surfaced to the caller, who may retry with a simplified two-point
    /// request carrying no waypoints.
    #[error("no route found between the requested endpoints")]
    NoRouteFound,
    /// The provider did not answer within the hard timeout.
    #[error("routing provider timed out")]
    Timeout,
}
