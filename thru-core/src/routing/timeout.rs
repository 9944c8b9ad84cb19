//! Hard-timeout wrapper around a route provider.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use geo::Coord;

use super::error::RouteError;
use super::provider::{RouteProvider, RouteResult, TravelMode};

/// Timeout applied to provider calls unless the caller overrides it.
pub const DEFAULT_ROUTE_TIMEOUT: Duration = Duration::from_secs(5);

/// Races an inner provider against a hard deadline.
///
/// Each call runs on its own worker thread; if the inner provider has not
/// answered when the deadline passes, the call resolves to
/// [`RouteError::Timeout`] and the worker's eventual result is discarded.
/// The abandoned worker finishes in the background — acceptable because a
/// planning request issues at most one outstanding call.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use thru_core::{
///     DEFAULT_ROUTE_TIMEOUT, RouteError, RouteProvider, RouteResult, TimedRouteProvider,
///     TravelMode,
/// };
///
/// struct OfflineProvider;
///
/// impl RouteProvider for OfflineProvider {
///     fn compute_route(
///         &self,
///         _origin: Coord<f64>,
///         _destination: Coord<f64>,
///         _waypoints: &[Coord<f64>],
///         _mode: TravelMode,
///     ) -> Result<RouteResult, RouteError> {
///         Err(RouteError::ProviderUnavailable)
///     }
/// }
///
/// let provider = TimedRouteProvider::new(OfflineProvider);
/// assert_eq!(provider.timeout(), DEFAULT_ROUTE_TIMEOUT);
/// ```
#[derive(Debug)]
pub struct TimedRouteProvider<P> {
    inner: Arc<P>,
    timeout: Duration,
}

impl<P> TimedRouteProvider<P>
where
    P: RouteProvider + 'static,
{
    /// Wrap `inner` with the default 5-second deadline.
    pub fn new(inner: P) -> Self {
        Self::with_timeout(inner, DEFAULT_ROUTE_TIMEOUT)
    }

    /// Wrap `inner` with an explicit deadline.
    pub fn with_timeout(inner: P, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    /// The deadline applied to each call.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<P> RouteProvider for TimedRouteProvider<P>
where
    P: RouteProvider + 'static,
{
    fn compute_route(
        &self,
        origin: Coord<f64>,
        destination: Coord<f64>,
        waypoints: &[Coord<f64>],
        mode: TravelMode,
    ) -> Result<RouteResult, RouteError> {
        let (sender, receiver) = mpsc::channel();
        let provider = Arc::clone(&self.inner);
        let waypoints = waypoints.to_vec();
        thread::spawn(move || {
            // The send fails when the caller has already timed out and
            // dropped the receiver; the result is intentionally discarded.
            let _ = sender.send(provider.compute_route(origin, destination, &waypoints, mode));
        });

        receiver.recv_timeout(self.timeout).unwrap_or_else(|_| {
            log::warn!(
                "route provider exceeded {}ms deadline",
                self.timeout.as_millis()
            );
            Err(RouteError::Timeout)
        })
    }
}
