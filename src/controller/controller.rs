// HTTP controller trait for route registration.

use axum::Router;

/// A group of routes mounted on the shared router.
pub trait Controller: Send + Sync {
    /// Merges this controller's routes into `router`.
    ///
    /// Stateful controllers build their own `Router` with `with_state` and
    /// merge it, so the shared router stays stateless:
    /// ```rust
    /// # use axum::{Router, routing::get};
    /// # async fn events() -> &'static str { "[]" }
    /// let routes: Router<()> = Router::new().route("/api/events", get(events));
    /// let router = Router::new().merge(routes);
    /// # let _ = router;
    /// ```
    fn add_route(&self, router: Router) -> Router;
}
