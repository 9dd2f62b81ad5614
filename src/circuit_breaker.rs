use failsafe::{backoff, failure_policy, Config};
use std::time::Duration;

/// Creates the circuit breaker that guards event publishing.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failed publishes open the circuit.
/// - **Backoff**: exponential, 10s up to 60s, before a trial publish is let through.
///
/// While the circuit is open, `GuardedPublisher` rejects events without
/// contacting the broker. Scoring is unaffected either way.
pub fn create_publish_circuit_breaker() -> impl failsafe::CircuitBreaker + Send + Sync {
    let backoff_strategy = backoff::exponential(Duration::from_secs(10), Duration::from_secs(60));

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
