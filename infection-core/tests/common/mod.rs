use infection_core::Population;
use infection_test_support::{fixtures::cycle_with_isolated_pair, tracing::RecordingLayer};
use tracing_subscriber::layer::SubscriberExt;

/// The three-cycle `A -> B -> C -> A` plus isolated `D` and `E`.
#[must_use]
pub fn cycle_and_pair() -> Population {
    let (versions, graph) = cycle_with_isolated_pair();
    Population::load(versions, graph).expect("fixture population must load")
}

/// Runs `body` under a subscriber that records spans and events.
pub fn recorded<T>(body: impl FnOnce() -> T) -> (T, RecordingLayer) {
    let layer = RecordingLayer::default();
    let subscriber = tracing_subscriber::registry().with(layer.clone());
    let value = tracing::subscriber::with_default(subscriber, body);
    (value, layer)
}
