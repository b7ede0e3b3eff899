use skirmish_engine::MetricsSink;
use tracing::debug;

/// Forwards flushed statistics to the log.
#[derive(Debug, Default)]
pub(crate) struct TracingSink;

impl MetricsSink for TracingSink {
    fn add(&mut self, name: &str, value: f32) {
        debug!(target: "skirmish::metrics", name, value, "metric");
    }
}
