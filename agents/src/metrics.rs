//! Wall-clock stage timing for a turn. Observability data only; nothing
//! reads these values to make decisions.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Collects named stage durations and renders them for the answer metrics.
pub struct TurnMetrics {
    started: Instant,
    stages: Vec<(&'static str, Duration)>,
}

impl TurnMetrics {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            stages: Vec::new(),
        }
    }

    /// Records one named stage, e.g. "búsqueda" or "generación".
    pub fn record(&mut self, stage: &'static str, elapsed: Duration) {
        self.stages.push((stage, elapsed));
    }

    /// Renders all stages plus the running total and the turn type, each
    /// duration formatted to one decimal with an `s` suffix.
    pub fn finish(self, tipo: &str) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (stage, elapsed) in &self.stages {
            map.insert(stage.to_string(), format_duration(*elapsed));
        }
        map.insert("total".to_string(), format_duration(self.started.elapsed()));
        map.insert("tipo".to_string(), tipo.to_string());
        map
    }
}

fn format_duration(d: Duration) -> String {
    format!("{:.1}s", d.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_renders_stages_total_and_type() {
        let mut metrics = TurnMetrics::start();
        metrics.record("búsqueda", Duration::from_millis(1234));
        metrics.record("generación", Duration::from_millis(240));

        let map = metrics.finish("Respuesta Documental");
        assert_eq!(map.get("búsqueda").map(String::as_str), Some("1.2s"));
        assert_eq!(map.get("generación").map(String::as_str), Some("0.2s"));
        assert_eq!(map.get("tipo").map(String::as_str), Some("Respuesta Documental"));
        assert!(map.get("total").unwrap().ends_with('s'));
    }
}
