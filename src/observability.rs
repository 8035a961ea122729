use biometrics::{Collector, Counter, Emitter, Gauge, Histogram, Moments, Sensor};

pub(crate) static PROVIDER_REQUESTS: Counter = Counter::new("techreq.provider.requests");
pub(crate) static PROVIDER_REQUEST_ERRORS: Counter =
    Counter::new("techreq.provider.request_errors");
pub(crate) static PROVIDER_REQUEST_DURATION: Moments =
    Moments::new("techreq.provider.request_duration_seconds");

pub(crate) static SAVE_ATTEMPTS: Counter = Counter::new("techreq.save.attempts");
pub(crate) static SAVE_RETRIES: Counter = Counter::new("techreq.save.retries");
pub(crate) static SAVE_SUCCESSES: Counter = Counter::new("techreq.save.successes");
pub(crate) static SAVE_FAILURES: Counter = Counter::new("techreq.save.failures");
pub(crate) static SAVE_BACKOFF: Moments = Moments::new("techreq.save.backoff_seconds");

pub(crate) static CACHE_WRITES: Counter = Counter::new("techreq.cache.writes");
pub(crate) static CACHE_ERRORS: Counter = Counter::new("techreq.cache.errors");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: &Collector) {
    collector.register_counter(&PROVIDER_REQUESTS);
    collector.register_counter(&PROVIDER_REQUEST_ERRORS);
    collector.register_moments(&PROVIDER_REQUEST_DURATION);

    collector.register_counter(&SAVE_ATTEMPTS);
    collector.register_counter(&SAVE_RETRIES);
    collector.register_counter(&SAVE_SUCCESSES);
    collector.register_counter(&SAVE_FAILURES);
    collector.register_moments(&SAVE_BACKOFF);

    collector.register_counter(&CACHE_WRITES);
    collector.register_counter(&CACHE_ERRORS);
}

/// Reads every `techreq.*` sensor registered with `collector`, one line each.
///
/// Counters read as `label value`, moments as `label n=.. mean=..`.
pub fn metrics_snapshot(collector: &Collector) -> Vec<String> {
    let mut emitter = LineEmitter::default();
    // LineEmitter never fails.
    let _ = collector.emit(&mut emitter, 0);
    emitter.lines
}

#[derive(Debug, Default)]
struct LineEmitter {
    lines: Vec<String>,
}

impl LineEmitter {
    fn keep(label: &str) -> bool {
        label.starts_with("techreq.")
    }
}

impl Emitter for LineEmitter {
    type Error = std::convert::Infallible;

    fn emit_counter(&mut self, counter: &Counter, _: u64) -> Result<(), Self::Error> {
        if Self::keep(counter.label()) {
            self.lines
                .push(format!("{} {}", counter.label(), counter.read()));
        }
        Ok(())
    }

    fn emit_gauge(&mut self, gauge: &Gauge, _: u64) -> Result<(), Self::Error> {
        if Self::keep(gauge.label()) {
            self.lines.push(format!("{} {}", gauge.label(), gauge.read()));
        }
        Ok(())
    }

    fn emit_moments(&mut self, moments: &Moments, _: u64) -> Result<(), Self::Error> {
        if Self::keep(moments.label()) {
            let reading = moments.read();
            self.lines.push(format!(
                "{} n={} mean={:.3}",
                moments.label(),
                reading.n(),
                reading.mean()
            ));
        }
        Ok(())
    }

    fn emit_histogram(&mut self, histogram: &Histogram, _: u64) -> Result<(), Self::Error> {
        if Self::keep(histogram.label()) {
            self.lines.push(histogram.label().to_string());
        }
        Ok(())
    }
}
