use std::future::Future;
use tracing::{info_span, Instrument, Span};

/// Span covering one full pipeline run.
pub fn run_span(run: u64) -> Span {
    info_span!("pipeline", run = run, error = tracing::field::Empty)
}

/// Span for a single pipeline stage (load, resolve, emit, write).
pub fn stage_span(stage: &'static str) -> Span {
    info_span!("stage", name = stage)
}

/// Span for one emitter target.
pub fn emit_span(target: &str) -> Span {
    info_span!("emit", target = %target)
}

/// Span for a file operation.
pub fn file_span(operation: &str, path: &str) -> Span {
    info_span!("file", op = %operation, path = %path)
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record an error on the current span. The span must declare an `error`
/// field, as [`run_span`] does.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", tracing::field::display(error));
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Elapsed time so far.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }

    /// Complete the timer and record duration.
    pub fn finish(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}

pub use tracing::instrument;

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    fn with_subscriber<F>(f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let subscriber = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(EnvFilter::new("trace"))
            .finish();

        tracing::subscriber::with_default(subscriber, f);
    }

    #[test]
    fn test_span_nesting() {
        with_subscriber(|| {
            let run = run_span(1);
            let _g1 = run.enter();
            let stage = stage_span("resolve");
            let _g2 = stage.enter();
            let file = file_span("write", "dist/tokens.css");
            let _g3 = file.enter();

            let error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
            record_error(&error);
            tracing::info!("nested operation");
        });
    }

    #[tokio::test]
    async fn test_instrumented_future() {
        let value = instrument_future(async { 21 * 2 }, emit_span("css")).await;
        assert_eq!(value, 42);
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start("load");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed() >= std::time::Duration::from_millis(5));
        assert!(timer.finish() >= std::time::Duration::from_millis(5));
    }
}
