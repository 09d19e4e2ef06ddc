use crate::config::ProgressConfig;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Progress callback: receives percent complete in [0, 100]
pub type ProgressFn<'a> = dyn FnMut(f32) -> anyhow::Result<()> + 'a;

/// Throttled, failure-tolerant wrapper around an optional progress callback
///
/// A report is forwarded only when both the minimum interval has elapsed and
/// the value advanced by at least the minimum step since the last forwarded
/// report. The first report and the final 100 always go through. Errors and
/// panics raised by the callback are logged and swallowed.
pub struct ProgressReporter<'a, 'f> {
    callback: Option<&'a mut ProgressFn<'f>>,
    config: ProgressConfig,
    last_sent: Option<(Instant, f32)>,
    failures: usize,
}

impl<'a, 'f> ProgressReporter<'a, 'f> {
    pub fn new(callback: Option<&'a mut ProgressFn<'f>>, config: ProgressConfig) -> Self {
        Self {
            callback,
            config,
            last_sent: None,
            failures: 0,
        }
    }

    /// Reporter that drops every report
    pub fn disabled() -> Self {
        Self::new(None, ProgressConfig::default())
    }

    /// Number of callback invocations that failed
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn report(&mut self, percent: f32) {
        if self.callback.is_none() {
            return;
        }
        let percent = normalize(percent);

        let due = match self.last_sent {
            None => true,
            Some((at, last)) => {
                at.elapsed() >= self.config.min_interval
                    && percent - last >= self.config.min_step
            }
        };

        if due {
            self.send(percent);
        }
    }

    /// Report completion
    pub fn finish(&mut self) {
        if self.callback.is_none() {
            return;
        }
        if !matches!(self.last_sent, Some((_, last)) if last >= 100.0) {
            self.send(100.0);
        }
    }

    fn send(&mut self, percent: f32) {
        let Some(callback) = self.callback.as_mut() else {
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| callback(percent))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.failures += 1;
                tracing::warn!("Progress callback failed at {:.1}%: {:#}", percent, e);
            }
            Err(payload) => {
                self.failures += 1;
                tracing::warn!(
                    "Progress callback panicked at {:.1}%: {}",
                    percent,
                    panic_message(payload.as_ref())
                );
            }
        }

        self.last_sent = Some((Instant::now(), percent));
    }
}

fn normalize(percent: f32) -> f32 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use std::time::Duration;

    fn unthrottled() -> ProgressConfig {
        ProgressConfig {
            min_interval: Duration::ZERO,
            min_step: 0.0,
        }
    }

    #[test]
    fn test_reports_are_clamped_and_finished() {
        let mut seen = Vec::new();
        let mut callback = |p: f32| -> anyhow::Result<()> {
            seen.push(p);
            Ok(())
        };
        let mut reporter = ProgressReporter::new(Some(&mut callback), unthrottled());
        reporter.report(-5.0);
        reporter.report(50.0);
        reporter.report(250.0);
        reporter.finish();
        drop(reporter);

        assert_eq!(seen, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn test_step_throttle_bounds_invocations() {
        let mut calls = 0usize;
        let mut callback = |_: f32| -> anyhow::Result<()> {
            calls += 1;
            Ok(())
        };
        let config = ProgressConfig {
            min_interval: Duration::ZERO,
            min_step: 10.0,
        };
        let mut reporter = ProgressReporter::new(Some(&mut callback), config);
        for i in 0..1000 {
            reporter.report(i as f32 / 10.0);
        }
        reporter.finish();
        drop(reporter);

        // 0, 10, 20, ... 90, then the final 100
        assert_eq!(calls, 11);
    }

    #[test]
    fn test_time_throttle_suppresses_bursts() {
        let mut calls = 0usize;
        let mut callback = |_: f32| -> anyhow::Result<()> {
            calls += 1;
            Ok(())
        };
        let config = ProgressConfig {
            min_interval: Duration::from_secs(3600),
            min_step: 0.0,
        };
        let mut reporter = ProgressReporter::new(Some(&mut callback), config);
        for i in 0..100 {
            reporter.report(i as f32);
        }
        reporter.finish();
        drop(reporter);

        assert_eq!(calls, 2);
    }

    #[test]
    fn test_callback_errors_and_panics_are_contained() {
        let mut calls = 0usize;
        let mut callback = |p: f32| -> anyhow::Result<()> {
            calls += 1;
            if p < 50.0 {
                bail!("listener went away");
            }
            panic!("listener crashed");
        };
        let mut reporter = ProgressReporter::new(Some(&mut callback), unthrottled());
        reporter.report(10.0);
        reporter.report(60.0);
        reporter.finish();
        assert_eq!(reporter.failures(), 3);
        drop(reporter);

        assert_eq!(calls, 3);
    }

    #[test]
    fn test_disabled_reporter_is_inert() {
        let mut reporter = ProgressReporter::disabled();
        reporter.report(42.0);
        reporter.finish();
        assert_eq!(reporter.failures(), 0);
    }
}
