//! Progress reporting.

/// Receives `(percent, status)` updates while documents are processed.
///
/// Percentages never decrease during a run and end at 100.
pub trait ProgressReporter {
    fn report(&mut self, percent: f32, status: &str);
}

impl<F: FnMut(f32, &str)> ProgressReporter for F {
    fn report(&mut self, percent: f32, status: &str) {
        self(percent, status)
    }
}

/// Reporter that drops every update.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _percent: f32, _status: &str) {}
}

/// Maps a document's 0..=100 progress into its slice of a batch.
pub(crate) struct BatchSlice<'a, P: ProgressReporter> {
    inner: &'a mut P,
    start: f32,
    span: f32,
    last: f32,
}

impl<'a, P: ProgressReporter> BatchSlice<'a, P> {
    /// Slice for document `index` of `count`.
    pub(crate) fn new(inner: &'a mut P, index: usize, count: usize) -> Self {
        let span = 100.0 / count.max(1) as f32;
        let start = index as f32 * span;
        Self {
            inner,
            start,
            span,
            last: start,
        }
    }

    /// Jump to the end of the slice.
    pub(crate) fn complete(&mut self, status: &str) {
        self.report(100.0, status);
    }
}

impl<P: ProgressReporter> ProgressReporter for BatchSlice<'_, P> {
    fn report(&mut self, percent: f32, status: &str) {
        let global = (self.start + percent.clamp(0.0, 100.0) / 100.0 * self.span).min(100.0);
        self.last = self.last.max(global);
        self.inner.report(self.last, status);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_closure_reporter() {
        let mut seen = Vec::new();
        let mut reporter = |p: f32, s: &str| seen.push((p, s.to_string()));
        reporter.report(50.0, "half");
        assert_eq!(seen, vec![(50.0, "half".to_string())]);
    }

    #[test]
    fn test_batch_slice_scales_into_range() {
        let mut seen = Vec::new();
        let mut reporter = |p: f32, _: &str| seen.push(p);
        {
            let mut slice = BatchSlice::new(&mut reporter, 1, 4);
            slice.report(0.0, "start");
            slice.report(50.0, "half");
            slice.report(20.0, "stale");
            slice.complete("done");
        }
        assert_eq!(seen, vec![25.0, 37.5, 37.5, 50.0]);
    }
}
