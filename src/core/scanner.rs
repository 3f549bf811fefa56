use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::{filters::evaluate, seed::SeedGenerator};
use crate::models::{Draw, MatchResult, ScanRequest, UserProfile};

/// Shared flag a caller can trip to stop a running scan
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Lifecycle of a scan once its input has been validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Running,
    Completed,
    Cancelled,
}

/// Snapshot handed to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub state: ScanState,
    /// Offset of the next second to scan
    pub scanned: u64,
    pub total: u64,
    pub matches: usize,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.scanned as f64 / self.total as f64
    }
}

/// Lazy sequence of draws over `[from, to)` seconds of a scan window.
///
/// The cancel token is only consulted every `batch_size` seconds, counted
/// from where the stream started, so the atomic load stays out of the
/// per-second path. Once the stream ends it stays ended.
#[derive(Debug, Clone)]
pub struct DrawStream {
    generator: SeedGenerator,
    request: ScanRequest,
    origin: u64,
    position: u64,
    end: u64,
    cancel: Option<CancelToken>,
    batch_size: u64,
    cancelled: bool,
}

impl DrawStream {
    /// Stream over the whole window
    pub fn new(profile: &UserProfile, request: &ScanRequest) -> Self {
        Self::range(profile, request, 0, request.total_seconds())
    }

    /// Stream over a sub-range; bounds are clamped to the window
    pub fn range(profile: &UserProfile, request: &ScanRequest, from: u64, to: u64) -> Self {
        let end = to.min(request.total_seconds());
        let origin = from.min(end);
        Self {
            generator: SeedGenerator::new(profile, request),
            request: request.clone(),
            origin,
            position: origin,
            end,
            cancel: None,
            batch_size: u64::MAX,
            cancelled: false,
        }
    }

    /// Resume a window from an offset reported by an earlier cancelled scan
    pub fn resume_from(profile: &UserProfile, request: &ScanRequest, offset: u64) -> Self {
        Self::range(profile, request, offset, request.total_seconds())
    }

    pub fn with_cancel(mut self, cancel: CancelToken, batch_size: u64) -> Self {
        self.cancel = Some(cancel);
        self.batch_size = batch_size.max(1);
        self
    }

    /// Offset of the next second this stream would produce
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn remaining(&self) -> u64 {
        self.end - self.position
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl Iterator for DrawStream {
    type Item = Draw;

    fn next(&mut self) -> Option<Draw> {
        if self.cancelled || self.position >= self.end {
            return None;
        }

        if (self.position - self.origin) % self.batch_size == 0 {
            if let Some(cancel) = &self.cancel {
                if cancel.is_cancelled() {
                    self.cancelled = true;
                    return None;
                }
            }
        }

        let draw = self.generator.draw(self.request.timestamp_at(self.position));
        self.position += 1;
        Some(draw)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        if self.cancel.is_some() {
            (0, Some(remaining))
        } else {
            (remaining, Some(remaining))
        }
    }
}

/// Outcome of a scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub state: ScanState,
    /// Matches in timestamp order
    pub matches: Vec<MatchResult>,
    /// Offset reached, counted from the start of the window
    pub scanned: u64,
    pub total: u64,
    /// Where to resume when the scan was cancelled
    pub next_offset: Option<u64>,
}

/// Drives draw streams through the compatibility filter
#[derive(Debug, Clone)]
pub struct Scanner {
    progress_interval: u64,
    batch_size: u64,
    workers: usize,
}

impl Scanner {
    pub fn new(progress_interval: u64, batch_size: u64, workers: usize) -> Self {
        Self {
            progress_interval: progress_interval.max(1),
            batch_size: batch_size.max(1),
            workers: workers.max(1),
        }
    }

    /// Single-threaded scan starting at `offset`.
    ///
    /// `on_progress` is called every `progress_interval` seconds while
    /// running and once more with the final state.
    pub fn run<F>(
        &self,
        profile: &UserProfile,
        request: &ScanRequest,
        cancel: &CancelToken,
        offset: u64,
        mut on_progress: F,
    ) -> ScanReport
    where
        F: FnMut(Progress),
    {
        let total = request.total_seconds();
        let mut stream = DrawStream::resume_from(profile, request, offset)
            .with_cancel(cancel.clone(), self.batch_size);
        let mut matches = Vec::new();

        while let Some(draw) = stream.next() {
            if let Some(found) = evaluate(profile.element, &draw) {
                matches.push(found);
            }

            if stream.position() % self.progress_interval == 0 {
                on_progress(Progress {
                    state: ScanState::Running,
                    scanned: stream.position(),
                    total,
                    matches: matches.len(),
                });
            }
        }

        let report = finish(matches, stream.position(), total, stream.was_cancelled());
        on_progress(Progress {
            state: report.state,
            scanned: report.scanned,
            total,
            matches: report.matches.len(),
        });
        report
    }

    /// Scan `[offset, total)` split into one contiguous chunk per worker.
    ///
    /// Matches equal those of [`Scanner::run`] for the same input. When
    /// cancelled, results past the earliest unfinished chunk are dropped so
    /// that resuming from `next_offset` neither skips nor repeats a second.
    ///
    /// Workers share one counter of finished seconds; `on_progress` runs on
    /// whichever worker brings it to a multiple of `progress_interval`, and
    /// once more on the caller's thread with the final state. While running,
    /// `scanned` is `offset` plus the seconds finished so far.
    pub fn run_parallel<F>(
        &self,
        profile: &UserProfile,
        request: &ScanRequest,
        cancel: &CancelToken,
        offset: u64,
        on_progress: F,
    ) -> ScanReport
    where
        F: Fn(Progress) + Sync,
    {
        let total = request.total_seconds();
        let start = offset.min(total);
        let chunks = split_range(start, total, self.workers);
        let done = AtomicU64::new(0);
        let found = AtomicUsize::new(0);

        let partials: Vec<(Vec<MatchResult>, u64, bool)> = chunks
            .into_par_iter()
            .map(|(from, to)| {
                let mut stream = DrawStream::range(profile, request, from, to)
                    .with_cancel(cancel.clone(), self.batch_size);
                let mut matches = Vec::new();

                while let Some(draw) = stream.next() {
                    if let Some(hit) = evaluate(profile.element, &draw) {
                        matches.push(hit);
                        found.fetch_add(1, Ordering::Relaxed);
                    }

                    let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                    if finished % self.progress_interval == 0 {
                        on_progress(Progress {
                            state: ScanState::Running,
                            scanned: start + finished,
                            total,
                            matches: found.load(Ordering::Relaxed),
                        });
                    }
                }

                tracing::trace!(from, to, reached = stream.position(), "Chunk finished");
                (matches, stream.position(), stream.was_cancelled())
            })
            .collect();

        let cutoff = partials
            .iter()
            .filter(|(_, _, cancelled)| *cancelled)
            .map(|(_, reached, _)| *reached)
            .min();

        let scanned = cutoff.unwrap_or(total);
        let limit = request.timestamp_at(scanned);
        let matches = partials
            .into_iter()
            .flat_map(|(matches, _, _)| matches)
            .filter(|m| m.draw.timestamp < limit)
            .collect();

        let report = finish(matches, scanned, total, cutoff.is_some());
        on_progress(Progress {
            state: report.state,
            scanned: report.scanned,
            total,
            matches: report.matches.len(),
        });
        report
    }

    /// Run with the configured worker count, logging progress
    pub fn execute(
        &self,
        profile: &UserProfile,
        request: &ScanRequest,
        cancel: &CancelToken,
        offset: u64,
    ) -> ScanReport {
        tracing::info!(
            element = %profile.element,
            start = %request.start,
            total = request.total_seconds(),
            offset,
            workers = self.workers,
            "Scan started"
        );

        let report = if self.workers > 1 {
            self.run_parallel(profile, request, cancel, offset, log_progress)
        } else {
            self.run(profile, request, cancel, offset, log_progress)
        };

        tracing::info!(
            state = ?report.state,
            scanned = report.scanned,
            matches = report.matches.len(),
            "Scan finished"
        );

        report
    }
}

fn log_progress(progress: Progress) {
    tracing::debug!(
        scanned = progress.scanned,
        total = progress.total,
        matches = progress.matches,
        "Scan progress {:.1}%",
        progress.fraction() * 100.0
    );
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new(600, 256, 1)
    }
}

fn finish(matches: Vec<MatchResult>, scanned: u64, total: u64, cancelled: bool) -> ScanReport {
    let state = if cancelled {
        ScanState::Cancelled
    } else {
        ScanState::Completed
    };

    ScanReport {
        state,
        matches,
        scanned,
        total,
        next_offset: cancelled.then_some(scanned),
    }
}

/// Split `[from, to)` into at most `parts` contiguous, non-empty ranges
fn split_range(from: u64, to: u64, parts: usize) -> Vec<(u64, u64)> {
    let len = to.saturating_sub(from);
    if len == 0 {
        return Vec::new();
    }

    let parts = (parts.max(1) as u64).min(len);
    let step = len.div_ceil(parts);

    (0..parts)
        .map(|i| (from + i * step, (from + (i + 1) * step).min(to)))
        .filter(|(a, b)| a < b)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Element;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn profile() -> UserProfile {
        UserProfile {
            birth_date: NaiveDate::from_ymd_opt(1996, 5, 20).unwrap(),
            lunar_year: 1996,
            element: Element::Water,
            approximate_lunar_year: true,
        }
    }

    fn request(hours: f64) -> ScanRequest {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        ScanRequest::new(start.date(), vec!["79".to_string()], start, hours).unwrap()
    }

    #[test]
    fn test_half_hour_is_half_open() {
        let request = request(0.5);
        let draws: Vec<Draw> = DrawStream::new(&profile(), &request).collect();

        assert_eq!(draws.len(), 1800);
        assert_eq!(draws[0].timestamp, request.start);
        assert_eq!(draws[1799].timestamp, request.timestamp_at(1799));
        assert!(draws.iter().all(|d| d.timestamp < request.end()));
    }

    #[test]
    fn test_stream_is_reproducible() {
        let request = request(0.5);
        let a: Vec<Draw> = DrawStream::new(&profile(), &request).take(20).collect();
        let b: Vec<Draw> = DrawStream::new(&profile(), &request).take(20).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_cancel_stops_at_batch_boundary() {
        let request = request(0.5);
        let cancel = CancelToken::new();
        let mut stream = DrawStream::new(&profile(), &request).with_cancel(cancel.clone(), 100);

        for _ in 0..150 {
            stream.next();
        }
        cancel.cancel();

        assert_eq!(stream.by_ref().count(), 50);
        assert!(stream.was_cancelled());
        assert_eq!(stream.position(), 200);
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_run_reports_progress_and_completes() {
        let scanner = Scanner::new(600, 100, 1);
        let mut updates = Vec::new();

        let report = scanner.run(&profile(), &request(0.5), &CancelToken::new(), 0, |p| {
            updates.push(p)
        });

        assert_eq!(report.state, ScanState::Completed);
        assert_eq!(report.scanned, 1800);
        assert_eq!(report.next_offset, None);
        // 600, 1200, 1800 while running, then the final snapshot
        assert_eq!(updates.len(), 4);
        assert_eq!(updates.last().unwrap().state, ScanState::Completed);
    }

    #[test]
    fn test_matches_satisfy_filter() {
        let report = Scanner::default().run(&profile(), &request(1.0), &CancelToken::new(), 0, |_| {});

        for m in &report.matches {
            assert!(m.draw.numbers.contains(&m.second));
            assert!(crate::core::filters::all_compatible(Element::Water, &m.draw.numbers));
        }
        assert!(report.matches.windows(2).all(|w| w[0].draw.timestamp < w[1].draw.timestamp));
    }

    #[test]
    fn test_pre_cancelled_scan_resumes_from_offset() {
        let cancel = CancelToken::new();
        cancel.cancel();

        let report = Scanner::default().run(&profile(), &request(0.5), &cancel, 300, |_| {});

        assert_eq!(report.state, ScanState::Cancelled);
        assert_eq!(report.next_offset, Some(300));
        assert!(report.matches.is_empty());
    }

    #[test]
    fn test_resumed_halves_equal_full_scan() {
        let request = request(1.0);
        let scanner = Scanner::default();
        let full = scanner.run(&profile(), &request, &CancelToken::new(), 0, |_| {});

        let first: Vec<MatchResult> = DrawStream::range(&profile(), &request, 0, 1000)
            .filter_map(|d| evaluate(Element::Water, &d))
            .collect();
        let rest = scanner.run(&profile(), &request, &CancelToken::new(), 1000, |_| {});

        let mut joined = first;
        joined.extend(rest.matches);
        assert_eq!(joined, full.matches);
    }

    #[test]
    fn test_parallel_equals_sequential() {
        let request = request(1.0);
        let sequential = Scanner::new(600, 256, 1).run(&profile(), &request, &CancelToken::new(), 0, |_| {});
        let parallel = Scanner::new(600, 256, 4).run_parallel(&profile(), &request, &CancelToken::new(), 0, |_| {});

        assert_eq!(parallel.state, ScanState::Completed);
        assert_eq!(parallel.scanned, 3600);
        assert_eq!(parallel.matches, sequential.matches);
    }

    #[test]
    fn test_parallel_reports_shared_progress() {
        let updates = Mutex::new(Vec::new());

        let report = Scanner::new(600, 256, 4).run_parallel(
            &profile(),
            &request(1.0),
            &CancelToken::new(),
            0,
            |p| updates.lock().unwrap().push(p),
        );

        let updates = updates.into_inner().unwrap();
        let mut running: Vec<u64> = updates
            .iter()
            .filter(|p| p.state == ScanState::Running)
            .map(|p| p.scanned)
            .collect();
        running.sort_unstable();

        // one update per 600 seconds across all workers, then the final one
        assert_eq!(running, vec![600, 1200, 1800, 2400, 3000, 3600]);
        assert_eq!(updates.len(), 7);
        let last = updates.last().unwrap();
        assert_eq!(last.state, ScanState::Completed);
        assert_eq!(last.matches, report.matches.len());
    }

    #[test]
    fn test_parallel_cancel_midway_resumes_exactly() {
        let request = request(1.0);
        let full = Scanner::default().run(&profile(), &request, &CancelToken::new(), 0, |_| {});
        assert!(!full.matches.is_empty());

        // trip the token from inside the scan once 300 seconds are done
        let cancel = CancelToken::new();
        let scanner = Scanner::new(300, 8, 4);
        let first = scanner.run_parallel(&profile(), &request, &cancel, 0, |p| {
            if p.state == ScanState::Running {
                cancel.cancel();
            }
        });

        assert_eq!(first.state, ScanState::Cancelled);
        let offset = first.next_offset.unwrap();
        assert_eq!(offset, first.scanned);
        assert!(offset < request.total_seconds());
        assert!(first.matches.iter().all(|m| m.draw.timestamp < request.timestamp_at(offset)));

        let rest = scanner.run_parallel(&profile(), &request, &CancelToken::new(), offset, |_| {});
        assert_eq!(rest.state, ScanState::Completed);
        assert_eq!(rest.scanned, request.total_seconds());

        let mut joined = first.matches;
        joined.extend(rest.matches);
        assert_eq!(joined, full.matches);
    }

    #[test]
    fn test_split_range_covers_window() {
        assert_eq!(split_range(0, 10, 3), vec![(0, 4), (4, 8), (8, 10)]);
        assert_eq!(split_range(5, 7, 8), vec![(5, 6), (6, 7)]);
        assert!(split_range(7, 7, 4).is_empty());
    }
}
