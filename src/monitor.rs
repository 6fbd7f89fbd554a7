//! The wallboard monitor: polling, the refresh decision, and scheduling.
//!
//! A [`Monitor`] owns the HTTP client and the current [`Page`], and applies
//! the board's refresh semantics on every poll: same fingerprint patches
//! the body, a changed fingerprint adopts the fetched document wholesale,
//! and any failure swaps in the error banner until the next tick.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use log::{debug, info, warn};
use reqwest::blocking::Client;
use serde::Serialize;
use url::Url;

use crate::badge::{Badge, BadgeOptions};
use crate::page::{Page, StatusBox};
use crate::rendering::layout::{self, GridMetrics};
use crate::rendering::Stylesheet;
use crate::{BoardConfig, Error, Result, Viewport, DEFAULT_REFRESH_INTERVAL};

type RefreshHandler = Arc<dyn Fn(RefreshOutcome, &Page) + Send + Sync>;

/// What a poll did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The fingerprint changed; the fetched document was adopted wholesale.
    Reloaded,
    /// Same fingerprint; only the body content was patched.
    Patched,
    /// The fetch failed; the page now shows the error banner.
    Errored,
}

/// A tick delivered to the run loop.
enum Tick {
    Poll,
    Countdown,
}

/// Serialized form of the current page state, see [`Monitor::snapshot`].
#[derive(Serialize)]
struct PageSnapshot<'a> {
    url: Option<&'a str>,
    rel: Option<&'a str>,
    title: &'a str,
    boxes: &'a [StatusBox],
    running: usize,
    countdown: Option<i64>,
    stylesheet: &'a str,
}

pub struct Monitor {
    client: Client,
    config: BoardConfig,
    url: Option<String>,
    page: Page,
    stylesheet: Stylesheet,
    badge: Badge,
    metrics: Option<GridMetrics>,
    label_scales: Vec<Option<f64>>,
    on_refresh: Option<RefreshHandler>,
}

impl Monitor {
    pub fn new(mut config: BoardConfig) -> Result<Self> {
        // An interval of zero means "unset" and falls back to the default.
        if config.refresh_interval_secs == 0 {
            config.refresh_interval_secs = DEFAULT_REFRESH_INTERVAL;
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            url: None,
            page: Page::default(),
            stylesheet: Stylesheet::new(),
            badge: Badge::new(BadgeOptions::default()),
            metrics: None,
            label_scales: Vec::new(),
            on_refresh: None,
        })
    }

    /// Fetch the board for the first time and run the initial layout pass.
    pub fn load(&mut self, url: &str) -> Result<()> {
        Url::parse(url).map_err(|e| Error::UrlError(format!("{}: {}", url, e)))?;

        let body = self.fetch_board(url)?;
        self.url = Some(url.to_string());
        self.page = Page::parse(&body);
        self.layout();
        info!("loaded {} ({} boxes)", url, self.page.boxes().len());
        Ok(())
    }

    /// One refresh cycle against the current URL.
    ///
    /// Failures land on the page as the error banner rather than in the
    /// return value; the next tick is the retry.
    pub fn poll(&mut self) -> RefreshOutcome {
        let url = match self.url.clone() {
            Some(url) => url,
            None => {
                warn!("poll without a loaded board");
                self.page
                    .show_error(Local::now(), self.config.refresh_interval_secs);
                return RefreshOutcome::Errored;
            }
        };

        let outcome = match self.fetch_board(&url) {
            Ok(body) => {
                let fetched = Page::parse(&body);
                if fetched.rel() != self.page.rel() {
                    debug!(
                        "fingerprint changed ({:?} -> {:?}); adopting new document",
                        self.page.rel(),
                        fetched.rel()
                    );
                    self.page = fetched;
                    RefreshOutcome::Reloaded
                } else {
                    self.page.patch_body(fetched);
                    RefreshOutcome::Patched
                }
            }
            Err(e) => {
                warn!("board fetch failed: {}", e);
                self.page
                    .show_error(Local::now(), self.config.refresh_interval_secs);
                RefreshOutcome::Errored
            }
        };

        if outcome != RefreshOutcome::Errored {
            self.layout();
        }

        info!(
            "poll: {:?} ({} boxes, {} running)",
            outcome,
            self.page.boxes().len(),
            self.page.running_count()
        );

        if let Some(cb) = &self.on_refresh {
            cb(outcome, &self.page);
        }

        outcome
    }

    /// Update the viewport and rerun the layout pass.
    pub fn resize(&mut self, viewport: Viewport) {
        self.config.viewport = viewport;
        self.layout();
    }

    /// Forward the 1 Hz tick to the countdown display.
    pub fn tick_countdown(&mut self) {
        self.page.tick_countdown();
    }

    /// Register a callback invoked after every poll with the outcome and
    /// the refreshed page.
    pub fn on_refresh<F>(&mut self, cb: F)
    where
        F: Fn(RefreshOutcome, &Page) + Send + Sync + 'static,
    {
        self.on_refresh = Some(Arc::new(cb));
    }

    /// Remove a previously registered refresh callback if any
    pub fn clear_on_refresh(&mut self) {
        self.on_refresh = None;
    }

    /// Serialize the current page state as JSON.
    pub fn snapshot(&self) -> Result<String> {
        let snapshot = PageSnapshot {
            url: self.url.as_deref(),
            rel: self.page.rel(),
            title: self.page.title(),
            boxes: self.page.boxes(),
            running: self.page.running_count(),
            countdown: self.page.countdown(),
            stylesheet: self.stylesheet.rules(),
        };
        serde_json::to_string(&snapshot).map_err(|e| Error::SnapshotError(e.to_string()))
    }

    /// Drive the board forever: a poll tick every refresh interval and a
    /// countdown tick every second, applied on this thread.
    pub fn run(&mut self) {
        self.run_ticks(None);
    }

    /// Bounded variant of [`Monitor::run`]: returns after consuming the
    /// given number of poll ticks.
    pub fn run_for(&mut self, polls: u64) {
        self.run_ticks(Some(polls));
    }

    fn run_ticks(&mut self, max_polls: Option<u64>) {
        let (tx, rx) = mpsc::channel();

        let poll_tx = tx.clone();
        let interval = Duration::from_secs(self.config.refresh_interval_secs);
        thread::spawn(move || loop {
            thread::sleep(interval);
            if poll_tx.send(Tick::Poll).is_err() {
                break;
            }
        });

        thread::spawn(move || loop {
            thread::sleep(Duration::from_secs(1));
            if tx.send(Tick::Countdown).is_err() {
                break;
            }
        });

        // Every tick lands here, so all page mutation stays on this
        // thread and polls can never overlap.
        let mut polls = 0u64;
        while let Ok(tick) = rx.recv() {
            match tick {
                Tick::Poll => {
                    self.poll();
                    polls += 1;
                    if max_polls.map_or(false, |max| polls >= max) {
                        break;
                    }
                }
                Tick::Countdown => self.tick_countdown(),
            }
        }
        // Receiver dropped here; the tickers exit on their next send.
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    pub fn badge(&self) -> &Badge {
        &self.badge
    }

    /// Metrics from the most recent layout pass that had boxes to size.
    pub fn metrics(&self) -> Option<&GridMetrics> {
        self.metrics.as_ref()
    }

    /// Per-label shrink percentages from the latest layout pass, flattened
    /// across boxes in document order; `None` for labels that fit.
    pub fn label_scales(&self) -> &[Option<f64>] {
        &self.label_scales
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    fn fetch_board(&self, url: &str) -> Result<String> {
        let mut request = self
            .client
            .get(url)
            .header("User-Agent", self.config.user_agent.clone());
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .map_err(|e| Error::FetchError(format!("GET {} failed: {}", url, e)))?;

        let status = response.status().as_u16();
        if !(200..400).contains(&status) {
            return Err(Error::FetchError(format!(
                "GET {} returned status {}",
                url, status
            )));
        }

        response
            .text()
            .map_err(|e| Error::FetchError(format!("Failed to read response body: {}", e)))
    }

    fn layout(&mut self) {
        if let Some(metrics) = layout::scale_boxes(self.config.viewport, self.page.boxes().len()) {
            self.stylesheet.set(metrics.css());
            self.label_scales = self
                .page
                .boxes()
                .iter()
                .flat_map(|b| b.labels.iter())
                .map(|label| layout::label_scale(metrics.box_width, label))
                .collect();
            self.metrics = Some(metrics);
        } else {
            self.label_scales.clear();
        }
        self.badge.badge(self.page.running_count());
    }
}
