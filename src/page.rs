//! Page model for the wallboard document.
//!
//! A [`Page`] is the client's rendition of the dashboard HTML: the head
//! `rel` fingerprint, the grid of status boxes, and the countdown display
//! when the error banner is showing. The selectors here are the contract
//! between the client and the markup the board serves.

use chrono::{DateTime, Local};
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;

/// Selector for one status box.
pub const BOX_SELECTOR: &str = "a.outer";
/// Selector for a box whose workflow is currently running.
pub const RUNNING_SELECTOR: &str = "a.outer.running";
/// Selector for the box interior sized by the layout pass.
pub const INNER_SELECTOR: &str = "a.outer div.inner";
/// Selector for the label spans that get shrunk to fit their box.
pub const LABEL_SELECTOR: &str = ".inner > span > span";

const COUNTDOWN_SELECTOR: &str = "#countdown";

/// Workflow status carried on a box's class list.
///
/// The board renders one class per status; anything it has not taught us
/// degrades to `Unknown` rather than being dropped from the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Running,
    NotRun,
    Failed,
    Failing,
    Error,
    OnHold,
    Canceled,
    Unauthorized,
    Unknown,
}

impl Status {
    fn from_class(class: &str) -> Option<Status> {
        match class {
            "success" => Some(Status::Success),
            "running" => Some(Status::Running),
            "not_run" => Some(Status::NotRun),
            "failed" => Some(Status::Failed),
            "failing" => Some(Status::Failing),
            "error" => Some(Status::Error),
            "on_hold" => Some(Status::OnHold),
            "canceled" => Some(Status::Canceled),
            "unauthorized" => Some(Status::Unauthorized),
            "unknown" => Some(Status::Unknown),
            _ => None,
        }
    }
}

/// One status entry in the grid.
#[derive(Debug, Clone, Serialize)]
pub struct StatusBox {
    /// Label lines, outermost span first (project, workflow, branch)
    pub labels: Vec<String>,
    /// Link to the build behind the box
    pub link: Option<String>,
    /// Parsed workflow status
    pub status: Status,
    /// Set when the board flagged the pipeline with a build error
    pub build_error: bool,
}

impl StatusBox {
    pub fn is_running(&self) -> bool {
        self.status == Status::Running
    }

    fn from_element(element: ElementRef) -> StatusBox {
        let mut status = None;
        let mut build_error = false;
        for class in element.value().classes() {
            if class == "outer" {
                continue;
            }
            if class == "errored" || class == "errored-static" {
                build_error = true;
                continue;
            }
            if status.is_none() {
                status = Status::from_class(class);
            }
        }

        let label_sel = Selector::parse(LABEL_SELECTOR).unwrap();
        let labels = element
            .select(&label_sel)
            .map(|span| span.text().collect::<String>().trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        StatusBox {
            labels,
            link: element.value().attr("href").map(|s| s.to_string()),
            status: status.unwrap_or(Status::Unknown),
            build_error,
        }
    }
}

/// The client's rendition of the wallboard document.
#[derive(Debug, Clone, Default)]
pub struct Page {
    rel: Option<String>,
    title: String,
    body_html: String,
    boxes: Vec<StatusBox>,
    countdown: Option<i64>,
}

impl Page {
    /// Parse a fetched document into page state.
    pub fn parse(html: &str) -> Page {
        let document = Html::parse_document(html);

        let head_sel = Selector::parse("head").unwrap();
        let rel = document
            .select(&head_sel)
            .next()
            .and_then(|head| head.value().attr("rel"))
            .map(|s| s.to_string());

        let title_sel = Selector::parse("title").unwrap();
        let title = document
            .select(&title_sel)
            .next()
            .map(|n| n.text().collect::<String>())
            .unwrap_or_default();

        let body_sel = Selector::parse("body").unwrap();
        let body_html = document
            .select(&body_sel)
            .next()
            .map(|b| b.inner_html())
            .unwrap_or_default();

        let box_sel = Selector::parse(BOX_SELECTOR).unwrap();
        let boxes = document
            .select(&box_sel)
            .map(StatusBox::from_element)
            .collect();

        let countdown_sel = Selector::parse(COUNTDOWN_SELECTOR).unwrap();
        let countdown = document
            .select(&countdown_sel)
            .next()
            .and_then(|el| el.text().collect::<String>().trim().parse::<i64>().ok());

        Page {
            rel,
            title,
            body_html,
            boxes,
            countdown,
        }
    }

    /// The head `rel` fingerprint, if the document carried one.
    pub fn rel(&self) -> Option<&str> {
        self.rel.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Current body markup.
    pub fn body_html(&self) -> &str {
        &self.body_html
    }

    pub fn boxes(&self) -> &[StatusBox] {
        &self.boxes
    }

    /// Count of boxes matching `a.outer.running`.
    pub fn running_count(&self) -> usize {
        self.boxes.iter().filter(|b| b.is_running()).count()
    }

    /// The countdown display's current value, when one is on the page.
    pub fn countdown(&self) -> Option<i64> {
        self.countdown
    }

    /// Replace body-derived state from a freshly parsed document, keeping
    /// the existing head (title and fingerprint) in place.
    pub fn patch_body(&mut self, fetched: Page) {
        self.body_html = fetched.body_html;
        self.boxes = fetched.boxes;
        self.countdown = fetched.countdown;
    }

    /// Swap in the error banner: timestamp, countdown seeded with the
    /// refresh interval, and the `rel="error"` sentinel on the head.
    pub fn show_error(&mut self, now: DateTime<Local>, interval_secs: u64) {
        self.body_html = format!(
            "<div class=\"time\">{} (<span id=\"countdown\">{}</span>)</div><h1>ERROR</h1>",
            now.format("%Y-%m-%d %H:%M:%S %z"),
            interval_secs
        );
        self.boxes.clear();
        self.countdown = Some(interval_secs as i64);
        self.rel = Some("error".to_string());
    }

    /// Decrement the countdown display in place. No-op when the page has
    /// no countdown element; the value is never reset or clamped.
    pub fn tick_countdown(&mut self) {
        if let Some(value) = self.countdown {
            let next = value - 1;
            let old_span = format!("<span id=\"countdown\">{}</span>", value);
            let new_span = format!("<span id=\"countdown\">{}</span>", next);
            if self.body_html.contains(&old_span) {
                self.body_html = self.body_html.replacen(&old_span, &new_span, 1);
            }
            self.countdown = Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(rel: &str, body: &str) -> String {
        format!(
            "<html><head rel=\"{}\"><title>Wallboard</title></head><body>{}</body></html>",
            rel, body
        )
    }

    #[test]
    fn parse_extracts_rel_and_boxes() {
        let html = board(
            "v1",
            r#"<a class="outer success" href="https://ci.example.com/1"><div class="inner"><span><span>frontend</span></span></div></a>
               <a class="outer running" href="https://ci.example.com/2"><div class="inner"><span><span>backend</span><span>deploy</span></span></div></a>"#,
        );
        let page = Page::parse(&html);
        assert_eq!(page.rel(), Some("v1"));
        assert_eq!(page.title(), "Wallboard");
        assert_eq!(page.boxes().len(), 2);
        assert_eq!(page.boxes()[0].status, Status::Success);
        assert_eq!(page.boxes()[0].labels, vec!["frontend"]);
        assert_eq!(
            page.boxes()[0].link.as_deref(),
            Some("https://ci.example.com/1")
        );
        assert_eq!(page.boxes()[1].labels, vec!["backend", "deploy"]);
        assert_eq!(page.running_count(), 1);
        assert_eq!(page.countdown(), None);
    }

    #[test]
    fn parse_handles_status_vocabulary() {
        for (class, status) in [
            ("success", Status::Success),
            ("running", Status::Running),
            ("not_run", Status::NotRun),
            ("failed", Status::Failed),
            ("failing", Status::Failing),
            ("on_hold", Status::OnHold),
            ("canceled", Status::Canceled),
            ("unauthorized", Status::Unauthorized),
            ("mystery", Status::Unknown),
        ] {
            let html = board("v1", &format!("<a class=\"outer {}\"></a>", class));
            let page = Page::parse(&html);
            assert_eq!(page.boxes()[0].status, status, "class {}", class);
        }
    }

    #[test]
    fn parse_flags_build_errors() {
        let html = board("v1", "<a class=\"outer failed errored\"></a>");
        let page = Page::parse(&html);
        assert_eq!(page.boxes()[0].status, Status::Failed);
        assert!(page.boxes()[0].build_error);

        let html = board("v1", "<a class=\"outer success errored-static\"></a>");
        let page = Page::parse(&html);
        assert!(page.boxes()[0].build_error);
    }

    #[test]
    fn patch_body_keeps_head() {
        let mut page = Page::parse(&board("v1", "<a class=\"outer success\"></a>"));
        let fetched = Page::parse(&board(
            "v1",
            "<a class=\"outer running\"></a><a class=\"outer running\"></a>",
        ));
        page.patch_body(fetched);
        assert_eq!(page.rel(), Some("v1"));
        assert_eq!(page.boxes().len(), 2);
        assert_eq!(page.running_count(), 2);
    }

    #[test]
    fn error_banner_shape() {
        let mut page = Page::parse(&board("v1", "<a class=\"outer success\"></a>"));
        page.show_error(Local::now(), 30);
        assert_eq!(page.rel(), Some("error"));
        assert!(page.body_html().contains("<h1>ERROR</h1>"));
        assert!(page
            .body_html()
            .contains("<span id=\"countdown\">30</span>"));
        assert!(page.boxes().is_empty());
        assert_eq!(page.countdown(), Some(30));
    }

    #[test]
    fn countdown_ticks_in_place() {
        let mut page = Page::default();
        page.show_error(Local::now(), 3);
        page.tick_countdown();
        page.tick_countdown();
        assert_eq!(page.countdown(), Some(1));
        assert!(page.body_html().contains("<span id=\"countdown\">1</span>"));

        // Never clamped; keeps counting below zero like the display did.
        page.tick_countdown();
        page.tick_countdown();
        assert_eq!(page.countdown(), Some(-1));
    }

    #[test]
    fn countdown_tick_without_display_is_noop() {
        let mut page = Page::parse(&board("v1", "<a class=\"outer success\"></a>"));
        assert_eq!(page.countdown(), None);
        page.tick_countdown();
        assert_eq!(page.countdown(), None);
    }

    #[test]
    fn running_count_matches_selector() {
        let html = board(
            "v1",
            r#"<a class="outer running"></a><a class="outer success"></a><a class="outer running"></a>"#,
        );
        let page = Page::parse(&html);
        let document = Html::parse_document(&html);
        let running_sel = Selector::parse(RUNNING_SELECTOR).unwrap();
        assert_eq!(page.running_count(), document.select(&running_sel).count());
        assert_eq!(page.running_count(), 2);
    }

    #[test]
    fn countdown_parsed_from_fetched_banner() {
        let html = board(
            "error",
            "<div class=\"time\">now (<span id=\"countdown\">12</span>)</div><h1>ERROR</h1>",
        );
        let page = Page::parse(&html);
        assert_eq!(page.countdown(), Some(12));
    }
}
