use crate::api::{ApiRequest, ApiResponse, ArticleRange};
use crate::grid::{compute_grid, MonthGrid};
use crate::models::{Article, DayCounts};
use crate::remote::{narrow, needs_refetch, Remote, RemoteEvent};
use crate::route::DayParams;
use crate::scope::{FetchSlot, ScopeToken, Task, TaskOutput};
use crate::session::View;
use tracing::{debug, warn};

/// Render state of the article list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleList<'a> {
    Loading,
    Empty,
    Failed(&'a str),
    Articles(&'a [Article]),
}

/// One day's articles under the month grid the day belongs to.
///
/// The embedded calendar is fetched on activation and again when an unpinned
/// view moves to another year. Its failures are only logged; the grid then
/// stays in its unknown state. The article list is refetched whenever the day,
/// month or year changes.
#[derive(Debug)]
pub struct DayDetailView {
    params: DayParams,
    calendar_year: Option<i32>,
    calendar: Option<DayCounts>,
    /// Year the loaded or requested counts belong to.
    calendar_for: i32,
    calendar_slot: FetchSlot,
    articles: Remote<Vec<Article>>,
    article_slot: FetchSlot,
    expanded: Option<String>,
}

impl DayDetailView {
    /// `calendar_year` pins the embedded calendar to a fixed year; by default
    /// it follows the year of the day shown.
    pub fn new(params: DayParams, calendar_year: Option<i32>) -> Self {
        Self {
            params,
            calendar_year,
            calendar: None,
            calendar_for: calendar_year.unwrap_or(params.year),
            calendar_slot: FetchSlot::default(),
            articles: Remote::Pending,
            article_slot: FetchSlot::default(),
            expanded: None,
        }
    }

    pub fn params(&self) -> DayParams {
        self.params
    }

    pub fn calendar(&self) -> Option<&DayCounts> {
        self.calendar.as_ref()
    }

    /// Counts from another year than the one shown are treated as unknown.
    pub fn month_grid(&self) -> MonthGrid {
        let counts = self
            .calendar
            .as_ref()
            .filter(|_| self.calendar_for == self.params.year);
        compute_grid(self.params.year, self.params.month, counts)
    }

    fn fetch_calendar(&mut self) -> Task {
        let token = self.calendar_slot.begin();
        let year = self.calendar_year.unwrap_or(self.params.year);
        self.calendar_for = year;
        Task::request(token, ApiRequest::Calendar { year })
    }

    fn fetch_articles(&mut self) -> Option<Task> {
        let Some(date) = self.params.resolve() else {
            self.article_slot.cancel();
            let message = format!("{} is not a valid date", self.params.label());
            self.articles = Remote::Failed(message);
            return None;
        };
        let token = self.article_slot.begin();
        self.articles = std::mem::take(&mut self.articles).transition(RemoteEvent::Issued, true);
        Some(Task::request(token, ApiRequest::Articles(ArticleRange::for_date(date))))
    }

    /// Supersedes the article fetch when the day, month or year differs, and
    /// the calendar fetch when an unpinned view changes year.
    pub fn set_params(&mut self, params: DayParams) -> Vec<Task> {
        if !needs_refetch(&self.params, &params) {
            return Vec::new();
        }
        let year_changed = self.params.year != params.year;
        self.params = params;
        self.expanded = None;

        let mut tasks = Vec::new();
        if year_changed && self.calendar_year.is_none() {
            self.calendar = None;
            tasks.push(self.fetch_calendar());
        }
        tasks.extend(self.fetch_articles());
        tasks
    }

    pub fn article_list(&self) -> ArticleList<'_> {
        match &self.articles {
            Remote::Pending => ArticleList::Loading,
            Remote::Failed(message) => ArticleList::Failed(message),
            Remote::Loaded(articles) if articles.is_empty() => ArticleList::Empty,
            Remote::Loaded(articles) => ArticleList::Articles(articles),
        }
    }

    pub fn expanded(&self) -> Option<&str> {
        self.expanded.as_deref()
    }

    pub fn is_expanded(&self, url: &str) -> bool {
        self.expanded.as_deref() == Some(url)
    }

    /// Expands an article body, collapsing any other; toggling the open one closes it.
    pub fn toggle_article(&mut self, url: &str) {
        let known = self
            .articles
            .loaded()
            .is_some_and(|articles| articles.iter().any(|article| article.url == url));
        if !known {
            return;
        }
        self.expanded = if self.is_expanded(url) { None } else { Some(url.to_string()) };
    }

    fn complete_calendar(&mut self, result: Result<ApiResponse, crate::errors::FetchError>) {
        let result = narrow(result, |response| match response {
            ApiResponse::Calendar(counts) => Ok(counts),
            other => Err(other),
        });
        match result {
            Ok(counts) => self.calendar = Some(counts),
            Err(err) => {
                warn!(%err, date = %self.params.label(), "calendar unavailable for day view")
            }
        }
    }
}

impl View for DayDetailView {
    fn activate(&mut self) -> Vec<Task> {
        let mut tasks = vec![self.fetch_calendar()];
        tasks.extend(self.fetch_articles());
        tasks
    }

    fn deactivate(&mut self) {
        self.calendar_slot.cancel();
        self.article_slot.cancel();
    }

    fn complete(&mut self, token: &ScopeToken, output: TaskOutput) -> bool {
        let TaskOutput::Response(result) = output else {
            return false;
        };
        if self.calendar_slot.settle(token) {
            self.complete_calendar(result);
            return true;
        }
        let accepted = self.article_slot.settle(token);
        if !accepted {
            debug!(
                scope = token.id(),
                date = %self.params.label(),
                "ignoring stale day view response"
            );
            return false;
        }
        let result = narrow(result, |response| match response {
            ApiResponse::Articles(articles) => Ok(articles),
            other => Err(other),
        });
        self.articles =
            std::mem::take(&mut self.articles).transition(RemoteEvent::Resolved(result), accepted);
        true
    }
}
