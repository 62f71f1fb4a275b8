use crate::api::{ApiRequest, ApiResponse};
use crate::grid::{compute_grid, MonthGrid};
use crate::models::DayCounts;
use crate::remote::{narrow, needs_refetch, Remote, RemoteEvent};
use crate::scope::{FetchSlot, ScopeToken, Task, TaskOutput};
use crate::session::View;
use tracing::debug;

/// What the year calendar shows: either the whole grid or a single error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarRender {
    Failed(String),
    Months(Vec<MonthGrid>),
}

/// A year of month grids backed by one `/api/calendar/{year}` fetch.
#[derive(Debug)]
pub struct AggregateCalendarView {
    year: i32,
    counts: Remote<DayCounts>,
    slot: FetchSlot,
}

impl AggregateCalendarView {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            counts: Remote::Pending,
            slot: FetchSlot::default(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn counts(&self) -> &Remote<DayCounts> {
        &self.counts
    }

    fn fetch(&mut self) -> Task {
        let token = self.slot.begin();
        self.counts = std::mem::take(&mut self.counts).transition(RemoteEvent::Issued, true);
        Task::request(token, ApiRequest::Calendar { year: self.year })
    }

    /// Starts a new scope when the year actually changes.
    pub fn set_year(&mut self, year: i32) -> Option<Task> {
        if !needs_refetch(&self.year, &year) {
            return None;
        }
        self.year = year;
        Some(self.fetch())
    }

    /// Twelve grids, rendered as unknown until counts arrive.
    pub fn months(&self) -> Vec<MonthGrid> {
        (0..12)
            .map(|month| compute_grid(self.year, month, self.counts.loaded()))
            .collect()
    }

    pub fn render(&self) -> CalendarRender {
        match self.counts.failure() {
            Some(message) => CalendarRender::Failed(message.to_string()),
            None => CalendarRender::Months(self.months()),
        }
    }
}

impl View for AggregateCalendarView {
    fn activate(&mut self) -> Vec<Task> {
        vec![self.fetch()]
    }

    fn deactivate(&mut self) {
        self.slot.cancel();
    }

    fn complete(&mut self, token: &ScopeToken, output: TaskOutput) -> bool {
        let TaskOutput::Response(result) = output else {
            return false;
        };
        let accepted = self.slot.settle(token);
        if !accepted {
            debug!(scope = token.id(), year = self.year, "ignoring stale calendar response");
            return false;
        }
        let result = narrow(result, |response| match response {
            ApiResponse::Calendar(counts) => Ok(counts),
            other => Err(other),
        });
        self.counts =
            std::mem::take(&mut self.counts).transition(RemoteEvent::Resolved(result), accepted);
        true
    }
}
