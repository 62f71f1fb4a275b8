use crate::api::{ApiRequest, ApiResponse};
use crate::errors::FetchError;
use crate::models::{Poem, PoemScope};
use crate::permalink::{Clipboard, PermalinkControl};
use crate::remote::narrow;
use crate::scope::{FetchSlot, ScopeToken, Task, TaskOutput};
use crate::session::View;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardState {
    Uninitialized,
    /// Keeps the last poem on screen until the fetch resolves.
    Loading { previous: Option<Poem> },
    /// `None` means the backend has no poem for this scope.
    Loaded(Option<Poem>),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    Regenerate,
    Resolved(Result<Option<Poem>, FetchError>),
}

impl CardState {
    /// Pure transition; events from dead scopes are ignored.
    pub fn transition(self, event: CardEvent, accepted: bool) -> Self {
        if !accepted {
            return self;
        }
        match event {
            CardEvent::Regenerate => CardState::Loading {
                previous: self.displayed().cloned(),
            },
            CardEvent::Resolved(Ok(poem)) => CardState::Loaded(poem),
            CardEvent::Resolved(Err(err)) => CardState::Failed(err.to_string()),
        }
    }

    pub fn poem(&self) -> Option<&Poem> {
        match self {
            CardState::Loaded(Some(poem)) => Some(poem),
            _ => None,
        }
    }

    /// The poem on screen, including the one kept while reloading.
    pub fn displayed(&self) -> Option<&Poem> {
        match self {
            CardState::Loaded(Some(poem)) => Some(poem),
            CardState::Loading { previous } => previous.as_ref(),
            _ => None,
        }
    }
}

/// Poem of the day, month or year with its regenerate action and permalink control.
#[derive(Debug)]
pub struct ContentCard {
    scope: PoemScope,
    state: CardState,
    slot: FetchSlot,
    permalink: PermalinkControl,
}

impl ContentCard {
    pub fn new(scope: PoemScope, origin: impl Into<String>) -> Self {
        Self {
            scope,
            state: CardState::Uninitialized,
            slot: FetchSlot::default(),
            permalink: PermalinkControl::new(origin),
        }
    }

    pub fn scope(&self) -> PoemScope {
        self.scope
    }

    pub fn title(&self) -> &'static str {
        self.scope.title()
    }

    pub fn state(&self) -> &CardState {
        &self.state
    }

    /// Gates the regenerate control.
    pub fn is_loading(&self) -> bool {
        self.slot.is_busy()
    }

    pub fn permalink(&self) -> &PermalinkControl {
        &self.permalink
    }

    /// Fetches a fresh poem that replaces the shown one once it resolves.
    /// A no-op while loading.
    pub fn regenerate(&mut self) -> Option<Task> {
        if self.is_loading() {
            debug!(scope = %self.scope, "regenerate ignored while loading");
            return None;
        }
        let token = self.slot.begin();
        self.state = std::mem::replace(&mut self.state, CardState::Uninitialized)
            .transition(CardEvent::Regenerate, true);
        Some(Task::request(token, ApiRequest::Poem(self.scope)))
    }

    pub fn save_permalink(&mut self) -> Option<Task> {
        self.permalink.save()
    }

    pub fn copy_permalink(&mut self, clipboard: &mut dyn Clipboard) -> Option<Task> {
        self.permalink.copy(clipboard)
    }
}

impl View for ContentCard {
    fn activate(&mut self) -> Vec<Task> {
        self.regenerate().into_iter().collect()
    }

    fn deactivate(&mut self) {
        self.slot.cancel();
        self.permalink.teardown();
    }

    fn complete(&mut self, token: &ScopeToken, output: TaskOutput) -> bool {
        if self.permalink.owns(token) {
            return self.permalink.complete(token, output);
        }
        let TaskOutput::Response(result) = output else {
            return false;
        };
        let accepted = self.slot.settle(token);
        if !accepted {
            debug!(scope = %self.scope, token = token.id(), "ignoring stale poem response");
            return false;
        }
        let result = narrow(result, |response| match response {
            ApiResponse::Poem(poem) => Ok(poem),
            other => Err(other),
        });
        self.state = std::mem::replace(&mut self.state, CardState::Uninitialized)
            .transition(CardEvent::Resolved(result), accepted);
        self.permalink.observe(self.state.poem());
        true
    }
}
