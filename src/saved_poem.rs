use crate::api::{ApiRequest, ApiResponse};
use crate::models::SavedPoem;
use crate::remote::{narrow, needs_refetch, Remote, RemoteEvent};
use crate::route::extract_hash;
use crate::scope::{FetchSlot, ScopeToken, Task, TaskOutput};
use crate::session::View;
use tracing::debug;

/// A poem previously saved under a permalink hash.
#[derive(Debug)]
pub struct SavedPoemView {
    hash: String,
    poem: Remote<SavedPoem>,
    slot: FetchSlot,
}

impl SavedPoemView {
    /// Accepts a bare hash or a pasted permalink URL.
    pub fn new(hash: &str) -> Self {
        Self {
            hash: extract_hash(hash).to_string(),
            poem: Remote::Pending,
            slot: FetchSlot::default(),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn poem(&self) -> &Remote<SavedPoem> {
        &self.poem
    }

    fn fetch(&mut self) -> Task {
        let token = self.slot.begin();
        self.poem = std::mem::take(&mut self.poem).transition(RemoteEvent::Issued, true);
        Task::request(
            token,
            ApiRequest::SavedPoem {
                hash: self.hash.clone(),
            },
        )
    }

    pub fn set_hash(&mut self, hash: &str) -> Option<Task> {
        let hash = extract_hash(hash);
        if !needs_refetch(&self.hash.as_str(), &hash) {
            return None;
        }
        self.hash = hash.to_string();
        Some(self.fetch())
    }
}

impl View for SavedPoemView {
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
            debug!(scope = token.id(), hash = %self.hash, "ignoring stale saved poem response");
            return false;
        }
        let result = narrow(result, |response| match response {
            ApiResponse::SavedPoem(poem) => Ok(poem),
            other => Err(other),
        });
        self.poem =
            std::mem::take(&mut self.poem).transition(RemoteEvent::Resolved(result), accepted);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::scope::TaskKind;

    fn saved(line: &str) -> TaskOutput {
        TaskOutput::Response(Ok(ApiResponse::SavedPoem(SavedPoem {
            paragraphs: vec![line.to_string()],
        })))
    }

    #[test]
    fn pasted_url_is_reduced_to_hash() {
        let mut view = SavedPoemView::new("https://example.com/rabbit/saved-poem/abc123");
        assert_eq!(view.hash(), "abc123");
        let tasks = view.activate();
        assert_eq!(
            tasks[0].kind,
            TaskKind::Request(ApiRequest::SavedPoem {
                hash: "abc123".to_string()
            })
        );
    }

    #[test]
    fn hash_change_supersedes_fetch() {
        let mut view = SavedPoemView::new("abc123");
        let first = view.activate().remove(0);
        assert!(view.set_hash("/saved-poem/abc123").is_none());
        let second = view.set_hash("def456").expect("refetch");

        assert!(!view.complete(&first.token, saved("old")));
        assert!(view.poem().is_pending());
        assert!(view.complete(&second.token, saved("new")));
        assert_eq!(
            view.poem().loaded().map(|poem| poem.paragraphs.clone()),
            Some(vec!["new".to_string()])
        );
    }

    #[test]
    fn missing_poem_is_a_failure() {
        let mut view = SavedPoemView::new("nope");
        let task = view.activate().remove(0);
        let failure = FetchError::Status {
            status: 404,
            body: String::new(),
        };
        assert!(view.complete(&task.token, TaskOutput::Response(Err(failure))));
        assert_eq!(view.poem().failure(), Some("backend returned http 404"));
    }
}
