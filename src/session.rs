use crate::api::RabbitApi;
use crate::scope::{perform, ScopeToken, Task, TaskOutput};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// A view state machine driven by the scheduler.
pub trait View {
    /// Starts the view's scopes and returns the work they need.
    fn activate(&mut self) -> Vec<Task>;

    /// Cancels every scope the view owns. Must run before any pending continuation.
    fn deactivate(&mut self);

    /// Feeds back the output of a task. Returns whether view state changed.
    fn complete(&mut self, token: &ScopeToken, output: TaskOutput) -> bool;
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub token: ScopeToken,
    pub output: TaskOutput,
}

/// Executes view tasks on tokio and hands back completions of live scopes.
pub struct Session<A> {
    api: Arc<A>,
    tasks: JoinSet<Option<Completion>>,
}

impl<A: RabbitApi + 'static> Session<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn(&mut self, task: Task) {
        let api = Arc::clone(&self.api);
        debug!(scope = task.token.id(), kind = ?task.kind, "spawning task");
        self.tasks.spawn(async move {
            let output = perform(api.as_ref(), &task).await?;
            Some(Completion {
                token: task.token,
                output,
            })
        });
    }

    pub fn spawn_all(&mut self, tasks: impl IntoIterator<Item = Task>) {
        for task in tasks {
            self.spawn(task);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Next completion of a live scope, or `None` once nothing is in flight.
    pub async fn next(&mut self) -> Option<Completion> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(Some(completion)) => return Some(completion),
                Ok(None) => continue,
                Err(err) => warn!(%err, "view task did not finish"),
            }
        }
        None
    }

    /// Feeds completions into `view` until nothing is in flight.
    pub async fn run_until_idle<V: View + ?Sized>(&mut self, view: &mut V) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.next().await {
            if view.complete(&completion.token, completion.output) {
                applied += 1;
            }
        }
        applied
    }

    pub async fn drive<V: View + ?Sized>(&mut self, view: &mut V) -> usize {
        self.spawn_all(view.activate());
        self.run_until_idle(view).await
    }
}
