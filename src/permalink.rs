use crate::api::{ApiRequest, ApiResponse};
use crate::errors::ClipboardError;
use crate::models::Poem;
use crate::remote::narrow;
use crate::route::{extract_hash, saved_poem_url};
use crate::scope::{FetchSlot, ScopeToken, Task, TaskOutput};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long the "copied" acknowledgement stays up.
pub const COPY_ACK_DURATION: Duration = Duration::from_secs(1);

/// System clipboard, supplied by the host.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermalinkRecord {
    pub permalink: String,
    pub source_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermalinkMode<'a> {
    Save { enabled: bool, saving: bool },
    Display { hash: &'a str, copied: bool },
}

/// Save-then-share control for whatever content the parent card shows.
#[derive(Debug)]
pub struct PermalinkControl {
    origin: String,
    content: Option<Poem>,
    saved: Option<PermalinkRecord>,
    save_slot: FetchSlot,
    saving_hash: Option<String>,
    ack_slot: FetchSlot,
    last_error: Option<String>,
}

impl PermalinkControl {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            content: None,
            saved: None,
            save_slot: FetchSlot::default(),
            saving_hash: None,
            ack_slot: FetchSlot::default(),
            last_error: None,
        }
    }

    fn content_hash(&self) -> Option<&str> {
        self.content.as_ref().map(|poem| poem.hash.as_str())
    }

    /// Tracks the parent's displayed content. A different hash invalidates the
    /// saved permalink and any save still in flight for the old content.
    pub fn observe(&mut self, content: Option<&Poem>) {
        let next_hash = content.map(|poem| poem.hash.as_str());
        if self.content_hash() == next_hash {
            return;
        }

        if self.saved.as_ref().map(|record| record.source_hash.as_str()) != next_hash {
            if self.saved.take().is_some() {
                debug!("content changed; permalink cleared");
            }
            self.ack_slot.cancel();
        }
        if self.saving_hash.as_deref() != next_hash {
            self.save_slot.cancel();
            self.saving_hash = None;
        }
        self.last_error = None;
        self.content = content.cloned();
    }

    pub fn record(&self) -> Option<&PermalinkRecord> {
        self.saved.as_ref()
    }

    pub fn is_saving(&self) -> bool {
        self.save_slot.is_busy()
    }

    pub fn is_acknowledging(&self) -> bool {
        self.ack_slot.is_busy()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn can_save(&self) -> bool {
        self.content.is_some() && self.saved.is_none() && !self.is_saving()
    }

    pub fn mode(&self) -> PermalinkMode<'_> {
        match &self.saved {
            Some(record) => PermalinkMode::Display {
                hash: extract_hash(&record.permalink),
                copied: self.is_acknowledging(),
            },
            None => PermalinkMode::Save {
                enabled: self.can_save(),
                saving: self.is_saving(),
            },
        }
    }

    /// Persists the displayed content. `None` while disabled.
    pub fn save(&mut self) -> Option<Task> {
        if !self.can_save() {
            return None;
        }
        let poem = self.content.clone()?;
        let token = self.save_slot.begin();
        self.saving_hash = Some(poem.hash.clone());
        self.last_error = None;
        Some(Task::request(token, ApiRequest::SavePoem(poem)))
    }

    pub fn shareable_url(&self) -> Option<String> {
        self.saved
            .as_ref()
            .map(|record| saved_poem_url(&self.origin, extract_hash(&record.permalink)))
    }

    /// Copies the shareable URL and starts the acknowledgement timer.
    /// A no-op while the acknowledgement is still showing.
    pub fn copy(&mut self, clipboard: &mut dyn Clipboard) -> Option<Task> {
        if self.is_acknowledging() {
            return None;
        }
        let url = self.shareable_url()?;
        if let Err(err) = clipboard.write_text(&url) {
            warn!(%err, "could not copy permalink");
            return None;
        }
        let token = self.ack_slot.begin();
        Some(Task::delay(token, COPY_ACK_DURATION))
    }

    pub fn owns(&self, token: &ScopeToken) -> bool {
        self.save_slot.accepts(token) || self.ack_slot.accepts(token)
    }

    pub fn complete(&mut self, token: &ScopeToken, output: TaskOutput) -> bool {
        match output {
            TaskOutput::Elapsed => self.ack_slot.settle(token),
            TaskOutput::Response(result) => {
                if !self.save_slot.settle(token) {
                    return false;
                }
                let source_hash = self.saving_hash.take().unwrap_or_default();
                let result = narrow(result, |response| match response {
                    ApiResponse::Permalink(permalink) => Ok(permalink),
                    other => Err(other),
                });
                match result {
                    Ok(response) => {
                        info!(hash = %source_hash, permalink = %response.permalink, "poem saved");
                        self.saved = Some(PermalinkRecord {
                            permalink: response.permalink,
                            source_hash,
                        });
                    }
                    Err(err) => {
                        warn!(%err, hash = %source_hash, "saving poem failed");
                        self.last_error = Some(err.to_string());
                    }
                }
                true
            }
        }
    }

    /// Cancels the save and the acknowledgement timer.
    pub fn teardown(&mut self) {
        self.save_slot.cancel();
        self.saving_hash = None;
        self.ack_slot.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::models::PermalinkResponse;
    use crate::scope::TaskKind;

    #[derive(Debug, Default)]
    struct RecordingClipboard {
        writes: Vec<String>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
            if self.fail {
                return Err(ClipboardError("denied".to_string()));
            }
            self.writes.push(text.to_string());
            Ok(())
        }
    }

    fn poem(hash: &str) -> Poem {
        Poem {
            date_generated: "2021-03-15T12:00:00".to_string(),
            hash: hash.to_string(),
            paragraphs: vec!["Down the rabbit hole".to_string()],
        }
    }

    fn saved_control(hash: &str) -> PermalinkControl {
        let mut control = PermalinkControl::new("https://example.com");
        control.observe(Some(&poem(hash)));
        let task = control.save().expect("save task");
        assert!(control.complete(
            &task.token,
            TaskOutput::Response(Ok(ApiResponse::Permalink(PermalinkResponse {
                permalink: format!("/saved_poem/{hash}"),
            })))
        ));
        control
    }

    #[test]
    fn save_disabled_without_content() {
        let mut control = PermalinkControl::new("https://example.com");
        assert_eq!(control.mode(), PermalinkMode::Save { enabled: false, saving: false });
        assert!(control.save().is_none());
    }

    #[test]
    fn save_sends_content_and_blocks_reentry() {
        let mut control = PermalinkControl::new("https://example.com");
        control.observe(Some(&poem("abc123")));
        let task = control.save().expect("save task");
        assert_eq!(task.kind, TaskKind::Request(ApiRequest::SavePoem(poem("abc123"))));
        assert_eq!(control.mode(), PermalinkMode::Save { enabled: false, saving: true });
        assert!(control.save().is_none());
    }

    #[test]
    fn saved_permalink_switches_to_display() {
        let control = saved_control("abc123");
        assert_eq!(control.mode(), PermalinkMode::Display { hash: "abc123", copied: false });
        assert_eq!(
            control.shareable_url().as_deref(),
            Some("https://example.com/rabbit/saved-poem/abc123")
        );
        assert_eq!(control.record().map(|record| record.source_hash.as_str()), Some("abc123"));
    }

    #[test]
    fn content_change_clears_permalink() {
        let mut control = saved_control("abc123");
        control.observe(Some(&poem("abc123")));
        assert!(control.record().is_some());

        control.observe(Some(&poem("def456")));
        assert!(control.record().is_none());
        assert_eq!(control.mode(), PermalinkMode::Save { enabled: true, saving: false });
    }

    #[test]
    fn content_change_discards_inflight_save() {
        let mut control = PermalinkControl::new("https://example.com");
        control.observe(Some(&poem("abc123")));
        let task = control.save().expect("save task");
        control.observe(Some(&poem("def456")));

        assert!(!task.token.is_live());
        assert!(!control.complete(
            &task.token,
            TaskOutput::Response(Ok(ApiResponse::Permalink(PermalinkResponse {
                permalink: "abc123".to_string(),
            })))
        ));
        assert!(control.record().is_none());
        assert!(control.can_save());
    }

    #[test]
    fn failed_save_returns_to_save_affordance() {
        let mut control = PermalinkControl::new("https://example.com");
        control.observe(Some(&poem("abc123")));
        let task = control.save().expect("save task");
        assert!(control.complete(
            &task.token,
            TaskOutput::Response(Err(FetchError::Network("offline".to_string())))
        ));
        assert_eq!(control.last_error(), Some("network error: offline"));
        assert_eq!(control.mode(), PermalinkMode::Save { enabled: true, saving: false });
    }

    #[test]
    fn copy_shows_acknowledgement_until_timer_fires() {
        let mut control = saved_control("abc123");
        let mut clipboard = RecordingClipboard::default();

        let timer = control.copy(&mut clipboard).expect("timer");
        assert_eq!(timer.kind, TaskKind::Delay(COPY_ACK_DURATION));
        assert_eq!(clipboard.writes, vec!["https://example.com/rabbit/saved-poem/abc123"]);
        assert_eq!(control.mode(), PermalinkMode::Display { hash: "abc123", copied: true });

        assert!(control.copy(&mut clipboard).is_none());
        assert_eq!(clipboard.writes.len(), 1);

        assert!(control.complete(&timer.token, TaskOutput::Elapsed));
        assert_eq!(control.mode(), PermalinkMode::Display { hash: "abc123", copied: false });
        assert!(control.copy(&mut clipboard).is_some());
    }

    #[test]
    fn teardown_cancels_acknowledgement_timer() {
        let mut control = saved_control("abc123");
        let mut clipboard = RecordingClipboard::default();
        let timer = control.copy(&mut clipboard).expect("timer");

        control.teardown();
        assert!(!timer.token.is_live());
        assert!(!control.complete(&timer.token, TaskOutput::Elapsed));
    }

    #[test]
    fn clipboard_failure_skips_acknowledgement() {
        let mut control = saved_control("abc123");
        let mut clipboard = RecordingClipboard {
            fail: true,
            ..RecordingClipboard::default()
        };
        assert!(control.copy(&mut clipboard).is_none());
        assert!(!control.is_acknowledging());
    }
}
