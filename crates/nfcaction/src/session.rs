//! The read/write session driven by tag discoveries.
//!
//! A [`Session`] is either in read mode, where a presented tag's action is
//! decoded and dispatched, or in write mode, where the current
//! [`ActionForm`] is written to the presented tag.

use tracing::{debug, info};

use crate::action::ActionForm;
use crate::config::{ActionConfig, Config};
use crate::dispatch::{ActionDispatcher, DispatchReport, Launcher};
use crate::ndef::NdefMessage;
use crate::reader::{self, ReadError};
use crate::tag::{self, NdefTag, WriteResult};

const READ_PROMPT: &str = "Hold an NFC tag near";
const WRITE_PROMPT: &str = "Hold a tag near to write...";

/// How a tag was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryKind {
    /// The tag's NDEF messages were read during discovery.
    NdefDiscovered,
    /// Only the tag itself was discovered.
    TagDiscovered,
}

/// The tag carried by a discovery.
#[derive(Debug)]
pub enum PresentedTag<'a> {
    /// No tag came with the discovery.
    Missing,
    /// A tag without NDEF support.
    NotNdef,
    /// An NDEF capable tag.
    Ndef(&'a mut dyn NdefTag),
}

impl<'a> PresentedTag<'a> {
    fn into_ndef(self) -> Option<Option<&'a mut dyn NdefTag>> {
        match self {
            Self::Missing => None,
            Self::NotNdef => Some(None),
            Self::Ndef(tag) => Some(Some(tag)),
        }
    }
}

/// A tag discovery delivered to the session.
#[derive(Debug)]
pub struct TagIntent<'a> {
    /// How the tag was discovered.
    pub kind: DiscoveryKind,
    /// Messages read during discovery.
    pub messages: Vec<NdefMessage>,
    /// The tag itself.
    pub tag: PresentedTag<'a>,
}

impl<'a> TagIntent<'a> {
    /// A plain tag discovery.
    #[must_use]
    pub fn tag(tag: PresentedTag<'a>) -> Self {
        Self {
            kind: DiscoveryKind::TagDiscovered,
            messages: Vec::new(),
            tag,
        }
    }

    /// A discovery that already carries the tag's messages.
    #[must_use]
    pub fn ndef(messages: Vec<NdefMessage>, tag: PresentedTag<'a>) -> Self {
        Self {
            kind: DiscoveryKind::NdefDiscovered,
            messages,
            tag,
        }
    }
}

/// What a discovery led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The form was written to the tag.
    Written(WriteResult),
    /// The tag's text was dispatched.
    Dispatched(DispatchReport),
}

/// Result of handling one discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Status line after the discovery.
    pub status: String,
    /// Transient messages for the user.
    pub notices: Vec<String>,
    /// What happened, `None` when nothing reached a tag or a handler.
    pub outcome: Option<SessionOutcome>,
}

/// A read/write session.
#[derive(Debug)]
pub struct Session<L> {
    dispatcher: ActionDispatcher<L>,
    rules: ActionConfig,
    language: String,
    form: ActionForm,
    write_mode: bool,
    status: String,
}

impl<L: Launcher> Session<L> {
    /// Start a session in read mode.
    #[must_use]
    pub fn new(dispatcher: ActionDispatcher<L>, config: &Config) -> Self {
        Self {
            dispatcher,
            rules: config.action.clone(),
            language: config.tag.language.clone(),
            form: ActionForm::default(),
            write_mode: false,
            status: READ_PROMPT.to_string(),
        }
    }

    /// Current status line.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Whether presented tags are written rather than read.
    #[must_use]
    pub fn is_write_mode(&self) -> bool {
        self.write_mode
    }

    /// Switch between read and write mode, returning the new status line.
    pub fn toggle_write_mode(&mut self) -> &str {
        self.write_mode = !self.write_mode;
        self.status = if self.write_mode {
            WRITE_PROMPT
        } else {
            READ_PROMPT
        }
        .to_string();
        debug!(write_mode = self.write_mode, "Session mode changed");
        &self.status
    }

    /// The form written in write mode.
    #[must_use]
    pub fn form(&self) -> &ActionForm {
        &self.form
    }

    /// Replace the form written in write mode.
    pub fn set_form(&mut self, form: ActionForm) {
        self.form = form;
    }

    /// The dispatcher used in read mode.
    #[must_use]
    pub fn dispatcher(&self) -> &ActionDispatcher<L> {
        &self.dispatcher
    }

    /// Handle a tag discovery.
    pub async fn on_new_intent(&mut self, intent: TagIntent<'_>) -> SessionReport {
        let mut notices = Vec::new();
        let outcome = if self.write_mode {
            self.write(intent, &mut notices)
        } else {
            self.read(intent, &mut notices).await
        };

        SessionReport {
            status: self.status.clone(),
            notices,
            outcome,
        }
    }

    fn write(&self, intent: TagIntent<'_>, notices: &mut Vec<String>) -> Option<SessionOutcome> {
        let target = intent.tag.into_ndef()?;

        let json = match self.form.to_json(&self.rules) {
            Ok(json) => json,
            Err(e) => {
                notices.push(e.to_string());
                notices.push("JSON generation cancelled.".to_string());
                return None;
            }
        };

        let result = tag::write(target, &json, &self.language);
        info!(result = ?result, "Write attempt finished");
        notices.push(result.message().to_string());
        Some(SessionOutcome::Written(result))
    }

    async fn read(
        &mut self,
        intent: TagIntent<'_>,
        notices: &mut Vec<String>,
    ) -> Option<SessionOutcome> {
        let message = match intent.kind {
            DiscoveryKind::NdefDiscovered => {
                let Some(message) = intent.messages.into_iter().next() else {
                    self.status = "No NDEF message found in the intent.".to_string();
                    return None;
                };
                message
            }
            DiscoveryKind::TagDiscovered => {
                let Some(tag) = intent.tag.into_ndef() else {
                    self.status = "Tag not supported or not detected.".to_string();
                    return None;
                };
                match reader::read_tag(tag) {
                    Ok(message) => message,
                    Err(e) => {
                        self.fail(&e, notices);
                        return None;
                    }
                }
            }
        };

        let text = match reader::parse_ndef_message(&message) {
            Ok(payload) => payload.text,
            Err(e) => {
                self.fail(&e, notices);
                return None;
            }
        };

        self.status.clone_from(&text);
        let report = self.dispatcher.execute(&text).await;
        notices.extend(report.outcome.message());
        Some(SessionOutcome::Dispatched(report))
    }

    fn fail(&mut self, error: &ReadError, notices: &mut Vec<String>) {
        debug!(error = %error, "Tag read did not yield text");
        self.status = error.to_string();
        if let Some(detail) = error.detail() {
            notices.push(format!("Error: {detail}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchOptions, Intent};
    use crate::launcher::RecordingLauncher;
    use crate::ndef::{NdefRecord, TextPayload};
    use crate::tag::testing::MemoryTag;

    const TIMER_JSON: &str = r#"{"action":"set_timer","duration":90,"message":"Eggs"}"#;

    fn session() -> Session<RecordingLauncher> {
        let dispatcher = ActionDispatcher::new(RecordingLauncher::new(), DispatchOptions::default());
        Session::new(dispatcher, &Config::default())
    }

    fn text_message(text: &str) -> NdefMessage {
        NdefMessage::new(vec![NdefRecord::text("en", text).unwrap()]).unwrap()
    }

    #[test]
    fn test_toggle_write_mode() {
        let mut session = session();
        assert_eq!(session.status(), "Hold an NFC tag near");
        assert_eq!(session.toggle_write_mode(), "Hold a tag near to write...");
        assert!(session.is_write_mode());
        assert_eq!(session.toggle_write_mode(), "Hold an NFC tag near");
        assert!(!session.is_write_mode());
    }

    #[tokio::test]
    async fn test_ndef_discovered_dispatches_first_message() {
        let mut session = session();
        let intent = TagIntent::ndef(
            vec![text_message(TIMER_JSON), text_message("ignored")],
            PresentedTag::Missing,
        );

        let report = session.on_new_intent(intent).await;
        assert_eq!(report.status, TIMER_JSON);
        assert_eq!(report.notices, vec!["Timer 'Eggs' started for 90s"]);
        assert!(matches!(report.outcome, Some(SessionOutcome::Dispatched(_))));
        assert_eq!(
            session.dispatcher().launcher().started(),
            vec![Intent::SetTimer {
                length_secs: 90,
                message: "Eggs".to_string(),
                skip_ui: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_ndef_discovered_without_messages() {
        let mut session = session();
        let report = session
            .on_new_intent(TagIntent::ndef(Vec::new(), PresentedTag::Missing))
            .await;
        assert_eq!(report.status, "No NDEF message found in the intent.");
        assert!(report.outcome.is_none());
    }

    #[tokio::test]
    async fn test_tag_discovered_reads_tag() {
        let mut session = session();
        let mut tag = MemoryTag::with_message(text_message(TIMER_JSON));
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::Ndef(&mut tag)))
            .await;
        assert_eq!(report.status, TIMER_JSON);
        assert_eq!(tag.closes, 1);
    }

    #[tokio::test]
    async fn test_tag_discovered_without_tag() {
        let mut session = session();
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::Missing))
            .await;
        assert_eq!(report.status, "Tag not supported or not detected.");
    }

    #[tokio::test]
    async fn test_tag_discovered_not_ndef() {
        let mut session = session();
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::NotNdef))
            .await;
        assert_eq!(report.status, "This tag does not support NDEF.");
    }

    #[tokio::test]
    async fn test_tag_discovered_blank_tag() {
        let mut session = session();
        let mut tag = MemoryTag::blank(137);
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::Ndef(&mut tag)))
            .await;
        assert_eq!(report.status, "Tag is NDEF formatted but the message is empty.");
    }

    #[tokio::test]
    async fn test_tag_discovered_io_failure() {
        let mut session = session();
        let mut tag = MemoryTag {
            fail_io: true,
            ..MemoryTag::blank(137)
        };
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::Ndef(&mut tag)))
            .await;
        assert_eq!(report.status, "Reading the tag failed.");
        assert_eq!(report.notices.len(), 1);
        assert!(report.notices[0].starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_plain_text_tag_is_not_json() {
        let mut session = session();
        let report = session
            .on_new_intent(TagIntent::ndef(
                vec![text_message("hello")],
                PresentedTag::Missing,
            ))
            .await;
        assert_eq!(report.status, "hello");
        assert_eq!(report.notices, vec!["Non-JSON content detected"]);
    }

    #[tokio::test]
    async fn test_write_mode_writes_form() {
        let mut session = session();
        session.toggle_write_mode();
        session.set_form(ActionForm::timer("45", "Pasta"));

        let mut tag = MemoryTag::blank(137);
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::Ndef(&mut tag)))
            .await;

        assert_eq!(
            report.outcome,
            Some(SessionOutcome::Written(WriteResult::Success))
        );
        assert_eq!(report.notices, vec!["Tag written successfully!"]);
        assert_eq!(report.status, "Hold a tag near to write...");

        let written = tag.message.unwrap();
        let text = TextPayload::decode(written.first().payload()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text.text).unwrap();
        assert_eq!(json["action"], "set_timer");
        assert_eq!(json["duration"], 45);
        assert_eq!(json["message"], "Pasta");
    }

    #[tokio::test]
    async fn test_write_mode_invalid_form() {
        let mut session = session();
        session.toggle_write_mode();
        session.set_form(ActionForm::timer("", "Pasta"));

        let mut tag = MemoryTag::blank(137);
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::Ndef(&mut tag)))
            .await;

        assert!(report.outcome.is_none());
        assert_eq!(
            report.notices,
            vec!["Duration cannot be empty", "JSON generation cancelled."]
        );
        assert!(tag.message.is_none());
        assert_eq!(tag.closes, 0);
    }

    #[tokio::test]
    async fn test_write_mode_not_ndef_tag() {
        let mut session = session();
        session.toggle_write_mode();
        session.set_form(ActionForm::open_url("https://example.com"));

        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::NotNdef))
            .await;
        assert_eq!(
            report.outcome,
            Some(SessionOutcome::Written(WriteResult::Unsupported))
        );
    }

    #[tokio::test]
    async fn test_write_mode_without_tag_does_nothing() {
        let mut session = session();
        session.toggle_write_mode();
        let report = session
            .on_new_intent(TagIntent::tag(PresentedTag::Missing))
            .await;
        assert!(report.outcome.is_none());
        assert!(report.notices.is_empty());
    }
}
