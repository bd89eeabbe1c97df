//! Batch deletion of historical messages.
//!
//! [`purge`] walks a chat's history newest-first and deletes the messages
//! selected by a [`PurgeRequest`]. The walk is a single pass with several
//! interacting stop conditions:
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | scan cap | stop once `max(scan_cap, count)` messages were examined (unless `-full`) |
//! | count | stop once `count` messages were deleted |
//! | `before` | stop after the first message older than the boundary |
//! | `after` | history starts at messages older than this instant |
//!
//! Offsets are spent only on messages that would otherwise be deleted, so
//! `offset = 2` keeps the two newest matches and deletes the ones after them.
//!
//! With `hard_limit` disabled and no `before` boundary, the walk only ends when
//! `count` deletions happened or the history runs out; asking for an
//! unreachable count over a huge chat is a caller error.
//!
//! # Example
//!
//! ```rust
//! use chatmod::client::MemoryChatClient;
//! use chatmod::core::{PurgeRequest, purge};
//! use chatmod::message::{ChatId, Message, MessageId, User, UserId};
//! use chrono::{Duration, Utc};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> chatmod::Result<()> {
//! let client = MemoryChatClient::new(User::new(1));
//! let now = Utc::now();
//! for i in 0..10 {
//!     client.push_message(
//!         Message::new(MessageId(i), ChatId(-5), now - Duration::minutes(10 - i))
//!             .with_sender(UserId(2)),
//!     );
//! }
//!
//! let request = PurgeRequest::new(ChatId(-5)).with_user(UserId(2)).with_count(3);
//! let report = purge(&client, &request).await?;
//! assert_eq!(report.deleted, vec![MessageId(9), MessageId(8), MessageId(7)]);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use regex::Regex;
use tracing::{debug, warn};

use crate::client::{ChatClient, HistoryOptions};
use crate::error::Result;
use crate::message::{ChatId, Message, MessageId, UserId};

/// Default minimum number of messages a bounded purge examines.
pub const DEFAULT_SCAN_CAP: usize = 100;

/// What to delete, and when to stop looking.
#[derive(Debug, Clone)]
pub struct PurgeRequest {
    /// Chat whose history is scanned.
    pub chat: ChatId,

    /// Sender user ids or sender channel ids whose messages are candidates.
    pub targets: BTreeSet<i64>,

    /// Treat every message as a candidate, ignoring `targets`.
    pub delete_all: bool,

    /// Only candidates whose text matches this pattern are deleted.
    pub keyword: Option<Regex>,

    /// Matching messages to skip before deleting.
    pub offset: usize,

    /// Stop after the first message older than this instant.
    pub before: Option<DateTime<Utc>>,

    /// Only scan messages older than this instant.
    pub after: Option<DateTime<Utc>>,

    /// Bound the scan to `max(scan_cap, count)` messages.
    pub hard_limit: bool,

    /// Minimum scan length when `hard_limit` is set.
    pub scan_cap: usize,

    /// Deletions after which the purge stops.
    pub count: usize,

    /// The command message that triggered the purge; never deleted.
    pub trigger: Option<MessageId>,
}

impl PurgeRequest {
    /// Creates a request deleting one message, with no targets yet.
    pub fn new(chat: ChatId) -> Self {
        Self {
            chat,
            targets: BTreeSet::new(),
            delete_all: false,
            keyword: None,
            offset: 0,
            before: None,
            after: None,
            hard_limit: true,
            scan_cap: DEFAULT_SCAN_CAP,
            count: 1,
            trigger: None,
        }
    }

    #[must_use]
    pub fn with_user(mut self, user: UserId) -> Self {
        self.targets.insert(user.0);
        self
    }

    /// Targets messages posted on behalf of a channel or group.
    #[must_use]
    pub fn with_sender_chat(mut self, chat: ChatId) -> Self {
        self.targets.insert(chat.0);
        self
    }

    #[must_use]
    pub fn with_delete_all(mut self, enabled: bool) -> Self {
        self.delete_all = enabled;
        self
    }

    #[must_use]
    pub fn with_keyword(mut self, keyword: Regex) -> Self {
        self.keyword = Some(keyword);
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_before(mut self, dt: DateTime<Utc>) -> Self {
        self.before = Some(dt);
        self
    }

    #[must_use]
    pub fn with_after(mut self, dt: DateTime<Utc>) -> Self {
        self.after = Some(dt);
        self
    }

    #[must_use]
    pub fn with_hard_limit(mut self, enabled: bool) -> Self {
        self.hard_limit = enabled;
        self
    }

    #[must_use]
    pub fn with_scan_cap(mut self, cap: usize) -> Self {
        self.scan_cap = cap;
        self
    }

    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub fn with_trigger(mut self, trigger: MessageId) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Maximum number of messages examined, if bounded.
    pub fn scan_limit(&self) -> Option<usize> {
        self.hard_limit.then(|| self.scan_cap.max(self.count))
    }

    /// Returns `true` if `msg` is from a target (or everything is targeted).
    fn is_candidate(&self, msg: &Message) -> bool {
        self.delete_all
            || msg.sender.is_some_and(|u| self.targets.contains(&u.0))
            || msg.sender_chat.is_some_and(|c| self.targets.contains(&c.0))
    }

    fn matches(&self, msg: &Message) -> bool {
        self.is_candidate(msg)
            && self
                .keyword
                .as_ref()
                .is_none_or(|re| re.is_match(msg.text()))
    }
}

/// Why a purge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `count` messages were deleted.
    CountReached,
    /// The bounded scan examined its maximum number of messages.
    ScanCap,
    /// A message older than `before` was reached.
    TimeBoundary,
    /// The history stream ran out.
    Exhausted,
}

/// Outcome of a purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeReport {
    /// Messages examined, including the trigger.
    pub scanned: usize,
    /// Deleted message ids, newest first.
    pub deleted: Vec<MessageId>,
    /// Matches the platform refused to delete.
    pub failed: Vec<MessageId>,
    /// Matches spent on the offset.
    pub skipped: Vec<MessageId>,
    pub stop: StopReason,
}

impl PurgeReport {
    fn new() -> Self {
        Self {
            scanned: 0,
            deleted: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            stop: StopReason::Exhausted,
        }
    }
}

/// Scans `request.chat` and deletes the selected messages.
///
/// Deletes are issued one at a time in history order. A delete the platform
/// refuses is logged, recorded in [`PurgeReport::failed`] and does not count
/// toward `request.count`. A fault while fetching history is returned.
pub async fn purge<C>(client: &C, request: &PurgeRequest) -> Result<PurgeReport>
where
    C: ChatClient + ?Sized,
{
    let mut options = HistoryOptions::default();
    if let Some(after) = request.after {
        options = options.with_offset_date(after);
    }

    let limit = request.scan_limit();
    let mut offset = request.offset;
    let mut report = PurgeReport::new();
    let mut history = client.history(request.chat, options);

    while let Some(msg) = history.try_next().await? {
        if limit.is_some_and(|limit| report.scanned >= limit) {
            report.stop = StopReason::ScanCap;
            break;
        }
        report.scanned += 1;

        if request.trigger == Some(msg.id) {
            continue;
        }

        if request.matches(&msg) {
            if offset > 0 {
                offset -= 1;
                report.skipped.push(msg.id);
                continue;
            }
            match client.delete_message(request.chat, msg.id).await {
                Ok(()) => report.deleted.push(msg.id),
                Err(e) => {
                    warn!(chat = %request.chat, message = %msg.id, error = %e, "could not delete message");
                    report.failed.push(msg.id);
                }
            }
        }

        if report.deleted.len() >= request.count {
            report.stop = StopReason::CountReached;
            break;
        }
        if request.before.is_some_and(|before| msg.date < before) {
            report.stop = StopReason::TimeBoundary;
            break;
        }
    }

    debug!(
        chat = %request.chat,
        scanned = report.scanned,
        deleted = report.deleted.len(),
        stop = ?report.stop,
        "purge finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryChatClient;
    use crate::message::User;
    use chrono::{Duration, TimeZone};

    const CHAT: ChatId = ChatId(-100);
    const ALICE: UserId = UserId(2);
    const BOB: UserId = UserId(3);

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    /// Message `id` is sent `id` minutes after the base time, so higher ids are newer.
    fn msg(id: i64, sender: UserId, text: &str) -> Message {
        Message::new(MessageId(id), CHAT, base() + Duration::minutes(id))
            .with_sender(sender)
            .with_text(text)
    }

    fn client(messages: impl IntoIterator<Item = Message>) -> MemoryChatClient {
        let client = MemoryChatClient::new(User::new(1));
        for m in messages {
            client.push_message(m);
        }
        client
    }

    fn ids(raw: &[i64]) -> Vec<MessageId> {
        raw.iter().copied().map(MessageId).collect()
    }

    #[tokio::test]
    async fn test_default_request_deletes_newest_match() {
        let client = client((1..=5).map(|i| msg(i, ALICE, "hi")));
        let request = PurgeRequest::new(CHAT).with_user(ALICE);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[5]));
        assert_eq!(report.scanned, 1);
        assert_eq!(report.stop, StopReason::CountReached);
    }

    #[tokio::test]
    async fn test_trigger_is_never_deleted() {
        let client = client((1..=5).map(|i| msg(i, ALICE, "hi")));
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_count(2)
            .with_trigger(MessageId(5));

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[4, 3]));
        assert_eq!(report.scanned, 3);
    }

    #[tokio::test]
    async fn test_only_targets_are_deleted() {
        let client = client([
            msg(1, ALICE, "a"),
            msg(2, BOB, "b"),
            msg(3, ALICE, "a"),
            msg(4, BOB, "b"),
        ]);
        let request = PurgeRequest::new(CHAT).with_user(BOB).with_count(5);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[4, 2]));
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(client.remaining(CHAT), ids(&[3, 1]));
    }

    #[tokio::test]
    async fn test_delete_all_ignores_targets() {
        let client = client([msg(1, ALICE, "a"), msg(2, BOB, "b"), msg(3, ALICE, "a")]);
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_delete_all(true)
            .with_count(3);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[3, 2, 1]));
    }

    #[tokio::test]
    async fn test_sender_chat_target() {
        let channel = ChatId(-500);
        let client = client([
            msg(1, ALICE, "a"),
            Message::new(MessageId(2), CHAT, base() + Duration::minutes(2))
                .with_sender_chat(channel)
                .with_text("post"),
        ]);
        let request = PurgeRequest::new(CHAT)
            .with_sender_chat(channel)
            .with_count(5);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[2]));
    }

    #[tokio::test]
    async fn test_offset_skips_newest_matches() {
        let mut history: Vec<Message> = (1..=10).map(|i| msg(i, ALICE, "x")).collect();
        history.push(msg(11, BOB, "x"));
        let client = client(history);
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_count(5)
            .with_offset(2);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.skipped, ids(&[10, 9]));
        assert_eq!(report.deleted, ids(&[8, 7, 6, 5, 4]));
    }

    #[tokio::test]
    async fn test_keyword_filters_candidates_and_offset() {
        let client = client([
            msg(1, ALICE, "spam link"),
            msg(2, ALICE, "hello"),
            msg(3, ALICE, "more SPAM"),
            msg(4, ALICE, "spam again"),
            msg(5, ALICE, "bye"),
        ]);
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_keyword(Regex::new("(?i)spam").unwrap())
            .with_offset(1)
            .with_count(10);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.skipped, ids(&[4]));
        assert_eq!(report.deleted, ids(&[3, 1]));
        assert_eq!(client.remaining(CHAT), ids(&[5, 4, 2]));
    }

    #[tokio::test]
    async fn test_keyword_uses_caption() {
        let client = client([
            Message::new(MessageId(1), CHAT, base())
                .with_sender(ALICE)
                .with_caption("buy now"),
        ]);
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_keyword(Regex::new("buy").unwrap());

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[1]));
    }

    #[tokio::test]
    async fn test_scan_cap_bounds_scan() {
        let client = client((1..=150).map(|i| msg(i, ALICE, "hi")));
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_keyword(Regex::new("never").unwrap());

        let report = purge(&client, &request).await.unwrap();
        assert!(report.deleted.is_empty());
        assert_eq!(report.scanned, 100);
        assert_eq!(report.stop, StopReason::ScanCap);
    }

    #[tokio::test]
    async fn test_scan_cap_grows_with_count() {
        let client = client((1..=300).map(|i| msg(i, if i % 2 == 0 { ALICE } else { BOB }, "hi")));
        let request = PurgeRequest::new(CHAT).with_user(ALICE).with_count(120);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(request.scan_limit(), Some(120));
        assert_eq!(report.scanned, 120);
        assert_eq!(report.deleted.len(), 60);
    }

    #[tokio::test]
    async fn test_full_scan_is_unbounded() {
        let client = client((1..=150).map(|i| msg(i, ALICE, "hi")));
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_keyword(Regex::new("never").unwrap())
            .with_hard_limit(false);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.scanned, 150);
        assert_eq!(report.stop, StopReason::Exhausted);
        assert_eq!(request.scan_limit(), None);
    }

    #[tokio::test]
    async fn test_before_boundary_stops_after_older_message() {
        let client = client((1..=10).map(|i| msg(i, ALICE, "hi")));
        // messages 6..=10 are at or after the boundary; 5 is the first older one
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_count(100)
            .with_before(base() + Duration::minutes(6));

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[10, 9, 8, 7, 6, 5]));
        assert_eq!(report.stop, StopReason::TimeBoundary);
    }

    #[tokio::test]
    async fn test_after_bounds_history_start() {
        let client = client((1..=10).map(|i| msg(i, ALICE, "hi")));
        let request = PurgeRequest::new(CHAT)
            .with_user(ALICE)
            .with_count(2)
            .with_after(base() + Duration::minutes(8));

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.deleted, ids(&[7, 6]));
    }

    #[tokio::test]
    async fn test_denied_delete_is_skipped() {
        let client = client((1..=4).map(|i| msg(i, ALICE, "hi")));
        client.deny_delete(CHAT, MessageId(4));
        let request = PurgeRequest::new(CHAT).with_user(ALICE).with_count(2);

        let report = purge(&client, &request).await.unwrap();
        assert_eq!(report.failed, ids(&[4]));
        assert_eq!(report.deleted, ids(&[3, 2]));
    }

    #[tokio::test]
    async fn test_empty_history() {
        let client = client([]);
        let report = purge(&client, &PurgeRequest::new(CHAT).with_user(ALICE))
            .await
            .unwrap();
        assert_eq!(report, PurgeReport::new());
    }
}
