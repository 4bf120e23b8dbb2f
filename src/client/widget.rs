//! Optimistic like toggle for a single post.
//!
//! Two phases: `Idle` and `Mutating`. A toggle captures a rollback
//! [`Snapshot`] in the same step that applies the optimistic change, and
//! hands it back inside the [`PendingMutation`]. Completing the mutation
//! either adopts the server's count or restores that snapshot exactly.
//!
//! Count reads are tagged with the generation current when they started.
//! Every toggle bumps the generation, so a read that was issued before a
//! mutation can never overwrite the count that mutation settled on.

use super::ClientError;
use crate::models::LikeOp;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Mutating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub liked: bool,
    pub count: u64,
}

// In-flight like/unlike, owned by whoever sends the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    pub post_id: String,
    pub op: LikeOp,
    pub rollback: Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Server confirmed; persist `liked` for the post.
    Confirmed { liked: bool },
    RolledBack,
    /// Not the mutation this widget is waiting on.
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeWidget {
    post_id: String,
    liked: bool,
    count: u64,
    phase: Phase,
    error: Option<String>,
    disabled: bool,
    generation: u64,
}

impl LikeWidget {
    pub fn new(post_id: impl Into<String>) -> Self {
        Self {
            post_id: post_id.into(),
            liked: false,
            count: 0,
            phase: Phase::Idle,
            error: None,
            disabled: false,
            generation: 0,
        }
    }

    pub fn post_id(&self) -> &str {
        &self.post_id
    }

    pub fn liked(&self) -> bool {
        self.liked
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            liked: self.liked,
            count: self.count,
        }
    }

    /// Mount step 1: locally persisted membership.
    ///
    /// Returns the token to pass to [`apply_count`](Self::apply_count) with
    /// the result of the count read that follows.
    pub fn mount_with(&mut self, liked_locally: bool) -> u64 {
        if self.phase == Phase::Idle {
            self.liked = liked_locally;
        }
        self.generation
    }

    /// Mount step 2: result of reading the canonical count.
    ///
    /// Dropped while a mutation is in flight, and dropped when any toggle
    /// started after `token` was issued: the mutation response is fresher.
    pub fn apply_count(&mut self, token: u64, result: Result<u64, ClientError>) {
        if self.phase == Phase::Mutating || token != self.generation {
            return;
        }
        match result {
            Ok(count) => {
                self.count = count;
                self.error = None;
            }
            Err(err) => self.error = Some(err.user_message()),
        }
    }

    /// Start a toggle. `None` while mutating or disabled: no request must be sent.
    pub fn begin_toggle(&mut self) -> Option<PendingMutation> {
        if self.disabled || self.phase == Phase::Mutating {
            return None;
        }

        let rollback = self.snapshot();
        let op = if self.liked { LikeOp::Unlike } else { LikeOp::Like };

        self.liked = !self.liked;
        self.count = match op {
            LikeOp::Like => self.count.saturating_add(1),
            LikeOp::Unlike => self.count.saturating_sub(1),
        };
        self.phase = Phase::Mutating;
        self.generation += 1;

        Some(PendingMutation {
            post_id: self.post_id.clone(),
            op,
            rollback,
        })
    }

    pub fn complete(
        &mut self,
        pending: &PendingMutation,
        result: Result<u64, ClientError>,
    ) -> Resolution {
        if self.phase != Phase::Mutating || pending.post_id != self.post_id {
            return Resolution::Ignored;
        }
        self.phase = Phase::Idle;

        match result {
            Ok(count) => {
                self.count = count;
                self.error = None;
                Resolution::Confirmed { liked: self.liked }
            }
            Err(err) => {
                self.liked = pending.rollback.liked;
                self.count = pending.rollback.count;
                self.error = Some(err.user_message());
                Resolution::RolledBack
            }
        }
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget(liked: bool, count: u64) -> LikeWidget {
        let mut widget = LikeWidget::new("post");
        let token = widget.mount_with(liked);
        widget.apply_count(token, Ok(count));
        widget
    }

    #[test]
    fn mount_sets_liked_and_count() {
        let w = widget(true, 7);
        assert!(w.liked());
        assert_eq!(w.count(), 7);
        assert_eq!(w.phase(), Phase::Idle);
        assert_eq!(w.error(), None);
    }

    #[test]
    fn failed_count_read_keeps_previous_count() {
        let mut w = widget(false, 5);
        let token = w.mount_with(false);
        w.apply_count(token, Err(ClientError::Timeout));
        assert_eq!(w.count(), 5);
        assert!(w.error().is_some());
    }

    #[test]
    fn like_is_optimistic() {
        let mut w = widget(false, 3);
        let pending = w.begin_toggle().unwrap();

        assert_eq!(pending.op, LikeOp::Like);
        assert_eq!(pending.rollback, Snapshot { liked: false, count: 3 });
        assert!(w.liked());
        assert_eq!(w.count(), 4);
        assert_eq!(w.phase(), Phase::Mutating);
    }

    #[test]
    fn unlike_at_zero_stays_at_zero() {
        let mut w = widget(true, 0);
        let pending = w.begin_toggle().unwrap();
        assert_eq!(pending.op, LikeOp::Unlike);
        assert!(!w.liked());
        assert_eq!(w.count(), 0);
    }

    #[test]
    fn success_adopts_server_count() {
        let mut w = widget(false, 3);
        let pending = w.begin_toggle().unwrap();

        let resolution = w.complete(&pending, Ok(10));
        assert_eq!(resolution, Resolution::Confirmed { liked: true });
        assert!(w.liked());
        assert_eq!(w.count(), 10);
        assert_eq!(w.phase(), Phase::Idle);
    }

    #[test]
    fn failure_restores_exact_snapshot() {
        let mut w = widget(false, 3);
        let pending = w.begin_toggle().unwrap();
        assert_eq!((w.liked(), w.count()), (true, 4));

        let resolution = w.complete(&pending, Err(ClientError::Network("offline".into())));
        assert_eq!(resolution, Resolution::RolledBack);
        assert!(!w.liked());
        assert_eq!(w.count(), 3);
        assert_eq!(w.phase(), Phase::Idle);
        assert_eq!(w.error(), Some("Something went wrong. Please try again."));
    }

    #[test]
    fn rate_limit_failure_mentions_wait() {
        let mut w = widget(true, 8);
        let pending = w.begin_toggle().unwrap();
        w.complete(
            &pending,
            Err(ClientError::RateLimited {
                retry_after_secs: 30,
            }),
        );
        assert!(w.liked());
        assert_eq!(w.count(), 8);
        assert!(w.error().unwrap().contains("30 seconds"));
    }

    #[test]
    fn toggle_while_mutating_is_noop() {
        let mut w = widget(false, 1);
        let first = w.begin_toggle();
        assert!(first.is_some());
        let before = w.clone();

        assert_eq!(w.begin_toggle(), None);
        assert_eq!(w, before);
    }

    #[test]
    fn toggle_while_disabled_is_noop() {
        let mut w = widget(false, 1);
        w.set_disabled(true);
        assert_eq!(w.begin_toggle(), None);
        assert_eq!(w.count(), 1);

        w.set_disabled(false);
        assert!(w.begin_toggle().is_some());
    }

    #[test]
    fn count_read_during_flight_is_dropped() {
        let mut w = widget(false, 3);
        let token = w.mount_with(false);
        let pending = w.begin_toggle().unwrap();
        w.apply_count(token, Ok(3));
        assert_eq!(w.count(), 4);

        w.complete(&pending, Ok(4));
        assert_eq!(w.count(), 4);
    }

    #[test]
    fn read_started_before_a_toggle_is_dropped_after_it_settles() {
        let mut w = LikeWidget::new("post");
        let stale = w.mount_with(false);

        let pending = w.begin_toggle().unwrap();
        w.complete(&pending, Ok(6));
        assert_eq!(w.phase(), Phase::Idle);

        w.apply_count(stale, Ok(5));
        assert_eq!((w.liked(), w.count()), (true, 6));

        let fresh = w.mount_with(true);
        w.apply_count(fresh, Ok(7));
        assert_eq!(w.count(), 7);
    }

    #[test]
    fn stale_read_failure_does_not_set_error() {
        let mut w = LikeWidget::new("post");
        let stale = w.mount_with(false);
        let pending = w.begin_toggle().unwrap();
        w.complete(&pending, Ok(1));

        w.apply_count(stale, Err(ClientError::Timeout));
        assert_eq!(w.error(), None);
    }

    #[test]
    fn completion_without_pending_is_ignored() {
        let mut w = widget(false, 3);
        let stray = PendingMutation {
            post_id: "post".into(),
            op: LikeOp::Like,
            rollback: Snapshot {
                liked: true,
                count: 99,
            },
        };
        assert_eq!(w.complete(&stray, Err(ClientError::Timeout)), Resolution::Ignored);
        assert_eq!((w.liked(), w.count()), (false, 3));
    }

    #[test]
    fn success_clears_previous_error() {
        let mut w = widget(false, 0);
        let pending = w.begin_toggle().unwrap();
        w.complete(&pending, Err(ClientError::Timeout));
        assert!(w.error().is_some());

        let pending = w.begin_toggle().unwrap();
        w.complete(&pending, Ok(1));
        assert_eq!(w.error(), None);
    }

    #[test]
    fn dismiss_error() {
        let mut w = widget(false, 0);
        let token = w.mount_with(false);
        w.apply_count(token, Err(ClientError::Timeout));
        w.dismiss_error();
        assert_eq!(w.error(), None);
    }
}
