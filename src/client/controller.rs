use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{LikeApi, LikeWidget, LikedPosts, Resolution};

/// Drives one [`LikeWidget`] against a [`LikeApi`] and local membership.
///
/// The lock is only held for the synchronous transitions, never across a
/// request, so a second `toggle` during flight sees `Mutating` and returns.
pub struct LikeController {
    widget: Mutex<LikeWidget>,
    api: Arc<dyn LikeApi>,
    liked_posts: LikedPosts,
}

impl LikeController {
    pub fn new(post_id: impl Into<String>, api: Arc<dyn LikeApi>, liked_posts: LikedPosts) -> Self {
        Self {
            widget: Mutex::new(LikeWidget::new(post_id)),
            api,
            liked_posts,
        }
    }

    pub async fn state(&self) -> LikeWidget {
        self.widget.lock().await.clone()
    }

    pub async fn mount(&self) {
        let (post_id, token) = {
            let mut widget = self.widget.lock().await;
            let post_id = widget.post_id().to_string();
            let token = widget.mount_with(self.liked_posts.contains(&post_id));
            (post_id, token)
        };

        let result = self.api.get_count(&post_id).await;
        if let Err(e) = &result {
            warn!(post_id = %post_id, error = %e, "failed to load like count");
        }
        self.widget.lock().await.apply_count(token, result);
    }

    /// Toggle like/unlike. Returns `false` if no request was sent.
    pub async fn toggle(&self) -> bool {
        let Some(pending) = self.widget.lock().await.begin_toggle() else {
            debug!("toggle ignored, widget busy or disabled");
            return false;
        };

        let result = self.api.mutate(&pending.post_id, pending.op).await;
        if let Err(e) = &result {
            warn!(post_id = %pending.post_id, op = pending.op.as_str(), error = %e, "like request failed");
        }

        let resolution = self.widget.lock().await.complete(&pending, result);
        if let Resolution::Confirmed { liked } = resolution {
            // The server already counted it; a failed local write only loses the heart icon
            if let Err(e) = self.liked_posts.set_liked(&pending.post_id, liked) {
                warn!(post_id = %pending.post_id, error = %e, "failed to persist liked posts");
            }
        }
        true
    }

    pub async fn dismiss_error(&self) {
        self.widget.lock().await.dismiss_error();
    }

    pub async fn set_disabled(&self, disabled: bool) {
        self.widget.lock().await.set_disabled(disabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, MemoryStorage, Phase};
    use crate::models::LikeOp;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    // Scripted API: counts calls and can hold reads or mutations until released
    struct FakeApi {
        count: u64,
        fail_mutations: Option<ClientError>,
        fail_reads: bool,
        gate: Option<Arc<Notify>>,
        read_gate: Option<Arc<Notify>>,
        mutations: AtomicUsize,
        reads: AtomicUsize,
    }

    impl FakeApi {
        fn new(count: u64) -> Self {
            Self {
                count,
                fail_mutations: None,
                fail_reads: false,
                gate: None,
                read_gate: None,
                mutations: AtomicUsize::new(0),
                reads: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LikeApi for FakeApi {
        async fn get_count(&self, _post_id: &str) -> Result<u64, ClientError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.read_gate {
                gate.notified().await;
            }
            if self.fail_reads {
                return Err(ClientError::Network("down".into()));
            }
            Ok(self.count)
        }

        async fn mutate(&self, _post_id: &str, op: LikeOp) -> Result<u64, ClientError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if let Some(err) = &self.fail_mutations {
                return Err(err.clone());
            }
            Ok(match op {
                LikeOp::Like => self.count + 1,
                LikeOp::Unlike => self.count.saturating_sub(1),
            })
        }
    }

    fn liked_posts() -> LikedPosts {
        LikedPosts::new(Arc::new(MemoryStorage::new()))
    }

    #[tokio::test]
    async fn mount_reads_membership_and_count() {
        let liked = liked_posts();
        liked.set_liked("post", true).unwrap();
        let controller = LikeController::new("post", Arc::new(FakeApi::new(12)), liked);

        controller.mount().await;
        let state = controller.state().await;
        assert!(state.liked());
        assert_eq!(state.count(), 12);
    }

    #[tokio::test]
    async fn mount_failure_sets_error() {
        let mut api = FakeApi::new(12);
        api.fail_reads = true;
        let controller = LikeController::new("post", Arc::new(api), liked_posts());

        controller.mount().await;
        let state = controller.state().await;
        assert_eq!(state.count(), 0);
        assert!(state.error().is_some());
    }

    #[tokio::test]
    async fn confirmed_like_is_persisted() {
        let liked = liked_posts();
        let controller = LikeController::new("post", Arc::new(FakeApi::new(3)), liked.clone());
        controller.mount().await;

        assert!(controller.toggle().await);
        let state = controller.state().await;
        assert!(state.liked());
        assert_eq!(state.count(), 4);
        assert!(liked.contains("post"));
    }

    #[tokio::test]
    async fn failed_like_rolls_back_and_is_not_persisted() {
        let mut api = FakeApi::new(3);
        api.fail_mutations = Some(ClientError::Server {
            status: 500,
            code: Some("DATABASE_ERROR".into()),
            message: "Failed to update like count".into(),
        });
        let liked = liked_posts();
        let controller = LikeController::new("post", Arc::new(api), liked.clone());
        controller.mount().await;

        assert!(controller.toggle().await);
        let state = controller.state().await;
        assert!(!state.liked());
        assert_eq!(state.count(), 3);
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.error().is_some());
        assert!(!liked.contains("post"));
    }

    #[tokio::test]
    async fn second_toggle_in_flight_sends_nothing() {
        let gate = Arc::new(Notify::new());
        let mut api = FakeApi::new(3);
        api.gate = Some(gate.clone());
        let api = Arc::new(api);

        let controller = Arc::new(LikeController::new("post", api.clone(), liked_posts()));
        controller.mount().await;

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.toggle().await }
        });

        // wait until the first request is actually in flight
        while api.mutations.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert_eq!(controller.state().await.phase(), Phase::Mutating);
        assert!(!controller.toggle().await);

        gate.notify_one();
        assert!(first.await.unwrap());
        assert_eq!(api.mutations.load(Ordering::SeqCst), 1);

        let state = controller.state().await;
        assert!(state.liked());
        assert_eq!(state.count(), 4);
    }

    #[tokio::test]
    async fn slow_mount_read_does_not_undo_a_confirmed_like() {
        let read_gate = Arc::new(Notify::new());
        let mut api = FakeApi::new(5);
        api.read_gate = Some(read_gate.clone());
        let api = Arc::new(api);

        let liked = liked_posts();
        let controller = Arc::new(LikeController::new("post", api.clone(), liked.clone()));

        let mount = tokio::spawn({
            let controller = controller.clone();
            async move { controller.mount().await }
        });
        while api.reads.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // the like confirms at 6 while the mount read is still out
        assert!(controller.toggle().await);
        assert_eq!(controller.state().await.count(), 6);

        // now the old read comes back with 5
        read_gate.notify_one();
        mount.await.unwrap();

        let state = controller.state().await;
        assert!(state.liked());
        assert_eq!(state.count(), 6);
        assert_eq!(state.error(), None);
        assert!(liked.contains("post"));
    }

    #[tokio::test]
    async fn like_then_unlike_restores_membership() {
        let liked = liked_posts();
        let controller = LikeController::new("post", Arc::new(FakeApi::new(0)), liked.clone());
        controller.mount().await;

        controller.toggle().await;
        assert!(liked.contains("post"));
        controller.toggle().await;
        assert!(!liked.contains("post"));
        assert!(!controller.state().await.liked());
    }

    #[tokio::test]
    async fn disabled_widget_sends_nothing() {
        let api = Arc::new(FakeApi::new(0));
        let controller = LikeController::new("post", api.clone(), liked_posts());
        controller.set_disabled(true).await;

        assert!(!controller.toggle().await);
        assert_eq!(api.mutations.load(Ordering::SeqCst), 0);
    }
}
