//! Reader-side half of the like feature.

mod api;
mod controller;
mod error;
mod liked;
mod widget;

pub use api::{DEFAULT_TIMEOUT, HttpLikeApi, LikeApi};
pub use controller::LikeController;
pub use error::ClientError;
pub use liked::{FileStorage, LIKED_POSTS_KEY, LikedPosts, LocalStorage, MemoryStorage};
pub use widget::{LikeWidget, PendingMutation, Phase, Resolution, Snapshot};
