use serde::{Deserialize, Serialize};
use validator::Validate;

// Largest integer a browser can hold exactly in a JSON number (2^53 - 1)
pub const MAX_SAFE_COUNT: u64 = 9_007_199_254_740_991;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LikeOp {
    Like,
    Unlike,
}

impl LikeOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LikeOp::Like => "like",
            LikeOp::Unlike => "unlike",
        }
    }
}

// POST /like body
#[derive(Deserialize, Serialize, Clone, Debug, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    #[validate(length(min = 1, max = 256, message = "postId must be 1-256 characters"))]
    pub post_id: String,
    pub op: LikeOp,
}

// POST /like success body
#[derive(Deserialize, Serialize, Clone, Debug, Validate)]
pub struct LikeResponse {
    pub success: bool,
    #[validate(range(max = MAX_SAFE_COUNT))]
    pub count: u64,
}

// GET /like/count query string
#[derive(Deserialize, Debug, Default, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CountQuery {
    #[validate(length(min = 1, max = 256, message = "postId must be 1-256 characters"))]
    pub post_id: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Validate)]
pub struct CountResponse {
    #[validate(range(max = MAX_SAFE_COUNT))]
    pub count: u64,
}

// Uniform failure body for both endpoints
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
    pub code: String,
}
