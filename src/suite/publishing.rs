//! Website analysis and post generation

use serde_json::json;

use super::Suite;
use crate::check::Check;
use crate::step::Step;

/// Generation calls the AI backend and regularly takes minutes
const GENERATION_TIMEOUT_SECS: u64 = 180;

pub fn website() -> Suite {
    Suite::new("website", "Latest website analysis").with_steps(vec![
        // 404 until the account has run its first analysis
        Step::get("analysis is retrievable", "/website/analyze").expecting(&[200, 404]),
    ])
}

/// Generates and publishes content, so it only runs when asked for by name
pub fn posts() -> Suite {
    Suite::new("posts", "Post generation and publication").opt_in().with_steps(vec![
        Step::post("posts are generated", "/posts/generate")
            .with_body(json!({"num_posts": 1, "source": "cmprobe ${run_id}"}))
            .with_timeout(GENERATION_TIMEOUT_SECS)
            .capturing("post_id", &["posts.0.id", "posts.0.post_id", "post_id"]),
        Step::get("generated post is listed", "/posts")
            .with_check(Check::body_contains("${post_id}")),
        // 400 when no social account is connected
        Step::post("publication is answered", "/posts/publish")
            .with_body(json!({"post_id": "${post_id}"}))
            .expecting(&[200, 400]),
    ])
}
