//! Pending content, thumbnails and Pixabay import

use serde_json::json;

use super::Suite;
use crate::check::Check;
use crate::step::Step;

pub fn content() -> Suite {
    Suite::new("content", "Pending media and thumbnail generation").with_steps(vec![
        Step::get("pending content is listed", "/content/pending?limit=5")
            .with_check(Check::present("content"))
            .capturing("content_id", &["content.0.id", "content.0._id"]),
        Step::get("thumbnail is served", "/content/${content_id}/thumb"),
        Step::post(
            "thumbnail generation is accepted",
            "/content/${content_id}/thumbnail",
        )
        .expecting(&[200, 202]),
    ])
}

pub fn pixabay() -> Suite {
    Suite::new("pixabay", "Stock image search and import").with_steps(vec![
        Step::get("categories are listed", "/pixabay/categories")
            .with_check(Check::non_empty("categories")),
        Step::get("search returns hits", "/pixabay/search?query=business&per_page=3")
            .with_check(Check::non_empty("hits"))
            .capturing("image_url", &["hits.0.webformatURL", "hits.0.largeImageURL"]),
        Step::post("image import", "/pixabay/save-image")
            .with_body(json!({
                "image_url": "${image_url}",
                "tags": ["cmprobe"],
            })),
    ])
}
