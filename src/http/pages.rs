//! HTML pages. Both are static and compiled into the binary.

use axum::response::Html;

const ROBOT_HTML: &str = include_str!("../../templates/robot.html");
const INDEX_HTML: &str = include_str!("../../templates/index.html");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Robot,
    Index,
}

pub fn render(page: Page) -> Html<&'static str> {
    match page {
        Page::Robot => Html(ROBOT_HTML),
        Page::Index => Html(INDEX_HTML),
    }
}
