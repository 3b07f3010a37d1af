//! Page collaborator
//!
//! The controller touches the page through a narrow contract: scroll,
//! history navigation, link opening, and two read-only queries. The
//! shipped implementation works over an HTML snapshot.

mod html;

pub use html::HtmlPage;

/// Narrow page contract the controller drives
pub trait PageActions: Send {
    /// Scroll the viewport by a pixel delta.
    fn scroll_by(&mut self, dx: i32, dy: i32);

    /// Go one step back in session history.
    fn navigate_back(&mut self);

    /// Go one step forward in session history.
    fn navigate_forward(&mut self);

    /// Open the first link in scope, returning its target if found.
    fn open_first_link(&mut self) -> Option<String>;

    /// Text of the main content region with nested links and buttons
    /// stripped, or `None` when the page has no such region.
    fn main_content(&self) -> Option<String>;

    /// Trimmed, non-empty labels of button-like elements, in document
    /// order.
    fn button_labels(&self) -> Vec<String>;
}
