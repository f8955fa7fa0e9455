pub mod backend;
pub mod mock;
pub mod types;
pub mod webdriver;

pub use backend::{BrowserSession, SCRIPT_CLICK, SCRIPT_READY_STATE, SCRIPT_SCROLL_INTO_VIEW, parse_user_agent};
pub use mock::{ClickMethod, MockBrowser, MockClick, MockElement};
pub use types::{BrowserError, BrowserResult, SelectorCandidate, SelectorGroup};
pub use webdriver::{WebDriverOptions, WebDriverSession};
