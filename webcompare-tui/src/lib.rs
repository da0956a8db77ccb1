pub mod browser;

pub use browser::{
    BrowserAction, BrowserMessage, BrowserOptions, ResultBrowser, Tab, create_browser_channel,
    run_browser,
};
