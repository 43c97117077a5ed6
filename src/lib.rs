pub mod app;
pub mod avatar;
pub mod capture;
pub mod config;
pub mod error;
pub mod format;
pub mod headless;
pub mod lang;
pub mod logging;
pub mod lookup;
pub mod message;
pub mod session;
pub mod state;
pub mod ui;
pub mod worker;
