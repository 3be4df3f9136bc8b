pub mod browser;
pub mod gallery;
pub mod sheets;
pub mod webdriver;
