// src/prepro/progress.rs

// With the "progressbar" feature the real indicatif types are used; without it
// these no-op stand-ins keep the call sites identical.

#[cfg(feature = "progressbar")]
pub use indicatif::{ProgressBar, ProgressStyle};

#[cfg(not(feature = "progressbar"))]
pub use noop::{ProgressBar, ProgressStyle};

#[cfg(not(feature = "progressbar"))]
mod noop {
    use std::borrow::Cow;

    pub struct ProgressBar;

    impl ProgressBar {
        pub fn new(_length: u64) -> Self {
            Self {}
        }

        pub fn set_message(&self, _message: impl Into<Cow<'static, str>>) {}
        pub fn inc(&self, _inc: u64) {}
        pub fn set_style(&self, _style: ProgressStyle) {}
        pub fn finish(&self) {}
    }

    pub struct ProgressStyle;

    impl ProgressStyle {
        pub fn default_bar() -> Self {
            Self {}
        }
        pub fn template(self, _template: &str) -> Result<Self, String> {
            Ok(self)
        }
    }
}

/// Builds the bar used while copying per-item features, or `None` when
/// progress display is turned off.
pub(crate) fn feature_bar(len: usize, show: bool) -> Option<ProgressBar> {
    if !show {
        return None;
    }
    let p = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] {msg:<20!} {wide_bar} {pos:>9!}/{len:<9!}")
    {
        p.set_style(style);
    }
    p.set_message("Copying features");
    Some(p)
}
