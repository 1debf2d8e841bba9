//! Greeting text fetch.
//!
//! The greeting comes from an external text service; the visual open
//! transition never waits on it. Whatever goes wrong — error, empty
//! answer, slow network — the canned fallback shows instead.

use anyhow::Result;
use crossbeam_channel::{bounded, Receiver};
use std::thread;
use tracing::warn;

/// Shown whenever the source fails or returns nothing. Must never be
/// blank.
pub const FALLBACK_GREETING: &str =
    "Merry Christmas! May love and light fill your heart. 圣诞快乐，愿爱与光亮充满你的心房。";

/// Narrow boundary over the external text-generation service.
pub trait GreetingSource: Send + 'static {
    fn generate(&self) -> Result<String>;
}

/// Offline source used when no remote service is wired up.
pub struct CannedGreeting;

impl GreetingSource for CannedGreeting {
    fn generate(&self) -> Result<String> {
        Ok(FALLBACK_GREETING.to_string())
    }
}

/// One fetch per opening; the result arrives over a channel and is read
/// without blocking the render loop.
pub struct GreetingFetcher {
    pending: Option<Receiver<String>>,
    text: Option<String>,
}

impl GreetingFetcher {
    pub fn new() -> Self {
        Self {
            pending: None,
            text: None,
        }
    }

    /// Kick off a background fetch unless one already ran or is running.
    pub fn request<S: GreetingSource>(&mut self, source: S) {
        if self.text.is_some() || self.pending.is_some() {
            return;
        }
        let (tx, rx) = bounded(1);
        thread::spawn(move || {
            let text = match source.generate() {
                Ok(t) if !t.trim().is_empty() => t,
                Ok(_) => FALLBACK_GREETING.to_string(),
                Err(err) => {
                    warn!("greeting source failed: {err:#}");
                    FALLBACK_GREETING.to_string()
                }
            };
            let _ = tx.send(text);
        });
        self.pending = Some(rx);
    }

    /// Current greeting, if it has arrived.
    pub fn poll(&mut self) -> Option<&str> {
        if let Some(rx) = &self.pending {
            if let Ok(text) = rx.try_recv() {
                self.text = Some(text);
                self.pending = None;
            }
        }
        self.text.as_deref()
    }

    /// Forget the greeting when the tree closes.
    pub fn clear(&mut self) {
        self.pending = None;
        self.text = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Fixed(&'static str);
    impl GreetingSource for Fixed {
        fn generate(&self) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Broken;
    impl GreetingSource for Broken {
        fn generate(&self) -> Result<String> {
            anyhow::bail!("service unreachable")
        }
    }

    fn poll_until_some(fetcher: &mut GreetingFetcher) -> String {
        for _ in 0..200 {
            if let Some(text) = fetcher.poll() {
                return text.to_string();
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("greeting never arrived");
    }

    #[test]
    fn successful_fetch_passes_through() {
        let mut fetcher = GreetingFetcher::new();
        fetcher.request(Fixed("May your days be merry and bright."));
        assert_eq!(poll_until_some(&mut fetcher), "May your days be merry and bright.");
    }

    #[test]
    fn errors_substitute_the_fallback() {
        let mut fetcher = GreetingFetcher::new();
        fetcher.request(Broken);
        assert_eq!(poll_until_some(&mut fetcher), FALLBACK_GREETING);
    }

    #[test]
    fn empty_answers_substitute_the_fallback() {
        let mut fetcher = GreetingFetcher::new();
        fetcher.request(Fixed("   "));
        assert_eq!(poll_until_some(&mut fetcher), FALLBACK_GREETING);
    }

    #[test]
    fn fallback_is_never_blank() {
        assert!(!FALLBACK_GREETING.trim().is_empty());
    }

    #[test]
    fn clear_resets_for_the_next_opening() {
        let mut fetcher = GreetingFetcher::new();
        fetcher.request(Fixed("first"));
        poll_until_some(&mut fetcher);
        fetcher.clear();
        assert!(fetcher.poll().is_none());
        fetcher.request(Fixed("second"));
        assert_eq!(poll_until_some(&mut fetcher), "second");
    }

    #[test]
    fn request_is_one_shot_until_cleared() {
        let mut fetcher = GreetingFetcher::new();
        fetcher.request(Fixed("kept"));
        poll_until_some(&mut fetcher);
        fetcher.request(Fixed("ignored"));
        assert_eq!(fetcher.poll(), Some("kept"));
    }
}
