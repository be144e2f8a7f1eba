//! Logging infrastructure for the core.
//!
//! Provides rate-limited, categorized logging. On `wasm32` messages go to the
//! browser console; native builds emit `tracing` events tagged with the category.

use std::sync::atomic::{AtomicU32, Ordering};

/// Log categories for filtering and rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogCategory {
    Cpu,
    Cartridge,
    Bus,
    Ppu,
    General,
}

impl LogCategory {
    fn prefix(self) -> &'static str {
        match self {
            LogCategory::Cpu => "[CPU]",
            LogCategory::Cartridge => "[Cart]",
            LogCategory::Bus => "[Bus]",
            LogCategory::Ppu => "[PPU]",
            LogCategory::General => "[EMU]",
        }
    }
}

/// Rate limiter that tracks how many times a particular log point has been hit.
pub struct RateLimiter {
    counter: AtomicU32,
    limit: u32,
}

impl RateLimiter {
    /// Create a new rate limiter that allows `limit` messages.
    pub const fn new(limit: u32) -> Self {
        RateLimiter {
            counter: AtomicU32::new(0),
            limit,
        }
    }

    /// Check if we should log. Returns true if under the limit.
    pub fn should_log(&self) -> bool {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        count < self.limit
    }

    /// Get current count without incrementing.
    #[allow(dead_code)]
    pub fn count(&self) -> u32 {
        self.counter.load(Ordering::Relaxed)
    }
}

pub struct Logger;

impl Logger {
    #[cfg(target_arch = "wasm32")]
    pub fn info(category: LogCategory, msg: &str) {
        let formatted = format!("{} {}", category.prefix(), msg);
        web_sys::console::log_1(&formatted.into());
    }

    #[cfg(target_arch = "wasm32")]
    pub fn warn(category: LogCategory, msg: &str) {
        let formatted = format!("{} {}", category.prefix(), msg);
        web_sys::console::warn_1(&formatted.into());
    }

    #[cfg(target_arch = "wasm32")]
    pub fn error(category: LogCategory, msg: &str) {
        let formatted = format!("{} {}", category.prefix(), msg);
        web_sys::console::error_1(&formatted.into());
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn info(category: LogCategory, msg: &str) {
        tracing::info!(category = category.prefix(), "{}", msg);
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn warn(category: LogCategory, msg: &str) {
        tracing::warn!(category = category.prefix(), "{}", msg);
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn error(category: LogCategory, msg: &str) {
        tracing::error!(category = category.prefix(), "{}", msg);
    }
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::Logger::info($cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::Logger::warn($cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($cat:expr, $($arg:tt)*) => {
        $crate::log::Logger::error($cat, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info_limited {
    ($cat:expr, $limiter:expr, $($arg:tt)*) => {
        if $limiter.should_log() {
            $crate::log::Logger::info($cat, &format!($($arg)*))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_cuts_off() {
        let limiter = RateLimiter::new(3);
        let allowed = (0..10).filter(|_| limiter.should_log()).count();
        assert_eq!(allowed, 3);
        assert_eq!(limiter.count(), 10);
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let cats = [
            LogCategory::Cpu,
            LogCategory::Cartridge,
            LogCategory::Bus,
            LogCategory::Ppu,
            LogCategory::General,
        ];
        for (i, a) in cats.iter().enumerate() {
            for b in &cats[i + 1..] {
                assert_ne!(a.prefix(), b.prefix());
            }
        }
    }
}
