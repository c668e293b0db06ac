//! Logging macros.
//!
//! - `defmt` feature: forwards to `defmt` (target builds).
//! - Host tests: prints with a level prefix.
//! - Host, no `defmt`: compiled out.
//!
//! Format strings must stay within the `{}` subset both backends accept,
//! and arguments must implement both `Display` and `defmt::Format`.

/// Log informational message.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::info!($($arg)*);
        #[cfg(all(not(feature = "defmt"), test))]
        println!("[INFO] {}", format_args!($($arg)*));
        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log warning message.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::warn!($($arg)*);
        #[cfg(all(not(feature = "defmt"), test))]
        println!("[WARN] {}", format_args!($($arg)*));
        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log error message.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::error!($($arg)*);
        #[cfg(all(not(feature = "defmt"), test))]
        eprintln!("[ERROR] {}", format_args!($($arg)*));
        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}

/// Log debug message.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "defmt")]
        ::defmt::debug!($($arg)*);
        #[cfg(all(not(feature = "defmt"), test))]
        println!("[DEBUG] {}", format_args!($($arg)*));
        #[cfg(all(not(feature = "defmt"), not(test)))]
        let _ = format_args!($($arg)*);
    }};
}
