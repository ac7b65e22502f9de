//! Crate-internal logging macros.
//!
//! With the `tracing` feature every level forwards to the matching `tracing` macro under the
//! `referral_scanner` target. Without it, the arguments are only borrowed so call sites compile
//! the same and no variable turns unused. Call sites use `field = value, "message"` (with `%` or
//! `?` sigils as needed).

#[cfg(feature = "tracing")]
macro_rules! log_event {
    ($level:ident, $($arg:tt)+) => {
        tracing::$level!(target: "referral_scanner", $($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! log_event {
    ($level:ident, $($arg:tt)+) => {
        discard_fields!($($arg)+)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! discard_fields {
    ($field:ident = % $value:expr, $($rest:tt)+) => {{
        let _ = &$value;
        discard_fields!($($rest)+)
    }};
    ($field:ident = ? $value:expr, $($rest:tt)+) => {{
        let _ = &$value;
        discard_fields!($($rest)+)
    }};
    ($field:ident = $value:expr, $($rest:tt)+) => {{
        let _ = &$value;
        discard_fields!($($rest)+)
    }};
    ($message:literal) => {
        ()
    };
}

#[allow(unused_macros)]
macro_rules! error {
    ($($arg:tt)+) => { log_event!(error, $($arg)+) };
}

#[allow(unused_macros)]
macro_rules! warn {
    ($($arg:tt)+) => { log_event!(warn, $($arg)+) };
}

#[allow(unused_macros)]
macro_rules! info {
    ($($arg:tt)+) => { log_event!(info, $($arg)+) };
}

#[allow(unused_macros)]
macro_rules! debug {
    ($($arg:tt)+) => { log_event!(debug, $($arg)+) };
}

#[allow(unused_macros)]
macro_rules! trace {
    ($($arg:tt)+) => { log_event!(trace, $($arg)+) };
}
