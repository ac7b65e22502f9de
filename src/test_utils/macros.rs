use tokio_stream::Stream;

use crate::{BindReferralEvent, ReferralScannerResult, ScannerMessage};

#[macro_export]
macro_rules! assert_next {
    // 1. Explicit error matching, by error kind
    ($stream: expr, Err($expected_err:expr)) => {
        $crate::assert_next!($stream, Err($expected_err), timeout = 5)
    };
    ($stream: expr, Err($expected_err:expr), timeout = $secs: expr) => {
        let message = tokio::time::timeout(
            std::time::Duration::from_secs($secs),
            tokio_stream::StreamExt::next(&mut $stream),
        )
        .await
        .expect("timed out");
        if let Some(msg) = message {
            let expected = &$expected_err;
            assert_eq!(&msg, expected, "Expected error {:?}, got {:?}", expected, msg);
        } else {
            panic!("Expected error {:?}, but channel was closed", $expected_err);
        }
    };

    // 2. Success matching, unwrapping the `Ok`
    ($stream: expr, $expected: expr) => {
        $crate::assert_next!($stream, $expected, timeout = 5)
    };
    ($stream: expr, $expected: expr, timeout = $secs: expr) => {
        let message = tokio::time::timeout(
            std::time::Duration::from_secs($secs),
            tokio_stream::StreamExt::next(&mut $stream),
        )
        .await
        .expect("timed out");
        let expected = $expected;
        match message {
            std::option::Option::Some(std::result::Result::Ok(msg)) => {
                assert_eq!(msg, expected, "Expected {:?}, got {:?}", expected, msg);
            }
            std::option::Option::Some(std::result::Result::Err(e)) => {
                panic!("Expected Ok({:?}), got Err({:?})", expected, e);
            }
            std::option::Option::None => {
                panic!("Expected Ok({:?}), but channel was closed", expected);
            }
        }
    };
}

#[macro_export]
macro_rules! assert_closed {
    ($stream: expr) => {
        $crate::assert_closed!($stream, timeout = 5)
    };
    ($stream: expr, timeout = $secs: expr) => {
        let message = tokio::time::timeout(
            std::time::Duration::from_secs($secs),
            tokio_stream::StreamExt::next(&mut $stream),
        )
        .await
        .expect("timed out");
        assert!(message.is_none(), "Expected closed stream, got {:?}", message)
    };
}

#[macro_export]
macro_rules! assert_empty {
    ($stream: expr) => {{
        let inner = $stream.into_inner();
        assert!(inner.is_empty(), "Stream should have no pending messages");
        tokio_stream::wrappers::ReceiverStream::new(inner)
    }};
}

/// Asserts that a stream delivers the given events next, in order, as `Message::Data` items.
///
/// Accepts a slice or array literal of [`BindReferralEvent`] values, or any expression that can
/// be iterated by reference.
///
/// # Panics
///
/// * **Timeout**: the next expected event does not arrive within the timeout (default 5
///   seconds, configurable via `timeout = N`).
/// * **Wrong event**: the stream delivers a different event than the next expected one.
/// * **Wrong message type**: the stream yields a notification or an error instead.
/// * **Stream closed early**: the stream ends before all expected events arrive.
/// * **Empty sequence**: nothing was expected (use `assert_empty!` instead).
#[macro_export]
macro_rules! assert_event_sequence {
    ($stream: expr, [$($event:expr),+ $(,)?]) => {
        $crate::assert_event_sequence!($stream, &[$($event),+], timeout = 5)
    };
    ($stream: expr, [$($event:expr),+ $(,)?], timeout = $secs: expr) => {
        $crate::assert_event_sequence!($stream, &[$($event),+], timeout = $secs)
    };
    ($stream: expr, $events: expr) => {
        $crate::assert_event_sequence!($stream, $events, timeout = 5)
    };
    ($stream: expr, $events: expr, timeout = $secs: expr) => {
        let expected: std::vec::Vec<$crate::BindReferralEvent> =
            $events.iter().cloned().collect();
        if expected.is_empty() {
            panic!("error: assert_event_sequence! called with an empty collection. Use assert_empty! macro instead to check for no pending messages.")
        }
        $crate::test_utils::macros::assert_event_sequence(&mut $stream, &expected, $secs).await
    };
}

#[allow(clippy::missing_panics_doc)]
pub async fn assert_event_sequence<S: Stream<Item = ReferralScannerResult> + Unpin>(
    stream: &mut S,
    expected: &[BindReferralEvent],
    timeout_secs: u64,
) {
    let start = std::time::Instant::now();
    let timeout_duration = std::time::Duration::from_secs(timeout_secs);

    for (position, event) in expected.iter().enumerate() {
        let remaining = &expected[position + 1..];
        let time_left = timeout_duration.saturating_sub(start.elapsed());
        let message = tokio::time::timeout(time_left, tokio_stream::StreamExt::next(stream))
            .await
            .unwrap_or_else(|_| panic!("timed out waiting for event: {event:#?}"));

        match message {
            Some(Ok(ScannerMessage::Data(received))) => {
                assert_eq!(&received, event, "\nRemaining: {remaining:#?}\n");
            }
            Some(Ok(other)) => {
                panic!("Expected Message::Data, got: {other:#?}");
            }
            Some(Err(e)) => {
                panic!("Expected Ok(Message::Data), got Err: {e:#?}");
            }
            None => {
                panic!("Stream closed while still expecting: {:#?}", &expected[position..]);
            }
        }
    }
}
