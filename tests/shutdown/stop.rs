use std::time::Duration;

use referral_scanner::{
    ChainQueryError, Notification, ScannerError, assert_closed, assert_next,
};

use crate::common::{entry, event, setup_scanner};

#[tokio::test]
async fn stop_releases_the_subscription_and_ends_streams() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);
    assert_eq!(client.active_subscriptions(), 1);

    handle.stop().await;

    client.wait_for_release().await;
    assert_eq!(client.cancelled_subscriptions(), 1);
    assert_closed!(stream);
    Ok(())
}

#[tokio::test]
async fn entries_after_stop_are_not_delivered() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.emit_live(entry(101, 0));
    assert_next!(stream, event(101, 0));

    handle.stop().await;
    client.emit_live(entry(102, 0));

    assert_closed!(stream);
    Ok(())
}

#[tokio::test]
async fn stop_before_live_skips_the_subscription() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;
    client.add_logs([entry(95, 0)]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    handle.stop().await;

    assert_next!(stream, event(95, 0));
    assert_closed!(stream);
    assert!(client.subscribe_calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn stop_signal_interrupts_resubscription() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    for _ in 0..1_000 {
        client.fail_next_subscribe(ChainQueryError::Timeout);
    }
    client.emit_live_error(ChainQueryError::SubscriptionClosed);
    assert_next!(stream, Err(ScannerError::ChainQuery(ChainQueryError::SubscriptionClosed)));

    handle.stop_signal().cancel();
    tokio::time::timeout(Duration::from_secs(5), handle.join()).await?;

    assert_closed!(stream);
    assert_eq!(client.active_subscriptions(), 0);
    Ok(())
}

#[tokio::test]
async fn dropping_every_stream_ends_the_pipeline() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);
    drop(stream);

    client.emit_live(entry(101, 0));
    tokio::time::timeout(Duration::from_secs(5), handle.join()).await?;

    client.wait_for_release().await;
    assert_eq!(client.cancelled_subscriptions(), 1);
    Ok(())
}
