use referral_scanner::{
    ChainQueryError, Notification, ScannerError, assert_event_sequence, assert_next,
    test_utils::MockChainClient,
};

use crate::common::{builder, entry, event, setup_scanner};

#[tokio::test]
async fn subscription_error_is_reported_and_recovered() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.emit_live(entry(101, 0));
    assert_next!(stream, event(101, 0));

    // mined while the connection is down
    client.add_logs([entry(104, 0), entry(105, 2)]);
    client.set_head(105);
    client.emit_live_error(ChainQueryError::SubscriptionClosed);

    assert_next!(stream, Err(ScannerError::ChainQuery(ChainQueryError::SubscriptionClosed)));
    assert_event_sequence!(stream, [event(104, 0), event(105, 2)]);
    assert_next!(stream, Notification::Resubscribed);

    client.emit_live(entry(106, 0));
    assert_next!(stream, event(106, 0));

    assert_eq!(client.subscribe_calls().len(), 2);
    assert_eq!(client.cancelled_subscriptions(), 1);
    assert_eq!(client.active_subscriptions(), 1);
    assert_eq!(client.get_logs_calls()[1].block_range(), Some(101..=105));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn ended_subscription_is_reopened() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.add_logs([entry(103, 0)]);
    client.set_head(103);
    client.close_live();

    assert_next!(stream, event(103, 0));
    assert_next!(stream, Notification::Resubscribed);
    assert_eq!(client.subscribe_calls().len(), 2);
    assert_eq!(client.cancelled_subscriptions(), 1);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn entries_replayed_after_resubscribing_are_dropped() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.emit_live(entry(101, 0));
    assert_next!(stream, event(101, 0));

    client.add_logs([entry(102, 0)]);
    client.set_head(102);
    client.close_live();
    assert_next!(stream, event(102, 0));
    assert_next!(stream, Notification::Resubscribed);

    // a reconnecting node may resend logs the catch-up already covered
    client.push_live(entry(101, 0));
    client.push_live(entry(102, 0));
    client.emit_live(entry(103, 0));

    assert_next!(stream, event(103, 0));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn lag_triggers_catch_up_without_resubscribing() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.add_logs([entry(104, 1)]);
    client.set_head(104);
    client.emit_live_error(ChainQueryError::Lagged(3));

    assert_next!(stream, Err(ScannerError::ChainQuery(ChainQueryError::Lagged(3))));
    assert_next!(stream, event(104, 1));

    client.emit_live(entry(105, 0));
    assert_next!(stream, event(105, 0));

    assert_eq!(client.subscribe_calls().len(), 1);
    assert_eq!(client.cancelled_subscriptions(), 0);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn failed_subscribe_attempts_are_retried() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;
    client.fail_next_subscribe(ChainQueryError::Timeout);
    client.fail_next_subscribe(ChainQueryError::SubscriptionClosed);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);
    assert_eq!(client.subscribe_calls().len(), 1);

    client.emit_live(entry(101, 0));
    assert_next!(stream, event(101, 0));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn failed_catch_up_releases_the_new_subscription_and_retries() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.add_logs([entry(105, 0)]);
    client.set_head(105);
    client.fail_next_get_logs(ChainQueryError::Timeout);
    client.emit_live_error(ChainQueryError::SubscriptionClosed);

    assert_next!(stream, Err(ScannerError::ChainQuery(ChainQueryError::SubscriptionClosed)));
    assert_next!(stream, event(105, 0));
    assert_next!(stream, Notification::Resubscribed);

    assert_eq!(client.subscribe_calls().len(), 3);
    assert_eq!(client.cancelled_subscriptions(), 2);
    assert_eq!(client.active_subscriptions(), 1);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn disabled_catch_up_only_resubscribes() -> anyhow::Result<()> {
    let client = MockChainClient::new(100);
    let mut scanner = builder(100).catch_up(false).connect(client.clone())?;
    let subscription = scanner.subscribe();

    let handle = scanner.start().await?;
    let mut stream = subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.add_logs([entry(103, 0)]);
    client.set_head(103);
    client.close_live();
    assert_next!(stream, Notification::Resubscribed);

    client.emit_live(entry(104, 0));
    assert_next!(stream, event(104, 0));
    assert_eq!(client.get_logs_calls().len(), 1);

    handle.stop().await;
    Ok(())
}
