use referral_scanner::{
    Notification, assert_empty, assert_event_sequence, assert_next, test_utils::referral_entry,
};

use crate::common::{OTHER_CONTRACT, PARENT, USER, entry, event, setup_scanner};

#[tokio::test]
async fn live_events_are_streamed() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.emit_live(entry(101, 0));
    client.emit_live(entry(102, 0));
    client.emit_live(entry(102, 1));

    assert_event_sequence!(stream, [event(101, 0), event(102, 0), event(102, 1)]);

    let subscriptions = client.subscribe_calls();
    assert_eq!(subscriptions.len(), 1);
    assert!(subscriptions[0].is_live());

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn replayed_live_entries_are_dropped() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.emit_live(entry(101, 0));
    client.push_live(entry(101, 0));
    client.push_live(entry(101, 0));
    client.emit_live(entry(102, 0));

    assert_event_sequence!(stream, [event(101, 0), event(102, 0)]);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn late_entries_from_older_blocks_are_dropped() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.emit_live(entry(105, 0));
    client.push_live(entry(103, 0));
    client.emit_live(entry(105, 1));
    client.emit_live(entry(106, 0));

    assert_event_sequence!(stream, [event(105, 0), event(105, 1), event(106, 0)]);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn undecodable_live_entries_are_skipped() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    let mut malformed = entry(101, 0);
    malformed.topics.truncate(2);
    client.emit_live(malformed);
    client.emit_live(entry(101, 1));

    assert_next!(stream, event(101, 1));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn other_contracts_are_not_streamed() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    client.emit_live(referral_entry(OTHER_CONTRACT, USER, PARENT, 101, 0));
    client.emit_live(entry(102, 0));

    assert_next!(stream, event(102, 0));
    let _stream = assert_empty!(stream);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn every_subscriber_receives_every_item() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;
    let mut scanner = setup.scanner;
    client.add_logs([entry(90, 0)]);
    let second = scanner.subscribe();

    let handle = scanner.start().await?;
    let mut first = setup.subscription.stream(&handle);
    let mut second = second.stream(&handle);

    for stream in [&mut first, &mut second] {
        assert_next!(*stream, event(90, 0));
        assert_next!(*stream, Notification::SwitchingToLive);
    }

    client.emit_live(entry(101, 0));

    assert_next!(first, event(101, 0));
    assert_next!(second, event(101, 0));

    handle.stop().await;
    Ok(())
}
