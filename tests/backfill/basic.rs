use referral_scanner::{
    Notification, assert_event_sequence, assert_next, test_utils::referral_entry,
};

use crate::common::{OTHER_CONTRACT, PARENT, USER, entry, event, setup_scanner};

#[tokio::test]
async fn backfill_covers_the_lookback_window() -> anyhow::Result<()> {
    let setup = setup_scanner(1000, 100)?;
    setup.client.add_logs([
        entry(850, 0),
        entry(899, 3),
        entry(900, 0),
        entry(950, 2),
        entry(1000, 1),
    ]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_event_sequence!(stream, [event(900, 0), event(950, 2), event(1000, 1)]);
    assert_next!(stream, Notification::SwitchingToLive);

    let calls = setup.client.get_logs_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].block_range(), Some(900..=1000));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn window_is_clamped_at_genesis() -> anyhow::Result<()> {
    let setup = setup_scanner(50, 100)?;
    setup.client.add_logs([entry(0, 0), entry(50, 0)]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_event_sequence!(stream, [event(0, 0), event(50, 0)]);
    assert_next!(stream, Notification::SwitchingToLive);
    assert_eq!(setup.client.get_logs_calls()[0].block_range(), Some(0..=50));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn zero_window_replays_only_the_head_block() -> anyhow::Result<()> {
    let setup = setup_scanner(500, 0)?;
    setup.client.add_logs([entry(499, 0), entry(500, 4)]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_next!(stream, event(500, 4));
    assert_next!(stream, Notification::SwitchingToLive);
    assert_eq!(setup.client.get_logs_calls()[0].block_range(), Some(500..=500));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn empty_backfill_is_announced() -> anyhow::Result<()> {
    let setup = setup_scanner(1000, 100)?;

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn backfill_is_delivered_in_block_and_index_order() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    setup.client.add_logs([entry(40, 7), entry(12, 0), entry(40, 2), entry(12, 5), entry(99, 0)]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_event_sequence!(
        stream,
        [event(12, 0), event(12, 5), event(40, 2), event(40, 7), event(99, 0)]
    );
    assert_next!(stream, Notification::SwitchingToLive);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn logs_from_other_contracts_are_ignored() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    setup.client.add_logs([
        referral_entry(OTHER_CONTRACT, USER, PARENT, 60, 0),
        entry(61, 0),
    ]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_next!(stream, event(61, 0));
    assert_next!(stream, Notification::SwitchingToLive);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn undecodable_backfill_entries_are_skipped() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let mut malformed = entry(70, 0);
    malformed.topics.truncate(3);
    setup.client.add_logs([malformed, entry(71, 0)]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_next!(stream, event(71, 0));
    assert_next!(stream, Notification::SwitchingToLive);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn only_undecodable_backfill_counts_as_empty() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let mut malformed = entry(70, 0);
    let extra = malformed.topics[3];
    malformed.topics.push(extra);
    setup.client.add_logs([malformed]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);

    assert_next!(stream, Notification::NoPastEventsFound);
    assert_next!(stream, Notification::SwitchingToLive);

    handle.stop().await;
    Ok(())
}
