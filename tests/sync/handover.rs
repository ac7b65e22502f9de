use referral_scanner::{Notification, assert_event_sequence, assert_next};

use crate::common::{entry, event, setup_scanner};

#[tokio::test]
async fn head_block_overlap_is_delivered_once() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;
    client.add_logs([entry(99, 0), entry(100, 0), entry(100, 1)]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_event_sequence!(stream, [event(99, 0), event(100, 0), event(100, 1)]);
    assert_next!(stream, Notification::SwitchingToLive);

    // the live stream repeats the head block the backfill already covered
    client.push_live(entry(100, 0));
    client.push_live(entry(100, 1));
    client.emit_live(entry(100, 2));
    client.emit_live(entry(101, 0));

    assert_event_sequence!(stream, [event(100, 2), event(101, 0)]);

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn blocks_mined_during_startup_are_caught_up() -> anyhow::Result<()> {
    let setup = setup_scanner(100, 100)?;
    let client = setup.client;
    client.add_logs([entry(100, 0)]);

    let handle = setup.scanner.start().await?;
    // the pipeline task has not subscribed yet
    client.add_logs([entry(101, 0), entry(102, 0)]);
    client.set_head(102);

    let mut stream = setup.subscription.stream(&handle);
    assert_event_sequence!(stream, [event(100, 0), event(101, 0), event(102, 0)]);
    assert_next!(stream, Notification::SwitchingToLive);

    let calls = client.get_logs_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].block_range(), Some(101..=102));

    // the node also pushes the caught-up blocks once subscribed
    client.push_live(entry(101, 0));
    client.push_live(entry(102, 0));
    client.emit_live(entry(103, 0));
    assert_next!(stream, event(103, 0));

    handle.stop().await;
    Ok(())
}

#[tokio::test]
async fn delivery_order_never_goes_backwards() -> anyhow::Result<()> {
    let setup = setup_scanner(20, 10)?;
    let client = setup.client;
    client.add_logs([entry(12, 0), entry(20, 0)]);

    let handle = setup.scanner.start().await?;
    let mut stream = setup.subscription.stream(&handle);
    assert_event_sequence!(stream, [event(12, 0), event(20, 0)]);
    assert_next!(stream, Notification::SwitchingToLive);

    client.push_live(entry(15, 0));
    client.push_live(entry(19, 4));
    client.emit_live(entry(20, 1));
    client.emit_live(entry(21, 0));

    assert_event_sequence!(stream, [event(20, 1), event(21, 0)]);

    handle.stop().await;
    Ok(())
}
