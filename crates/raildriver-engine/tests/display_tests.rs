//! LED display behaviour against a mock transport.

use raildriver_engine::{Display, EngineError, LedDisplay, MarqueeEnded, ReportWriter};
use raildriver_hid_common::HidDeviceInfo;
use raildriver_hid_common::mock::MockHidTransport;
use raildriver_protocol::{LED_COMMAND, Segment};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn setup() -> Result<(MockHidTransport, LedDisplay), EngineError> {
    let device = MockHidTransport::new(
        HidDeviceInfo::new(0x05F3, 0x00D2, "mock").with_report_lengths(15, 9),
    );
    let writer = Arc::new(ReportWriter::new(Arc::new(device.clone())));
    let display = LedDisplay::new(writer, 100)?;
    Ok((device, display))
}

/// LED frames written so far as `[left, center, right]`.
fn frames(device: &MockHidTransport) -> Vec<[u8; 3]> {
    device
        .get_write_history()
        .iter()
        .filter(|r| r.get(1) == Some(&LED_COMMAND))
        .filter_map(|r| Some([*r.get(4)?, *r.get(3)?, *r.get(2)?]))
        .collect()
}

fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(3);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

const H: u8 = 0x76;
const I: u8 = 0x30;

#[test]
fn test_short_text_is_static() -> TestResult {
    let (device, display) = setup()?;
    display.set_text("hi")?;
    assert_eq!(frames(&device), vec![[H, I, 0]]);
    assert!(!display.is_scrolling());
    Ok(())
}

#[test]
fn test_repeated_text_is_written_once() -> TestResult {
    let (device, display) = setup()?;
    display.set_text("hi")?;
    display.set_text("hi")?;
    assert_eq!(frames(&device).len(), 1);

    display.set_text("")?;
    display.set_text("hi")?;
    assert_eq!(frames(&device), vec![[H, I, 0], [0, 0, 0], [H, I, 0]]);
    Ok(())
}

#[test]
fn test_number_folds_dot() -> TestResult {
    let (device, display) = setup()?;
    display.set_number(5.25)?;
    assert_eq!(frames(&device), vec![[0x00, 0xED, 0x4F]]);

    display.set_number(f64::NAN)?;
    assert!(!display.is_scrolling());
    assert_eq!(frames(&device).len(), 2);
    Ok(())
}

#[test]
fn test_long_text_scrolls_with_repeat() -> TestResult {
    let (_device, display) = setup()?;
    display.set_text("abcd")?;
    let marquee = display.marquee().ok_or("no marquee")?;
    assert!(marquee.repeat());
    assert!(!marquee.is_loader());
    assert_eq!(marquee.codes().len(), 6);
    assert_eq!(marquee.codes().get(..2), Some(&[Segment::empty(); 2][..]));
    Ok(())
}

#[test]
fn test_marquee_without_repeat_ends_once() -> TestResult {
    let (device, display) = setup()?;
    let events = display.marquee_events();
    display.set_marquee_text("hello", false)?;

    let ended = events.recv_timeout(Duration::from_secs(3))?;
    assert_eq!(
        ended,
        MarqueeEnded {
            repeating: false,
            loader: false
        }
    );
    assert!(wait_until(|| !display.is_scrolling()));
    assert!(events.recv_timeout(Duration::from_millis(300)).is_err());

    // Two blanks of lead-in plus five letters, one frame each.
    let written = frames(&device);
    assert_eq!(written.len(), 7);
    assert_eq!(written.first(), Some(&[0, 0, H]));
    Ok(())
}

#[test]
fn test_repeating_marquee_notifies_every_pass() -> TestResult {
    let (_device, display) = setup()?;
    let events = display.marquee_events();
    display.set_marquee(
        &[Segment::TOP, Segment::MIDDLE, Segment::BOTTOM, Segment::TOP],
        true,
    )?;

    for _ in 0..2 {
        let ended = events.recv_timeout(Duration::from_secs(3))?;
        assert!(ended.repeating);
    }
    assert!(display.is_scrolling());
    Ok(())
}

#[test]
fn test_each_listener_hears_marquee_end() -> TestResult {
    let (_device, display) = setup()?;
    let first = display.marquee_events();
    let second = display.marquee_events();
    display.set_marquee_text("abcd", false)?;

    assert!(!first.recv_timeout(Duration::from_secs(3))?.repeating);
    assert!(!second.recv_timeout(Duration::from_secs(3))?.repeating);

    // A listener that arrives later only hears later passes.
    let late = display.marquee_events();
    assert!(late.recv_timeout(Duration::from_millis(300)).is_err());
    Ok(())
}

#[test]
fn test_static_write_stops_marquee() -> TestResult {
    let (device, display) = setup()?;
    display.set_text("abcdef")?;
    assert!(display.is_scrolling());

    display.set_segments(Segment::TOP, Segment::MIDDLE, Segment::BOTTOM)?;
    assert!(!display.is_scrolling());
    assert_eq!(frames(&device).last(), Some(&[0x01, 0x40, 0x08]));
    Ok(())
}

#[test]
fn test_clear_marquee_allows_same_text_again() -> TestResult {
    let (_device, display) = setup()?;
    display.set_text("abcdef")?;
    display.clear_marquee();
    assert!(!display.is_scrolling());

    display.set_text("abcdef")?;
    assert!(display.is_scrolling());
    Ok(())
}

#[test]
fn test_loader_runs_and_ends_blank() -> TestResult {
    let (device, display) = setup()?;
    display.start_loader(true)?;
    assert!(display.marquee().is_some_and(|m| m.is_loader()));

    assert!(wait_until(|| frames(&device).len() >= 2));
    for [left, center, right] in frames(&device) {
        assert_eq!(left, center);
        assert_eq!(center, right);
        assert_ne!(left, 0);
    }

    display.end_loader()?;
    assert!(!display.is_scrolling());
    assert_eq!(frames(&device).last(), Some(&[0, 0, 0]));
    Ok(())
}

#[test]
fn test_scroll_delay_and_reset() -> TestResult {
    let (device, display) = setup()?;
    display.set_scroll_delay(250);
    assert_eq!(display.scroll_delay(), 200);
    display.set_scroll_delay(20);
    assert_eq!(display.scroll_delay(), 100);

    display.set_text("abcdef")?;
    display.set_scroll_delay(700);
    display.reset()?;
    assert_eq!(display.scroll_delay(), 100);
    assert!(!display.is_scrolling());
    assert_eq!(frames(&device).last(), Some(&[0, 0, 0]));
    Ok(())
}

#[test]
fn test_marquee_survives_write_failures() -> TestResult {
    let (device, display) = setup()?;
    device.set_fail_writes(true);
    display.set_marquee_text("abcdef", true)?;
    thread::sleep(Duration::from_millis(250));
    assert!(frames(&device).is_empty());

    device.set_fail_writes(false);
    assert!(wait_until(|| !frames(&device).is_empty()));
    Ok(())
}

#[test]
fn test_shutdown_blanks_and_detaches() -> TestResult {
    let (device, display) = setup()?;
    display.set_marquee_text("railway", true)?;
    assert!(wait_until(|| !frames(&device).is_empty()));

    display.shutdown();
    assert!(!display.is_attached());
    assert_eq!(frames(&device).last(), Some(&[0, 0, 0]));

    let written = frames(&device).len();
    thread::sleep(Duration::from_millis(300));
    assert_eq!(frames(&device).len(), written);
    assert!(matches!(
        display.set_text("hi"),
        Err(EngineError::DisplayDetached)
    ));
    display.shutdown();
    Ok(())
}

#[test]
fn test_usable_through_trait_object() -> TestResult {
    let (device, display) = setup()?;
    let display: &dyn Display = &display;
    display.set_segments(Segment::FULL, Segment::empty(), Segment::DOT)?;
    display.set_scroll_delay(400);
    display.reset()?;
    assert_eq!(frames(&device), vec![[0x7F, 0x00, 0x80], [0, 0, 0]]);
    Ok(())
}
