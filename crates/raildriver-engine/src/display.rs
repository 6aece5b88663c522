//! LED display and marquee engine
//!
//! Text of up to three positions is written straight to the display. Longer
//! text becomes a marquee that a background thread scrolls one position per
//! step through a three-wide window. The loader animation runs on the same
//! thread. Every write goes through the shared [`ReportWriter`], and the
//! display state lock is always taken before the writer's.

use crate::config::{SCROLL_STEP_MS, normalize_scroll_delay};
use crate::{EngineError, EngineResult, ReportWriter};
use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::{Mutex, MutexGuard};
use raildriver_protocol::segment::{LOADER_ANIMATION, encode_text, format_number};
use raildriver_protocol::{LED_DIGITS, LedFrame, Segment};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

const MARQUEE_THREAD: &str = "raildriver-marquee";

/// Blank positions in front of scrolling text, so it enters from the right.
const MARQUEE_LEAD_IN: usize = 2;

const LOADER_STEP_MS: u32 = 100;

const MARQUEE_EVENT_CAPACITY: usize = 64;

/// Something that can show short text.
pub trait Display {
    fn set_text(&self, text: &str) -> EngineResult<()>;

    fn set_number(&self, value: f64) -> EngineResult<()>;

    fn set_segments(&self, left: Segment, middle: Segment, right: Segment) -> EngineResult<()>;

    fn set_scroll_delay(&self, delay_ms: u32);

    /// Blank, idle, with the scroll delay it started with.
    fn reset(&self) -> EngineResult<()>;
}

/// Sent each time a marquee or loader finishes a pass, including passes
/// that repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarqueeEnded {
    pub repeating: bool,
    pub loader: bool,
}

/// A running marquee or loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarqueeState {
    codes: Vec<Segment>,
    offset: usize,
    repeat: bool,
    loader: bool,
}

impl MarqueeState {
    fn scrolling(codes: Vec<Segment>, repeat: bool) -> Self {
        let mut padded = vec![Segment::empty(); MARQUEE_LEAD_IN];
        padded.extend(codes);
        Self {
            codes: padded,
            offset: 0,
            repeat,
            loader: false,
        }
    }

    fn loader(repeat: bool) -> Self {
        Self {
            codes: LOADER_ANIMATION.to_vec(),
            offset: 0,
            repeat,
            loader: true,
        }
    }

    pub fn codes(&self) -> &[Segment] {
        &self.codes
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn repeat(&self) -> bool {
        self.repeat
    }

    pub fn is_loader(&self) -> bool {
        self.loader
    }

    /// What the display shows at the current offset. Text windows wrap to the
    /// start of the sequence; the loader lights one code on every digit.
    pub fn frame(&self) -> LedFrame {
        if self.loader {
            return LedFrame::uniform(self.codes.get(self.offset).copied().unwrap_or_default());
        }
        let window: Vec<Segment> = self
            .codes
            .iter()
            .copied()
            .cycle()
            .skip(self.offset)
            .take(LED_DIGITS)
            .collect();
        LedFrame::from_codes(&window)
    }

    /// Moves one position on. Returns `true` when that completed a pass; a
    /// repeating marquee is then back at offset 0. A finished non-repeating
    /// marquee stays put and never reports another pass.
    pub fn advance(&mut self) -> bool {
        if self.offset >= self.codes.len() {
            return false;
        }
        self.offset = self.offset.saturating_add(1);
        if self.offset < self.codes.len() {
            return false;
        }
        if self.repeat {
            self.offset = 0;
        }
        true
    }
}

#[derive(Debug, Default)]
struct DisplayState {
    marquee: Option<MarqueeState>,
    /// Last text shown through `set_text` or `set_marquee_text`.
    last_text: Option<String>,
}

struct DisplayShared {
    writer: Arc<ReportWriter>,
    state: Mutex<DisplayState>,
    attached: AtomicBool,
    /// Cuts the current pause short when a new marquee is installed.
    wake: AtomicBool,
    delay_ms: AtomicU32,
    /// One sender per `marquee_events` subscriber.
    subscribers: Mutex<Vec<Sender<MarqueeEnded>>>,
}

impl DisplayShared {
    /// Shows one marquee frame and returns how long to wait before the next.
    fn step(&self) -> u32 {
        let mut state = self.state.lock();
        self.wake.store(false, Ordering::Release);
        let delay = self.delay_ms.load(Ordering::Relaxed);

        let Some(marquee) = state.marquee.as_mut() else {
            return delay;
        };

        if let Err(e) = self.writer.write_led(marquee.frame()) {
            warn!(error = %e, "Marquee write failed");
        }

        let pause = if marquee.loader { LOADER_STEP_MS } else { delay };
        let repeating = marquee.repeat;
        let loader = marquee.loader;
        if marquee.advance() {
            if !repeating {
                state.marquee = None;
            }
            drop(state);
            self.notify(MarqueeEnded { repeating, loader });
        }
        pause
    }

    /// Offers `ended` to every subscriber without blocking. Subscribers whose
    /// receiver is gone are forgotten.
    fn notify(&self, ended: MarqueeEnded) {
        self.subscribers.lock().retain(|tx| match tx.try_send(ended) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                trace!("Marquee end notice dropped");
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    /// Sleeps in scroll-step slices until `ms` has passed, the display is
    /// detached, or a new marquee wakes it.
    fn pause(&self, ms: u32) {
        let slices = (ms / SCROLL_STEP_MS).max(1);
        for _ in 0..slices {
            if !self.attached.load(Ordering::Acquire) || self.wake.load(Ordering::Acquire) {
                return;
            }
            thread::sleep(Duration::from_millis(u64::from(SCROLL_STEP_MS)));
        }
    }
}

fn marquee_loop(shared: Arc<DisplayShared>) {
    debug!("Marquee thread started");
    while shared.attached.load(Ordering::Acquire) {
        let pause = shared.step();
        shared.pause(pause);
    }
    debug!("Marquee thread stopping");
}

/// The three-digit LED display.
pub struct LedDisplay {
    shared: Arc<DisplayShared>,
    initial_delay_ms: u32,
    scroller: Mutex<Option<JoinHandle<()>>>,
}

impl LedDisplay {
    /// Attaches to `writer` and starts the marquee thread.
    pub fn new(writer: Arc<ReportWriter>, scroll_delay_ms: u32) -> EngineResult<Self> {
        let initial_delay_ms = normalize_scroll_delay(scroll_delay_ms);
        let shared = Arc::new(DisplayShared {
            writer,
            state: Mutex::new(DisplayState::default()),
            attached: AtomicBool::new(true),
            wake: AtomicBool::new(false),
            delay_ms: AtomicU32::new(initial_delay_ms),
            subscribers: Mutex::new(Vec::new()),
        });

        let thread_shared = Arc::clone(&shared);
        let scroller = thread::Builder::new()
            .name(MARQUEE_THREAD.to_string())
            .spawn(move || marquee_loop(thread_shared))
            .map_err(|source| EngineError::ThreadSpawn {
                name: MARQUEE_THREAD,
                source,
            })?;

        Ok(Self {
            shared,
            initial_delay_ms,
            scroller: Mutex::new(Some(scroller)),
        })
    }

    fn attached_state(&self) -> EngineResult<MutexGuard<'_, DisplayState>> {
        let state = self.shared.state.lock();
        if !self.shared.attached.load(Ordering::Acquire) {
            return Err(EngineError::DisplayDetached);
        }
        Ok(state)
    }

    /// Stops any marquee and writes `frame`.
    fn write_static(&self, state: &mut DisplayState, frame: LedFrame) -> EngineResult<()> {
        state.marquee = None;
        self.shared.writer.write_led(frame)
    }

    fn show_codes(
        &self,
        state: &mut DisplayState,
        codes: Vec<Segment>,
        repeat: bool,
    ) -> EngineResult<()> {
        if codes.len() <= LED_DIGITS {
            return self.write_static(state, LedFrame::from_codes(&codes));
        }
        debug!(positions = codes.len(), repeat, "Starting marquee");
        state.marquee = Some(MarqueeState::scrolling(codes, repeat));
        self.shared.wake.store(true, Ordering::Release);
        Ok(())
    }

    fn show_text(&self, text: &str, repeat: bool) -> EngineResult<()> {
        let mut state = self.attached_state()?;
        if text.is_empty() {
            state.last_text = None;
            return self.write_static(&mut state, LedFrame::BLANK);
        }
        if state.last_text.as_deref() == Some(text) {
            return Ok(());
        }
        let result = self.show_codes(&mut state, encode_text(text), repeat);
        state.last_text = result.is_ok().then(|| text.to_owned());
        result
    }

    /// Shows `text`; longer than three positions, it scrolls and repeats.
    /// Repeating the previous text is a no-op, and empty text blanks the
    /// display.
    pub fn set_text(&self, text: &str) -> EngineResult<()> {
        self.show_text(text, true)
    }

    /// Like [`set_text`](Self::set_text) with a choice of repeating.
    pub fn set_marquee_text(&self, text: &str, repeat: bool) -> EngineResult<()> {
        self.show_text(text, repeat)
    }

    /// Shows raw codes, scrolling when there are more than three.
    pub fn set_marquee(&self, codes: &[Segment], repeat: bool) -> EngineResult<()> {
        let mut state = self.attached_state()?;
        state.last_text = None;
        self.show_codes(&mut state, codes.to_vec(), repeat)
    }

    pub fn set_number(&self, value: f64) -> EngineResult<()> {
        self.set_text(&format_number(value))
    }

    pub fn set_segments(&self, left: Segment, middle: Segment, right: Segment) -> EngineResult<()> {
        let mut state = self.attached_state()?;
        state.last_text = None;
        self.write_static(&mut state, LedFrame::new(left, middle, right))
    }

    /// Blanks every digit.
    pub fn clear(&self) -> EngineResult<()> {
        let mut state = self.attached_state()?;
        state.last_text = None;
        self.write_static(&mut state, LedFrame::BLANK)
    }

    /// Stops scrolling, leaving the current frame lit.
    pub fn clear_marquee(&self) {
        let mut state = self.shared.state.lock();
        state.marquee = None;
        state.last_text = None;
    }

    /// Runs the figure-eight loader. A no-op while a loader is already
    /// running.
    pub fn start_loader(&self, repeat: bool) -> EngineResult<()> {
        let mut state = self.attached_state()?;
        if state.marquee.as_ref().is_some_and(|m| m.loader) {
            return Ok(());
        }
        state.last_text = None;
        state.marquee = Some(MarqueeState::loader(repeat));
        self.shared.wake.store(true, Ordering::Release);
        Ok(())
    }

    /// Stops the loader, or any marquee, and blanks the display.
    pub fn end_loader(&self) -> EngineResult<()> {
        self.clear()
    }

    pub fn set_scroll_delay(&self, delay_ms: u32) {
        let delay = normalize_scroll_delay(delay_ms);
        self.shared.delay_ms.store(delay, Ordering::Relaxed);
        debug!(delay_ms = delay, "Scroll delay set");
    }

    pub fn scroll_delay(&self) -> u32 {
        self.shared.delay_ms.load(Ordering::Relaxed)
    }

    /// The active marquee or loader.
    pub fn marquee(&self) -> Option<MarqueeState> {
        self.shared.state.lock().marquee.clone()
    }

    pub fn is_scrolling(&self) -> bool {
        self.shared.state.lock().marquee.is_some()
    }

    /// Subscribes to end-of-pass notices from now on. Every subscriber gets
    /// its own queue; notices to a full queue are dropped.
    pub fn marquee_events(&self) -> Receiver<MarqueeEnded> {
        let (tx, rx) = channel::bounded(MARQUEE_EVENT_CAPACITY);
        self.shared.subscribers.lock().push(tx);
        rx
    }

    pub fn is_attached(&self) -> bool {
        self.shared.attached.load(Ordering::Acquire)
    }

    pub fn reset(&self) -> EngineResult<()> {
        let mut state = self.attached_state()?;
        state.last_text = None;
        self.shared
            .delay_ms
            .store(self.initial_delay_ms, Ordering::Relaxed);
        self.write_static(&mut state, LedFrame::BLANK)
    }

    /// Blanks the display, detaches and joins the marquee thread. Later
    /// writes fail with [`EngineError::DisplayDetached`].
    pub fn shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            if self.shared.attached.swap(false, Ordering::AcqRel) {
                state.marquee = None;
                state.last_text = None;
                if let Err(e) = self.shared.writer.write_led(LedFrame::BLANK) {
                    warn!(error = %e, "Failed to blank LED display");
                }
            }
        }

        if let Some(scroller) = self.scroller.lock().take() {
            match scroller.join() {
                Ok(()) => info!("Marquee thread stopped cleanly"),
                Err(_) => error!("Marquee thread panicked"),
            }
        }
    }
}

impl Display for LedDisplay {
    fn set_text(&self, text: &str) -> EngineResult<()> {
        LedDisplay::set_text(self, text)
    }

    fn set_number(&self, value: f64) -> EngineResult<()> {
        LedDisplay::set_number(self, value)
    }

    fn set_segments(&self, left: Segment, middle: Segment, right: Segment) -> EngineResult<()> {
        LedDisplay::set_segments(self, left, middle, right)
    }

    fn set_scroll_delay(&self, delay_ms: u32) {
        LedDisplay::set_scroll_delay(self, delay_ms);
    }

    fn reset(&self) -> EngineResult<()> {
        LedDisplay::reset(self)
    }
}

impl Drop for LedDisplay {
    fn drop(&mut self) {
        if self.is_attached() {
            debug!("LED display dropped while attached - shutting down");
        }
        self.shutdown();
    }
}
