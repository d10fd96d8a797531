//! Lyric timeline
//!
//! A timeline turns raw lyric text into line-change notifications as
//! playback moves. The orchestrator owns at most one, replacing it (after
//! stopping the old one) whenever the loaded track changes.

use tokio::sync::mpsc;

use crate::playback::events::PlayerInput;

/// One timed line
#[derive(Debug, Clone, PartialEq)]
pub struct LyricLine {
    /// Seconds from track start
    pub time: f64,
    pub text: String,
}

/// Where a timeline reports line changes
///
/// Tagged with the selection generation it was created under so changes
/// from a replaced timeline are ignored.
#[derive(Debug, Clone)]
pub struct LyricSink {
    tx: mpsc::UnboundedSender<PlayerInput>,
    generation: u64,
}

impl LyricSink {
    pub fn new(tx: mpsc::UnboundedSender<PlayerInput>, generation: u64) -> Self {
        Self { tx, generation }
    }

    pub fn line_changed(&self, line: usize, text: &str) {
        let _ = self.tx.send(PlayerInput::LyricLine {
            generation: self.generation,
            line,
            text: text.to_string(),
        });
    }
}

/// Line-indexed timed text
pub trait LyricTimeline: Send {
    /// Text of the first line, shown before playback reaches it
    fn first_line(&self) -> Option<String>;

    /// Begin following playback from the last known position
    fn start(&mut self);

    /// Stop following and forget the current line
    fn stop(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Jump to `position` seconds and keep following
    fn seek(&mut self, position: f64);

    /// Playback reached `position` seconds
    fn sync(&mut self, position: f64);
}

/// Builds a timeline for a track's lyric text
pub trait LyricTimelineFactory: Send {
    fn create(&self, lyric: &str, sink: LyricSink) -> Box<dyn LyricTimeline>;
}

/// Parse `[mm:ss.xx]text` lines
///
/// A line may carry several time tags. Tags that are not timestamps
/// (`[ar:...]`, `[ti:...]`) are ignored, as are lines with no timestamp.
/// Result is sorted by time.
pub fn parse_lrc(text: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        let mut rest = raw.trim();
        let mut times = Vec::new();
        while let Some(stripped) = rest.strip_prefix('[') {
            let Some((tag, after)) = stripped.split_once(']') else {
                break;
            };
            if let Some(time) = parse_timestamp(tag) {
                times.push(time);
            }
            rest = after;
        }
        let text = rest.trim();
        for time in times {
            lines.push(LyricLine {
                time,
                text: text.to_string(),
            });
        }
    }
    lines.sort_by(|a, b| a.time.total_cmp(&b.time));
    lines
}

fn parse_timestamp(tag: &str) -> Option<f64> {
    let (minutes, seconds) = tag.split_once(':')?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    let seconds: f64 = seconds.trim().parse().ok()?;
    if !seconds.is_finite() || seconds < 0.0 {
        return None;
    }
    Some(minutes as f64 * 60.0 + seconds)
}

/// [`LyricTimeline`] over parsed LRC text, driven by playback ticks
pub struct LrcTimeline {
    lines: Vec<LyricLine>,
    sink: LyricSink,
    following: bool,
    position: f64,
    current: Option<usize>,
}

impl LrcTimeline {
    pub fn new(lyric: &str, sink: LyricSink) -> Self {
        Self {
            lines: parse_lrc(lyric),
            sink,
            following: false,
            position: 0.0,
            current: None,
        }
    }

    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// Index of the last line at or before `position`
    fn line_at(&self, position: f64) -> Option<usize> {
        let after = self.lines.partition_point(|l| l.time <= position);
        after.checked_sub(1)
    }

    fn report(&mut self) {
        if !self.following {
            return;
        }
        let line = self.line_at(self.position);
        if line != self.current {
            self.current = line;
            if let Some(index) = line {
                self.sink.line_changed(index, &self.lines[index].text);
            }
        }
    }
}

impl LyricTimeline for LrcTimeline {
    fn first_line(&self) -> Option<String> {
        self.lines.first().map(|l| l.text.clone())
    }

    fn start(&mut self) {
        self.following = !self.lines.is_empty();
        self.report();
    }

    fn stop(&mut self) {
        self.following = false;
        self.current = None;
    }

    fn pause(&mut self) {
        self.following = false;
    }

    fn resume(&mut self) {
        self.start();
    }

    fn seek(&mut self, position: f64) {
        self.position = position.max(0.0);
        self.start();
    }

    fn sync(&mut self, position: f64) {
        self.position = position.max(0.0);
        self.report();
    }
}

/// Creates [`LrcTimeline`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct LrcTimelineFactory;

impl LyricTimelineFactory for LrcTimelineFactory {
    fn create(&self, lyric: &str, sink: LyricSink) -> Box<dyn LyricTimeline> {
        Box::new(LrcTimeline::new(lyric, sink))
    }
}
