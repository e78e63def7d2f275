//! Cue points and the loop region
//!
//! Each deck carries an ordered list of named cue markers plus a single
//! loop region. Positions are in seconds of track time. The loop only
//! redirects playback while it is both enabled and armed; disabling it
//! also disarms it so a re-enable does not instantly jump the playhead.

/// A named position marker in the track.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CuePoint {
    pub name: String,
    /// Position in seconds.
    pub position: f64,
    /// Display color tag (e.g. "#FF5500").
    pub color: String,
}

/// The single loop region of a deck.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopRegion {
    pub enabled: bool,
    /// Whether the loop currently redirects playback.
    pub armed: bool,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds (exclusive).
    pub end: f64,
    /// Cached `end - start`.
    pub length: f64,
}

/// Cue markers and loop state for one deck.
#[derive(Debug, Default)]
pub struct CueBank {
    cues: Vec<CuePoint>,
    loop_region: LoopRegion,
}

impl CueBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cue marker.
    pub fn add(&mut self, name: impl Into<String>, position: f64, color: impl Into<String>) {
        self.cues.push(CuePoint {
            name: name.into(),
            position,
            color: color.into(),
        });
    }

    /// Remove the cue at `index`, compacting the list. Returns false if
    /// the index is out of range.
    pub fn remove(&mut self, index: usize) -> bool {
        if index >= self.cues.len() {
            return false;
        }
        self.cues.remove(index);
        true
    }

    pub fn get(&self, index: usize) -> Option<&CuePoint> {
        self.cues.get(index)
    }

    pub fn clear(&mut self) {
        self.cues.clear();
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn cues(&self) -> &[CuePoint] {
        &self.cues
    }

    /// The cue closest to `position` by absolute distance.
    pub fn find_nearest(&self, position: f64) -> Option<&CuePoint> {
        self.cues.iter().min_by(|a, b| {
            let da = (a.position - position).abs();
            let db = (b.position - position).abs();
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Configure the loop region. Requires `start < end`; an invalid
    /// region is ignored.
    pub fn set_loop(&mut self, start: f64, end: f64) {
        if start >= end {
            return;
        }
        self.loop_region.start = start;
        self.loop_region.end = end;
        self.loop_region.length = end - start;
        self.loop_region.enabled = true;
    }

    /// Enable or disable the loop. Disabling also disarms.
    pub fn enable_loop(&mut self, enabled: bool) {
        self.loop_region.enabled = enabled;
        if !enabled {
            self.loop_region.armed = false;
        }
    }

    /// Arm the loop so playback re-enters the start on crossing the end.
    /// Has no effect while the loop is disabled.
    pub fn arm_loop(&mut self) {
        if self.loop_region.enabled {
            self.loop_region.armed = true;
        }
    }

    /// Disarm the loop without disabling it; playback passes through the
    /// end point on the next crossing.
    pub fn disarm_loop(&mut self) {
        self.loop_region.armed = false;
    }

    /// Test whether `position` (seconds) crossed the loop end. Returns
    /// `(true, start)` when playback should jump, `(false, position)`
    /// otherwise.
    pub fn check_loop(&self, position: f64) -> (bool, f64) {
        if !self.loop_region.enabled || !self.loop_region.armed {
            return (false, position);
        }
        if position >= self.loop_region.end {
            return (true, self.loop_region.start);
        }
        (false, position)
    }

    pub fn loop_region(&self) -> &LoopRegion {
        &self.loop_region
    }
}
