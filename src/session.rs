//! The monitor session: attaches level meters to a sequence and updates the meter strips once per
//! tick.
use crate::{
    controls::GainControl,
    engine::{read_level, LevelEngine, MeterHandle, Sequence, Target, LEFT_CHANNEL, RIGHT_CHANNEL},
    meter::{MeterStrip, PEAK_HOLD_TICKS},
    monitor_data::MonitorData,
    scale::iec_scale,
};
use im::Vector;
use itertools::izip;
use serde::Deserialize;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};

const MASTER_NAME: &str = "Master";

/// How levels read from the engine map onto the meter.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LevelInput {
    /// The engine already publishes meter positions in `0..=1`.
    Linear,
    /// The engine publishes decibels, which go through the IEC curve.
    Decibels,
}

impl LevelInput {
    pub fn to_meter(self, reading: f64) -> f64 {
        match self {
            LevelInput::Linear => reading,
            LevelInput::Decibels => iec_scale(reading),
        }
    }

    /// Meter position for a raw engine reading. Missing readings are silence in either mode.
    fn position(self, reading: Option<f64>) -> f64 {
        reading.map_or(0.0, |r| self.to_meter(r))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSettings {
    /// Expected time between ticks. Only used to warn about slow ticks.
    pub tick_interval: Duration,
    pub peak_hold_ticks: u32,
    pub level_input: LevelInput,
}

impl Default for MeterSettings {
    fn default() -> Self {
        MeterSettings {
            tick_interval: Duration::from_millis(40),
            peak_hold_ticks: PEAK_HOLD_TICKS,
            level_input: LevelInput::Linear,
        }
    }
}

/// An immutable copy of every strip, taken after a tick, for the renderer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Number of ticks since the session was opened.
    pub tick: u64,
    pub strips: Vector<MeterStrip>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
}

/// Level monitoring for one sequence at a time.
///
/// Strip 0 is always the master bus, followed by the editable tracks in sequence order.
pub struct MonitorSession<E: LevelEngine> {
    engine: Arc<E>,
    settings: MeterSettings,
    available: bool,
    state: State,
    handles: Vec<MeterHandle>,
    strips: Vec<MeterStrip>,
    controls: Vec<GainControl>,
    ticks: u64,
    snapshots: MonitorData<Snapshot>,
}

impl<E: LevelEngine> MonitorSession<E> {
    pub fn new(engine: Arc<E>, settings: MeterSettings) -> Self {
        let available = engine.level_meter_available();
        if available {
            log::info!("audio level monitoring available");
        } else {
            log::warn!("audio level meter not available, monitoring disabled");
        }
        MonitorSession {
            engine,
            settings,
            available,
            state: State::Closed,
            handles: vec![],
            strips: vec![],
            controls: vec![],
            ticks: 0,
            snapshots: MonitorData::new(Snapshot::default()),
        }
    }

    /// Whether the engine can meter levels. Checked once, when the session is created.
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn is_open(&self) -> bool {
        self.state == State::Open
    }

    /// Attach a level meter to the master bus and to each editable track of `sequence`.
    ///
    /// Does nothing if the session is already open, or if monitoring is not available.
    pub fn open(&mut self, sequence: &Sequence) {
        if self.is_open() {
            log::debug!("monitor already open, ignoring open for \"{}\"", sequence.name);
            return;
        }
        if !self.available {
            log::warn!("cannot open monitor for \"{}\": no level meter", sequence.name);
            return;
        }

        let hold = self.settings.peak_hold_ticks;
        let master = self.engine.attach_level_meter(Target::Master);
        self.handles.push(master);
        self.strips.push(MeterStrip::new(0, MASTER_NAME, hold));
        self.controls.push(GainControl::new(MASTER_NAME));

        for (track_idx, track) in sequence.editable_tracks() {
            let handle = self.engine.attach_level_meter(Target::Track(track_idx));
            let name: Arc<str> = track.name.as_str().into();
            self.handles.push(handle);
            self.strips
                .push(MeterStrip::new(self.strips.len(), name.clone(), hold));
            self.controls.push(GainControl::new(name));
        }

        self.ticks = 0;
        self.state = State::Open;
        log::info!(
            "monitoring \"{}\": master + {} tracks",
            sequence.name,
            self.strips.len() - 1
        );
        self.publish();
    }

    /// Read the current levels of every strip and advance the meters by one tick.
    ///
    /// # Panics
    ///
    /// Panics if the session is not open.
    pub fn tick(&mut self) {
        assert!(self.is_open(), "tick() called on a closed monitor session");
        let started = Instant::now();
        let engine: &E = &self.engine;
        let input = self.settings.level_input;

        for (handle, strip) in izip!(&self.handles, &mut self.strips) {
            let left = input.position(read_level(engine, *handle, LEFT_CHANNEL));
            let right = input.position(read_level(engine, *handle, RIGHT_CHANNEL));
            log::trace!("{}: {:.3} {:.3}", strip.name(), left, right);
            strip.update(left, right);
        }
        self.ticks += 1;
        self.publish();

        let elapsed = started.elapsed();
        if elapsed > self.settings.tick_interval {
            log::warn!(
                "tick {} took {:?}, longer than the {:?} interval",
                self.ticks,
                elapsed,
                self.settings.tick_interval
            );
        }
    }

    /// Detach all level meters and drop the strips. Returns how many meters were detached.
    ///
    /// Safe to call when the session is already closed.
    pub fn close(&mut self) -> usize {
        if !self.is_open() {
            return 0;
        }
        // stop reading before anything is detached
        self.state = State::Closed;
        let detached = self.handles.len();
        for handle in self.handles.drain(..) {
            self.engine.detach_level_meter(handle);
        }
        self.strips.clear();
        self.controls.clear();
        log::info!("monitor closed, detached {} level meters", detached);
        // the renderer must not be left showing open strips
        let snapshot = self.snapshot();
        self.snapshots.replace(move |s| *s = snapshot);
        detached
    }

    pub fn strips(&self) -> &[MeterStrip] {
        &self.strips
    }

    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn strip(&self, idx: usize) -> &MeterStrip {
        &self.strips[idx]
    }

    pub fn controls(&self) -> &[GainControl] {
        &self.controls
    }

    /// # Panics
    ///
    /// Panics if `idx` is out of range.
    pub fn control_mut(&mut self, idx: usize) -> &mut GainControl {
        &mut self.controls[idx]
    }

    /// Ticks since the session was last opened.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn settings(&self) -> &MeterSettings {
        &self.settings
    }

    pub fn engine(&self) -> &Arc<E> {
        &self.engine
    }

    /// Copy the current state of every strip.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.ticks,
            strips: self.strips.iter().cloned().collect(),
        }
    }

    /// The cell the session publishes a snapshot to after every tick.
    pub fn snapshots(&self) -> MonitorData<Snapshot> {
        self.snapshots.clone()
    }

    fn publish(&self) {
        let snapshot = self.snapshot();
        if !self.snapshots.update(move |s| *s = snapshot) {
            log::trace!("renderer busy, skipped snapshot for tick {}", self.ticks);
        }
    }
}

impl<E: LevelEngine> Drop for MonitorSession<E> {
    fn drop(&mut self) {
        if self.is_open() {
            log::debug!("monitor session dropped while open");
            self.close();
        }
    }
}
