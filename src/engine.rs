//! The media engine as seen by the monitor.
//!
//! The engine owns the tracks of the sequence being edited. It can attach a level meter to the
//! master bus or to a track, and the attached meter publishes the current left and right levels
//! as string properties that can be read at any time.
use fnv::FnvHashMap as HashMap;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Property holding the left channel level.
pub const LEFT_CHANNEL: &str = "_audio_level.0";
/// Property holding the right channel level.
pub const RIGHT_CHANNEL: &str = "_audio_level.1";

/// What a level meter is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Master,
    /// Index into `Sequence::tracks`.
    Track(usize),
}

/// An attached level meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeterHandle(u64);

impl MeterHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// A source of audio levels.
///
/// Implementations are shared between the monitor and whatever produces the levels, so all
/// methods take `&self`.
pub trait LevelEngine: Send + Sync {
    /// Whether this engine can attach level meters at all.
    fn level_meter_available(&self) -> bool;

    fn attach_level_meter(&self, target: Target) -> MeterHandle;

    fn detach_level_meter(&self, handle: MeterHandle);

    /// Read a property of an attached meter. `None` if it has not been set.
    fn property(&self, handle: MeterHandle, name: &str) -> Option<String>;
}

/// Read a channel level. `None` if the property is missing or is not a finite number.
pub fn read_level(engine: &dyn LevelEngine, handle: MeterHandle, property: &str) -> Option<f64> {
    engine
        .property(handle, property)
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|level| level.is_finite())
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct Track {
    pub name: String,
    /// Hidden and locked tracks are not editable, and get no meter.
    #[serde(default = "default_editable")]
    pub editable: bool,
}

fn default_editable() -> bool {
    true
}

impl Track {
    pub fn new(name: impl Into<String>, editable: bool) -> Self {
        Track {
            name: name.into(),
            editable,
        }
    }
}

/// The tracks of the sequence being edited, in order. The master bus is implicit.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    pub name: String,
    pub tracks: Vec<Track>,
}

impl Sequence {
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        Sequence {
            name: name.into(),
            tracks,
        }
    }

    /// Editable tracks with their index in `tracks`.
    pub fn editable_tracks(&self) -> impl Iterator<Item = (usize, &Track)> {
        self.tracks.iter().enumerate().filter(|(_, t)| t.editable)
    }
}

/// An in-process engine that keeps meter properties in memory.
///
/// Levels are written with [`PropertyEngine::set_property`] (or the `set_levels` shorthand) by
/// whatever is producing them, and read back by the monitor.
#[derive(Debug)]
pub struct PropertyEngine {
    available: AtomicBool,
    next_id: AtomicU64,
    meters: Mutex<HashMap<MeterHandle, AttachedMeter>>,
}

#[derive(Debug)]
struct AttachedMeter {
    target: Target,
    properties: HashMap<String, String>,
}

impl Default for PropertyEngine {
    fn default() -> Self {
        PropertyEngine::new()
    }
}

impl PropertyEngine {
    pub fn new() -> Self {
        PropertyEngine {
            available: AtomicBool::new(true),
            next_id: AtomicU64::new(0),
            meters: Mutex::new(HashMap::default()),
        }
    }

    /// An engine built without the level meter, for exercising the fallback path.
    pub fn without_level_meter() -> Self {
        let engine = Self::new();
        engine.available.store(false, Ordering::Relaxed);
        engine
    }

    /// Set a property on an attached meter. Returns `false` if the handle is not attached.
    pub fn set_property(&self, handle: MeterHandle, name: &str, value: impl Into<String>) -> bool {
        match self.meters.lock().get_mut(&handle) {
            Some(meter) => {
                meter.properties.insert(name.to_owned(), value.into());
                true
            }
            None => false,
        }
    }

    /// Publish both channel levels of the meter on `target`, if one is attached.
    pub fn set_levels(&self, target: Target, left: f64, right: f64) -> bool {
        let mut meters = self.meters.lock();
        let meter = match meters.values_mut().find(|m| m.target == target) {
            Some(m) => m,
            None => return false,
        };
        meter
            .properties
            .insert(LEFT_CHANNEL.to_owned(), left.to_string());
        meter
            .properties
            .insert(RIGHT_CHANNEL.to_owned(), right.to_string());
        true
    }

    /// Number of meters currently attached.
    pub fn attached(&self) -> usize {
        self.meters.lock().len()
    }

    /// Targets that currently have a meter attached.
    pub fn attached_targets(&self) -> Vec<Target> {
        self.meters.lock().values().map(|m| m.target).collect()
    }
}

impl LevelEngine for PropertyEngine {
    fn level_meter_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    fn attach_level_meter(&self, target: Target) -> MeterHandle {
        let handle = MeterHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        log::trace!("attaching level meter {} to {:?}", handle.0, target);
        self.meters.lock().insert(
            handle,
            AttachedMeter {
                target,
                properties: HashMap::default(),
            },
        );
        handle
    }

    fn detach_level_meter(&self, handle: MeterHandle) {
        if self.meters.lock().remove(&handle).is_none() {
            log::warn!("level meter {} was not attached", handle.0);
        }
    }

    fn property(&self, handle: MeterHandle, name: &str) -> Option<String> {
        self.meters
            .lock()
            .get(&handle)
            .and_then(|m| m.properties.get(name).cloned())
    }
}
