use crate::{
    engine::{Sequence, Track},
    session::{LevelInput, MeterSettings},
    Result,
};
use anyhow::format_err;
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};
use structopt::StructOpt;

const CONFIG_FILE_NAME: &str = "config.toml";

/// Live audio level meters for the tracks of a sequence.
#[derive(StructOpt, Debug)]
pub struct Opt {
    /// How verbose should we be (normal = info, 1 = debug, 2+ = trace).
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    pub verbosity: u32,
    /// Location of the config file to load. Will try default locations otherwise (cwd and standard
    /// location).
    #[structopt(long = "config-file", parse(from_os_str))]
    pub config_file: Option<PathBuf>,
    /// Stop monitoring after this many seconds. Runs until killed otherwise.
    #[structopt(long = "duration")]
    pub duration: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Time between meter updates.
    pub tick_interval_ms: u64,
    /// How many ticks a peak stays on screen.
    pub peak_hold_ticks: u32,
    /// How to read the levels published by the engine.
    pub level_input: LevelInput,
    pub sequence_name: String,
    // the order of tracks matters.
    pub tracks: Vec<Track>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_interval_ms: 40,
            peak_hold_ticks: crate::meter::PEAK_HOLD_TICKS,
            level_input: LevelInput::Linear,
            sequence_name: "sequence".into(),
            tracks: vec![
                Track::new("V2", true),
                Track::new("V1", true),
                Track::new("A1", true),
                Track::new("A2", true),
            ],
        }
    }
}

impl Config {
    /// Loads the config, if there is one.
    ///
    /// The rules for finding a config file are:
    ///
    ///  - Look at the location given as a parameter (if given).
    ///  - Look in the current directory
    ///  - Look in the project config directory (as defined by `directories` crate)
    pub fn load(loc: Option<impl AsRef<Path>>) -> Result<Self> {
        // parameter
        if let Some(loc) = loc {
            let loc = loc.as_ref();
            // Break on all errors, including not found
            log::info!("using config at \"{}\"", loc.display());
            let conf_raw = fs::read(loc)?;
            return Self::from_slice(&conf_raw);
        }

        // current dir
        fn load_from_current() -> Result<Option<Config>> {
            let current_dir = match env::current_dir() {
                Ok(dir) => dir,
                Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let current_dir_path = current_dir.join(CONFIG_FILE_NAME);
            let conf_raw = match fs::read(&current_dir_path) {
                Ok(x) => x,
                Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            log::info!("using config at \"{}\"", current_dir_path.display());
            Ok(Some(Config::from_slice(&conf_raw)?))
        }
        if let Some(conf) = load_from_current()? {
            return Ok(conf);
        }

        // project dir
        let dirs = ProjectDirs::from("org", "derekdreery", "mixmeter")
            .ok_or_else(|| format_err!("could not load project directories"))?;
        let config_path = dirs.config_dir().join(CONFIG_FILE_NAME);
        match fs::read(&config_path) {
            Ok(conf_raw) => {
                log::info!("using config at \"{}\"", config_path.display());
                Self::from_slice(&conf_raw)
            }
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => {
                log::info!("no config found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and check a raw toml config.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let config: Config = toml::from_slice(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result {
        if self.tick_interval_ms == 0 {
            return Err(format_err!("tick_interval_ms must be greater than 0"));
        }
        if self.peak_hold_ticks == 0 {
            return Err(format_err!("peak_hold_ticks must be greater than 0"));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn settings(&self) -> MeterSettings {
        MeterSettings {
            tick_interval: self.tick_interval(),
            peak_hold_ticks: self.peak_hold_ticks,
            level_input: self.level_input,
        }
    }

    pub fn sequence(&self) -> Sequence {
        Sequence::new(self.sequence_name.clone(), self.tracks.clone())
    }
}
