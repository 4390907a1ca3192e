pub mod cli;
pub mod controls;
pub mod engine;
pub mod feed;
pub mod meter;
mod monitor_data;
pub mod render;
pub mod scale;
pub mod session;

use crossbeam_channel as channel;
use std::{io, sync::Arc, thread, time::Duration};

pub use crate::{
    monitor_data::MonitorData,
    session::{LevelInput, MeterSettings, MonitorSession, Snapshot},
};
use crate::{
    cli::{Config, Opt},
    engine::{LevelEngine, PropertyEngine},
    feed::SignalFeed,
    render::{Painter, RenderPlan, TextPainter},
};

pub type Result<T = (), E = anyhow::Error> = std::result::Result<T, E>;

/// Main programm runner.
///
/// Ticks the meters at the configured rate on this thread and paints them on a second one, until
/// the requested duration is up.
pub fn run_monitor(config: Arc<Config>, opts: Opt) -> Result {
    let engine = Arc::new(PropertyEngine::new());
    if !engine.level_meter_available() {
        return Err(anyhow::format_err!("audio level meters are not available"));
    }
    let sequence = config.sequence();

    let mut session = MonitorSession::new(engine.clone(), config.settings());
    let snapshots = session.snapshots();
    session.open(&sequence);
    let mut feed = SignalFeed::new(engine);

    let render_handle = {
        let snapshots = snapshots.clone();
        thread::spawn(move || {
            let stdout = io::stdout();
            let mut painter = TextPainter::new(stdout.lock());
            snapshots.on_changed(|snapshot| {
                if let Err(e) = painter.paint(&RenderPlan::new(snapshot)) {
                    log::error!("could not draw meters: {}", e);
                }
            });
        })
    };

    // holds at most one pending tick, so a slow tick drops the next rather than piling up
    let ticker = channel::tick(config.tick_interval());
    let deadline = match opts.duration {
        Some(secs) => channel::after(Duration::from_secs(secs)),
        None => channel::never(),
    };
    log::debug!("ticking every {:?}", config.tick_interval());

    loop {
        channel::select! {
            recv(ticker) -> _ => {
                feed.advance();
                session.tick();
            }
            recv(deadline) -> _ => break,
        }
    }

    session.close();
    snapshots.shutdown();
    render_handle
        .join()
        .map_err(|_| anyhow::format_err!("render thread panicked"))?;
    Ok(())
}
