//! Headless Prism runner
//!
//! Routes the default input device through the EQ to the default
//! output, drains the spectrum pipeline at ~60Hz, and prints peak
//! levels once a second. Press Enter to quit; the current parameter
//! values are persisted on exit.
//!
//! Log verbosity via RUST_LOG, e.g. `RUST_LOG=debug prism`.

use std::time::{Duration, Instant};

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use prism_core::{AudioEngine, CurveBounds, EngineResult, EqSettings, Event};

fn main() -> EngineResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let engine = AudioEngine::new()?;
    let settings = EqSettings::load();
    engine.apply_settings(&settings);

    engine.start()?;
    let mut outlet = engine.spectrum_outlet();
    if outlet.is_none() {
        warn!("No audio session came up; check the event log");
    }

    // Quit on Enter
    let (quit_tx, quit_rx) = crossbeam_channel::bounded::<()>(1);
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = quit_tx.send(());
    });
    info!("Running; press Enter to quit");

    let bounds = CurveBounds::new(0.0, 0.0, 800.0, 256.0);
    let mut last_report = Instant::now();

    loop {
        if quit_rx.try_recv().is_ok() {
            break;
        }

        while let Some(event) = engine.poll_event() {
            match event {
                Event::Error { message } => warn!("Engine error: {}", message),
                Event::BufferUnderrun => {}
                other => info!("Engine event: {:?}", other),
            }
        }

        if let Some(outlet) = outlet.as_mut() {
            let curves = outlet.render(bounds);

            if last_report.elapsed() >= Duration::from_secs(1) {
                last_report = Instant::now();
                let (peak_l, peak_r) = engine.peaks();
                info!(
                    "peaks L={:.3} R={:.3}, spectrum vertices={}",
                    peak_l,
                    peak_r,
                    curves.spectrum_left.points.len()
                );
            }
        }

        // ~60Hz display rate
        std::thread::sleep(Duration::from_millis(16));
    }

    if let Err(e) = engine.current_settings().save() {
        warn!("Failed to save settings: {}", e);
    }
    engine.stop()?;

    Ok(())
}
