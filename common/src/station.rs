use log::{debug, info, warn};

use crate::clock::Clock;
use crate::config::StationConfig;
use crate::connectivity::{ConnectionState, ConnectivityManager, NetworkLink};
use crate::datalog::DataLog;
use crate::reading::{Reading, UNSYNCED};
use crate::screen::{Screen, ScreenView};
use crate::sensor::SensorSource;
use crate::telemetry::{TelemetryClient, Transport};

/// The tick scheduler. Owns the current reading buffer and the interval
/// timer, and drives sensors, display, connectivity, telemetry and the log
/// from a single cooperative loop.
///
/// `tick` is meant to be called at high frequency from a single-threaded
/// loop; there is no internal locking and no reentrancy.
pub struct WeatherStation<C, S, V, L, T> {
    clock: C,
    sensors: S,
    screen: V,
    connectivity: ConnectivityManager<L>,
    telemetry: TelemetryClient<T>,
    datalog: DataLog,
    config: StationConfig,
    last_fire: u32,
    current: Option<Reading>,
    last_valid: Option<Reading>,
}

impl<C, S, V, L, T> WeatherStation<C, S, V, L, T>
where
    C: Clock,
    S: SensorSource,
    V: Screen,
    L: NetworkLink,
    T: Transport,
{
    /// # Panics
    ///
    /// If `config.upload_interval_ms` is zero.
    pub fn new(
        config: StationConfig,
        clock: C,
        sensors: S,
        screen: V,
        link: L,
        telemetry: TelemetryClient<T>,
    ) -> Self {
        assert!(
            config.upload_interval_ms > 0,
            "upload interval must be positive"
        );

        let connectivity = ConnectivityManager::new(link, config.retry);
        let datalog = DataLog::new(&config.log_path, config.truncate_on_init);

        Self {
            clock,
            sensors,
            screen,
            connectivity,
            telemetry,
            datalog,
            config,
            last_fire: 0,
            current: None,
            last_valid: None,
        }
    }

    /// Startup work: dumps any surviving log from the previous run, then
    /// resets (or adopts) the log file. Storage failures degrade persistence
    /// but never abort startup.
    pub fn initialize(&mut self) {
        if let Ok(existing) = self.datalog.contents() {
            if !existing.is_empty() {
                debug!("log content from previous run:\n{existing}");
            }
        }
        if let Err(e) = self.datalog.initialize() {
            warn!("{e}");
        }
    }

    /// One pass of the control loop.
    ///
    /// Interval-gated network and persistence work runs first, against the
    /// reading sampled at the end of the previous tick; then the sensors are
    /// resampled and the display redrawn unconditionally, so the operator
    /// view never freezes on upload stalls. The exception is a down link:
    /// `ensure_connected` blocks the whole tick for as long as its
    /// [`RetryPolicy`](crate::connectivity::RetryPolicy) allows.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();

        // Wraparound-safe: correct even when the millisecond clock has
        // overflowed between fires.
        let elapsed = now.wrapping_sub(self.last_fire);
        if elapsed >= self.config.upload_interval_ms {
            self.upload_cycle();
            self.last_fire = now;
        }

        self.sample();
        self.refresh_screen();
    }

    /// Connectivity-ensure, then publish and append best-effort, no rollback:
    /// a failed upload does not stop the append, and vice versa.
    fn upload_cycle(&mut self) {
        if self.connectivity.ensure_connected() != ConnectionState::Connected {
            warn!("no connectivity, skipping upload and persist for this cycle");
            return;
        }

        let Some(reading) = &self.current else {
            info!("no reading captured yet, nothing to upload");
            return;
        };

        if let Err(e) = self.telemetry.publish(reading) {
            warn!("{e}");
        }
        if let Err(e) = self.datalog.append(reading) {
            warn!("{e}");
        }
    }

    /// Resamples every sensor field into a fresh reading. Invalid samples
    /// (NaN sentinels) pass through as-is; a fully valid snapshot also
    /// becomes the new last-known-good reading for the display.
    fn sample(&mut self) {
        let timestamp = self
            .clock
            .wall_clock()
            .unwrap_or_else(|| UNSYNCED.to_string());

        let reading = Reading {
            temperature: self.sensors.read_temperature(),
            humidity: self.sensors.read_humidity(),
            pressure: self.sensors.read_pressure(),
            altitude: self.sensors.read_altitude(self.config.reference_pressure_hpa),
            timestamp,
        };

        if reading.is_valid() {
            self.last_valid = Some(reading.clone());
        }
        self.current = Some(reading);
    }

    /// The display shows the freshest valid reading it can: the current one,
    /// else the last-known-good one, else an explicit no-data state.
    fn refresh_screen(&mut self) {
        let shown = match (&self.current, &self.last_valid) {
            (Some(current), _) if current.is_valid() => Some(current),
            (_, Some(previous)) => Some(previous),
            _ => None,
        };

        match shown {
            Some(reading) => self.screen.render(ScreenView::Reading(reading)),
            None => self.screen.render(ScreenView::NoData),
        }
    }

    pub fn datalog(&self) -> &DataLog {
        &self.datalog
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connectivity.state()
    }

    /// The reading buffer as of the last tick, valid or not.
    pub fn current_reading(&self) -> Option<&Reading> {
        self.current.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::RetryPolicy;
    use crate::telemetry::{TelemetryConfig, TransportError};
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use std::time::Duration;

    #[derive(Clone)]
    struct FakeClock {
        now: Rc<Cell<u32>>,
        synced: bool,
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> u32 {
            self.now.get()
        }

        fn wall_clock(&self) -> Option<String> {
            self.synced.then(|| "01-01-2024 | 00:00:00".to_string())
        }
    }

    /// Sensor fed from a script of (temperature, humidity, pressure)
    /// triples; an exhausted script repeats the last entry, `None` entries
    /// produce NaN sentinels.
    struct ScriptedSensor {
        script: VecDeque<Option<(f32, f32, f32)>>,
        current: Option<(f32, f32, f32)>,
    }

    impl ScriptedSensor {
        fn new(script: Vec<Option<(f32, f32, f32)>>) -> Self {
            Self {
                script: script.into(),
                current: None,
            }
        }

        fn advance(&mut self) -> Option<(f32, f32, f32)> {
            if let Some(next) = self.script.pop_front() {
                self.current = next;
            }
            self.current
        }
    }

    impl SensorSource for ScriptedSensor {
        fn read_temperature(&mut self) -> f32 {
            self.advance().map_or(f32::NAN, |(t, _, _)| t)
        }

        fn read_humidity(&mut self) -> f32 {
            self.current.map_or(f32::NAN, |(_, h, _)| h)
        }

        fn read_pressure(&mut self) -> f32 {
            self.current.map_or(f32::NAN, |(_, _, p)| p)
        }

        fn read_altitude(&mut self, _reference_hpa: f32) -> f32 {
            self.current.map_or(f32::NAN, |_| 45.0)
        }
    }

    /// Records what each frame showed: `None` for the no-data state,
    /// otherwise the rendered temperature.
    struct RecordingScreen {
        frames: Rc<RefCell<Vec<Option<f32>>>>,
    }

    impl Screen for RecordingScreen {
        fn render(&mut self, view: ScreenView<'_>) {
            let frame = match view {
                ScreenView::NoData => None,
                ScreenView::Reading(r) => Some(r.temperature),
            };
            self.frames.borrow_mut().push(frame);
        }
    }

    struct CountingLink {
        up: Rc<Cell<bool>>,
        can_join: bool,
        checks: Rc<Cell<u32>>,
    }

    impl NetworkLink for CountingLink {
        fn join(&mut self) {
            if self.can_join {
                self.up.set(true);
            }
        }

        fn is_up(&self) -> bool {
            self.checks.set(self.checks.get() + 1);
            self.up.get()
        }
    }

    struct RecordingTransport {
        posts: Rc<RefCell<Vec<String>>>,
    }

    impl Transport for RecordingTransport {
        fn post(&mut self, _url: &str, body: &str) -> Result<u16, TransportError> {
            self.posts.borrow_mut().push(body.into());
            Ok(200)
        }
    }

    struct Harness {
        station: WeatherStation<
            FakeClock,
            ScriptedSensor,
            RecordingScreen,
            CountingLink,
            RecordingTransport,
        >,
        now: Rc<Cell<u32>>,
        frames: Rc<RefCell<Vec<Option<f32>>>>,
        posts: Rc<RefCell<Vec<String>>>,
        link_checks: Rc<Cell<u32>>,
        _dir: tempfile::TempDir,
    }

    const INTERVAL: u32 = 5_000;

    fn harness(script: Vec<Option<(f32, f32, f32)>>) -> Harness {
        harness_with_link(script, true, None)
    }

    fn harness_with_link(
        script: Vec<Option<(f32, f32, f32)>>,
        link_up: bool,
        max_attempts: Option<u32>,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config = StationConfig {
            upload_interval_ms: INTERVAL,
            log_path: dir.path().join("WeatherData.csv"),
            retry: RetryPolicy {
                poll_interval: Duration::ZERO,
                max_attempts,
            },
            ..Default::default()
        };

        let now = Rc::new(Cell::new(0));
        let frames = Rc::new(RefCell::new(Vec::new()));
        let posts = Rc::new(RefCell::new(Vec::new()));
        let link_checks = Rc::new(Cell::new(0));

        let clock = FakeClock {
            now: now.clone(),
            synced: true,
        };
        let screen = RecordingScreen {
            frames: frames.clone(),
        };
        let link = CountingLink {
            up: Rc::new(Cell::new(link_up)),
            can_join: link_up,
            checks: link_checks.clone(),
        };
        let telemetry = TelemetryClient::new(
            RecordingTransport {
                posts: posts.clone(),
            },
            TelemetryConfig::default(),
        );

        let mut station = WeatherStation::new(
            config,
            clock,
            ScriptedSensor::new(script),
            screen,
            link,
            telemetry,
        );
        station.initialize();

        Harness {
            station,
            now,
            frames,
            posts,
            link_checks,
            _dir: dir,
        }
    }

    fn valid(temp: f32) -> Option<(f32, f32, f32)> {
        Some((temp, 60.1, 1008.3))
    }

    fn data_lines(h: &Harness) -> usize {
        h.station
            .datalog()
            .contents()
            .unwrap()
            .lines()
            .skip(1)
            .count()
    }

    #[test]
    fn short_elapsed_does_only_sample_and_display() {
        let mut h = harness(vec![valid(21.0)]);

        for now in [0, 100, INTERVAL - 1] {
            h.now.set(now);
            h.station.tick();
        }

        assert_eq!(h.link_checks.get(), 0, "connectivity untouched");
        assert!(h.posts.borrow().is_empty(), "no upload attempt");
        assert_eq!(data_lines(&h), 0, "no log append");
        assert_eq!(h.frames.borrow().len(), 3, "display refreshed every tick");
    }

    #[test]
    fn elapsed_interval_fires_exactly_one_upload_and_append() {
        let mut h = harness(vec![valid(21.0)]);

        h.now.set(0);
        h.station.tick(); // captures the first reading
        h.now.set(INTERVAL);
        h.station.tick(); // fires

        assert_eq!(h.posts.borrow().len(), 1);
        assert_eq!(data_lines(&h), 1);

        // The very next tick must not fire again.
        h.now.set(INTERVAL + 1);
        h.station.tick();
        assert_eq!(h.posts.borrow().len(), 1);
        assert_eq!(data_lines(&h), 1);

        // last_fire advanced to the firing tick's time.
        h.now.set(2 * INTERVAL);
        h.station.tick();
        assert_eq!(h.posts.borrow().len(), 2);
    }

    #[test]
    fn wrapped_clock_still_measures_elapsed_time() {
        let mut h = harness(vec![valid(21.0)]);

        h.now.set(0);
        h.station.tick(); // captures the first reading, no fire

        // Walk last_fire up to just before the wrap point.
        h.now.set(u32::MAX - 1);
        h.station.tick();
        assert_eq!(h.posts.borrow().len(), 1);

        // Clock wrapped: elapsed is 2 ms, far below the interval.
        h.now.set(1);
        h.station.tick();
        assert_eq!(h.posts.borrow().len(), 1, "wrap must not look like a fire");

        // A full interval past the wrap fires normally.
        h.now.set(INTERVAL.wrapping_add(u32::MAX - 1));
        h.station.tick();
        assert_eq!(h.posts.borrow().len(), 2);
    }

    #[test]
    fn first_fire_with_no_reading_uploads_nothing() {
        let mut h = harness(vec![valid(21.0)]);

        // Interval already elapsed on the very first tick; the buffer is
        // still empty at that point.
        h.now.set(INTERVAL);
        h.station.tick();

        assert!(h.posts.borrow().is_empty());
        assert_eq!(data_lines(&h), 0);
    }

    #[test]
    fn disconnected_link_skips_upload_but_keeps_sampling() {
        // Link never comes up; the bounded policy lets the fire give up
        // instead of blocking forever.
        let mut h = harness_with_link(vec![valid(21.0)], false, Some(3));

        h.now.set(0);
        h.station.tick(); // captures the first reading
        h.now.set(INTERVAL);
        h.station.tick(); // fires, gives up on connectivity

        assert!(h.posts.borrow().is_empty(), "no publish while disconnected");
        assert_eq!(data_lines(&h), 0, "no append while disconnected");
        assert_eq!(h.frames.borrow().len(), 2, "display refreshed every tick");
        assert_eq!(h.station.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn invalid_sample_keeps_last_good_frame_on_screen() {
        let mut h = harness(vec![valid(21.0), None, valid(23.0)]);

        h.now.set(0);
        h.station.tick(); // cycle 1: valid
        h.station.tick(); // cycle 2: sensor fails
        h.station.tick(); // cycle 3: recovered

        let frames = h.frames.borrow();
        assert_eq!(frames.as_slice(), [Some(21.0), Some(21.0), Some(23.0)]);
    }

    #[test]
    fn no_data_state_until_the_first_sample_succeeds() {
        let mut h = harness(vec![None, valid(22.0)]);

        h.now.set(0);
        h.station.tick();
        h.station.tick();

        let frames = h.frames.borrow();
        assert_eq!(frames.as_slice(), [None, Some(22.0)]);
    }

    #[test]
    fn invalid_reading_is_still_uploaded_and_persisted() {
        // The sentinel passes through; only the display filters it.
        let mut h = harness(vec![None]);

        h.now.set(0);
        h.station.tick();
        h.now.set(INTERVAL);
        h.station.tick();

        assert_eq!(h.posts.borrow().len(), 1);
        assert_eq!(data_lines(&h), 1);
        let contents = h.station.datalog().contents().unwrap();
        assert!(contents.lines().nth(1).unwrap().contains("NaN"));
    }

    #[test]
    fn unsynced_clock_substitutes_the_placeholder_timestamp() {
        let mut h = harness(vec![valid(21.0)]);
        h.station.clock.synced = false;

        h.now.set(0);
        h.station.tick();

        assert_eq!(
            h.station.current_reading().unwrap().timestamp,
            UNSYNCED,
            "cycle must continue with a placeholder, not fail"
        );
    }
}
