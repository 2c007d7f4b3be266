mod commands;
mod settings;
mod stopwatch;
mod storage;
mod ui;

use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use num_traits::FromPrimitive;
use stopwatch_core::TimerState;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, HELP_TEXT};
use crate::settings::{Settings, INTERVAL_HINT};
use crate::stopwatch::StopwatchState;
use crate::storage::SettingsStorage;

const APP_NAME: &str = "stopwatch";
const FALLBACK_INTERVAL_MS: u64 = 100;

#[derive(Debug)]
enum AppMsg {
    Input(String),
    Pump,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, num_derive::FromPrimitive)]
enum PumpOp {
    Start = 0,
    Stop,
    Quit,
}

/// Scalar message on the pump control channel.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PumpMsg {
    id: usize,
    arg1: usize,
}

impl PumpMsg {
    fn new(op: PumpOp, arg1: usize) -> Self {
        Self { id: op as usize, arg1 }
    }
}

struct PumpControl {
    interval_ms: u64,
    running: bool,
}

impl PumpControl {
    fn new() -> Self {
        Self {
            interval_ms: FALLBACK_INTERVAL_MS,
            running: false,
        }
    }

    /// Returns false once told to quit.
    fn apply(&mut self, msg: PumpMsg) -> bool {
        match FromPrimitive::from_usize(msg.id) {
            Some(PumpOp::Start) => {
                self.interval_ms = msg.arg1 as u64;
                if self.interval_ms == 0 {
                    self.interval_ms = FALLBACK_INTERVAL_MS;
                }
                self.running = true;
            }
            Some(PumpOp::Stop) => self.running = false,
            Some(PumpOp::Quit) => return false,
            None => log::warn!("unknown pump opcode: {:?}", msg),
        }
        true
    }
}

fn pump_thread(control: Receiver<PumpMsg>, main_conn: Sender<AppMsg>) {
    let mut pump = PumpControl::new();

    loop {
        if pump.running {
            thread::sleep(Duration::from_millis(pump.interval_ms));
            if main_conn.send(AppMsg::Pump).is_err() {
                break;
            }
        } else {
            // Block-wait when stopped
            match control.recv() {
                Ok(msg) if pump.apply(msg) => {}
                _ => break,
            }
        }

        loop {
            match control.try_recv() {
                Ok(msg) => {
                    if !pump.apply(msg) {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }
    }
}

fn input_thread(main_conn: Sender<AppMsg>) {
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => {
                if main_conn.send(AppMsg::Input(line)).is_err() {
                    return;
                }
            }
            Err(e) => {
                log::error!("can't read input: {}", e);
                break;
            }
        }
    }
    main_conn.send(AppMsg::Quit).ok();
}

struct StopwatchApp<W: Write> {
    out: W,
    epoch: Instant,
    storage: SettingsStorage,
    settings: Settings,
    stopwatch: StopwatchState,
    pump_conn: Sender<PumpMsg>,
    pump_running: bool,
}

impl<W: Write> StopwatchApp<W> {
    fn new(out: W, storage: SettingsStorage, pump_conn: Sender<PumpMsg>) -> Self {
        let settings = storage.load();
        log::info!(
            "settings from {}: interval {} ms, format {:?}",
            storage.path().display(),
            settings.interval,
            settings.format
        );
        let stopwatch = StopwatchState::new(settings.display_format());

        Self {
            out,
            epoch: Instant::now(),
            storage,
            settings,
            stopwatch,
            pump_conn,
            pump_running: false,
        }
    }

    fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    fn redraw(&mut self) {
        if let Err(e) = ui::draw_stopwatch(&mut self.out, &self.stopwatch) {
            log::error!("can't draw: {}", e);
        }
    }

    fn notice(&mut self, message: &str) {
        if let Err(e) = ui::draw_notice(&mut self.out, message) {
            log::error!("can't draw notice: {}", e);
        }
        self.redraw();
    }

    fn send_pump(&self, msg: PumpMsg) {
        if self.pump_conn.send(msg).is_err() {
            log::warn!("pump thread is gone, dropped {:?}", msg);
        }
    }

    fn start_pump(&mut self) {
        if !self.pump_running {
            self.pump_running = true;
            self.send_pump(PumpMsg::new(PumpOp::Start, self.settings.interval as usize));
        }
    }

    fn stop_pump(&mut self) {
        if self.pump_running {
            self.pump_running = false;
            self.send_pump(PumpMsg::new(PumpOp::Stop, 0));
        }
    }

    /// Rebuild a running pump so it picks up a new interval.
    fn restart_pump(&mut self) {
        if self.pump_running {
            self.stop_pump();
            self.start_pump();
        }
    }

    fn quit_pump(&mut self) {
        self.stop_pump();
        self.send_pump(PumpMsg::new(PumpOp::Quit, 0));
    }

    fn save_settings(&self) {
        if let Err(e) = self.storage.save(&self.settings) {
            log::error!("Failed to save settings: {}", e);
        }
    }

    fn handle_pump(&mut self) {
        if self.stopwatch.is_running() {
            let now = self.now_ms();
            self.stopwatch.refresh(now);
            self.redraw();
        } else {
            self.stop_pump();
        }
    }

    fn handle_input(&mut self, line: &str) -> ControlFlow<()> {
        match Command::parse(line) {
            Some(command) => self.handle_command(command),
            None => {
                log::debug!("unknown command: {:?}", line);
                self.notice(&format!("Unknown command {:?}, type h for help", line.trim()));
                ControlFlow::Continue(())
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> ControlFlow<()> {
        let now = self.now_ms();
        match command {
            Command::StartStop => {
                match self.stopwatch.start_or_stop(now) {
                    TimerState::Started => self.start_pump(),
                    _ => self.stop_pump(),
                }
                self.redraw();
            }
            Command::Reset => {
                self.stopwatch.reset(now);
                self.stop_pump();
                self.redraw();
            }
            Command::Interval(value) => match self.settings.set_interval(&value) {
                Ok(interval) => {
                    log::info!("interval set to {}", interval);
                    self.save_settings();
                    self.restart_pump();
                    self.redraw();
                }
                Err(e) => {
                    log::info!("interval {:?} rejected: {}", value, e);
                    self.notice(&format!("{}. {}", INTERVAL_HINT, e));
                }
            },
            Command::Format(value) => match self.settings.set_format(&value) {
                Ok(format) => {
                    log::info!("format set to {:?}", value);
                    self.stopwatch.set_format(format, now);
                    self.save_settings();
                    self.redraw();
                }
                Err(e) => {
                    log::info!("format {:?} rejected: {}", value, e);
                    self.notice(&e.to_string());
                }
            },
            Command::Help => {
                if let Err(e) = ui::draw_help(&mut self.out, HELP_TEXT, &self.settings) {
                    log::error!("can't draw help: {}", e);
                }
                self.redraw();
            }
            Command::Quit => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }

    fn finish(&mut self) {
        if let Err(e) = writeln!(self.out).and_then(|_| self.out.flush()) {
            log::error!("can't draw: {}", e);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("logging unavailable: {}", e);
    }
}

fn main() {
    init_logging();
    log::info!("{} PID is {}", APP_NAME, std::process::id());

    let (main_conn, inbox) = mpsc::channel();
    let (pump_conn, pump_inbox) = mpsc::channel();

    let pump_main = main_conn.clone();
    let pump = thread::spawn(move || pump_thread(pump_inbox, pump_main));
    thread::spawn(move || input_thread(main_conn));

    let mut app = StopwatchApp::new(io::stdout(), SettingsStorage::new(), pump_conn);
    app.redraw();

    while let Ok(msg) = inbox.recv() {
        match msg {
            AppMsg::Input(line) => {
                if app.handle_input(&line).is_break() {
                    break;
                }
            }
            AppMsg::Pump => app.handle_pump(),
            AppMsg::Quit => break,
        }
    }

    // Clean up
    app.quit_pump();
    if pump.join().is_err() {
        log::error!("pump thread panicked");
    }
    app.finish();
    log::info!("{} exiting", APP_NAME);
}
