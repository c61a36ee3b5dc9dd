//! Biometric Shield Demo Application
//!
//! Plays the four-stage script in the terminal:
//! - Dashboard waits for `a` (activate)
//! - Calibration and the defense run on their own timers
//! - Status report waits for `r` (restart)
//!
//! `go <stage>` jumps to a stage the way a router would, `q` quits.

mod render;

use std::io;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant, MissedTickBehavior};

use shield_core::{EventSink, ShieldEvent, ShieldResult, SimTime, StageId, StagePhase};
use shield_runtime::{init_tracing, LogFormat, ScriptConfig, StageScheduler, TelemetryConfig};

use render::Renderer;

/// Wall-clock period of the playback loop
const FRAME: Duration = Duration::from_millis(20);

/// Fastest accepted playback speed
const MAX_RATE: f64 = 1000.0;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Seed for the obfuscation jitter
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Playback speed, 2.0 runs the script twice as fast
    #[arg(long, default_value_t = 1.0, value_parser = playback_rate)]
    rate: f64,
    /// Stop after this many completed cycles (0 runs until `q`)
    #[arg(long, default_value_t = 0)]
    cycles: u32,
    /// Press activate and restart automatically
    #[arg(long)]
    auto: bool,
    /// Print every event as a JSON line
    #[arg(long)]
    json: bool,
    /// Emit logs as JSON on stderr
    #[arg(long)]
    log_json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Activate,
    Restart,
    Go(StageId),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let mut words = line.split_whitespace();
    match words.next()? {
        "a" | "activate" => Some(Command::Activate),
        "r" | "restart" => Some(Command::Restart),
        "q" | "quit" => Some(Command::Quit),
        "go" => words.next()?.parse().ok().map(Command::Go),
        _ => None,
    }
}

fn playback_rate(arg: &str) -> Result<f64, String> {
    let rate: f64 = arg.parse().map_err(|err| format!("{err}"))?;
    if !rate.is_finite() || rate <= 0.0 || rate > MAX_RATE {
        return Err(format!("expected a speed in (0, {MAX_RATE}], got {arg}"));
    }
    Ok(rate)
}

/// Scheduler plus the count of cycles closed by a restart
struct Playback<S> {
    scheduler: StageScheduler<S>,
    completed_cycles: u32,
}

impl<S: EventSink> Playback<S> {
    fn new(scheduler: StageScheduler<S>) -> Self {
        Playback {
            scheduler,
            completed_cycles: 0,
        }
    }

    /// Apply one command; `false` once the user quits
    fn command(&mut self, command: Command) -> ShieldResult<bool> {
        tracing::debug!(?command, "command");
        match command {
            Command::Activate => {
                self.scheduler.activate();
            }
            Command::Restart => self.restart()?,
            Command::Go(stage) => self.scheduler.navigate(stage)?,
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    /// Only an accepted restart closes a cycle; `go /` does not
    fn restart(&mut self) -> ShieldResult<()> {
        if self.scheduler.restart()? {
            self.completed_cycles += 1;
        }
        Ok(())
    }

    /// Press whatever button the current stage waits for
    fn auto_step(&mut self) -> ShieldResult<()> {
        match (self.scheduler.stage(), self.scheduler.phase()) {
            (StageId::Dashboard, StagePhase::Idle) => {
                self.scheduler.activate();
            }
            // Report counters have settled once nothing is pending
            (StageId::StatusReport, _) if self.scheduler.live_timers() == 0 => self.restart()?,
            _ => {}
        }
        Ok(())
    }
}

/// Forward stdin commands to the playback loop
///
/// Runs on a plain thread: a pending stdin read cannot be cancelled and
/// must not hold the runtime open at exit.
fn read_commands(tx: mpsc::Sender<Command>) {
    for line in io::stdin().lines() {
        let Ok(line) = line else { break };
        match parse_command(&line) {
            Some(command) => {
                if tx.blocking_send(command).is_err() {
                    break;
                }
            }
            None => tracing::warn!(input = %line.trim(), "unknown command"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(&TelemetryConfig {
        format: if args.log_json {
            LogFormat::Json
        } else {
            LogFormat::Text
        },
        ..TelemetryConfig::default()
    });

    let config = ScriptConfig::default();
    let mut renderer = Renderer::stdout(&config, args.json);
    let mut playback = Playback::new(StageScheduler::seeded(config, args.seed, Vec::new())?);

    let (tx, mut rx) = mpsc::channel(16);
    std::thread::spawn(move || read_commands(tx));

    let mut frames = interval(FRAME);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let started = Instant::now();

    loop {
        tokio::select! {
            _ = frames.tick() => {
                let now = SimTime::from_secs_f64(started.elapsed().as_secs_f64() * args.rate);
                playback.scheduler.advance_to(now)?;
            }
            Some(command) = rx.recv() => {
                if !playback.command(command)? {
                    break;
                }
            }
        }

        let events: Vec<(SimTime, ShieldEvent)> =
            playback.scheduler.sink_mut().drain(..).collect();
        for (at, event) in &events {
            renderer.show(*at, event)?;
        }

        if args.cycles > 0 && playback.completed_cycles >= args.cycles {
            break;
        }
        if args.auto {
            playback.auto_step()?;
        }
    }

    let scheduler = &playback.scheduler;
    tracing::info!(
        stats = %serde_json::to_string(scheduler.stats())?,
        at = %scheduler.now(),
        "demo finished"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("a"), Some(Command::Activate));
        assert_eq!(parse_command("  restart "), Some(Command::Restart));
        assert_eq!(
            parse_command("go /chaos-engine"),
            Some(Command::Go(StageId::ChaosEngine))
        );
        assert_eq!(
            parse_command("go status_report"),
            Some(Command::Go(StageId::StatusReport))
        );
        assert_eq!(parse_command("go nowhere"), None);
        assert_eq!(parse_command(""), None);
    }

    fn playback() -> Playback<Vec<(SimTime, ShieldEvent)>> {
        let scheduler = StageScheduler::seeded(ScriptConfig::default(), 1, Vec::new()).unwrap();
        Playback::new(scheduler)
    }

    #[test]
    fn test_playback_rate_bounds() {
        assert_eq!(playback_rate("2.5"), Ok(2.5));
        assert!(playback_rate("0").is_err());
        assert!(playback_rate("-1").is_err());
        assert!(playback_rate("NaN").is_err());
        assert!(playback_rate("1e30").is_err());
        assert!(playback_rate("fast").is_err());
    }

    #[test]
    fn test_only_restart_completes_a_cycle() {
        let mut playback = playback();
        assert!(playback.command(Command::Go(StageId::StatusReport)).unwrap());
        assert!(playback.command(Command::Go(StageId::Dashboard)).unwrap());
        assert_eq!(playback.completed_cycles, 0);

        // Ignored outside the report
        playback.command(Command::Restart).unwrap();
        assert_eq!(playback.completed_cycles, 0);

        playback.command(Command::Go(StageId::StatusReport)).unwrap();
        playback.command(Command::Restart).unwrap();
        assert_eq!(playback.completed_cycles, 1);
        assert_eq!(playback.scheduler.stage(), StageId::Dashboard);
        assert!(!playback.command(Command::Quit).unwrap());
    }

    #[test]
    fn test_auto_step_runs_full_cycles() {
        let mut playback = playback();
        let mut now = SimTime::ZERO;
        while playback.completed_cycles < 2 {
            playback.auto_step().unwrap();
            now = now + Duration::from_millis(20);
            playback.scheduler.advance_to(now).unwrap();
            assert!(now < SimTime::from_millis(60_000));
        }
        assert_eq!(playback.scheduler.stage(), StageId::Dashboard);
    }
}
