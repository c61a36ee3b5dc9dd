//! Terminal renderer - turns scheduler events into output lines

use std::collections::HashMap;
use std::io::{self, Write};

use serde::Serialize;

use shield_core::{CounterId, LandmarkSet, ShieldEvent, SimTime, StageId, StagePhase};
use shield_landmark::{obfuscation_hue, style_for};
use shield_runtime::{
    calibration_status, defense_status, stage_title, ScriptConfig, THREAT_LABEL, THREAT_LEVEL,
};
use shield_time::CounterAnimator;

/// One JSON output line
#[derive(Serialize)]
struct JsonLine<'a> {
    at_ms: u64,
    #[serde(flatten)]
    event: &'a ShieldEvent,
}

/// Print a jitter summary every this many snapshots
const JITTER_SUMMARY_EVERY: u64 = 10;

/// Width of the calibration progress bar
const BAR_WIDTH: f64 = 20.0;

pub struct Renderer<W> {
    out: W,
    json: bool,
    animators: HashMap<(StageId, CounterId), CounterAnimator>,
    /// Calibration face, revealed point by point
    face: Option<LandmarkSet>,
    last_status: Option<&'static str>,
    jitter_snapshots: u64,
}

impl Renderer<io::Stdout> {
    pub fn stdout(config: &ScriptConfig, json: bool) -> Self {
        Self::new(io::stdout(), config, json)
    }
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W, config: &ScriptConfig, json: bool) -> Self {
        let mut animators = HashMap::new();
        for animator in [&config.calibration.progress, &config.calibration.reveal] {
            animators.insert((StageId::Calibration, animator.counter), animator.clone());
        }
        let identifiers = &config.obfuscation.identifiers;
        animators.insert((StageId::ChaosEngine, identifiers.counter), identifiers.clone());
        for animator in &config.status.counters {
            animators.insert((StageId::StatusReport, animator.counter), animator.clone());
        }

        Renderer {
            out,
            json,
            animators,
            face: None,
            last_status: None,
            jitter_snapshots: 0,
        }
    }

    pub fn show(&mut self, at: SimTime, event: &ShieldEvent) -> io::Result<()> {
        if self.json {
            let line = JsonLine {
                at_ms: at.as_millis(),
                event,
            };
            serde_json::to_writer(&mut self.out, &line)?;
            writeln!(self.out)?;
            return self.out.flush();
        }

        match event {
            ShieldEvent::StageEntered { stage } => self.stage_banner(at, *stage)?,
            ShieldEvent::StageExited { stage } => {
                writeln!(self.out, "[{at}] -- leaving {stage}")?;
            }
            ShieldEvent::TransitionRequested { from, to } => {
                writeln!(self.out, "[{at}] route {} -> {}", from.path(), to.path())?;
            }
            ShieldEvent::PhaseChanged { stage, phase } => self.phase(at, *stage, *phase)?,
            ShieldEvent::LandmarksChanged { stage, landmarks } => {
                self.landmarks(at, *stage, landmarks)?
            }
            ShieldEvent::CounterChanged {
                stage,
                counter,
                value,
            } => self.counter(at, *stage, *counter, *value)?,
        }
        self.out.flush()
    }

    fn stage_banner(&mut self, at: SimTime, stage: StageId) -> io::Result<()> {
        self.last_status = None;
        self.jitter_snapshots = 0;
        writeln!(self.out)?;
        writeln!(self.out, "[{at}] ==== {} ====", stage_title(stage))?;
        match stage {
            StageId::Dashboard => {
                writeln!(self.out, "        THREAT LEVEL {THREAT_LEVEL}% ({THREAT_LABEL})")?;
                writeln!(self.out, "        type `a` + Enter to activate the shield")?;
            }
            StageId::StatusReport => {
                writeln!(self.out, "        type `r` + Enter to run the demo again")?;
            }
            _ => {}
        }
        Ok(())
    }

    fn phase(&mut self, at: SimTime, stage: StageId, phase: StagePhase) -> io::Result<()> {
        match (stage, phase) {
            (StageId::Dashboard, StagePhase::Acknowledging) => {
                writeln!(self.out, "[{at}] shield activated, preparing calibration...")
            }
            (StageId::ChaosEngine, phase) => {
                writeln!(self.out, "[{at}] {}", defense_status(phase))
            }
            _ => writeln!(self.out, "[{at}] {stage}: {phase:?}"),
        }
    }

    fn landmarks(&mut self, at: SimTime, stage: StageId, landmarks: &LandmarkSet) -> io::Result<()> {
        let jittered = landmarks.iter().any(|p| p.displacement() > 0.0);
        if !jittered {
            if stage == StageId::Calibration {
                self.face = Some(landmarks.clone());
            }
            let regions: Vec<String> = landmarks
                .runs()
                .iter()
                .map(|run| format!("{:?} {} {}", run.region, run.len, style_for(run.region).color))
                .collect();
            return writeln!(
                self.out,
                "[{at}] {} landmarks generated for {stage}: {}",
                landmarks.len(),
                regions.join(", ")
            );
        }

        self.jitter_snapshots += 1;
        if self.jitter_snapshots % JITTER_SUMMARY_EVERY != 0 {
            return Ok(());
        }
        let mean = landmarks.iter().map(|p| p.displacement()).sum::<f64>() / landmarks.len() as f64;
        let (peak, offset) = landmarks
            .iter()
            .map(|p| p.displacement())
            .enumerate()
            .fold((0, 0.0), |best, (index, d)| if d > best.1 { (index, d) } else { best });
        writeln!(
            self.out,
            "[{at}] {} snapshots randomized, mean offset {mean:.2}%, peak {offset:.2}% at point {peak} (hue {:.0})",
            self.jitter_snapshots,
            obfuscation_hue(peak, landmarks.len())
        )
    }

    /// Announce each region once its last point is revealed
    fn reveal(&mut self, at: SimTime, value: u32) -> io::Result<()> {
        let Some(face) = &self.face else {
            return Ok(());
        };
        let shown = face.revealed(value as usize);
        let Some(last) = shown.last() else {
            return Ok(());
        };
        let region_done = match face.iter().nth(shown.len()) {
            Some(next) => next.region != last.region,
            None => true,
        };
        if region_done {
            writeln!(self.out, "[{at}] {:?} mapped ({}/{})", last.region, shown.len(), face.len())?;
        }
        Ok(())
    }

    fn counter(&mut self, at: SimTime, stage: StageId, counter: CounterId, value: u32) -> io::Result<()> {
        match counter {
            CounterId::ScanLine => Ok(()),
            CounterId::LandmarksRevealed => self.reveal(at, value),
            CounterId::CalibrationProgress => {
                let status = calibration_status(value);
                if self.last_status != Some(status) {
                    self.last_status = Some(status);
                    writeln!(self.out, "[{at}] {status}")?;
                }
                let Some(animator) = self.animators.get(&(stage, counter)) else {
                    return Ok(());
                };
                if value % 20 == 0 && value > animator.spec.min {
                    let filled = (animator.fraction(value) * BAR_WIDTH).round() as usize;
                    writeln!(
                        self.out,
                        "[{at}] [{}{}] {value}%",
                        "#".repeat(filled),
                        ".".repeat(BAR_WIDTH as usize - filled.min(BAR_WIDTH as usize))
                    )?;
                }
                Ok(())
            }
            _ => match self.animators.get(&(stage, counter)) {
                Some(animator) if animator.spec.max == value => {
                    writeln!(self.out, "[{at}] {counter}: {value}")
                }
                _ => Ok(()),
            },
        }
    }
}
