//! Step sequencing for a single brew.
//!
//! A [`TimerSession`] is advanced by one [`TimerSession::tick`] per second.
//! It never sleeps or touches the terminal; callers own the clock and the
//! rendering, and react to the [`Cue`]s each tick reports.

use tracing::debug;

use crate::recipe::Step;

/// Seconds of silent "get set" countdown before the first step
pub const PREP_TIME: u32 = 3;
/// Ticks the completion message stays up before the session returns to idle
pub const FINISH_DISPLAY_TICKS: u32 = 7;
/// Seconds remaining in a step at which the countdown cue fires
pub const COUNTDOWN_CUE_AT: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Preparing,
    Running { step: usize },
    Finished,
}

impl Phase {
    pub fn is_active(&self) -> bool {
        !matches!(self, Phase::Idle)
    }
}

/// Side effects requested by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cue {
    Countdown,
    Finish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StepStatus {
    Done,
    Active,
    Pending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub prep_secs: u32,
    pub finish_display_ticks: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            prep_secs: PREP_TIME,
            finish_display_ticks: FINISH_DISPLAY_TICKS,
        }
    }
}

/// What happened during one tick (or during a start command)
#[derive(Debug, Clone, PartialEq)]
pub struct TickEvent {
    pub phase: Phase,
    pub seconds_left: u32,
    pub elapsed_secs: u32,
    pub cumulative_water: u32,
    pub step_progress: f64,
    pub cues: Vec<Cue>,
}

/// A step annotated for display
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub index: usize,
    pub step: Step,
    pub status: StepStatus,
    /// water on the scale once this step's pour is done
    pub cumulative_water: u32,
}

/// Immutable per-tick view handed to the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub seconds_left: u32,
    pub elapsed_secs: u32,
    pub cumulative_water: u32,
    /// scale reading the current step starts from
    pub previous_water: u32,
    pub step_progress: f64,
    pub steps: Vec<StepView>,
}

impl SessionSnapshot {
    pub fn current_step(&self) -> Option<&StepView> {
        match self.phase {
            Phase::Running { step } => self.steps.get(step),
            _ => None,
        }
    }

    /// The step after the running one, or the first step while preparing
    pub fn upcoming_step(&self) -> Option<&StepView> {
        match self.phase {
            Phase::Preparing => self.steps.first(),
            Phase::Running { step } => self.steps.get(step + 1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TimerSession {
    steps: Vec<Step>,
    timing: Timing,
    phase: Phase,
    seconds_remaining: u32,
    cumulative_water: u32,
    elapsed_secs: u32,
    cancel_requested: bool,
}

impl TimerSession {
    pub fn new(steps: Vec<Step>, timing: Timing) -> Self {
        Self {
            steps,
            timing,
            phase: Phase::Idle,
            seconds_remaining: 0,
            cumulative_water: 0,
            elapsed_secs: 0,
            cancel_requested: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn cumulative_water(&self) -> u32 {
        self.cumulative_water
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_active(&self) -> bool {
        self.phase.is_active()
    }

    /// Idle -> Preparing. Ignored in any other phase.
    pub fn start(&mut self) -> TickEvent {
        let mut cues = Vec::new();
        if self.phase == Phase::Idle {
            self.cumulative_water = 0;
            self.elapsed_secs = 0;
            self.cancel_requested = false;
            self.phase = Phase::Preparing;
            self.seconds_remaining = self.timing.prep_secs;
            debug!(prep_secs = self.timing.prep_secs, "brew started");
            if self.seconds_remaining == 0 {
                self.leave_preparation(&mut cues);
            }
        }
        self.event(cues)
    }

    /// Asks the session to stop; honoured at the start of the next tick.
    pub fn request_cancel(&mut self) {
        if self.is_active() {
            self.cancel_requested = true;
        }
    }

    pub fn cancel_requested(&self) -> bool {
        self.cancel_requested
    }

    /// Applies a pending cancellation. Returns true if the session went idle.
    pub fn cancel_if_requested(&mut self) -> bool {
        if !self.cancel_requested {
            return false;
        }
        self.cancel_requested = false;
        if self.is_active() {
            debug!(phase = ?self.phase, "brew cancelled");
            self.phase = Phase::Idle;
            self.seconds_remaining = 0;
            return true;
        }
        false
    }

    /// Advances the session by one second.
    pub fn tick(&mut self) -> TickEvent {
        let mut cues = Vec::new();
        if self.cancel_if_requested() {
            return self.event(cues);
        }

        match self.phase {
            Phase::Idle => {}
            Phase::Preparing => {
                self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
                if self.seconds_remaining == 0 {
                    self.leave_preparation(&mut cues);
                }
            }
            Phase::Running { step } => {
                self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
                self.elapsed_secs += 1;
                if self.seconds_remaining == 0 {
                    self.enter_step(step + 1, &mut cues);
                } else {
                    self.check_countdown(step, &mut cues);
                }
            }
            Phase::Finished => {
                self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
                if self.seconds_remaining == 0 {
                    debug!("finish window elapsed");
                    self.phase = Phase::Idle;
                }
            }
        }

        self.event(cues)
    }

    fn leave_preparation(&mut self, cues: &mut Vec<Cue>) {
        self.elapsed_secs = 0;
        self.cumulative_water = 0;
        self.enter_step(0, cues);
    }

    /// Enters `index`, skipping through zero-length steps, or finishes the
    /// brew when no steps remain.
    fn enter_step(&mut self, index: usize, cues: &mut Vec<Cue>) {
        let mut index = index;
        loop {
            let Some(step) = self.steps.get(index) else {
                self.finish(cues);
                return;
            };
            self.cumulative_water += step.water;
            self.phase = Phase::Running { step: index };
            self.seconds_remaining = step.duration;
            debug!(
                step = index,
                action = %step.action,
                water = self.cumulative_water,
                "entered step"
            );
            if step.duration > 0 {
                self.check_countdown(index, cues);
                return;
            }
            index += 1;
        }
    }

    fn check_countdown(&self, step: usize, cues: &mut Vec<Cue>) {
        let is_last = step + 1 >= self.steps.len();
        if self.seconds_remaining == COUNTDOWN_CUE_AT && !is_last {
            cues.push(Cue::Countdown);
        }
    }

    fn finish(&mut self, cues: &mut Vec<Cue>) {
        debug!(
            elapsed = self.elapsed_secs,
            water = self.cumulative_water,
            "brew finished"
        );
        cues.push(Cue::Finish);
        self.seconds_remaining = self.timing.finish_display_ticks;
        self.phase = if self.seconds_remaining == 0 {
            Phase::Idle
        } else {
            Phase::Finished
        };
    }

    pub fn step_progress(&self) -> f64 {
        match self.phase {
            Phase::Idle => 0.0,
            Phase::Preparing | Phase::Finished => 1.0,
            Phase::Running { step } => {
                let duration = self.steps.get(step).map(|s| s.duration).unwrap_or(0);
                if duration == 0 {
                    1.0
                } else {
                    (duration - self.seconds_remaining.min(duration)) as f64 / duration as f64
                }
            }
        }
    }

    pub fn step_status(&self, index: usize) -> StepStatus {
        match self.phase {
            Phase::Idle | Phase::Preparing => StepStatus::Pending,
            Phase::Finished => StepStatus::Done,
            Phase::Running { step } if index < step => StepStatus::Done,
            Phase::Running { step } if index == step => StepStatus::Active,
            Phase::Running { .. } => StepStatus::Pending,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let mut running_total = 0;
        let steps = self
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                running_total += step.water;
                StepView {
                    index,
                    step: step.clone(),
                    status: self.step_status(index),
                    cumulative_water: running_total,
                }
            })
            .collect();

        let previous_water = match self.phase {
            Phase::Running { step } => self
                .cumulative_water
                .saturating_sub(self.steps.get(step).map(|s| s.water).unwrap_or(0)),
            _ => self.cumulative_water,
        };

        SessionSnapshot {
            phase: self.phase,
            seconds_left: self.seconds_remaining,
            elapsed_secs: self.elapsed_secs,
            cumulative_water: self.cumulative_water,
            previous_water,
            step_progress: self.step_progress(),
            steps,
        }
    }

    fn event(&self, cues: Vec<Cue>) -> TickEvent {
        TickEvent {
            phase: self.phase,
            seconds_left: self.seconds_remaining,
            elapsed_secs: self.elapsed_secs,
            cumulative_water: self.cumulative_water,
            step_progress: self.step_progress(),
            cues,
        }
    }
}
