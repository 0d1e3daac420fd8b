use super::description::TargetAnimation;
use super::runtime::BoundAnimator;
use crate::error::{Result, VectorError};
use crate::scene::{Shape, Target};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Lifecycle of a player. `Ended` and `Prepared` can both start again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Unbound,
    Prepared,
    Started,
    Paused,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Direction {
    Forward,
    Backward { from: f64 },
}

/// Plays every target animation of one drawable together.
///
/// The player never owns a timer: the host passes the frame time to
/// [`on_frame`](Self::on_frame) and keeps drawing while it returns `true`.
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    state: PlayerState,
    root: Option<BoundAnimator>,
    start_time: Duration,
    paused_at: Option<Duration>,
    direction: Direction,
}

impl Default for AnimationPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl AnimationPlayer {
    pub fn new() -> Self {
        Self {
            state: PlayerState::Unbound,
            root: None,
            start_time: Duration::ZERO,
            paused_at: None,
            direction: Direction::Forward,
        }
    }

    /// Binds each animation to the node its target name resolves to.
    /// Only groups and paths can be animated.
    #[instrument(level = "debug", skip_all, fields(targets = targets.len()))]
    pub fn prepare(&mut self, targets: &[TargetAnimation], shape: &Shape) -> Result<()> {
        let mut children = Vec::with_capacity(targets.len());
        for target in targets {
            let node = shape
                .find_target(&target.target_name)
                .ok_or_else(|| VectorError::UnresolvedAnimationTarget(target.target_name.clone()))?;
            if matches!(node, Target::Shape | Target::ClipPath(_)) {
                return Err(VectorError::UnsupportedAnimationTarget(target.target_name.clone()));
            }
            children.push(BoundAnimator::bind(&target.animation, node)?);
        }
        debug!("Bound {} target animations", children.len());
        self.root = Some(BoundAnimator::together(children));
        self.state = PlayerState::Prepared;
        self.paused_at = None;
        self.direction = Direction::Forward;
        Ok(())
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// True between start and end, paused or not.
    pub fn is_running(&self) -> bool {
        matches!(self.state, PlayerState::Started | PlayerState::Paused)
    }

    pub fn is_started(&self) -> bool {
        self.state == PlayerState::Started
    }

    pub fn is_paused(&self) -> bool {
        self.state == PlayerState::Paused
    }

    pub fn is_infinite(&self) -> bool {
        self.total_duration().is_none()
    }

    /// Milliseconds, `None` when something repeats forever.
    pub fn total_duration(&self) -> Option<u64> {
        self.root.as_ref().map_or(Some(0), BoundAnimator::total_duration)
    }

    /// Playback position in milliseconds.
    pub fn position(&self, now: Duration) -> f64 {
        let now = self.paused_at.unwrap_or(now);
        let elapsed = now.saturating_sub(self.start_time).as_secs_f64() * 1000.0;
        match self.direction {
            Direction::Forward => elapsed,
            Direction::Backward { from } => (from - elapsed).max(0.0),
        }
    }

    /// Does nothing when already running.
    pub fn start(&mut self, now: Duration, shape: &mut Shape) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let Some(root) = self.root.as_mut() else {
            warn!("Start requested before animations were prepared");
            return Ok(());
        };
        root.rewind();
        root.apply_at(0.0, shape)?;
        self.start_time = now;
        self.paused_at = None;
        self.direction = Direction::Forward;
        self.state = PlayerState::Started;
        Ok(())
    }

    /// Jumps to the end values regardless of elapsed time.
    pub fn end(&mut self, shape: &mut Shape) -> Result<()> {
        let running = self.is_running();
        let Some(root) = self.root.as_mut() else {
            return Ok(());
        };
        if !running {
            root.rewind();
        }
        root.apply_end(shape)?;
        self.paused_at = None;
        self.state = PlayerState::Ended;
        Ok(())
    }

    pub fn pause(&mut self, now: Duration) {
        if self.state == PlayerState::Started {
            self.paused_at = Some(now);
            self.state = PlayerState::Paused;
        }
    }

    /// Continues from where [`pause`](Self::pause) left off.
    pub fn resume(&mut self, now: Duration) {
        if let (PlayerState::Paused, Some(paused_at)) = (self.state, self.paused_at) {
            self.start_time += now.saturating_sub(paused_at);
            self.paused_at = None;
            self.state = PlayerState::Started;
        }
    }

    /// Plays back towards the start from the current position, or from the
    /// end when nothing is running.
    pub fn reverse(&mut self, now: Duration, shape: &mut Shape) -> Result<()> {
        let Some(total) = self.total_duration() else {
            warn!("Cannot reverse an animation that repeats forever");
            return Ok(());
        };
        let running = self.is_running();
        let from = if running { self.position(now) } else { total as f64 };
        let Some(root) = self.root.as_mut() else {
            return Ok(());
        };
        if !running {
            root.rewind();
        }
        root.apply_at(from, shape)?;
        self.start_time = now;
        self.paused_at = None;
        self.direction = Direction::Backward { from };
        self.state = PlayerState::Started;
        Ok(())
    }

    /// Leaves the scene at the start values, ready to start again.
    pub fn reset(&mut self, shape: &mut Shape) -> Result<()> {
        let Some(root) = self.root.as_mut() else {
            return Ok(());
        };
        root.rewind();
        root.apply_start(shape)?;
        root.rewind();
        self.paused_at = None;
        self.direction = Direction::Forward;
        self.state = PlayerState::Prepared;
        Ok(())
    }

    /// Advances playback to `now`. Returns whether another frame is needed.
    pub fn on_frame(&mut self, now: Duration, shape: &mut Shape) -> Result<bool> {
        if self.state != PlayerState::Started {
            return Ok(false);
        }
        let position = self.position(now);
        let total = self.total_duration();
        let Some(root) = self.root.as_mut() else {
            return Ok(false);
        };
        root.apply_at(position, shape)?;
        let finished = match self.direction {
            Direction::Forward => total.is_some_and(|t| position >= t as f64),
            Direction::Backward { .. } => position <= 0.0,
        };
        if finished {
            debug!(position, "Animation finished");
            self.state = PlayerState::Ended;
        }
        Ok(!finished)
    }
}
