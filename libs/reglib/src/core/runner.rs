// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Timer-driven run loop.
//!
//! The runner is the only source of scheduled continuation: it steps the
//! machine, and while stepping keeps succeeding it schedules the next tick
//! after a delay derived from the play speed. A step that reports no legal
//! transition stops the loop and marks the machine not-playing.
//!
//! Cancellation is part of the contract, not an optimization: a reset must
//! abort the pending tick so no stale step fires into the restored state.
//! Aborting alone is not enough (a tick already past its await point runs
//! synchronously to its next one), so the loop also re-checks the playing
//! flag under the machine lock before every step.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::core::machine::{Machine, MAX_PLAY_SPEED};

/// Delay between automatic steps at a given play speed: `(9 - speed) * 125`
/// milliseconds, speed clamped to `0..=8`.
pub fn step_delay(play_speed: u8) -> Duration {
    Duration::from_millis(u64::from(9 - play_speed.min(MAX_PLAY_SPEED)) * 125)
}

/// Drives a shared [`Machine`] on a timer.
pub struct Runner {
    machine: Arc<Mutex<Machine>>,
    tick_task: Option<JoinHandle<()>>,
}

impl Runner {
    pub fn new(machine: Arc<Mutex<Machine>>) -> Self {
        Self {
            machine,
            tick_task: None,
        }
    }

    pub fn machine(&self) -> &Arc<Mutex<Machine>> {
        &self.machine
    }

    /// Toggle the play state. Turning play on starts the tick loop;
    /// turning it off cancels the pending tick.
    pub fn play_pause(&mut self) {
        self.cancel_pending();
        let playing = {
            let mut machine = self.machine.lock();
            let playing = !machine.is_playing();
            machine.set_playing(playing);
            playing
        };
        if playing {
            self.spawn_loop();
        }
    }

    /// Cancel the pending tick, then reset the machine. Order matters:
    /// the abort must land before the restore so a late tick cannot step
    /// into post-reset state.
    pub fn reset(&mut self) {
        self.cancel_pending();
        self.machine.lock().reset();
    }

    /// Stop playing without resetting.
    pub fn stop(&mut self) {
        self.cancel_pending();
        self.machine.lock().set_playing(false);
    }

    fn spawn_loop(&mut self) {
        let machine = Arc::clone(&self.machine);
        self.tick_task = Some(tokio::spawn(async move {
            loop {
                let delay = {
                    let mut machine = machine.lock();
                    if !machine.is_playing() {
                        // Stopped between ticks (reset or pause).
                        break;
                    }
                    if machine.step() {
                        step_delay(machine.play_speed())
                    } else {
                        machine.set_playing(false);
                        tracing::debug!("Run loop finished, no legal transition");
                        break;
                    }
                };
                tokio::time::sleep(delay).await;
            }
        }));
    }

    fn cancel_pending(&mut self) {
        if let Some(task) = self.tick_task.take() {
            task.abort();
        }
    }
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::{Direction, NodeKind, RegOp};

    fn looping_machine() -> Arc<Mutex<Machine>> {
        // START → REG(+, 0) → back into REG forever.
        let mut machine = Machine::new();
        let start = machine.add_node(0.0, 0.0, NodeKind::Start);
        let reg = machine.add_node(1.0, 0.0, NodeKind::Register {
            op: RegOp::Inc,
            index: 0,
        });
        machine.add_connector(start, Direction::East, reg, Direction::West, false);
        machine.add_connector(reg, Direction::North, reg, Direction::South, false);
        machine.set_play_speed(MAX_PLAY_SPEED);
        Arc::new(Mutex::new(machine))
    }

    fn halting_machine() -> Arc<Mutex<Machine>> {
        let mut machine = Machine::new();
        let start = machine.add_node(0.0, 0.0, NodeKind::Start);
        let halt = machine.add_node(1.0, 0.0, NodeKind::Halt);
        machine.add_connector(start, Direction::East, halt, Direction::West, false);
        machine.set_play_speed(MAX_PLAY_SPEED);
        Arc::new(Mutex::new(machine))
    }

    #[test]
    fn test_step_delay_formula() {
        assert_eq!(step_delay(0), Duration::from_millis(1125));
        assert_eq!(step_delay(4), Duration::from_millis(625));
        assert_eq!(step_delay(8), Duration::from_millis(125));
        // Out-of-range speeds clamp instead of underflowing.
        assert_eq!(step_delay(200), Duration::from_millis(125));
    }

    #[tokio::test]
    async fn test_run_loop_stops_at_halt() {
        let machine = halting_machine();
        let mut runner = Runner::new(Arc::clone(&machine));

        runner.play_pause();
        assert!(machine.lock().is_playing());

        // find START, START → HALT, dead end: three ticks at 125ms.
        tokio::time::sleep(Duration::from_millis(700)).await;

        assert!(!machine.lock().is_playing());
        let halted_at = machine.lock().active_node();
        assert!(halted_at.is_some());
    }

    #[tokio::test]
    async fn test_reset_cancels_pending_tick() {
        let machine = looping_machine();
        let mut runner = Runner::new(Arc::clone(&machine));

        runner.play_pause();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(machine.lock().is_playing());

        runner.reset();
        let register_after_reset = machine.lock().registers().get(0);
        assert_eq!(register_after_reset, 0);
        assert!(!machine.lock().is_playing());
        assert_eq!(machine.lock().active_node(), None);

        // No stale tick may fire into the restored state.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(machine.lock().registers().get(0), 0);
        assert_eq!(machine.lock().active_node(), None);
    }

    #[tokio::test]
    async fn test_play_pause_toggles() {
        let machine = looping_machine();
        let mut runner = Runner::new(Arc::clone(&machine));

        runner.play_pause();
        assert!(machine.lock().is_playing());
        runner.play_pause();
        assert!(!machine.lock().is_playing());

        // Paused: the loop must not keep stepping.
        let frozen = machine.lock().registers().get(0);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(machine.lock().registers().get(0), frozen);
    }
}
