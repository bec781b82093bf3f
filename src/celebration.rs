//! Transient "course completed" signal.
//!
//! Raising the signal bumps a generation counter and scatters a fresh batch of
//! confetti. The owner schedules a clear for that generation; a clear for an
//! older generation is ignored, so a re-trigger effectively replaces the
//! pending timer.

use rand::Rng;
use serde::Serialize;

pub const CONFETTI_PIECES: usize = 20;
pub const CONFETTI_PALETTE: [&str; 4] = ["#fbbf24", "#f472b6", "#a78bfa", "#60a5fa"];

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfettiPiece {
  pub color: &'static str,
  pub left_pct: f32,
  pub top_pct: f32,
  pub delay_secs: f32,
}

#[derive(Clone, Debug, Default)]
pub struct Celebration {
  active: bool,
  generation: u64,
  confetti: Vec<ConfettiPiece>,
}

impl Celebration {
  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn confetti(&self) -> &[ConfettiPiece] {
    &self.confetti
  }

  /// Raise the signal and return the generation a timer should clear.
  pub fn raise(&mut self) -> u64 {
    self.generation += 1;
    self.active = true;
    self.confetti = scatter_confetti(&mut rand::thread_rng());
    self.generation
  }

  /// Clear the signal if `generation` is still the current one.
  pub fn clear(&mut self, generation: u64) -> bool {
    if !self.active || generation != self.generation {
      return false;
    }
    self.active = false;
    self.confetti.clear();
    true
  }

  /// Drop any active signal and invalidate outstanding timers.
  pub fn reset(&mut self) {
    self.generation += 1;
    self.active = false;
    self.confetti.clear();
  }
}

fn scatter_confetti<R: Rng>(rng: &mut R) -> Vec<ConfettiPiece> {
  (0..CONFETTI_PIECES)
    .map(|i| ConfettiPiece {
      color: CONFETTI_PALETTE[i % CONFETTI_PALETTE.len()],
      left_pct: rng.gen_range(0.0..100.0),
      top_pct: rng.gen_range(0.0..100.0),
      delay_secs: rng.gen_range(0.0..0.5),
    })
    .collect()
}
