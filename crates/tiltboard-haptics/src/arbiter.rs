//! Authority blending between the operator and the guidance controller.
//!
//! Alpha is the operator's share of the attraction force: 1 is full human
//! authority, 0 full autonomy. Outside the Human and Ideal holds it moves by
//! at most one step per cycle. It is stored as integer thousandths so that a
//! run of steps lands exactly on 0, 0.5 and 1.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::device::Buttons;
use crate::prediction::Prediction;

/// Damping gain while the operator is reclaiming authority.
pub const DAMPING_RESPONSIVE: f64 = 2.0;

/// Damping gain in every other situation.
pub const DAMPING_SMOOTHING: f64 = 0.10;

/// Per-cycle alpha change, in thousandths.
pub const ALPHA_STEP: u16 = 1;

/// How authority is shared for a whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ControlMode {
    /// Operator always in control.
    Human,
    /// Buttons and inactivity move authority.
    Shared,
    /// Buttons override, otherwise the physiological prediction decides.
    PhysiologyDriven,
    /// Guidance controller always in control.
    Ideal,
}

impl ControlMode {
    /// Mode for a settings selector (1 to 4).
    pub fn from_selector(selector: i64) -> Option<Self> {
        match selector {
            1 => Some(ControlMode::Human),
            2 => Some(ControlMode::Shared),
            3 => Some(ControlMode::PhysiologyDriven),
            4 => Some(ControlMode::Ideal),
            _ => None,
        }
    }

    /// Settings selector of this mode.
    pub fn selector(self) -> u8 {
        match self {
            ControlMode::Human => 1,
            ControlMode::Shared => 2,
            ControlMode::PhysiologyDriven => 3,
            ControlMode::Ideal => 4,
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlMode::Human => "human",
            ControlMode::Shared => "shared",
            ControlMode::PhysiologyDriven => "physiology",
            ControlMode::Ideal => "ideal",
        })
    }
}

/// Operator authority in thousandths, always within `0..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Authority(u16);

impl Authority {
    /// Full autonomy.
    pub const AUTONOMOUS: Authority = Authority(0);
    /// Even split.
    pub const EQUAL: Authority = Authority(500);
    /// Full human authority.
    pub const HUMAN: Authority = Authority(1000);

    /// Authority from thousandths, clamped to 1000.
    pub const fn from_millis(millis: u16) -> Self {
        if millis > 1000 {
            Authority(1000)
        } else {
            Authority(millis)
        }
    }

    /// Authority from a fraction, rounded to the nearest thousandth and
    /// clamped to `[0, 1]`. NaN maps to [`Authority::EQUAL`].
    pub fn from_f64(alpha: f64) -> Self {
        if alpha.is_nan() {
            return Authority::EQUAL;
        }
        let millis = (alpha.clamp(0.0, 1.0) * 1000.0).round();
        Authority(millis as u16)
    }

    /// Thousandths.
    #[inline]
    pub const fn millis(self) -> u16 {
        self.0
    }

    /// Fraction in `[0, 1]`.
    #[inline]
    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 1000.0
    }

    fn raised(self) -> Self {
        Authority((self.0 + ALPHA_STEP).min(Self::HUMAN.0))
    }

    fn lowered(self) -> Self {
        Authority(self.0.saturating_sub(ALPHA_STEP))
    }

    fn relaxed(self) -> Self {
        let equal = Self::EQUAL.0;
        if self.0.abs_diff(equal) <= ALPHA_STEP {
            Self::EQUAL
        } else if self.0 > equal {
            Authority(self.0 - ALPHA_STEP)
        } else {
            Authority(self.0 + ALPHA_STEP)
        }
    }
}

impl Default for Authority {
    fn default() -> Self {
        Authority::EQUAL
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.as_f64())
    }
}

/// Control parameters read by the force model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlState {
    /// Operator authority.
    pub authority: Authority,
    /// Velocity damping gain applied to the sphere (N·s/m).
    pub damping_gain: f64,
    /// Session mode.
    pub mode: ControlMode,
}

impl ControlState {
    /// Starting state for `mode`.
    pub fn initial(mode: ControlMode) -> Self {
        Self {
            authority: Authority::EQUAL,
            damping_gain: DAMPING_SMOOTHING,
            mode,
        }
    }

    /// Alpha as a fraction.
    #[inline]
    pub fn alpha(&self) -> f64 {
        self.authority.as_f64()
    }
}

/// Per-cycle inputs of the arbiter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArbiterInputs {
    /// Stylus buttons.
    pub buttons: Buttons,
    /// Operator has been still long enough to count as inactive.
    pub user_inactive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rule {
    TowardHuman,
    TowardGuidance,
    Relax,
}

/// Authority state machine.
///
/// # Examples
///
/// ```
/// use tiltboard_haptics::{ArbiterInputs, Buttons, ControlArbiter, ControlMode};
///
/// let mut arbiter = ControlArbiter::new(ControlMode::Shared);
/// let held = ArbiterInputs { buttons: Buttons::NONE.with(0, true), user_inactive: false };
/// for _ in 0..500 {
///     arbiter.update(&held);
/// }
/// assert_eq!(arbiter.state().alpha(), 1.0);
/// assert_eq!(arbiter.state().damping_gain, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ControlArbiter {
    state: ControlState,
    prediction: Prediction,
}

impl ControlArbiter {
    /// Arbiter in its initial state.
    pub fn new(mode: ControlMode) -> Self {
        Self::with_state(ControlState::initial(mode))
    }

    /// Arbiter resuming from `state`.
    pub fn with_state(state: ControlState) -> Self {
        Self {
            state,
            prediction: Prediction::default(),
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> &ControlState {
        &self.state
    }

    /// Session mode.
    #[inline]
    pub fn mode(&self) -> ControlMode {
        self.state.mode
    }

    /// Prediction currently in force.
    #[inline]
    pub fn prediction(&self) -> Prediction {
        self.prediction
    }

    /// Take a newly polled prediction. `None` keeps the previous one.
    pub fn observe_prediction(&mut self, prediction: Option<Prediction>) {
        if let Some(p) = prediction
            && p != self.prediction
        {
            debug!(from = %self.prediction, to = %p, "prediction changed");
            self.prediction = p;
        }
    }

    /// Advance one cycle.
    pub fn update(&mut self, inputs: &ArbiterInputs) -> ControlState {
        let primary = inputs.buttons.primary();
        let secondary = inputs.buttons.secondary();

        let rule = match self.state.mode {
            ControlMode::Human => {
                self.state.authority = Authority::HUMAN;
                return self.state;
            }
            ControlMode::Ideal => {
                self.state.authority = Authority::AUTONOMOUS;
                self.state.damping_gain = DAMPING_SMOOTHING;
                return self.state;
            }
            ControlMode::Shared => {
                if primary {
                    Rule::TowardHuman
                } else if secondary || inputs.user_inactive {
                    Rule::TowardGuidance
                } else {
                    Rule::Relax
                }
            }
            ControlMode::PhysiologyDriven => {
                if primary {
                    Rule::TowardHuman
                } else if secondary {
                    Rule::TowardGuidance
                } else {
                    match self.prediction {
                        Prediction::Human => Rule::TowardHuman,
                        Prediction::Negotiate => Rule::Relax,
                        Prediction::Autonomous => Rule::TowardGuidance,
                    }
                }
            }
        };

        match rule {
            Rule::TowardHuman => {
                self.state.authority = self.state.authority.raised();
                self.state.damping_gain = DAMPING_RESPONSIVE;
            }
            Rule::TowardGuidance => {
                self.state.authority = self.state.authority.lowered();
                self.state.damping_gain = DAMPING_SMOOTHING;
            }
            Rule::Relax => {
                self.state.authority = self.state.authority.relaxed();
                self.state.damping_gain = DAMPING_SMOOTHING;
            }
        }
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(index: usize) -> ArbiterInputs {
        ArbiterInputs {
            buttons: Buttons::NONE.with(index, true),
            user_inactive: false,
        }
    }

    fn idle() -> ArbiterInputs {
        ArbiterInputs::default()
    }

    fn at(mode: ControlMode, alpha: f64) -> ControlArbiter {
        ControlArbiter::with_state(ControlState {
            authority: Authority::from_f64(alpha),
            damping_gain: DAMPING_SMOOTHING,
            mode,
        })
    }

    #[test]
    fn test_selector_round_trip() {
        for selector in 1..=4 {
            let mode = ControlMode::from_selector(selector);
            assert_eq!(mode.map(|m| i64::from(m.selector())), Some(selector));
        }
        assert_eq!(ControlMode::from_selector(0), None);
        assert_eq!(ControlMode::from_selector(5), None);
    }

    #[test]
    fn test_initial_state() {
        let arbiter = ControlArbiter::new(ControlMode::Shared);
        assert_eq!(arbiter.state().authority, Authority::EQUAL);
        assert_eq!(arbiter.state().damping_gain, DAMPING_SMOOTHING);
        assert_eq!(arbiter.prediction(), Prediction::Human);
    }

    #[test]
    fn test_human_mode_holds_full_authority() {
        let mut arbiter = ControlArbiter::new(ControlMode::Human);
        assert_eq!(arbiter.update(&pressed(1)).authority, Authority::HUMAN);
        assert_eq!(arbiter.update(&idle()).authority, Authority::HUMAN);
    }

    #[test]
    fn test_ideal_mode_holds_autonomy() {
        let mut arbiter = at(ControlMode::Ideal, 0.9);
        arbiter.state.damping_gain = DAMPING_RESPONSIVE;
        let state = arbiter.update(&pressed(0));
        assert_eq!(state.authority, Authority::AUTONOMOUS);
        assert_eq!(state.damping_gain, DAMPING_SMOOTHING);
    }

    #[test]
    fn test_shared_primary_wins_over_secondary() {
        let mut arbiter = ControlArbiter::new(ControlMode::Shared);
        let both = ArbiterInputs {
            buttons: Buttons::new([true, true, false, false]),
            user_inactive: true,
        };
        let state = arbiter.update(&both);
        assert_eq!(state.authority.millis(), 501);
        assert_eq!(state.damping_gain, DAMPING_RESPONSIVE);
    }

    #[test]
    fn test_shared_inactivity_lowers_authority() {
        let mut arbiter = ControlArbiter::new(ControlMode::Shared);
        let inactive = ArbiterInputs {
            buttons: Buttons::NONE,
            user_inactive: true,
        };
        assert_eq!(arbiter.update(&inactive).authority.millis(), 499);
    }

    #[test]
    fn test_shared_clamps_at_bounds() {
        let mut arbiter = at(ControlMode::Shared, 1.0);
        assert_eq!(arbiter.update(&pressed(0)).authority, Authority::HUMAN);
        let mut arbiter = at(ControlMode::Shared, 0.0);
        assert_eq!(arbiter.update(&pressed(1)).authority, Authority::AUTONOMOUS);
    }

    #[test]
    fn test_relax_lands_on_equal() {
        let mut arbiter = at(ControlMode::Shared, 0.501);
        assert_eq!(arbiter.update(&idle()).authority, Authority::EQUAL);
        assert_eq!(arbiter.update(&idle()).authority, Authority::EQUAL);
        let mut arbiter = at(ControlMode::Shared, 0.2);
        assert_eq!(arbiter.update(&idle()).authority.millis(), 201);
    }

    #[test]
    fn test_physiology_ignores_inactivity() {
        let mut arbiter = ControlArbiter::new(ControlMode::PhysiologyDriven);
        arbiter.observe_prediction(Some(Prediction::Negotiate));
        let inactive = ArbiterInputs {
            buttons: Buttons::NONE,
            user_inactive: true,
        };
        assert_eq!(arbiter.update(&inactive).authority, Authority::EQUAL);
    }

    #[test]
    fn test_physiology_follows_prediction() {
        let mut arbiter = ControlArbiter::new(ControlMode::PhysiologyDriven);
        let state = arbiter.update(&idle());
        assert_eq!(state.authority.millis(), 501);
        assert_eq!(state.damping_gain, DAMPING_RESPONSIVE);

        arbiter.observe_prediction(Some(Prediction::Autonomous));
        let state = arbiter.update(&idle());
        assert_eq!(state.authority.millis(), 500);
        assert_eq!(state.damping_gain, DAMPING_SMOOTHING);

        arbiter.observe_prediction(None);
        assert_eq!(arbiter.prediction(), Prediction::Autonomous);
        assert_eq!(arbiter.update(&idle()).authority.millis(), 499);
    }

    #[test]
    fn test_authority_conversions() {
        assert_eq!(Authority::from_f64(1.7), Authority::HUMAN);
        assert_eq!(Authority::from_f64(-0.2), Authority::AUTONOMOUS);
        assert_eq!(Authority::from_f64(f64::NAN), Authority::EQUAL);
        assert_eq!(Authority::from_millis(4000), Authority::HUMAN);
        assert_eq!(Authority::from_f64(0.8).to_string(), "0.800");
    }
}
