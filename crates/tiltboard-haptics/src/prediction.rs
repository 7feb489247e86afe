//! Physiological prediction input.

use std::fmt;

use serde::Serialize;

/// Label produced by the external physiology classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Prediction {
    /// Operator is comfortable, hand authority back (token `0`).
    #[default]
    Human,
    /// Share authority evenly (token `1`).
    Negotiate,
    /// Any other token, hand authority to the guidance controller.
    Autonomous,
}

impl Prediction {
    /// Parse one token. Surrounding whitespace is ignored; an empty token
    /// is no prediction at all.
    ///
    /// ```
    /// use tiltboard_haptics::Prediction;
    ///
    /// assert_eq!(Prediction::from_token("0"), Some(Prediction::Human));
    /// assert_eq!(Prediction::from_token(" 1\n"), Some(Prediction::Negotiate));
    /// assert_eq!(Prediction::from_token("2"), Some(Prediction::Autonomous));
    /// assert_eq!(Prediction::from_token("  "), None);
    /// ```
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim() {
            "" => None,
            "0" => Some(Prediction::Human),
            "1" => Some(Prediction::Negotiate),
            _ => Some(Prediction::Autonomous),
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Prediction::Human => "human",
            Prediction::Negotiate => "negotiate",
            Prediction::Autonomous => "autonomous",
        })
    }
}

/// Source of predictions polled by the haptic loop.
///
/// `None` means nothing could be read this cycle; the arbiter keeps the
/// previous label.
pub trait PredictionSource: Send {
    /// Latest available prediction.
    fn poll(&mut self) -> Option<Prediction>;
}

/// Fixed prediction, for tests and offline runs.
#[derive(Debug, Clone, Copy)]
pub struct StaticPrediction(pub Option<Prediction>);

impl PredictionSource for StaticPrediction {
    fn poll(&mut self) -> Option<Prediction> {
        self.0
    }
}
