use serde::{Deserialize, Serialize};

/// Pointer button of a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickKind {
    Single,
    Double,
    Triple,
}

/// Turns timestamped clicks into single / double / triple clicks.
///
/// A click is a double when it follows a click of the same button within
/// `double_window` seconds, and a triple when it additionally comes within
/// `triple_window` seconds of the last double. Only the previous click and
/// the last double are remembered.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickClassifier {
    double_window: f64,
    triple_window: f64,
    last_time: Option<f64>,
    last_button: Option<Button>,
    double_click_time: Option<f64>,
}

impl ClickClassifier {
    pub fn new(double_window: f64, triple_window: f64) -> Self {
        Self {
            double_window,
            triple_window,
            last_time: None,
            last_button: None,
            double_click_time: None,
        }
    }

    /// Classify a click at `time` seconds. Timestamps only need a common
    /// origin, not wall-clock meaning.
    pub fn classify(&mut self, button: Button, time: f64) -> ClickKind {
        let quick_repeat = match (self.last_time, self.last_button) {
            (Some(last), Some(prev)) => prev == button && time - last < self.double_window,
            _ => false,
        };

        let kind = match self.double_click_time {
            Some(dct) if quick_repeat && time - dct < self.triple_window => ClickKind::Triple,
            _ if quick_repeat => {
                self.double_click_time = Some(time);
                ClickKind::Double
            }
            _ => ClickKind::Single,
        };

        self.last_time = Some(time);
        self.last_button = Some(button);
        kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ClickClassifier {
        ClickClassifier::new(0.3, 0.5)
    }

    #[test]
    fn single_double_triple_sequence() {
        let mut c = classifier();
        assert_eq!(c.classify(Button::Left, 10.0), ClickKind::Single);
        assert_eq!(c.classify(Button::Left, 10.1), ClickKind::Double);
        assert_eq!(c.classify(Button::Left, 10.2), ClickKind::Triple);
    }

    #[test]
    fn button_change_breaks_the_chain() {
        let mut c = classifier();
        c.classify(Button::Left, 1.0);
        assert_eq!(c.classify(Button::Right, 1.1), ClickKind::Single);
        assert_eq!(c.classify(Button::Right, 1.2), ClickKind::Double);
    }

    #[test]
    fn slow_clicks_stay_single() {
        let mut c = classifier();
        assert_eq!(c.classify(Button::Left, 0.0), ClickKind::Single);
        assert_eq!(c.classify(Button::Left, 0.3), ClickKind::Single);
        assert_eq!(c.classify(Button::Left, 1.0), ClickKind::Single);
    }

    #[test]
    fn stale_double_gives_a_new_double() {
        let mut c = classifier();
        c.classify(Button::Left, 0.0);
        assert_eq!(c.classify(Button::Left, 0.1), ClickKind::Double);
        c.classify(Button::Left, 5.0);
        // quick repeat, but the last double is long gone
        assert_eq!(c.classify(Button::Left, 5.1), ClickKind::Double);
    }

    #[test]
    fn configurable_windows() {
        let mut c = ClickClassifier::new(1.0, 2.0);
        c.classify(Button::Right, 0.0);
        assert_eq!(c.classify(Button::Right, 0.9), ClickKind::Double);
        assert_eq!(c.classify(Button::Right, 1.8), ClickKind::Triple);
    }
}
