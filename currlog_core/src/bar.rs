//! Thermometer-coded LED bar.
use currlog_traits::OutputLine;

use crate::config::Boundary;

/// Number of bar LEDs lit for `amps` with `step` amperes per LED.
///
/// LED n (1-based) is lit when the current passes `n * step`; with
/// `Boundary::Strict` an exact multiple does not light its LED, with
/// `Boundary::Inclusive` it does (giving exactly `floor(amps / step)`).
/// Capped at `leds`. Non-finite input or a non-positive step lights nothing.
pub fn lit_count(amps: f64, step: f64, leds: usize, boundary: Boundary) -> usize {
    if !(step.is_finite() && step > 0.0) || !amps.is_finite() {
        return 0;
    }
    (1..=leds)
        .take_while(|&n| {
            let threshold = step * n as f64;
            match boundary {
                Boundary::Strict => amps > threshold,
                Boundary::Inclusive => amps >= threshold,
            }
        })
        .count()
}

pub struct LedBar {
    lines: Vec<Box<dyn OutputLine + Send>>,
    shown: Option<usize>,
}

impl LedBar {
    pub fn new(lines: Vec<Box<dyn OutputLine + Send>>) -> Self {
        Self { lines, shown: None }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Light the lowest `lit` LEDs. Lines are only rewritten when the count changes.
    pub fn show(&mut self, lit: usize) {
        if self.shown == Some(lit) {
            return;
        }
        for (i, line) in self.lines.iter_mut().enumerate() {
            if let Err(e) = line.set(i < lit) {
                tracing::warn!(led = i, error = %e, "bar led write failed");
            }
        }
        self.shown = Some(lit);
    }

    pub fn all_on(&mut self) {
        let n = self.lines.len();
        self.show(n);
    }

    pub fn clear(&mut self) {
        self.show(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingLine;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, 0)]
    #[case(4.9, 0)]
    #[case(5.0, 0)]
    #[case(5.1, 1)]
    #[case(10.0, 1)]
    #[case(29.99, 5)]
    #[case(30.0, 5)]
    #[case(30.01, 6)]
    #[case(1000.0, 6)]
    fn strict_boundary(#[case] amps: f64, #[case] lit: usize) {
        assert_eq!(lit_count(amps, 5.0, 6, Boundary::Strict), lit);
    }

    #[rstest]
    #[case(4.9, 0)]
    #[case(5.0, 1)]
    #[case(10.0, 2)]
    #[case(30.0, 6)]
    #[case(35.0, 6)]
    fn inclusive_boundary(#[case] amps: f64, #[case] lit: usize) {
        assert_eq!(lit_count(amps, 5.0, 6, Boundary::Inclusive), lit);
    }

    #[test]
    fn degenerate_inputs_light_nothing() {
        assert_eq!(lit_count(f64::NAN, 5.0, 6, Boundary::Strict), 0);
        assert_eq!(lit_count(f64::INFINITY, 5.0, 6, Boundary::Strict), 0);
        assert_eq!(lit_count(10.0, 0.0, 6, Boundary::Strict), 0);
        assert_eq!(lit_count(10.0, 5.0, 0, Boundary::Strict), 0);
    }

    #[test]
    fn show_writes_thermometer_pattern_once() {
        let lines: Vec<RecordingLine> = (0..4).map(|_| RecordingLine::new()).collect();
        let mut bar = LedBar::new(
            lines
                .iter()
                .map(|l| Box::new(l.clone()) as Box<dyn OutputLine + Send>)
                .collect(),
        );
        bar.show(2);
        bar.show(2);
        let levels: Vec<Vec<bool>> = lines.iter().map(|l| l.levels()).collect();
        assert_eq!(
            levels,
            vec![vec![true], vec![true], vec![false], vec![false]]
        );
        bar.clear();
        assert!(lines.iter().all(|l| !l.is_high()));
    }
}
