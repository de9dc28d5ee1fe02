//! Bounds a step function to an analysis window without losing or double counting
//! the partial periods that straddle the window edges.

use crate::series::step_function::StepFunction;
use crate::types::window::Window;
use log::trace;

impl StepFunction {
    /// Clips the step function to `window`, in place.
    ///
    /// The first and last boundaries are handled independently:
    ///
    /// * **start**: a boundary before the window that is followed by one inside it is
    ///   moved forward to the window start (keeping its time of day). If the *second*
    ///   boundary is already on or before the window start, the first one is dropped
    ///   and the value ending at the second is marked missing, since it lies entirely
    ///   before the window. A lone boundary before the window start is dropped.
    /// * **end**: the same in mirror image, against the cutoff (the day after the
    ///   window end). A last boundary past the cutoff is pulled back to it if the
    ///   previous boundary lies before the cutoff, and dropped otherwise.
    ///
    /// Only the outermost boundary on each side is adjusted. Boundaries further outside
    /// should be removed beforehand by pre-filtering records against the window, as
    /// [`crate::reindex_by_period_endtime`] does.
    pub fn clip(&mut self, window: &Window) {
        self.clip_start(window);
        self.clip_end(window);
    }

    /// Consuming variant of [`StepFunction::clip`].
    pub fn clipped(mut self, window: &Window) -> Self {
        self.clip(window);
        self
    }

    fn clip_start(&mut self, window: &Window) {
        let start = window.start();
        match self.steps.as_mut_slice() {
            [] => {}
            [only] => {
                if start > only.period_to.date() {
                    trace!("{}: dropping lone boundary before {}", self.key, start);
                    self.steps.clear();
                }
            }
            [first, second, ..] => {
                let first_date = first.period_to.date();
                if start <= first_date {
                    return;
                }
                if start < second.period_to.date() {
                    first.period_to += start - first_date;
                } else {
                    second.value = None;
                    self.steps.remove(0);
                }
            }
        }
    }

    fn clip_end(&mut self, window: &Window) {
        let cutoff = window.cutoff_date();
        match self.steps.as_mut_slice() {
            [] => {}
            [only] => {
                if cutoff < only.period_to.date() {
                    trace!("{}: dropping lone boundary after {}", self.key, cutoff);
                    self.steps.clear();
                }
            }
            [.., second_last, last] => {
                let last_date = last.period_to.date();
                if cutoff >= last_date {
                    return;
                }
                if cutoff > second_last.period_to.date() {
                    last.period_to -= last_date - cutoff;
                } else {
                    self.steps.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::series::step_function::StepFunction;
    use crate::series::test_support::{at, key, record};
    use crate::types::window::Window;
    use chrono::NaiveDateTime;

    fn instants(steps: &StepFunction) -> Vec<NaiveDateTime> {
        steps.steps().iter().map(|s| s.period_to).collect()
    }

    fn two_periods() -> StepFunction {
        StepFunction::build(
            key(),
            &[
                record("2021-01-01 06:00", "2021-01-10 06:00", Some(1.0), "2021-01-10 12:00"),
                record("2021-01-10 06:00", "2021-01-20 06:00", Some(2.0), "2021-01-20 12:00"),
            ],
        )
    }

    #[test]
    fn test_start_inside_first_period_moves_first_boundary() {
        let window = Window::new("2021-01-05", "2021-01-25").unwrap();
        let steps = two_periods().clipped(&window);
        assert_eq!(
            instants(&steps),
            vec![at("2021-01-05 06:00"), at("2021-01-10 06:00"), at("2021-01-20 06:00")]
        );
    }

    #[test]
    fn test_start_past_second_boundary_drops_first() {
        let window = Window::new("2021-01-12", "2021-01-25").unwrap();
        let steps = two_periods().clipped(&window);
        assert_eq!(instants(&steps), vec![at("2021-01-10 06:00"), at("2021-01-20 06:00")]);
        assert_eq!(steps.steps()[0].value, None);
        assert_eq!(steps.steps()[1].value, Some(2.0));
    }

    #[test]
    fn test_start_on_or_before_first_boundary_is_untouched() {
        let window = Window::new("2021-01-01", "2021-01-25").unwrap();
        assert_eq!(two_periods().clipped(&window), two_periods());
    }

    #[test]
    fn test_end_inside_last_period_pulls_last_boundary_back() {
        let window = Window::new("2021-01-01", "2021-01-15").unwrap();
        let steps = two_periods().clipped(&window);
        assert_eq!(
            instants(&steps),
            vec![at("2021-01-01 06:00"), at("2021-01-10 06:00"), at("2021-01-16 06:00")]
        );
        assert_eq!(steps.steps()[2].value, Some(2.0));
    }

    #[test]
    fn test_end_before_second_last_boundary_drops_last() {
        let window = Window::new("2021-01-01", "2021-01-08").unwrap();
        let steps = two_periods().clipped(&window);
        assert_eq!(instants(&steps), vec![at("2021-01-01 06:00"), at("2021-01-10 06:00")]);
    }

    #[test]
    fn test_lone_boundary_outside_window_is_dropped() {
        let mut before = two_periods();
        before.steps.truncate(1);
        let window = Window::new("2021-01-02", "2021-01-03").unwrap();
        assert!(before.clipped(&window).is_empty());

        let mut after = two_periods();
        after.steps.drain(..2);
        let window = Window::new("2021-01-02", "2021-01-03").unwrap();
        assert!(after.clipped(&window).is_empty());
    }

    #[test]
    fn test_clipping_empty_is_noop() {
        let window = Window::new("2021-01-02", "2021-01-03").unwrap();
        assert!(StepFunction::build(key(), &[]).clipped(&window).is_empty());
    }
}
