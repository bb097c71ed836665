use blockfall::input::{EdgeDetector, Input, Signal, SignalSet};

mod signal_set {
    use super::*;

    #[test]
    fn empty_set_contains_nothing() {
        for signal in Signal::ALL {
            assert!(!SignalSet::EMPTY.contains(signal));
        }
        assert!(SignalSet::EMPTY.is_empty());
    }

    #[test]
    fn collected_set_contains_its_members() {
        let set: SignalSet = [Signal::Rotate, Signal::SoftDrop].into_iter().collect();

        assert!(set.contains(Signal::Rotate));
        assert!(set.contains(Signal::SoftDrop));
        assert!(!set.contains(Signal::MoveLeft));
        assert!(!set.contains(Signal::MoveRight));
    }

    #[test]
    fn difference_removes_shared_signals() {
        let a: SignalSet = [Signal::Rotate, Signal::MoveLeft].into_iter().collect();
        let b = SignalSet::EMPTY.with(Signal::MoveLeft);

        assert_eq!(a.difference(b), SignalSet::EMPTY.with(Signal::Rotate));
    }
}

mod edge_detector {
    use super::*;

    #[test]
    fn first_sample_reports_press() {
        let mut edges = EdgeDetector::new();
        let input = edges.sample(SignalSet::EMPTY.with(Signal::Rotate));

        assert!(input.pressed(Signal::Rotate));
        assert!(input.held(Signal::Rotate));
    }

    #[test]
    fn held_signal_reports_no_second_press() {
        let mut edges = EdgeDetector::new();
        let rotate = SignalSet::EMPTY.with(Signal::Rotate);
        edges.sample(rotate);

        let input = edges.sample(rotate);

        assert!(!input.pressed(Signal::Rotate));
        assert!(input.held(Signal::Rotate));
    }

    #[test]
    fn release_then_press_is_a_new_edge() {
        let mut edges = EdgeDetector::new();
        let left = SignalSet::EMPTY.with(Signal::MoveLeft);
        edges.sample(left);

        let released = edges.sample(SignalSet::EMPTY);
        let pressed = edges.sample(left);

        assert_eq!(released, Input::NONE);
        assert!(pressed.pressed(Signal::MoveLeft));
    }

    #[test]
    fn signals_are_tracked_independently() {
        let mut edges = EdgeDetector::new();
        edges.sample(SignalSet::EMPTY.with(Signal::SoftDrop));

        let both: SignalSet = [Signal::SoftDrop, Signal::MoveRight].into_iter().collect();
        let input = edges.sample(both);

        assert!(input.held(Signal::SoftDrop));
        assert!(!input.pressed(Signal::SoftDrop));
        assert!(input.pressed(Signal::MoveRight));
    }

    #[test]
    fn reset_forgets_held_signals() {
        let mut edges = EdgeDetector::new();
        let rotate = SignalSet::EMPTY.with(Signal::Rotate);
        edges.sample(rotate);

        edges.reset();

        assert!(edges.sample(rotate).pressed(Signal::Rotate));
    }
}
