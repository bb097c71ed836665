//! Edge detection over the game's input signals.
//!
//! The front end reports which signals are currently held; [`EdgeDetector`]
//! compares that against the previous sample so a held key triggers its
//! action once per press.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Signal {
    Rotate,
    MoveLeft,
    MoveRight,
    SoftDrop,
}

impl Signal {
    pub const ALL: [Signal; 4] = [
        Signal::Rotate,
        Signal::MoveLeft,
        Signal::MoveRight,
        Signal::SoftDrop,
    ];

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SignalSet(u8);

impl SignalSet {
    pub const EMPTY: SignalSet = SignalSet(0);

    pub fn with(mut self, signal: Signal) -> Self {
        self.insert(signal);
        self
    }

    pub fn insert(&mut self, signal: Signal) {
        self.0 |= signal.bit();
    }

    pub fn contains(self, signal: Signal) -> bool {
        self.0 & signal.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Signals in `self` that are not in `other`.
    pub fn difference(self, other: SignalSet) -> SignalSet {
        SignalSet(self.0 & !other.0)
    }
}

impl FromIterator<Signal> for SignalSet {
    fn from_iter<T: IntoIterator<Item = Signal>>(iter: T) -> Self {
        iter.into_iter().fold(SignalSet::EMPTY, SignalSet::with)
    }
}

/// One frame of input as the game sees it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Input {
    /// Signals held during this frame.
    pub held: SignalSet,
    /// Signals that went from released to held since the previous frame.
    pub pressed: SignalSet,
}

impl Input {
    pub const NONE: Input = Input {
        held: SignalSet::EMPTY,
        pressed: SignalSet::EMPTY,
    };

    /// A single-frame tap: pressed and held.
    pub fn tap(signal: Signal) -> Self {
        let set = SignalSet::EMPTY.with(signal);
        Input {
            held: set,
            pressed: set,
        }
    }

    /// A signal held without a new press edge.
    pub fn hold(signal: Signal) -> Self {
        Input {
            held: SignalSet::EMPTY.with(signal),
            pressed: SignalSet::EMPTY,
        }
    }

    pub fn pressed(&self, signal: Signal) -> bool {
        self.pressed.contains(signal)
    }

    pub fn held(&self, signal: Signal) -> bool {
        self.held.contains(signal)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeDetector {
    previous: SignalSet,
}

impl EdgeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, current: SignalSet) -> Input {
        let pressed = current.difference(self.previous);
        self.previous = current;
        Input {
            held: current,
            pressed,
        }
    }

    pub fn reset(&mut self) {
        self.previous = SignalSet::EMPTY;
    }
}
