//! Raw strategy signals, aligned bar-for-bar with the price series.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Enter,
    Exit,
    Hold,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Enter => write!(f, "enter"),
            Signal::Exit => write!(f, "exit"),
            Signal::Hold => write!(f, "hold"),
        }
    }
}

/// One signal per bar plus the length of the leading warm-up span.
///
/// Bars inside the warm-up span always carry `Hold`; the resolver leaves the
/// position undefined there rather than flat.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    signals: Vec<Signal>,
    warmup: usize,
}

impl SignalSeries {
    pub fn new(signals: Vec<Signal>, warmup: usize) -> Self {
        let warmup = warmup.min(signals.len());
        let mut signals = signals;
        signals[..warmup].fill(Signal::Hold);
        Self { signals, warmup }
    }

    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    pub fn get(&self, i: usize) -> Option<Signal> {
        self.signals.get(i).copied()
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    pub fn entries(&self) -> Vec<bool> {
        self.signals.iter().map(|s| *s == Signal::Enter).collect()
    }

    pub fn exits(&self) -> Vec<bool> {
        self.signals.iter().map(|s| *s == Signal::Exit).collect()
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.signals.iter().filter(|s| **s == signal).count()
    }
}
