//! Time-dependent coronal heating profiles.

use crate::error::{PhysicsError, PhysicsResult};

/// Volumetric heating rate H(t) (erg cm^-3 s^-1) and its electron share.
pub trait Heating: Send + Sync {
    fn rate(&self, time: f64) -> f64;

    /// Fraction of the heating deposited in the electrons, in [0, 1].
    fn partition(&self) -> f64;
}

/// Which fluid receives the heating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeatedSpecies {
    Electron,
    Ion,
    Equal,
}

impl HeatedSpecies {
    pub fn partition(self) -> f64 {
        match self {
            HeatedSpecies::Electron => 1.0,
            HeatedSpecies::Ion => 0.0,
            HeatedSpecies::Equal => 0.5,
        }
    }
}

/// Temporal envelope of one heating event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseShape {
    /// Linear rise to the peak at the midpoint, linear decay to zero at the end
    Triangle,
    /// Constant over the whole event
    Square,
    /// Centered on the midpoint with σ equal to half the duration
    Gaussian,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatingEvent {
    pub shape: PulseShape,
    pub start: f64,
    pub end: f64,
    /// Peak heating rate (erg cm^-3 s^-1)
    pub magnitude: f64,
}

impl HeatingEvent {
    pub fn new(shape: PulseShape, start: f64, end: f64, magnitude: f64) -> PhysicsResult<Self> {
        if !(start.is_finite() && end.is_finite()) || end <= start {
            return Err(PhysicsError::InvalidArg {
                what: format!("heating event must end after it starts (start={start}, end={end})"),
            });
        }
        if !(magnitude.is_finite() && magnitude >= 0.0) {
            return Err(PhysicsError::NonPhysical {
                what: "heating event magnitude",
                value: magnitude,
            });
        }
        Ok(Self {
            shape,
            start,
            end,
            magnitude,
        })
    }

    fn midpoint(&self) -> f64 {
        0.5 * (self.start + self.end)
    }

    pub fn rate(&self, time: f64) -> f64 {
        match self.shape {
            PulseShape::Triangle => {
                let mid = self.midpoint();
                if time < self.start || time > self.end {
                    0.0
                } else if time <= mid {
                    self.magnitude * (time - self.start) / (mid - self.start)
                } else {
                    self.magnitude * (self.end - time) / (self.end - mid)
                }
            }
            PulseShape::Square => {
                if time >= self.start && time <= self.end {
                    self.magnitude
                } else {
                    0.0
                }
            }
            PulseShape::Gaussian => {
                let sigma = 0.5 * (self.end - self.start);
                let x = time - self.midpoint();
                self.magnitude * (-x * x / (2.0 * sigma * sigma)).exp()
            }
        }
    }
}

/// Steady background plus a train of discrete events.
#[derive(Debug, Clone, PartialEq)]
pub struct EventHeating {
    background: f64,
    partition: f64,
    events: Vec<HeatingEvent>,
}

impl EventHeating {
    pub fn new(background: f64, partition: f64, events: Vec<HeatingEvent>) -> PhysicsResult<Self> {
        if !(background.is_finite() && background >= 0.0) {
            return Err(PhysicsError::NonPhysical {
                what: "background heating",
                value: background,
            });
        }
        if !(0.0..=1.0).contains(&partition) {
            return Err(PhysicsError::NonPhysical {
                what: "heating partition",
                value: partition,
            });
        }
        Ok(Self {
            background,
            partition,
            events,
        })
    }

    /// Time-independent heating.
    pub fn constant(rate: f64, species: HeatedSpecies) -> PhysicsResult<Self> {
        Self::new(rate, species.partition(), Vec::new())
    }

    pub fn background(&self) -> f64 {
        self.background
    }

    pub fn events(&self) -> &[HeatingEvent] {
        &self.events
    }
}

impl Heating for EventHeating {
    fn rate(&self, time: f64) -> f64 {
        self.background + self.events.iter().map(|e| e.rate(time)).sum::<f64>()
    }

    fn partition(&self) -> f64 {
        self.partition
    }
}
