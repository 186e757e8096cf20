//! This module contains the tags used to address measurements.

use strum_macros::{EnumCount, EnumIter};

/// What a measured value represents.
#[derive(Debug, EnumIter, EnumCount, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Quantity {
    /// Volts.
    Voltage,
    /// Amps.
    Current,
    /// Watts.
    ActivePower,
    /// kWh.
    ActiveEnergy,
    /// var.
    ReactivePower,
    /// kvarh.
    ReactiveEnergy,
    /// VA.
    ApparentPower,
    /// kVAh.
    ApparentEnergy,
    PowerFactor,
    /// Hz.
    Frequency,
    /// Degrees, relative to phase A's voltage.
    VoltagePhaseAngle,
    /// Degrees, relative to phase A's voltage.
    CurrentPhaseAngle,
}

impl Quantity {
    /// Position of this quantity in per-quantity tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Whether the meter reports a combined total for this quantity.
    ///
    /// Voltage has a combined view too, but it is the average of the three phases rather than a
    /// reported total.
    pub const fn has_reported_total(self) -> bool {
        matches!(
            self,
            Quantity::ActivePower
                | Quantity::ReactivePower
                | Quantity::ApparentPower
                | Quantity::ActiveEnergy
                | Quantity::ReactiveEnergy
                | Quantity::ApparentEnergy
                | Quantity::PowerFactor
        )
    }
}

/// Which line a value belongs to.
#[derive(Debug, EnumIter, EnumCount, PartialEq, Eq, Clone, Copy, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum Phase {
    A,
    B,
    C,
    /// Aggregate over all three phases.
    #[default]
    Combined,
}

impl Phase {
    /// The three line phases, in order.
    pub const LINES: [Phase; 3] = [Phase::A, Phase::B, Phase::C];

    /// Index of a line phase, `None` for [Phase::Combined].
    pub const fn line_index(self) -> Option<usize> {
        match self {
            Phase::A => Some(0),
            Phase::B => Some(1),
            Phase::C => Some(2),
            Phase::Combined => None,
        }
    }
}

/// A request for one (quantity, phase) value.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Subscription {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub quantity: Quantity,
    #[cfg_attr(feature = "serde", serde(default))]
    pub phase: Phase,
}

impl Subscription {
    pub const fn new(quantity: Quantity, phase: Phase) -> Self {
        Self { quantity, phase }
    }
}
