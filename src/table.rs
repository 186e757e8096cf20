//! Latest value of every (quantity, phase) cell.
//!
//! A cell is `None` ("missing") until the register group owning it is read successfully, and
//! again whenever a later read of that group fails. Arithmetic over cells propagates missing:
//! a result built from any missing operand is itself missing.

use strum::EnumCount;

use crate::types::{Phase, Quantity};

#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementTable {
    lines: [[Option<f32>; 3]; Quantity::COUNT],
    totals: [Option<f32>; Quantity::COUNT],
}

impl Default for MeasurementTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementTable {
    /// A table with every cell missing.
    pub const fn new() -> Self {
        Self {
            lines: [[None; 3]; Quantity::COUNT],
            totals: [None; Quantity::COUNT],
        }
    }

    /// The stored cell, without deriving anything.
    ///
    /// For [Phase::Combined] this is the meter-reported total, which only exists for power,
    /// energy and power factor.
    pub fn get(&self, quantity: Quantity, phase: Phase) -> Option<f32> {
        match phase.line_index() {
            Some(line) => self.lines[quantity.index()][line],
            None => self.totals[quantity.index()],
        }
    }

    /// Store a value. NaN is stored as missing.
    pub fn set(&mut self, quantity: Quantity, phase: Phase, value: f32) {
        let value = (!value.is_nan()).then_some(value);
        *self.cell_mut(quantity, phase) = value;
    }

    /// Mark a cell as missing.
    pub fn invalidate(&mut self, quantity: Quantity, phase: Phase) {
        *self.cell_mut(quantity, phase) = None;
    }

    /// Resolve a subscription's value.
    ///
    /// Combined voltage is the mean of the three line voltages. Quantities without a combined
    /// form resolve to missing for [Phase::Combined].
    pub fn resolve(&self, quantity: Quantity, phase: Phase) -> Option<f32> {
        match (quantity, phase) {
            (Quantity::Voltage, Phase::Combined) => self.average(Quantity::Voltage),
            (quantity, Phase::Combined) if !quantity.has_reported_total() => None,
            (quantity, phase) => self.get(quantity, phase),
        }
    }

    /// Mean over the three lines, missing if any line is.
    pub fn average(&self, quantity: Quantity) -> Option<f32> {
        let [a, b, c] = self.lines[quantity.index()];
        Some((a? + b? + c?) / 3.0)
    }

    fn cell_mut(&mut self, quantity: Quantity, phase: Phase) -> &mut Option<f32> {
        match phase.line_index() {
            Some(line) => &mut self.lines[quantity.index()][line],
            None => &mut self.totals[quantity.index()],
        }
    }
}
