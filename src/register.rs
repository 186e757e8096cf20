//! This module is used to define the input registers on the PZEM-6L24 and how they are polled.
//!
//! All registers are read only, through function code 0x04.

use strum_macros::{EnumCount, EnumIter};

use crate::{
    decode::{PowerFactorPair, scale, signed_pair},
    types::{
        Phase::{self, A, B, C, Combined},
        Quantity::{self, *},
    },
};

/// Volts per bit.
pub const VOLTAGE_RESOLUTION: f32 = 0.01;
/// Amps per bit.
pub const CURRENT_RESOLUTION: f32 = 0.01;
/// Hertz per bit.
pub const FREQUENCY_RESOLUTION: f32 = 0.01;
/// Watts (var, VA) per bit.
pub const POWER_RESOLUTION: f32 = 0.1;
pub const POWER_FACTOR_RESOLUTION: f32 = 0.01;
/// kWh (kvarh, kVAh) per bit.
pub const ENERGY_RESOLUTION: f32 = 0.1;
/// Degrees per bit.
pub const PHASE_RESOLUTION: f32 = 0.01;

/// Largest register group, in registers.
pub const MAX_GROUP_LEN: usize = 6;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u16)]
pub enum MeterRegister {
    /// __R__ - Voltage of phases A, B, C. One register each.
    Voltage = 0x0000,
    /// __R__ - Current of phases A, B, C. One register each.
    Current = 0x0003,
    /// __R__ - Frequency of phases A, B, C. One register each.
    Frequency = 0x0006,
    /// __R__ - Voltage phase angle of phases B and C. Phase A is the 0° reference.
    VoltagePhaseAngle = 0x0009,
    /// __R__ - Current phase angle of phases A, B, C.
    CurrentPhaseAngle = 0x000B,
    /// __R__ - Active power of phases A, B, C. Signed, high word first.
    ActivePower = 0x000E,
    /// __R__ - Reactive power of phases A, B, C. Signed, high word first.
    ReactivePower = 0x0014,
    /// __R__ - Apparent power of phases A, B, C. Signed, high word first.
    ApparentPower = 0x001A,
    /// __R__ - Combined active power. Signed, high word first.
    ActivePowerCombined = 0x0020,
    /// __R__ - Combined reactive power.
    ReactivePowerCombined = 0x0022,
    /// __R__ - Combined apparent power.
    ApparentPowerCombined = 0x0024,
    /// __R__ - Power factor of phase A (high byte) and B (low byte).
    PowerFactorAB = 0x0026,
    /// __R__ - Power factor of phase C (high byte) and combined (low byte).
    PowerFactorCCombined = 0x0027,
    /// __R__ - Active energy of phases A, B, C. Signed, high word first.
    ActiveEnergy = 0x0028,
    /// __R__ - Reactive energy of phases A, B, C.
    ReactiveEnergy = 0x002E,
    /// __R__ - Apparent energy of phases A, B, C.
    ApparentEnergy = 0x0034,
    /// __R__ - Combined active energy.
    ActiveEnergyCombined = 0x003A,
    /// __R__ - Combined reactive energy.
    ReactiveEnergyCombined = 0x003C,
    /// __R__ - Combined apparent energy.
    ApparentEnergyCombined = 0x003E,
}

impl From<MeterRegister> for u16 {
    fn from(value: MeterRegister) -> Self {
        value as u16
    }
}

/// A block of registers fetched with a single request.
///
/// Declaration order is polling order.
#[derive(Debug, EnumIter, EnumCount, PartialEq, Eq, Clone, Copy)]
pub enum RegisterGroup {
    Voltage,
    Current,
    Frequency,
    ActivePower,
    ReactivePower,
    ApparentPower,
    PowerFactor,
    ActiveEnergy,
    ReactiveEnergy,
    ApparentEnergy,
    CombinedPower,
    CombinedEnergy,
    PhaseAngles,
}

const fn lines(quantity: Quantity) -> [(Quantity, Phase); 3] {
    [(quantity, A), (quantity, B), (quantity, C)]
}

const VOLTAGE_CELLS: [(Quantity, Phase); 3] = lines(Voltage);
const CURRENT_CELLS: [(Quantity, Phase); 3] = lines(Current);
const FREQUENCY_CELLS: [(Quantity, Phase); 3] = lines(Frequency);
const ACTIVE_POWER_CELLS: [(Quantity, Phase); 3] = lines(ActivePower);
const REACTIVE_POWER_CELLS: [(Quantity, Phase); 3] = lines(ReactivePower);
const APPARENT_POWER_CELLS: [(Quantity, Phase); 3] = lines(ApparentPower);
const ACTIVE_ENERGY_CELLS: [(Quantity, Phase); 3] = lines(ActiveEnergy);
const REACTIVE_ENERGY_CELLS: [(Quantity, Phase); 3] = lines(ReactiveEnergy);
const APPARENT_ENERGY_CELLS: [(Quantity, Phase); 3] = lines(ApparentEnergy);
const POWER_FACTOR_CELLS: [(Quantity, Phase); 4] = [
    (PowerFactor, A),
    (PowerFactor, B),
    (PowerFactor, C),
    (PowerFactor, Combined),
];
const COMBINED_POWER_CELLS: [(Quantity, Phase); 3] = [
    (ActivePower, Combined),
    (ReactivePower, Combined),
    (ApparentPower, Combined),
];
const COMBINED_ENERGY_CELLS: [(Quantity, Phase); 3] = [
    (ActiveEnergy, Combined),
    (ReactiveEnergy, Combined),
    (ApparentEnergy, Combined),
];
const PHASE_ANGLE_CELLS: [(Quantity, Phase); 6] = [
    (VoltagePhaseAngle, A),
    (VoltagePhaseAngle, B),
    (VoltagePhaseAngle, C),
    (CurrentPhaseAngle, A),
    (CurrentPhaseAngle, B),
    (CurrentPhaseAngle, C),
];

impl RegisterGroup {
    /// First register of the block.
    pub const fn start(self) -> MeterRegister {
        match self {
            RegisterGroup::Voltage => MeterRegister::Voltage,
            RegisterGroup::Current => MeterRegister::Current,
            RegisterGroup::Frequency => MeterRegister::Frequency,
            RegisterGroup::ActivePower => MeterRegister::ActivePower,
            RegisterGroup::ReactivePower => MeterRegister::ReactivePower,
            RegisterGroup::ApparentPower => MeterRegister::ApparentPower,
            RegisterGroup::PowerFactor => MeterRegister::PowerFactorAB,
            RegisterGroup::ActiveEnergy => MeterRegister::ActiveEnergy,
            RegisterGroup::ReactiveEnergy => MeterRegister::ReactiveEnergy,
            RegisterGroup::ApparentEnergy => MeterRegister::ApparentEnergy,
            RegisterGroup::CombinedPower => MeterRegister::ActivePowerCombined,
            RegisterGroup::CombinedEnergy => MeterRegister::ActiveEnergyCombined,
            // Voltage angles B, C then current angles A, B, C are contiguous.
            RegisterGroup::PhaseAngles => MeterRegister::VoltagePhaseAngle,
        }
    }

    /// Number of registers in the block.
    pub const fn count(self) -> u16 {
        match self {
            RegisterGroup::Voltage | RegisterGroup::Current | RegisterGroup::Frequency => 3,
            RegisterGroup::PowerFactor => 2,
            RegisterGroup::PhaseAngles => 5,
            _ => 6,
        }
    }

    /// Table cells owned by this group, in the order [RegisterGroup::decode] yields them.
    pub fn cells(self) -> &'static [(Quantity, Phase)] {
        match self {
            RegisterGroup::Voltage => &VOLTAGE_CELLS,
            RegisterGroup::Current => &CURRENT_CELLS,
            RegisterGroup::Frequency => &FREQUENCY_CELLS,
            RegisterGroup::ActivePower => &ACTIVE_POWER_CELLS,
            RegisterGroup::ReactivePower => &REACTIVE_POWER_CELLS,
            RegisterGroup::ApparentPower => &APPARENT_POWER_CELLS,
            RegisterGroup::PowerFactor => &POWER_FACTOR_CELLS,
            RegisterGroup::ActiveEnergy => &ACTIVE_ENERGY_CELLS,
            RegisterGroup::ReactiveEnergy => &REACTIVE_ENERGY_CELLS,
            RegisterGroup::ApparentEnergy => &APPARENT_ENERGY_CELLS,
            RegisterGroup::CombinedPower => &COMBINED_POWER_CELLS,
            RegisterGroup::CombinedEnergy => &COMBINED_ENERGY_CELLS,
            RegisterGroup::PhaseAngles => &PHASE_ANGLE_CELLS,
        }
    }

    /// Decode this group's registers into values aligned with [RegisterGroup::cells].
    ///
    /// `registers` must hold [RegisterGroup::count] values.
    pub fn decode(self, registers: &[u16]) -> heapless::Vec<f32, MAX_GROUP_LEN> {
        let mut values = heapless::Vec::new();
        // Capacity is never exceeded: no group owns more than MAX_GROUP_LEN cells.
        let mut emit = |value: f32| {
            values.push(value).ok();
        };

        match self {
            RegisterGroup::Voltage => {
                registers[..3]
                    .iter()
                    .for_each(|&raw| emit(scale(raw, VOLTAGE_RESOLUTION)));
            }
            RegisterGroup::Current => {
                registers[..3]
                    .iter()
                    .for_each(|&raw| emit(scale(raw, CURRENT_RESOLUTION)));
            }
            RegisterGroup::Frequency => {
                registers[..3]
                    .iter()
                    .for_each(|&raw| emit(scale(raw, FREQUENCY_RESOLUTION)));
            }
            RegisterGroup::ActivePower
            | RegisterGroup::ReactivePower
            | RegisterGroup::ApparentPower
            | RegisterGroup::CombinedPower => {
                (0..3).for_each(|i| emit(signed_pair(registers, i, POWER_RESOLUTION)));
            }
            RegisterGroup::ActiveEnergy
            | RegisterGroup::ReactiveEnergy
            | RegisterGroup::ApparentEnergy
            | RegisterGroup::CombinedEnergy => {
                (0..3).for_each(|i| emit(signed_pair(registers, i, ENERGY_RESOLUTION)));
            }
            RegisterGroup::PowerFactor => {
                let (a, b) = PowerFactorPair::from(registers[0]).scaled(POWER_FACTOR_RESOLUTION);
                let (c, combined) =
                    PowerFactorPair::from(registers[1]).scaled(POWER_FACTOR_RESOLUTION);
                [a, b, c, combined].into_iter().for_each(&mut emit);
            }
            RegisterGroup::PhaseAngles => {
                emit(0.0);
                registers[..5]
                    .iter()
                    .for_each(|&raw| emit(scale(raw, PHASE_RESOLUTION)));
            }
        }
        values
    }
}
