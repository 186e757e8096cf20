//! CRC-16/MODBUS as used on the meter's serial link.

/// Reflected polynomial for CRC-16/MODBUS.
pub const POLYNOMIAL: u16 = 0xA001;

/// Compute the CRC-16/MODBUS checksum of `bytes`.
///
/// The result goes on the wire low byte first.
pub fn compute_crc(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in bytes {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}
