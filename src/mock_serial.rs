//! We use this mocking module in unit tests to emulate the meter's serial link and the host clock.
//!
//! [MockSerial] and [MockClock] share a millisecond timeline, so a test can say "the response
//! arrives after 199 ms" and let the driver's wait loop advance time through [Clock::yield_now].

use core::cell::Cell;

use crate::{
    crc::compute_crc,
    reader::FUNCTION_READ_INPUT_REGISTERS,
    transport::{Clock, Instant, Transport},
};

/// Number of input registers the simulated meter exposes.
pub const REGISTER_SPACE: usize = 0x40;

/// Our mock type used to emulate a serial port.
pub struct MockSerial<'a> {
    /// Shared millisecond timeline.
    timeline: &'a Cell<u32>,
    /// Buffer to store data written to the mock serial port
    write_buffer: heapless::Vec<u8, 1024>,
    /// Offset of the first written byte not yet answered by the simulated device
    answered: usize,
    /// Buffer containing response data to be read
    read_buffer: heapless::Vec<u8, 256>,
    /// Current position in the read buffer
    read_position: usize,
    /// Timeline value from which the read buffer becomes visible
    ready_at: u32,
    /// Bytes reported as available but never delivered
    withheld: usize,
    /// When set, requests are answered from this register file
    device: Option<MockDevice>,
    /// Flag to simulate write errors
    should_error_on_write: bool,
    /// Flag to simulate read errors
    should_error_on_read: bool,
}

/// A simulated PZEM-6L24 answering read-input-register requests.
pub struct MockDevice {
    address: u8,
    registers: [u16; REGISTER_SPACE],
    latency_ms: u32,
    /// Start registers whose requests are never answered.
    silent: heapless::Vec<u16, 16>,
    /// Start registers whose responses carry a broken CRC.
    corrupt: heapless::Vec<u16, 16>,
    /// Start registers whose responses lose their final byte.
    truncated: heapless::Vec<u16, 16>,
    requests: usize,
}

#[derive(Debug)]
pub enum MockSerialError {
    /// Simulated buffer overflow
    BufferOverflow,
    /// Generic simulated error for testing
    SimulatedError,
}

impl core::fmt::Display for MockSerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl core::error::Error for MockSerialError {}

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            MockSerialError::BufferOverflow => embedded_io::ErrorKind::OutOfMemory,
            MockSerialError::SimulatedError => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for MockSerial<'_> {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }

        self.write_buffer
            .extend_from_slice(buf)
            .map_err(|_| MockSerialError::BufferOverflow)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        if self.should_error_on_write {
            return Err(MockSerialError::SimulatedError);
        }
        // Everything written is now "on the wire", so the device may answer.
        while self.write_buffer.len() - self.answered >= 8 {
            let mut frame = [0u8; 8];
            frame.copy_from_slice(&self.write_buffer[self.answered..self.answered + 8]);
            self.answered += 8;
            self.answer(&frame)?;
        }
        Ok(())
    }
}

impl embedded_io::Read for MockSerial<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }

        if !self.is_ready() || self.read_position >= self.read_buffer.len() {
            // End of data, a blocking UART would hand back nothing more.
            return Ok(0);
        }

        let available_bytes = self.read_buffer.len() - self.read_position;
        let bytes_to_read = core::cmp::min(buf.len(), available_bytes);

        buf[..bytes_to_read].copy_from_slice(
            &self.read_buffer[self.read_position..self.read_position + bytes_to_read],
        );

        self.read_position += bytes_to_read;
        Ok(bytes_to_read)
    }
}

impl Transport for MockSerial<'_> {
    fn bytes_available(&mut self) -> Result<usize, Self::Error> {
        if self.should_error_on_read {
            return Err(MockSerialError::SimulatedError);
        }
        if !self.is_ready() {
            return Ok(0);
        }
        let remaining = self.read_buffer.len() - self.read_position;
        Ok(if remaining == 0 { 0 } else { remaining + self.withheld })
    }
}

impl<'a> MockSerial<'a> {
    /// Create a new MockSerial instance with empty buffers
    pub fn new(timeline: &'a Cell<u32>) -> Self {
        Self {
            timeline,
            write_buffer: heapless::Vec::new(),
            answered: 0,
            read_buffer: heapless::Vec::new(),
            read_position: 0,
            ready_at: 0,
            withheld: 0,
            device: None,
            should_error_on_write: false,
            should_error_on_read: false,
        }
    }

    /// Create a MockSerial that answers requests like a meter would.
    pub fn with_device(timeline: &'a Cell<u32>, device: MockDevice) -> Self {
        let mut mock = Self::new(timeline);
        mock.device = Some(device);
        mock
    }

    /// Set the data that will be returned when read() is called, available immediately.
    pub fn set_read_data(&mut self, data: &[u8]) -> Result<(), MockSerialError> {
        let now = self.timeline.get();
        self.set_read_data_at(data, now)
    }

    /// Set the data that will be returned when read() is called, available from `at_ms`.
    pub fn set_read_data_at(&mut self, data: &[u8], at_ms: u32) -> Result<(), MockSerialError> {
        self.read_buffer.clear();
        self.read_position = 0;
        self.withheld = 0;
        self.ready_at = at_ms;

        self.read_buffer
            .extend_from_slice(data)
            .map_err(|_| MockSerialError::BufferOverflow)
    }

    /// Report `count` more bytes as available than will actually be delivered.
    pub fn withhold_bytes(&mut self, count: usize) {
        self.withheld = count;
    }

    /// Get a reference to the data that was written to this mock serial port
    pub fn written_data(&self) -> &[u8] {
        &self.write_buffer
    }

    /// Clear the write buffer
    pub fn clear_written_data(&mut self) {
        self.write_buffer.clear();
        self.answered = 0;
    }

    /// Configure whether write operations should fail with an error
    pub fn set_write_error(&mut self, should_error: bool) {
        self.should_error_on_write = should_error;
    }

    /// Configure whether read operations should fail with an error
    pub fn set_read_error(&mut self, should_error: bool) {
        self.should_error_on_read = should_error;
    }

    pub fn device(&self) -> Option<&MockDevice> {
        self.device.as_ref()
    }

    pub fn device_mut(&mut self) -> Option<&mut MockDevice> {
        self.device.as_mut()
    }

    fn is_ready(&self) -> bool {
        self.timeline.get() >= self.ready_at
    }

    fn answer(&mut self, frame: &[u8; 8]) -> Result<(), MockSerialError> {
        let now = self.timeline.get();
        let Some(device) = self.device.as_mut() else {
            return Ok(());
        };
        device.requests += 1;

        let start = u16::from_be_bytes([frame[2], frame[3]]);
        let count = u16::from_be_bytes([frame[4], frame[5]]);
        if frame[0] != device.address
            || frame[1] != FUNCTION_READ_INPUT_REGISTERS
            || compute_crc(&frame[..6]) != u16::from_le_bytes([frame[6], frame[7]])
            || device.silent.contains(&start)
        {
            self.read_buffer.clear();
            self.read_position = 0;
            return Ok(());
        }

        let mut response: heapless::Vec<u8, 256> = heapless::Vec::new();
        let overflow = |_| MockSerialError::BufferOverflow;
        response
            .extend_from_slice(&[device.address, FUNCTION_READ_INPUT_REGISTERS, (count * 2) as u8])
            .map_err(overflow)?;
        for offset in 0..count {
            let value = device
                .registers
                .get(usize::from(start + offset))
                .copied()
                .unwrap_or(0);
            response.extend_from_slice(&value.to_be_bytes()).map_err(overflow)?;
        }
        let mut crc = compute_crc(&response);
        if device.corrupt.contains(&start) {
            crc ^= 0x00FF;
        }
        response.extend_from_slice(&crc.to_le_bytes()).map_err(overflow)?;

        let truncated = device.truncated.contains(&start);
        let ready_at = now + device.latency_ms;
        if truncated {
            response.pop();
        }
        self.set_read_data_at(&response, ready_at)?;
        if truncated {
            self.withhold_bytes(1);
        }
        Ok(())
    }
}

impl MockDevice {
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; REGISTER_SPACE],
            latency_ms: 0,
            silent: heapless::Vec::new(),
            corrupt: heapless::Vec::new(),
            truncated: heapless::Vec::new(),
            requests: 0,
        }
    }

    pub fn set_register(&mut self, register: u16, value: u16) {
        self.registers[usize::from(register)] = value;
    }

    /// Store a 32 bit value as high word then low word.
    pub fn set_pair(&mut self, register: u16, value: i32) {
        let value = value as u32;
        self.set_register(register, (value >> 16) as u16);
        self.set_register(register + 1, value as u16);
    }

    pub fn set_latency_ms(&mut self, latency_ms: u32) {
        self.latency_ms = latency_ms;
    }

    /// Never answer requests starting at `register`.
    pub fn silence(&mut self, register: u16) {
        self.silent.push(register).ok();
    }

    /// Resume answering requests starting at `register`.
    pub fn unsilence(&mut self, register: u16) {
        self.silent.retain(|&r| r != register);
    }

    /// Break the CRC of responses to requests starting at `register`.
    pub fn corrupt(&mut self, register: u16) {
        self.corrupt.push(register).ok();
    }

    /// Drop the last byte of responses to requests starting at `register`.
    pub fn truncate(&mut self, register: u16) {
        self.truncated.push(register).ok();
    }

    /// Number of request frames received so far.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

/// Host clock driven by the shared timeline; every yield advances time by `step_ms`.
pub struct MockClock<'a> {
    timeline: &'a Cell<u32>,
    step_ms: u32,
    yields: usize,
}

impl<'a> MockClock<'a> {
    pub fn new(timeline: &'a Cell<u32>) -> Self {
        Self {
            timeline,
            step_ms: 1,
            yields: 0,
        }
    }

    pub fn advance(&mut self, ms: u32) {
        self.timeline.set(self.timeline.get().wrapping_add(ms));
    }

    pub fn yields(&self) -> usize {
        self.yields
    }
}

impl Clock for MockClock<'_> {
    fn now(&mut self) -> Instant {
        Instant::from_ticks(self.timeline.get())
    }

    fn yield_now(&mut self) {
        self.yields += 1;
        let step = self.step_ms;
        self.advance(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::{Error, Read, Write};

    #[test]
    fn test_write_data() {
        let timeline = Cell::new(0);
        let mut mock = MockSerial::new(&timeline);
        let test_data = b"Hello, World!";

        let result = mock.write(test_data);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), test_data.len());
        assert_eq!(mock.written_data(), test_data);
    }

    #[test]
    fn test_read_data_becomes_visible_at_time() {
        let timeline = Cell::new(0);
        let mut mock = MockSerial::new(&timeline);
        mock.set_read_data_at(b"late", 50).unwrap();

        assert_eq!(mock.bytes_available().unwrap(), 0);
        timeline.set(50);
        assert_eq!(mock.bytes_available().unwrap(), 4);

        let mut buffer = [0u8; 4];
        assert_eq!(mock.read(&mut buffer).unwrap(), 4);
        assert_eq!(&buffer, b"late");
        assert_eq!(mock.bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_withheld_bytes_are_reported_but_not_delivered() {
        let timeline = Cell::new(0);
        let mut mock = MockSerial::new(&timeline);
        mock.set_read_data(b"abc").unwrap();
        mock.withhold_bytes(2);

        assert_eq!(mock.bytes_available().unwrap(), 5);
        let mut buffer = [0u8; 5];
        assert_eq!(mock.read(&mut buffer).unwrap(), 3);
        assert_eq!(mock.read(&mut buffer).unwrap(), 0);
    }

    #[test]
    fn test_error_simulation() {
        let timeline = Cell::new(0);
        let mut mock = MockSerial::new(&timeline);
        mock.set_write_error(true);
        assert!(matches!(mock.write(b"test"), Err(MockSerialError::SimulatedError)));
        assert!(mock.flush().is_err());

        mock.set_read_data(b"data").unwrap();
        mock.set_read_error(true);
        let mut buffer = [0u8; 4];
        assert!(mock.read(&mut buffer).is_err());
        assert!(mock.bytes_available().is_err());
    }

    #[test]
    fn test_error_kinds() {
        assert!(matches!(
            MockSerialError::BufferOverflow.kind(),
            embedded_io::ErrorKind::OutOfMemory
        ));
        assert!(matches!(
            MockSerialError::SimulatedError.kind(),
            embedded_io::ErrorKind::Other
        ));
    }

    #[test]
    fn test_device_answers_after_latency() {
        let timeline = Cell::new(100);
        let mut device = MockDevice::new(0xF8);
        device.set_register(0x0000, 0x5A0F);
        device.set_latency_ms(20);
        let mut mock = MockSerial::with_device(&timeline, device);

        let crc = compute_crc(&[0xF8, 0x04, 0x00, 0x00, 0x00, 0x01]).to_le_bytes();
        mock.write(&[0xF8, 0x04, 0x00, 0x00, 0x00, 0x01, crc[0], crc[1]])
            .unwrap();
        mock.flush().unwrap();

        assert_eq!(mock.bytes_available().unwrap(), 0);
        timeline.set(120);
        assert_eq!(mock.bytes_available().unwrap(), 7);

        let mut response = [0u8; 7];
        mock.read(&mut response).unwrap();
        assert_eq!(&response[..5], &[0xF8, 0x04, 0x02, 0x5A, 0x0F]);
        assert_eq!(compute_crc(&response[..5]).to_le_bytes(), [response[5], response[6]]);
        assert_eq!(mock.device().unwrap().requests(), 1);
    }

    #[test]
    fn test_device_ignores_other_addresses() {
        let timeline = Cell::new(0);
        let mut mock = MockSerial::with_device(&timeline, MockDevice::new(0xF8));

        let crc = compute_crc(&[0x01, 0x04, 0x00, 0x00, 0x00, 0x01]).to_le_bytes();
        mock.write(&[0x01, 0x04, 0x00, 0x00, 0x00, 0x01, crc[0], crc[1]])
            .unwrap();
        mock.flush().unwrap();

        assert_eq!(mock.bytes_available().unwrap(), 0);
    }

    #[test]
    fn test_clock_advances_on_yield() {
        let timeline = Cell::new(0);
        let mut clock = MockClock::new(&timeline);
        clock.yield_now();
        clock.yield_now();
        clock.advance(10);
        assert_eq!(clock.now().ticks(), 12);
        assert_eq!(clock.yields(), 2);
    }
}
