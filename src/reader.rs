//! Modbus RTU "read input registers" exchange with the meter.
//!
//! Request frame: `[address][0x04][start hi][start lo][count hi][count lo][crc lo][crc hi]`.
//! The register fields are big-endian while the CRC trailer is little-endian.
//!
//! Response frame: `[address][function][byte count][count x 2 bytes big-endian][crc lo][crc hi]`.
//! The byte count field is not checked against the requested count, the response length is
//! derived from the request alone.

use crate::{
    crc::compute_crc,
    error::{Error, Result},
    transport::{self, Clock, Duration, Instant, Transport},
};

/// Function code for "read input registers".
pub const FUNCTION_READ_INPUT_REGISTERS: u8 = 0x04;

/// Length of every request frame.
pub const REQUEST_LEN: usize = 8;

/// Address, function and byte count fields.
pub const RESPONSE_HEADER_LEN: usize = 3;

/// Most registers a single response frame can carry.
pub const MAX_READ_COUNT: u16 = 125;

/// Longest response frame we ever wait for.
pub const MAX_RESPONSE_LEN: usize = response_len(MAX_READ_COUNT);

/// How long a complete response may take to arrive after the request was sent.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_ticks(200);

/// Build the request frame for reading `count` input registers from `start`.
pub fn build_request(address: u8, start: u16, count: u16) -> [u8; REQUEST_LEN] {
    let mut frame = [0u8; REQUEST_LEN];
    frame[0] = address;
    frame[1] = FUNCTION_READ_INPUT_REGISTERS;
    frame[2..4].copy_from_slice(&start.to_be_bytes());
    frame[4..6].copy_from_slice(&count.to_be_bytes());
    let crc = compute_crc(&frame[..6]);
    frame[6..].copy_from_slice(&crc.to_le_bytes());
    frame
}

/// Exact length of the response to a request for `count` registers.
pub const fn response_len(count: u16) -> usize {
    RESPONSE_HEADER_LEN + count as usize * 2 + 2
}

/// Check the trailing CRC of `response` and extract its register values.
pub fn parse_response<I: embedded_io::Error, const L: usize>(
    response: &[u8],
    count: u16,
) -> Result<heapless::Vec<u16, L>, I> {
    let expected = response_len(count);
    if response.len() < expected {
        return Err(Error::ShortRead);
    }
    let response = &response[..expected];

    let (body, trailer) = response.split_at(expected - 2);
    let received = u16::from_le_bytes([trailer[0], trailer[1]]);
    let computed = compute_crc(body);
    if computed != received {
        return Err(Error::ChecksumMismatch { computed, received });
    }

    let mut registers = heapless::Vec::new();
    for word in body[RESPONSE_HEADER_LEN..].chunks_exact(2) {
        registers
            .push(u16::from_be_bytes([word[0], word[1]]))
            .map_err(|_| Error::BufferError)?;
    }
    Ok(registers)
}

/// Owns the serial link for one request/response exchange at a time.
///
/// Waiting for a response polls [Transport::bytes_available] and hands control back to the
/// host through [Clock::yield_now] between checks, giving up after [RESPONSE_TIMEOUT].
pub struct RegisterReader<T: Transport, C: Clock> {
    transport: T,
    clock: C,
}

impl<T: Transport, C: Clock> RegisterReader<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    /// Read `count` consecutive input registers starting at `start` from the unit at `address`.
    ///
    /// Values come back in wire order. Any failure means no data at all.
    pub fn read_registers<const L: usize>(
        &mut self,
        address: u8,
        start: u16,
        count: u16,
    ) -> Result<heapless::Vec<u16, L>, T::Error> {
        if count == 0 || count > MAX_READ_COUNT || usize::from(count) > L {
            return Err(Error::InvalidRange);
        }

        let request = build_request(address, start, count);
        log::trace!("request {:02X?}", request);

        self.transport.flush().map_err(Error::SerialError)?;
        self.transport
            .write_all(&request)
            .map_err(Error::SerialError)?;
        self.transport.flush().map_err(Error::SerialError)?;

        let expected = response_len(count);
        self.wait_for(expected)?;

        let mut buff = [0u8; MAX_RESPONSE_LEN];
        let response = &mut buff[..expected];
        self.transport.read_exact(response)?;

        parse_response(response, count)
    }

    /// Discard any stale bytes waiting on the link.
    pub fn clear_input(&mut self) -> Result<(), T::Error> {
        self.transport.clear_input().map_err(Error::SerialError)
    }

    /// Current host time.
    pub fn now(&mut self) -> Instant {
        self.clock.now()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give back the transport and clock.
    pub fn release(self) -> (T, C) {
        (self.transport, self.clock)
    }

    fn wait_for(&mut self, expected: usize) -> Result<(), T::Error> {
        let start = self.clock.now();
        while self
            .transport
            .bytes_available()
            .map_err(Error::SerialError)?
            < expected
        {
            if transport::elapsed(start, self.clock.now()) > RESPONSE_TIMEOUT {
                return Err(Error::Timeout);
            }
            self.clock.yield_now();
        }
        Ok(())
    }
}
