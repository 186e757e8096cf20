//! Collaborator traits: the serial link and the host's clock.

/// Millisecond timestamp as reported by the host.
pub type Instant = fugit::TimerInstantU32<1000>;

/// Millisecond duration.
pub type Duration = fugit::MillisDurationU32;

/// A UART-like duplex byte channel.
///
/// On top of [embedded_io::Read] & [embedded_io::Write], the driver needs to know how many
/// received bytes are waiting, so it can wait for a full response without blocking in `read`.
pub trait Transport: embedded_io::Read + embedded_io::Write {
    /// Number of received bytes that can be read without blocking.
    fn bytes_available(&mut self) -> Result<usize, Self::Error>;

    /// Discard every byte currently waiting in the receive buffer.
    fn clear_input(&mut self) -> Result<(), Self::Error> {
        let mut scratch = [0u8; 32];
        loop {
            let pending = self.bytes_available()?;
            if pending == 0 {
                return Ok(());
            }
            let chunk = pending.min(scratch.len());
            if self.read(&mut scratch[..chunk])? == 0 {
                return Ok(());
            }
        }
    }
}

/// Monotonic time source plus a cooperative yield hook.
pub trait Clock {
    /// Current time since an arbitrary, fixed origin.
    fn now(&mut self) -> Instant;

    /// Give other cooperative tasks a chance to run.
    ///
    /// Called between checks while waiting for a response. The default does nothing.
    fn yield_now(&mut self) {}
}

impl<C: Clock + ?Sized> Clock for &mut C {
    fn now(&mut self) -> Instant {
        (**self).now()
    }

    fn yield_now(&mut self) {
        (**self).yield_now()
    }
}

/// Milliseconds elapsed from `since` to `now`, tolerant of counter wrap-around.
///
/// A `now` that appears to precede `since` counts as zero elapsed time.
pub fn elapsed(since: Instant, now: Instant) -> Duration {
    now.checked_duration_since(since)
        .unwrap_or(Duration::from_ticks(0))
}
