use strum::{EnumCount, IntoEnumIterator};

use crate::{
    config::MeterConfig,
    error::{Error, Result},
    observer::{Observer, Sink},
    reader::RegisterReader,
    register::{MAX_GROUP_LEN, RegisterGroup},
    table::MeasurementTable,
    transport::{self, Clock, Instant, Transport},
    types::Subscription,
};

/// Groups that failed during one poll cycle, in polling order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollSummary {
    pub failed: heapless::Vec<RegisterGroup, { RegisterGroup::COUNT }>,
}

impl PollSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        RegisterGroup::COUNT - self.failed.len()
    }
}

/// You can create a Meter using any interface which implements [Transport] and any host [Clock].
///
/// The meter owns the serial link and the latest measurements. The host calls [Meter::service]
/// from its main loop, a poll cycle then reads every register group in a fixed order and pushes
/// the refreshed values to the registered observers. Up to `N` observers can be registered.
pub struct Meter<T: Transport, C: Clock, S: Sink, const N: usize = 32> {
    reader: RegisterReader<T, C>,
    config: MeterConfig,
    table: MeasurementTable,
    observers: heapless::Vec<Observer<S>, N>,
    last_poll: Option<Instant>,
}

impl<T: Transport, C: Clock, S: Sink, const N: usize> Meter<T, C, S, N> {
    pub fn new(transport: T, clock: C, config: MeterConfig) -> Self {
        Self {
            reader: RegisterReader::new(transport, clock),
            config,
            table: MeasurementTable::new(),
            observers: heapless::Vec::new(),
            last_poll: None,
        }
    }

    /// Bind `sink` to the value of `subscription`.
    pub fn register_observer(
        &mut self,
        subscription: Subscription,
        sink: S,
    ) -> Result<(), T::Error> {
        self.observers
            .push(Observer::new(subscription, sink))
            .map_err(|_| Error::TooManyObservers)
    }

    /// Drop whatever is sitting in the receive buffer before the first poll.
    pub fn setup(&mut self) -> Result<(), T::Error> {
        self.reader.clear_input()?;
        log::info!("PZEM-6L24 initialized");
        Ok(())
    }

    pub fn dump_config(&self) {
        log::info!("PZEM-6L24:");
        log::info!("  Address: 0x{:02X}", self.config.address);
        log::info!("  Poll interval: {} ms", self.config.poll_interval_ms);
        log::info!("  Registered observers: {}", self.observers.len());
    }

    /// Run a poll cycle if a poll interval has passed since the previous one started.
    ///
    /// Returns `None` when it is not time yet. The first call always polls.
    pub fn service(&mut self) -> Option<PollSummary> {
        let now = self.reader.now();
        if let Some(last) = self.last_poll {
            if transport::elapsed(last, now) < self.config.poll_interval() {
                return None;
            }
        }
        self.last_poll = Some(now);
        Some(self.refresh())
    }

    /// Read every register group, then publish to observers.
    pub fn refresh(&mut self) -> PollSummary {
        let summary = self.poll();
        self.dispatch();
        summary
    }

    /// Read every register group in order, updating the table.
    ///
    /// A failing group only loses its own cells, the cycle always carries on to the next group.
    pub fn poll(&mut self) -> PollSummary {
        let mut summary = PollSummary::default();
        for group in RegisterGroup::iter() {
            if let Err(err) = self.poll_group(group) {
                log::warn!("Reading {:?} failed: {}", group, err);
                for &(quantity, phase) in group.cells() {
                    self.table.invalidate(quantity, phase);
                }
                // One slot per group, cannot overflow.
                summary.failed.push(group).ok();
            }
        }
        summary
    }

    /// Publish every observer's current value, skipping missing ones.
    pub fn dispatch(&mut self) {
        for observer in self.observers.iter_mut() {
            let Subscription { quantity, phase } = observer.subscription;
            if let Some(value) = self.table.resolve(quantity, phase) {
                log::debug!("{:?}/{:?} = {}", quantity, phase, value);
                observer.sink.publish(value);
            }
        }
    }

    /// Latest measurements.
    pub fn table(&self) -> &MeasurementTable {
        &self.table
    }

    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    pub fn observers(&self) -> &[Observer<S>] {
        &self.observers
    }

    /// Direct register access, e.g. for diagnostics.
    pub fn reader_mut(&mut self) -> &mut RegisterReader<T, C> {
        &mut self.reader
    }

    /// Give back the transport and clock.
    pub fn release(self) -> (T, C) {
        self.reader.release()
    }

    fn poll_group(&mut self, group: RegisterGroup) -> Result<(), T::Error> {
        let registers = self.reader.read_registers::<MAX_GROUP_LEN>(
            self.config.address,
            group.start().into(),
            group.count(),
        )?;
        let values = group.decode(&registers);
        for (&(quantity, phase), &value) in group.cells().iter().zip(values.iter()) {
            self.table.set(quantity, phase, value);
        }
        log::debug!("Read {:?}: {:?}", group, registers);
        Ok(())
    }
}
