//! In-memory radio for tests and the simulator
//!
//! `MockRadio` implements `RadioHal` without hardware. Handles are cheap
//! clones sharing one state, so a test can keep a handle for inspection and
//! event injection while the driver owns another.
//!
//! Received frames are stored the way the radio library holds them: a
//! length byte followed by the payload. `inject_rx` pushes them through the
//! registered `EventSink`, exactly like the library callback would.

use crate::error::HalError;
use crate::radio::events::RailEvents;
use crate::radio::hal::{
    AddressFilter, Band, CsmaConfig, HeldPacket, HeldPacketInfo, RadioConfig, RadioHal,
    RadioState, RxPacketDetails, RxPacketStatus, TxOptions,
};
use crate::radio::sink::EventSink;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A call the driver made into the radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioCall {
    Initialize(RadioConfig),
    ConfigureChannels(Band),
    ConfigureAddressing(AddressFilter),
    SetShortAddress(u16),
    SetLongAddress([u8; 8]),
    SetPanId(u16),
    SetTxPower(i16),
    StartRx(u8),
    Idle { abort: bool },
    WriteTxFifo(Vec<u8>),
    StartCsmaTx {
        channel: u8,
        options: TxOptions,
        csma: CsmaConfig,
    },
    Release(u32),
    SetPromiscuous(bool),
    SetAutoAck(bool),
    SetCcaThreshold(i8),
}

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Initialize,
    ConfigureChannels,
    ConfigureAddressing,
    SetAddress,
    SetTxPower,
    StartRx,
    WriteTxFifo,
    StartCsmaTx,
    Release,
    SetPromiscuous,
    SetAutoAck,
    SetCcaThreshold,
}

struct StoredPacket {
    bytes: Vec<u8>,
    details: RxPacketDetails,
}

struct MockState {
    calls: Vec<RadioCall>,
    failures: HashMap<MockOp, HalError>,
    radio_state: RadioState,
    tx_power_ddbm: i16,
    auto_ack: bool,
    promiscuous: bool,
    cca_threshold_dbm: i8,
    eui64: [u8; 8],
    addressing: Option<AddressFilter>,
    tx_fifo: Vec<u8>,
    tx_frames: Vec<Vec<u8>>,
    auto_complete_tx: bool,
    next_handle: u32,
    held: HashMap<u32, StoredPacket>,
    released: Vec<u32>,
    initialized: bool,
}

impl MockState {
    fn check(&self, op: MockOp) -> Result<(), HalError> {
        match self.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Shared-state radio double
#[derive(Clone)]
pub struct MockRadio {
    state: Arc<Mutex<MockState>>,
    // Separate lock: the sink may call back into the owner of `state`
    sink: Arc<Mutex<Option<EventSink>>>,
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRadio {
    pub fn new() -> Self {
        Self::with_eui64([0x00, 0x0b, 0x57, 0xff, 0xfe, 0x12, 0x34, 0x56])
    }

    /// Radio with a specific factory identity
    pub fn with_eui64(eui64: [u8; 8]) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                calls: Vec::new(),
                failures: HashMap::new(),
                radio_state: RadioState::Idle,
                tx_power_ddbm: 0,
                auto_ack: false,
                promiscuous: false,
                cca_threshold_dbm: -75,
                eui64,
                addressing: None,
                tx_fifo: Vec::new(),
                tx_frames: Vec::new(),
                auto_complete_tx: false,
                next_handle: 1,
                held: HashMap::new(),
                released: Vec::new(),
                initialized: false,
            })),
            sink: Arc::new(Mutex::new(None)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make `op` fail with `err` until cleared
    pub fn fail_on(&self, op: MockOp, err: HalError) {
        self.lock().failures.insert(op, err);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Report `TX_PACKET_SENT` as soon as a transmit is started
    pub fn set_auto_complete_tx(&self, enable: bool) {
        self.lock().auto_complete_tx = enable;
    }

    pub fn calls(&self) -> Vec<RadioCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Frames handed to the transmitter, PHR first
    pub fn tx_frames(&self) -> Vec<Vec<u8>> {
        self.lock().tx_frames.clone()
    }

    pub fn take_tx_frames(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.lock().tx_frames)
    }

    /// Handles given back through `release_held_packet` or by the sink
    pub fn released(&self) -> Vec<u32> {
        self.lock().released.clone()
    }

    /// Number of receive buffers still held
    pub fn held_count(&self) -> usize {
        self.lock().held.len()
    }

    pub fn is_held(&self, handle: u32) -> bool {
        self.lock().held.contains_key(&handle)
    }

    pub fn addressing(&self) -> Option<AddressFilter> {
        self.lock().addressing
    }

    pub fn is_promiscuous(&self) -> bool {
        self.lock().promiscuous
    }

    pub fn cca_threshold(&self) -> i8 {
        self.lock().cca_threshold_dbm
    }

    /// Whether `initialize` succeeded at least once
    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn has_sink(&self) -> bool {
        self.sink
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Force the state `radio_state` reports
    pub fn set_radio_state(&self, state: RadioState) {
        self.lock().radio_state = state;
    }

    /// Deliver `events` through the registered sink
    ///
    /// Returns `false` if no sink is registered.
    pub fn inject_events(&self, events: RailEvents) -> bool {
        self.deliver(events, None)
    }

    /// Radio reports the end of the current transmit with `events`
    pub fn complete_tx(&self, events: RailEvents) -> bool {
        self.lock().radio_state = RadioState::Idle;
        self.deliver(events, None)
    }

    /// Hold a received frame and report it.
    ///
    /// Returns the library handle assigned to the frame.
    pub fn inject_rx(&self, payload: &[u8], rssi: i8, lqi: u8) -> u32 {
        self.inject_rx_with_status(payload, rssi, lqi, RxPacketStatus::Ready)
    }

    pub fn inject_rx_with_status(
        &self,
        payload: &[u8],
        rssi: i8,
        lqi: u8,
        status: RxPacketStatus,
    ) -> u32 {
        self.hold_and_report(payload, rssi, lqi, status, RailEvents::empty())
    }

    /// Report a received frame together with other causes in one callback
    pub fn inject_rx_with_events(&self, payload: &[u8], extra: RailEvents) -> u32 {
        self.hold_and_report(payload, 0, 0, RxPacketStatus::Ready, extra)
    }

    fn hold_and_report(
        &self,
        payload: &[u8],
        rssi: i8,
        lqi: u8,
        status: RxPacketStatus,
        extra: RailEvents,
    ) -> u32 {
        let (handle, info) = {
            let mut state = self.lock();
            let handle = state.next_handle;
            state.next_handle = state.next_handle.wrapping_add(1);

            let mut bytes = Vec::with_capacity(payload.len() + 1);
            bytes.push((payload.len() + crate::constants::IEEE802154_FCS_LEN) as u8);
            bytes.extend_from_slice(payload);

            let info = HeldPacketInfo {
                status,
                packet_bytes: bytes.len() as u16,
            };
            state.held.insert(
                handle,
                StoredPacket {
                    bytes,
                    details: RxPacketDetails {
                        rssi,
                        lqi,
                        crc_passed: status == RxPacketStatus::Ready,
                        is_ack: false,
                        time_received_us: 0,
                    },
                },
            );
            (handle, info)
        };

        self.deliver(
            RailEvents::RX_PACKET_RECEIVED | extra,
            Some(HeldPacket::new(handle, info)),
        );
        handle
    }

    fn deliver(&self, events: RailEvents, packet: Option<HeldPacket>) -> bool {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(sink) = sink.as_mut() else {
            if let Some(packet) = packet {
                self.free(packet);
            }
            return false;
        };
        if let Some(rejected) = sink.on_events(events, packet) {
            self.free(rejected);
        }
        true
    }

    fn free(&self, packet: HeldPacket) {
        let handle = packet.into_raw();
        let mut state = self.lock();
        state.held.remove(&handle);
        state.released.push(handle);
    }
}

impl RadioHal for MockRadio {
    fn initialize(&mut self, config: &RadioConfig, sink: EventSink) -> Result<(), HalError> {
        {
            let mut state = self.lock();
            state.calls.push(RadioCall::Initialize(config.clone()));
            state.check(MockOp::Initialize)?;
            state.auto_ack = config.auto_ack;
            state.promiscuous = config.promiscuous;
            state.initialized = true;
        }
        *self.sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(sink);
        Ok(())
    }

    fn configure_channels(&mut self, band: Band) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::ConfigureChannels(band));
        state.check(MockOp::ConfigureChannels)
    }

    fn configure_addressing(&mut self, filter: &AddressFilter) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::ConfigureAddressing(*filter));
        state.check(MockOp::ConfigureAddressing)?;
        state.addressing = Some(*filter);
        Ok(())
    }

    fn set_short_address(&mut self, addr: u16) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::SetShortAddress(addr));
        state.check(MockOp::SetAddress)?;
        if let Some(filter) = state.addressing.as_mut() {
            filter.short_addr = addr;
        }
        Ok(())
    }

    fn set_long_address(&mut self, addr: [u8; 8]) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::SetLongAddress(addr));
        state.check(MockOp::SetAddress)?;
        if let Some(filter) = state.addressing.as_mut() {
            filter.long_addr = addr;
        }
        Ok(())
    }

    fn set_pan_id(&mut self, pan_id: u16) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::SetPanId(pan_id));
        state.check(MockOp::SetAddress)?;
        if let Some(filter) = state.addressing.as_mut() {
            filter.pan_id = pan_id;
        }
        Ok(())
    }

    fn tx_power_ddbm(&self) -> i16 {
        self.lock().tx_power_ddbm
    }

    fn set_tx_power_ddbm(&mut self, ddbm: i16) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::SetTxPower(ddbm));
        state.check(MockOp::SetTxPower)?;
        state.tx_power_ddbm = ddbm;
        Ok(())
    }

    fn start_rx(&mut self, channel: u8) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::StartRx(channel));
        state.check(MockOp::StartRx)?;
        state.radio_state = RadioState::Rx;
        Ok(())
    }

    fn idle(&mut self, abort: bool) {
        let mut state = self.lock();
        state.calls.push(RadioCall::Idle { abort });
        state.radio_state = RadioState::Idle;
    }

    fn write_tx_fifo(&mut self, frame: &[u8]) -> Result<usize, HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::WriteTxFifo(frame.to_vec()));
        state.check(MockOp::WriteTxFifo)?;
        state.tx_fifo = frame.to_vec();
        Ok(frame.len())
    }

    fn start_csma_tx(
        &mut self,
        channel: u8,
        options: TxOptions,
        csma: &CsmaConfig,
    ) -> Result<(), HalError> {
        let auto_complete = {
            let mut state = self.lock();
            state.calls.push(RadioCall::StartCsmaTx {
                channel,
                options,
                csma: *csma,
            });
            state.check(MockOp::StartCsmaTx)?;
            if state.tx_fifo.is_empty() {
                return Err(HalError::InvalidState);
            }
            let frame = std::mem::take(&mut state.tx_fifo);
            state.tx_frames.push(frame);
            if state.auto_complete_tx {
                state.radio_state = RadioState::Idle;
                true
            } else {
                state.radio_state = RadioState::Tx;
                false
            }
        };

        if auto_complete {
            self.deliver(RailEvents::TX_PACKET_SENT, None);
        }
        Ok(())
    }

    fn radio_state(&self) -> RadioState {
        self.lock().radio_state
    }

    fn held_packet_info(&self, packet: &HeldPacket) -> Result<HeldPacketInfo, HalError> {
        let state = self.lock();
        let stored = state
            .held
            .get(&packet.handle())
            .ok_or(HalError::InvalidParameter)?;
        Ok(HeldPacketInfo {
            status: packet.info().status,
            packet_bytes: stored.bytes.len() as u16,
        })
    }

    fn held_packet_details(&self, packet: &HeldPacket) -> Result<RxPacketDetails, HalError> {
        let state = self.lock();
        state
            .held
            .get(&packet.handle())
            .map(|stored| stored.details)
            .ok_or(HalError::InvalidParameter)
    }

    fn copy_held_packet(
        &self,
        packet: &HeldPacket,
        skip: usize,
        dest: &mut [u8],
    ) -> Result<usize, HalError> {
        let state = self.lock();
        let stored = state
            .held
            .get(&packet.handle())
            .ok_or(HalError::InvalidParameter)?;
        let src = stored.bytes.get(skip..).unwrap_or(&[]);
        let n = src.len().min(dest.len());
        dest[..n].copy_from_slice(&src[..n]);
        Ok(n)
    }

    fn release_held_packet(&mut self, packet: HeldPacket) -> Result<(), HalError> {
        let handle = packet.into_raw();
        let mut state = self.lock();
        state.calls.push(RadioCall::Release(handle));
        state.check(MockOp::Release)?;
        if state.held.remove(&handle).is_none() {
            return Err(HalError::InvalidParameter);
        }
        state.released.push(handle);
        Ok(())
    }

    fn set_promiscuous(&mut self, enable: bool) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::SetPromiscuous(enable));
        state.check(MockOp::SetPromiscuous)?;
        state.promiscuous = enable;
        Ok(())
    }

    fn is_auto_ack_enabled(&self) -> bool {
        self.lock().auto_ack
    }

    fn set_auto_ack(&mut self, enable: bool) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::SetAutoAck(enable));
        state.check(MockOp::SetAutoAck)?;
        state.auto_ack = enable;
        Ok(())
    }

    fn set_cca_threshold(&mut self, dbm: i8) -> Result<(), HalError> {
        let mut state = self.lock();
        state.calls.push(RadioCall::SetCcaThreshold(dbm));
        state.check(MockOp::SetCcaThreshold)?;
        state.cca_threshold_dbm = dbm;
        Ok(())
    }

    fn eui64(&self) -> [u8; 8] {
        self.lock().eui64
    }
}
