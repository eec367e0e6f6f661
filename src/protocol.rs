use crate::constants::*;
use crate::error::{MasterflexError, Result};
use crate::transport::{SerialConfig, Session, Transport};
use crate::types::{AuxOutput, MotorSpeed, Response};

/// Main Masterflex protocol interface: one client per satellite.
///
/// Every operation is a blocking send-then-receive exchange on the
/// underlying [`Session`]; the protocol is strictly half-duplex, so a
/// client must never be shared across threads. Transport faults during an
/// exchange collapse to [`Response::Empty`] rather than propagating.
pub struct Masterflex {
    session: Session,
    address: u8,
    print_tx: bool,
    print_rx: bool,
}

impl std::fmt::Debug for Masterflex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Masterflex")
            .field("address", &self.address)
            .field("print_tx", &self.print_tx)
            .field("print_rx", &self.print_rx)
            .finish_non_exhaustive()
    }
}

/// Build a standard command frame: `STX "P" <2-digit addr> <cmd> [params] CR`.
///
/// `command` is a string rather than a char so the startup assign-number
/// frame (blank command) goes through the same path. Parameters are
/// appended verbatim; numeric formatting is the caller's job.
pub fn standard_command(address: u8, command: &str, params: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(5 + command.len() + params.len());
    frame.push(STX);
    frame.extend_from_slice(format!("P{:02}", address).as_bytes());
    frame.extend_from_slice(command.as_bytes());
    frame.extend_from_slice(params.as_bytes());
    frame.push(CR);
    frame
}

impl Masterflex {
    /// Connect to a satellite with the default serial configuration.
    pub fn new(port_name: &str, address: u8) -> Result<Self> {
        Self::with_config(port_name, address, &SerialConfig::default())
    }

    /// Connect to a satellite with an explicit serial configuration.
    pub fn with_config(port_name: &str, address: u8, config: &SerialConfig) -> Result<Self> {
        if address > MAX_ADDRESS {
            return Err(MasterflexError::AddressOutOfRange(address));
        }
        let session = Session::open(port_name, config)?;
        Self::from_session(session, address)
    }

    /// Build a client over an already-open transport.
    ///
    /// Performs the same startup handshake as [`Masterflex::new`]; intended
    /// for custom links and tests.
    pub fn from_transport(link: Box<dyn Transport>, address: u8) -> Result<Self> {
        if address > MAX_ADDRESS {
            return Err(MasterflexError::AddressOutOfRange(address));
        }
        Self::from_session(Session::from_transport(link), address)
    }

    fn from_session(session: Session, address: u8) -> Result<Self> {
        let mut pump = Masterflex {
            session,
            address,
            print_tx: false,
            print_rx: false,
        };
        // Startup handshake: probe the drive, then assign its number.
        // Neither reply gates construction; a silent drive is still usable
        // once it comes online.
        pump.enquire();
        pump.assign_number();
        Ok(pump)
    }

    /// List available serial ports
    pub fn list_ports() -> Result<Vec<serialport::SerialPortInfo>> {
        Ok(serialport::available_ports()?)
    }

    /// Enable/disable debug printing for TX/RX
    pub fn set_debug_print(&mut self, tx: bool, rx: bool) {
        self.print_tx = tx;
        self.print_rx = rx;
    }

    /// Address this client currently targets; changes only on an
    /// acknowledged [`renumber`](Masterflex::renumber).
    pub fn address(&self) -> u8 {
        self.address
    }

    fn build(&self, command: &str, params: &str) -> Vec<u8> {
        standard_command(self.address, command, params)
    }

    /// Run one transaction: send the frame, read back the reply.
    ///
    /// Any transport fault yields `Empty`; callers treat "no data" as the
    /// universal failure signal.
    fn execute(&mut self, frame: &[u8]) -> Response {
        if self.print_tx {
            let debug_print: String = frame
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ");
            println!("Sending:  {}", debug_print);
        }

        let received = self
            .session
            .send_frame(frame)
            .and_then(|_| self.session.receive_frame());

        match received {
            Ok(Some(raw)) => {
                if self.print_rx {
                    let debug_print: String = raw
                        .iter()
                        .map(|b| format!("{:02X}", b))
                        .collect::<Vec<_>>()
                        .join(" ");
                    println!("Received: {}", debug_print);
                }
                Response::classify(raw)
            }
            Ok(None) | Err(_) => Response::Empty,
        }
    }

    /// One-shot address assignment sent during startup.
    fn assign_number(&mut self) -> Response {
        let frame = self.build("", "");
        self.execute(&frame)
    }

    /// (A) Request auxiliary input status
    pub fn request_aux_input_status(&mut self) -> Response {
        let frame = self.build("A", "");
        self.execute(&frame)
    }

    /// (B) Control auxiliary outputs when the next G command executes
    pub fn control_aux_outputs_on_go(&mut self, aux1: AuxOutput, aux2: AuxOutput) -> Response {
        let frame = self.build("B", &format!("{}{}", aux1, aux2));
        self.execute(&frame)
    }

    /// (C) Request cumulative revolution counter
    pub fn request_cumulative(&mut self) -> Response {
        let frame = self.build("C", "");
        self.execute(&frame)
    }

    /// (E) Request revolutions to go
    pub fn request_to_go(&mut self) -> Response {
        let frame = self.build("E", "");
        self.execute(&frame)
    }

    /// (G) Turn the pump on for the revolution count set by
    /// [`set_revolutions`](Masterflex::set_revolutions).
    ///
    /// Guard: if the current motor speed cannot be read or its magnitude is
    /// at or below 0.1 rpm, a Halt is sent instead, so a motionless run is
    /// never started.
    pub fn go(&mut self) -> Response {
        if self.speed_too_low_to_run() {
            return self.halt();
        }
        let frame = self.build("G", "");
        self.execute(&frame)
    }

    /// (G0) Turn the pump on and run continuously until halted.
    ///
    /// Same speed guard as [`go`](Masterflex::go). Known quirk: some drives
    /// have been observed to NAK this form persistently; pending hardware
    /// verification, the reply is surfaced as-is.
    pub fn go_continuous(&mut self) -> Response {
        if self.speed_too_low_to_run() {
            return self.halt();
        }
        let frame = self.build("G", "0");
        self.execute(&frame)
    }

    fn speed_too_low_to_run(&mut self) -> bool {
        match self.motor_speed() {
            Some(speed) => speed.magnitude() <= MIN_RUN_SPEED,
            None => true,
        }
    }

    /// (H) Halt (turn pump off)
    pub fn halt(&mut self) -> Response {
        let frame = self.build("H", "");
        self.execute(&frame)
    }

    /// (I) Request status data
    pub fn request_status(&mut self) -> Response {
        let frame = self.build("I", "");
        self.execute(&frame)
    }

    /// (K) Request front panel switch pressed since last K command
    pub fn request_front_panel_switch(&mut self) -> Response {
        let frame = self.build("K", "");
        self.execute(&frame)
    }

    /// (L) Enable local operation
    pub fn enable_local(&mut self) -> Response {
        let frame = self.build("L", "");
        self.execute(&frame)
    }

    /// (O) Control auxiliary outputs immediately without affecting the drive
    pub fn control_aux_outputs(&mut self, aux1: AuxOutput, aux2: AuxOutput) -> Response {
        let frame = self.build("O", &format!("{}{}", aux1, aux2));
        self.execute(&frame)
    }

    /// (R) Enable remote operation
    pub fn enable_remote(&mut self) -> Response {
        let frame = self.build("R", "");
        self.execute(&frame)
    }

    /// (S) Request motor direction and rpm; raw reply.
    pub fn request_motor_speed(&mut self) -> Response {
        let frame = self.build("S", "");
        self.execute(&frame)
    }

    /// Request the motor speed and decode it, if the drive answered with a
    /// parseable data frame.
    pub fn motor_speed(&mut self) -> Option<MotorSpeed> {
        match self.request_motor_speed() {
            Response::Data(frame) => MotorSpeed::parse(&frame),
            _ => None,
        }
    }

    /// (S) Set motor direction and rpm.
    ///
    /// `rpm` must already be in the drive's signed fixed-point format:
    /// `+xxx.x`, `-xxx.x`, `+xxxx` or `-xxxx` (`+` is CW, `-` is CCW),
    /// with a value between -100 and 100.
    pub fn set_motor_speed(&mut self, rpm: &str) -> Response {
        let frame = self.build("S", rpm);
        self.execute(&frame)
    }

    /// (U) Change the satellite's address.
    ///
    /// Addresses above 89 are reserved; those are rejected locally with
    /// `Nak` and nothing is sent. On a device `Ack` the client's stored
    /// address is updated to match.
    pub fn renumber(&mut self, new_address: u8) -> Response {
        if new_address > MAX_ASSIGNABLE_ADDRESS {
            return Response::Nak;
        }
        let frame = self.build("U", &new_address.to_string());
        let response = self.execute(&frame);
        if response.is_ack() {
            self.address = new_address;
        }
        response
    }

    /// (V) Set the number of revolutions to run.
    ///
    /// Magnitudes of 99999.99 or more are outside the drive's field width
    /// and are rejected locally with `Nak`, like a renumber out of range.
    pub fn set_revolutions(&mut self, revolutions: f64) -> Response {
        if !revolutions.is_finite() || revolutions.abs() >= MAX_REVOLUTIONS {
            return Response::Nak;
        }
        let frame = self.build("V", &revolutions.to_string());
        self.execute(&frame)
    }

    /// (Z) Zero the revolutions-to-go counter
    pub fn zero_to_go(&mut self) -> Response {
        let frame = self.build("Z", "");
        self.execute(&frame)
    }

    /// (Z0) Zero the cumulative revolution counter
    pub fn zero_cumulative(&mut self) -> Response {
        let frame = self.build("Z", "0");
        self.execute(&frame)
    }

    /// (CAN) Terminate the drive's current input line up to and including
    /// the STX; sent bare, no frame wrapper.
    pub fn cancel(&mut self) -> Response {
        self.execute(&[CAN])
    }

    /// (ENQ) Enquire which satellite has activated its RTS line; sent bare.
    ///
    /// Acts as a status probe after startup. If the drive stays silent the
    /// client falls back to an I command, which answers the same question
    /// less directly.
    pub fn enquire(&mut self) -> Response {
        let response = self.execute(&[ENQ]);
        if response.is_empty() {
            return self.request_status();
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use std::collections::VecDeque;
    use std::io;

    /// Construct a client over a mock link, scripting ACKs for the
    /// startup enquire and assign-number exchanges (sent frames 0 and 1).
    fn pump_with(link: &MockTransport, address: u8) -> Masterflex {
        link.push_reply(&[ACK]);
        link.push_reply(&[ACK]);
        Masterflex::from_transport(Box::new(link.clone()), address).unwrap()
    }

    #[test]
    fn standard_command_zero_pads_every_address() {
        for address in 0..=99 {
            let frame = standard_command(address, "I", "");
            assert_eq!(frame.len(), 6);
            assert_eq!(frame[0], STX);
            assert_eq!(&frame[1..4], format!("P{:02}", address).as_bytes());
            assert_eq!(frame[4], b'I');
            assert_eq!(frame[5], CR);
        }
    }

    #[test]
    fn standard_command_body_for_address_one() {
        assert_eq!(standard_command(1, "I", ""), b"\x02P01I\r");
    }

    #[test]
    fn construction_sends_enquire_then_assign_number() {
        let link = MockTransport::new();
        let pump = pump_with(&link, 3);
        let sent = link.sent();
        assert_eq!(sent[0], vec![ENQ]);
        assert_eq!(sent[1], b"\x02P03\r".to_vec());
        assert_eq!(pump.address(), 3);
    }

    #[test]
    fn construction_rejects_address_above_99() {
        let link = MockTransport::new();
        let err = Masterflex::from_transport(Box::new(link), 100).unwrap_err();
        assert!(matches!(err, MasterflexError::AddressOutOfRange(100)));
    }

    #[test]
    fn enquire_falls_back_to_request_status() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        // No reply to ENQ, but a status frame for the fallback I command.
        link.push_reply(&[]);
        link.push_reply(b"\x02P01I1100\r");
        let response = pump.enquire();
        let sent = link.sent();
        assert_eq!(sent[2], vec![ENQ]);
        assert_eq!(sent[3], b"\x02P01I\r".to_vec());
        assert_eq!(response, Response::Data(b"\x02P01I1100\r".to_vec()));
    }

    #[test]
    fn renumber_in_range_updates_address_on_ack() {
        for target in [1u8, 5, 10, 89] {
            let link = MockTransport::new();
            let mut pump = pump_with(&link, 2);
            link.push_reply(&[ACK]);
            let response = pump.renumber(target);
            assert_eq!(response, Response::Ack);
            assert_eq!(pump.address(), target);
            let expected = standard_command(2, "U", &target.to_string());
            assert_eq!(link.sent()[2], expected);
        }
    }

    #[test]
    fn renumber_keeps_address_on_nak() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 2);
        link.push_reply(&[NAK]);
        assert_eq!(pump.renumber(7), Response::Nak);
        assert_eq!(pump.address(), 2);
    }

    #[test]
    fn renumber_above_89_rejected_without_sending() {
        for target in [90u8, 100] {
            let link = MockTransport::new();
            let mut pump = pump_with(&link, 2);
            let frames_before = link.sent().len();
            assert_eq!(pump.renumber(target), Response::Nak);
            assert_eq!(pump.address(), 2);
            assert_eq!(link.sent().len(), frames_before);
        }
    }

    #[test]
    fn go_at_low_speed_substitutes_halt() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        link.push_reply(b"\x02S+000.0\r"); // speed query
        link.push_reply(&[ACK]); // halt
        assert_eq!(pump.go(), Response::Ack);
        let sent = link.sent();
        assert_eq!(sent[2], b"\x02P01S\r".to_vec());
        assert_eq!(sent[3], b"\x02P01H\r".to_vec());
        assert!(!sent.iter().any(|f| f.ends_with(b"G\r")));
    }

    #[test]
    fn go_with_unreadable_speed_substitutes_halt() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        // Speed query times out, halt is acknowledged.
        link.push_reply(&[]);
        link.push_reply(&[ACK]);
        assert_eq!(pump.go(), Response::Ack);
        assert_eq!(link.sent()[3], b"\x02P01H\r".to_vec());
    }

    #[test]
    fn go_at_running_speed_sends_g() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        link.push_reply(b"\x02S+004.0\r");
        link.push_reply(&[ACK]);
        assert_eq!(pump.go(), Response::Ack);
        assert_eq!(link.sent()[3], b"\x02P01G\r".to_vec());
    }

    #[test]
    fn go_continuous_sends_g_zero() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        link.push_reply(b"\x02S-050.0\r");
        link.push_reply(&[ACK]);
        assert_eq!(pump.go_continuous(), Response::Ack);
        assert_eq!(link.sent()[3], b"\x02P01G0\r".to_vec());
    }

    #[test]
    fn set_revolutions_rejects_field_overflow_locally() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        let frames_before = link.sent().len();
        assert_eq!(pump.set_revolutions(99999.99), Response::Nak);
        assert_eq!(pump.set_revolutions(f64::NAN), Response::Nak);
        assert_eq!(link.sent().len(), frames_before);
        link.push_reply(&[ACK]);
        assert_eq!(pump.set_revolutions(250.5), Response::Ack);
        assert_eq!(link.sent()[frames_before], b"\x02P01V250.5\r".to_vec());
    }

    #[test]
    fn cancel_sends_bare_can_byte() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        link.push_reply(&[ACK]);
        pump.cancel();
        assert_eq!(link.sent()[2], vec![CAN]);
    }

    #[test]
    fn aux_output_commands_encode_both_channels() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 4);
        link.push_reply(&[ACK]);
        link.push_reply(&[ACK]);
        pump.control_aux_outputs(AuxOutput::On, AuxOutput::Off);
        pump.control_aux_outputs_on_go(AuxOutput::Off, AuxOutput::On);
        let sent = link.sent();
        assert_eq!(sent[2], b"\x02P04O10\r".to_vec());
        assert_eq!(sent[3], b"\x02P04B01\r".to_vec());
    }

    #[test]
    fn transport_fault_collapses_to_empty() {
        let link = MockTransport::new();
        let mut pump = pump_with(&link, 1);
        link.fail_sends();
        assert_eq!(pump.halt(), Response::Empty);
        assert_eq!(pump.request_status(), Response::Empty);
    }

    /// Minimal satellite simulator: acknowledges writes, echoes the last
    /// set speed back on an S query.
    struct SimulatedPump {
        address: u8,
        speed: Vec<u8>,
        pending: VecDeque<u8>,
    }

    impl SimulatedPump {
        fn new(address: u8) -> Self {
            SimulatedPump {
                address,
                speed: b"+000.0".to_vec(),
                pending: VecDeque::new(),
            }
        }

        fn reply(&mut self, bytes: &[u8]) {
            self.pending = bytes.iter().copied().collect();
        }

        fn reply_speed(&mut self) {
            let mut frame = vec![STX, b'S'];
            frame.extend_from_slice(&self.speed);
            frame.push(CR);
            self.reply(&frame);
        }
    }

    impl crate::transport::Transport for SimulatedPump {
        fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.pending.clear();
            if bytes == [ENQ] {
                self.reply(&[STX, b'I', b'1', CR]);
                return Ok(());
            }
            if bytes == [CAN] {
                self.reply(&[ACK]);
                return Ok(());
            }
            // Strip STX ... CR and the P<addr> prefix.
            let body = &bytes[1..bytes.len() - 1];
            let expected = format!("P{:02}", self.address);
            if !body.starts_with(expected.as_bytes()) {
                self.reply(&[NAK]);
                return Ok(());
            }
            match &body[3..] {
                [] => self.reply(&[ACK]),
                [b'S'] => self.reply_speed(),
                [b'S', value @ ..] => {
                    self.speed = value.to_vec();
                    self.reply(&[ACK]);
                }
                [b'I'] => self.reply(&[STX, b'I', b'1', CR]),
                _ => self.reply(&[ACK]),
            }
            Ok(())
        }

        fn read_byte(&mut self) -> io::Result<Option<u8>> {
            Ok(self.pending.pop_front())
        }
    }

    #[test]
    fn speed_round_trip_against_simulated_pump() {
        let mut pump = Masterflex::from_transport(Box::new(SimulatedPump::new(1)), 1).unwrap();
        assert_eq!(pump.set_motor_speed("+004.0"), Response::Ack);
        let speed = pump.motor_speed().unwrap();
        assert_eq!(speed.rpm, 4.0);
        assert_eq!(speed.direction(), crate::types::Direction::Clockwise);
    }

    #[test]
    fn simulated_pump_naks_wrong_address() {
        let mut pump = Masterflex::from_transport(Box::new(SimulatedPump::new(2)), 5).unwrap();
        assert_eq!(pump.halt(), Response::Nak);
    }
}
