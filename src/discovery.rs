//! Device discovery: sweep local serial ports for attached satellites.

use crate::constants::DEFAULT_PROBE_ADDRESS;
use crate::error::Result;
use crate::protocol::Masterflex;
use crate::transport::SerialConfig;
use crate::types::Response;

/// One satellite located by [`find_pumps`], with its open client.
pub struct DiscoveredPump {
    /// Connected client, ready for commands
    pub pump: Masterflex,
    /// Port the satellite answered on
    pub port_name: String,
    /// Raw status frame that confirmed the device
    pub status: Vec<u8>,
}

/// Probe every local serial port with each candidate address and return
/// the satellites that answered a status request.
///
/// Multiple devices may share one bus at different addresses, so every
/// (port, address) pair is tried independently and sequentially. A busy
/// port, or any other failed probe, is skipped without aborting the sweep.
/// An empty candidate list defaults to address 1.
pub fn find_pumps(addresses: &[u8]) -> Vec<DiscoveredPump> {
    let default = [DEFAULT_PROBE_ADDRESS];
    let addresses = if addresses.is_empty() { &default[..] } else { addresses };
    let ports: Vec<String> = serialport::available_ports()
        .unwrap_or_default()
        .into_iter()
        .map(|info| info.port_name)
        .collect();
    let config = SerialConfig::default();
    sweep(&ports, addresses, |port, address| {
        Masterflex::with_config(port, address, &config)
    })
}

/// Sweep core, generic over the connect step so the skip behavior is
/// testable without hardware.
fn sweep<F>(ports: &[String], addresses: &[u8], mut connect: F) -> Vec<DiscoveredPump>
where
    F: FnMut(&str, u8) -> Result<Masterflex>,
{
    let mut found = Vec::new();
    for port in ports {
        for &address in addresses {
            let mut pump = match connect(port, address) {
                Ok(pump) => pump,
                // Busy port or dead probe: skip the pair, keep sweeping.
                Err(_) => continue,
            };
            if let Response::Data(status) = pump.request_status() {
                found.push(DiscoveredPump {
                    pump,
                    port_name: port.clone(),
                    status,
                });
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MasterflexError;
    use crate::transport::mock::MockTransport;

    fn answering_pump(address: u8) -> Masterflex {
        let link = MockTransport::new();
        link.push_reply(&[0x06]); // enquire
        link.push_reply(&[0x06]); // assign number
        link.push_reply(b"\x02P01I1100\r"); // status probe in the sweep
        Masterflex::from_transport(Box::new(link), address).unwrap()
    }

    fn silent_pump(address: u8) -> Masterflex {
        let link = MockTransport::new();
        Masterflex::from_transport(Box::new(link), address).unwrap()
    }

    #[test]
    fn busy_port_does_not_abort_the_sweep() {
        let ports = vec!["COM1".to_string(), "COM2".to_string()];
        let found = sweep(&ports, &[1], |port, address| {
            if port == "COM1" {
                Err(MasterflexError::PortBusy("resource in use".into()))
            } else {
                Ok(answering_pump(address))
            }
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].port_name, "COM2");
        assert_eq!(found[0].status, b"\x02P01I1100\r".to_vec());
    }

    #[test]
    fn silent_devices_are_not_recorded() {
        let ports = vec!["COM1".to_string()];
        let found = sweep(&ports, &[1, 2], |_, address| Ok(silent_pump(address)));
        assert!(found.is_empty());
    }

    #[test]
    fn every_port_address_pair_is_probed() {
        let ports = vec!["COM1".to_string(), "COM2".to_string()];
        let mut probed = Vec::new();
        sweep(&ports, &[1, 7], |port, address| {
            probed.push((port.to_string(), address));
            Err(MasterflexError::PortBusy("resource in use".into()))
        });
        assert_eq!(
            probed,
            vec![
                ("COM1".to_string(), 1),
                ("COM1".to_string(), 7),
                ("COM2".to_string(), 1),
                ("COM2".to_string(), 7),
            ]
        );
    }
}
