//! Discovery Example
//!
//! Sweeps every local serial port for attached satellites and prints what
//! answered. Candidate addresses come from the command line; with none
//! given, only address 1 is probed.
//!
//! Usage:
//!   cargo run --example discover
//!   cargo run --example discover -- 1 2 7

use masterflex_protocol::find_pumps;

fn main() {
    let addresses: Vec<u8> = std::env::args()
        .skip(1)
        .filter_map(|a| a.parse().ok())
        .collect();

    println!("Sweeping serial ports...");
    let found = find_pumps(&addresses);

    if found.is_empty() {
        println!("No satellites answered.");
        return;
    }

    for device in &found {
        println!(
            "{}: satellite {} answered, status {:?}",
            device.port_name,
            device.pump.address(),
            String::from_utf8_lossy(&device.status)
        );
    }
}
