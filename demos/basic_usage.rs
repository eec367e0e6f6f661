//! Basic Usage Example
//!
//! Demonstrates the core functionality of the Masterflex protocol library:
//! - Connecting to a pump drive on a serial port
//! - Switching the drive to remote operation
//! - Setting motor speed and revolutions, then running
//! - Reading back status and the cumulative counter
//! - Debug output for protocol analysis
//!
//! Usage:
//!   cargo run --example basic_usage -- /dev/ttyUSB0
//!   cargo run --example basic_usage -- COM3 7        # satellite address 7

use masterflex_protocol::{Masterflex, Response, Result};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let port_name = match args.next() {
        Some(port) => port,
        None => {
            eprintln!("Usage: basic_usage <port> [address]");
            for port in Masterflex::list_ports()? {
                eprintln!("  available: {}", port.port_name);
            }
            std::process::exit(1);
        }
    };
    let address: u8 = args.next().and_then(|a| a.parse().ok()).unwrap_or(1);

    println!("Connecting to satellite {} on {}...", address, port_name);
    let mut pump = Masterflex::new(&port_name, address)?;

    // Show the raw frames on the wire while experimenting.
    pump.set_debug_print(true, true);

    if pump.enable_remote() != Response::Ack {
        println!("Drive did not accept remote mode; is the address right?");
        return Ok(());
    }

    println!("Status: {:?}", pump.request_status());

    pump.set_motor_speed("+050.0");
    pump.set_revolutions(10.0);
    println!("Speed readback: {:?}", pump.motor_speed());

    match pump.go() {
        Response::Ack => println!("Running 10 revolutions at 50 rpm"),
        other => println!("Go refused: {:?}", other),
    }

    println!("Cumulative counter: {:?}", pump.request_cumulative());

    pump.halt();
    pump.enable_local();
    Ok(())
}
