// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! quadlink-monitor - Print live telemetry from a flight controller.
//!
//! Opens a control link, streams the neutral setpoint, and prints one line
//! per status packet until Ctrl-C or the watchdog times the link out.

use clap::Parser;
use quadlink::Link;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Live telemetry monitor for a HackQuad control link
#[derive(Parser, Debug)]
#[command(name = "quadlink-monitor")]
#[command(version)]
#[command(about = "Print live telemetry from a flight controller")]
struct Args {
    /// Hostname or address of the flight controller
    #[arg(long, default_value = "hackquad.local")]
    host: String,

    /// UDP port the flight controller listens on
    #[arg(long, default_value = "25565")]
    port: u16,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let link = match Link::builder(&args.host).port(args.port).build() {
        Ok(link) => link,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };
    println!("monitoring {} (Ctrl-C to stop)", link.host());

    link.events().on_status_update(|status| {
        println!(
            "battery {:6.2} V | rssi {:4} | loop {:7.3} ms | angles {:7.2} {:7.2} {:7.2}",
            status.battery,
            status.rssi,
            status.fc_loop_time,
            status.angle_x,
            status.angle_y,
            status.angle_z
        );
        Ok(())
    });

    let timed_out = Arc::new(AtomicBool::new(false));
    {
        let timed_out = Arc::clone(&timed_out);
        link.events().on_connection_timeout(move |_| {
            timed_out.store(true, Ordering::SeqCst);
            Ok(())
        });
    }

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        if let Err(err) = ctrlc::set_handler(move || {
            running.store(false, Ordering::SeqCst);
        }) {
            log::warn!("[MONITOR] no Ctrl-C handler: {}", err);
        }
    }

    while running.load(Ordering::SeqCst) && !link.is_closed() {
        std::thread::sleep(Duration::from_millis(100));
    }

    if timed_out.load(Ordering::SeqCst) {
        eprintln!("connection timed out");
        std::process::exit(2);
    }
    link.close();
    println!("closed");
}
