//! tourne-led daemon entry point
//!
//! Receives smoothed `/color/rgb` triples over UDP and forwards them to the
//! strip-owning thread. On SIGINT/SIGTERM the receive loop exits, the strip
//! thread is joined, the strip goes dark, and the GPIO pins are released.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use tourne_core::{config, wire};
use tourne_led::{ColorCommand, LedStrip, StripThread};

/// Process-wide shutdown flag, set by the signal handler.
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

extern "C" fn signal_handler(_sig: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

fn install_signal_handlers() {
    // signal() is async-signal-safe; the handler only flips an AtomicBool.
    unsafe {
        libc::signal(
            libc::SIGTERM,
            signal_handler as *const () as libc::sighandler_t,
        );
        libc::signal(
            libc::SIGINT,
            signal_handler as *const () as libc::sighandler_t,
        );
    }
}

/// Build the strip thread on the real GPIO bus, or fall back to the
/// logging stub when the strip is unavailable.
fn start_strip(net: &config::NetworkConfig) -> StripThread {
    let cfg = &net.led;

    #[cfg(all(target_os = "linux", feature = "gpio"))]
    match tourne_led::GpioBus::new(cfg.clk_pin, cfg.dat_pin) {
        Ok(bus) => {
            return StripThread::spawn(LedStrip::new(bus, cfg.alpha, cfg.buffer_size));
        }
        Err(e) => {
            log::warn!("GPIO unavailable ({}), running without hardware", e);
        }
    }

    StripThread::spawn(LedStrip::new(tourne_led::NullBus, cfg.alpha, cfg.buffer_size))
}

fn main() -> Result<()> {
    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    install_signal_handlers();

    let config_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let config = config::load_config_or_default(&config_path);

    log::info!(
        "tourne-led starting (listen={}, alpha={}, CLK=BCM{}, DAT=BCM{})",
        config.led.listen.addr(),
        config.led.alpha,
        config.led.clk_pin,
        config.led.dat_pin
    );

    let strip = start_strip(&config);

    let socket = UdpSocket::bind(config.led.listen.addr())
        .with_context(|| format!("Cannot bind on {}", config.led.listen.addr()))?;
    // Short timeout so the loop notices the shutdown flag promptly
    socket
        .set_read_timeout(Some(Duration::from_millis(200)))
        .context("Cannot set socket timeout")?;

    let mut buf = [0u8; 1536];
    while !SHUTDOWN.load(Ordering::SeqCst) {
        let (len, src) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue;
            }
            Err(e) => return Err(e).context("Color socket receive failed"),
        };

        let msg = match wire::decode(&buf[..len]) {
            Ok(msg) => msg,
            Err(e) => {
                log::warn!("Dropping malformed datagram from {}: {}", src, e);
                continue;
            }
        };

        if msg.topic != "/color/rgb" {
            log::debug!("Ignoring topic {}", msg.topic);
            continue;
        }

        // Last-good-value policy: malformed triples change nothing
        match msg.finite_args::<3>() {
            Some([red, green, blue]) => strip.set_color(ColorCommand {
                red: red as i32,
                green: green as i32,
                blue: blue as i32,
            }),
            None => log::warn!("Dropping malformed color triple: {}", msg),
        }
    }

    log::info!("Shutdown requested, turning strip off");
    drop(strip); // joins the strip thread: off() + pin release
    Ok(())
}
