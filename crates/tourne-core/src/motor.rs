//! Motor controller link data shapes
//!
//! The turntable motor sits behind an Arduino speaking a line-text serial
//! protocol. The serial I/O itself (port handling, reconnection with fixed
//! backoff) lives in the bridge daemon outside this workspace; this module
//! defines the data shapes both sides agree on: outgoing command lines and
//! the status lines the controller prints back, pattern-matched into
//! `(topic, value)` pairs for injection into the message system.

use crate::message::Message;

/// Commands accepted by the motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorCommand {
    /// Set rotation speed (sign is direction)
    SetSpeed(i32),
    /// Toggle the servo's pendulum mode
    ToggleBalance,
}

impl MotorCommand {
    /// Serialize to the controller's line format, terminator included.
    pub fn to_line(&self) -> String {
        match self {
            MotorCommand::SetSpeed(speed) => format!("v{}\n", speed),
            MotorCommand::ToggleBalance => String::from("b\n"),
        }
    }
}

/// A status event parsed from a controller output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// Speed acknowledged (also emitted on direction change)
    MotorSpeed(i32),
    /// Motor came to a stop
    MotorStopped,
    /// Pendulum mode was switched on
    BalanceModeOn,
    /// Servo reached an angle
    ServoAngle(i32),
}

impl StatusEvent {
    /// The message injected into the routing system for this event.
    pub fn to_message(&self) -> Message {
        match self {
            StatusEvent::MotorSpeed(speed) => Message::int("/arduino/motor/speed", *speed),
            StatusEvent::MotorStopped => Message::int("/arduino/motor/speed", 0),
            StatusEvent::BalanceModeOn => Message::int("/arduino/servo/mode", 1),
            StatusEvent::ServoAngle(angle) => Message::int("/arduino/servo/angle", *angle),
        }
    }
}

/// Extract the first (possibly signed) integer following `label` in `line`.
fn int_after<'a>(line: &'a str, label: &str) -> Option<i32> {
    let rest = line.split_once(label)?.1;
    let rest = rest.trim_start_matches([' ', ':']);
    let end = rest
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || (i == 0 && c == '-'))
        .count();
    rest[..end].parse().ok()
}

/// Pattern-match one free-text status line from the controller.
///
/// The firmware prints French status text; we key on the stable label
/// fragments. Unrecognized lines return `None` and are only logged by the
/// caller.
pub fn parse_status_line(line: &str) -> Option<StatusEvent> {
    let line = line.trim();

    if line.contains("Moteur arrêté") {
        return Some(StatusEvent::MotorStopped);
    }
    if line.contains("Mode balancier du servo activé") {
        return Some(StatusEvent::BalanceModeOn);
    }
    if line.contains("Vitesse réglée à") {
        // Covers both "Vitesse réglée à : N" and
        // "Nouvelle direction appliquée, vitesse réglée à : N"
        return int_after(line, "réglée à").map(StatusEvent::MotorSpeed);
    }
    if line.contains("Servo déplacé à") {
        return int_after(line, "déplacé à").map(StatusEvent::ServoAngle);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Arg;

    #[test]
    fn command_lines() {
        assert_eq!(MotorCommand::SetSpeed(200).to_line(), "v200\n");
        assert_eq!(MotorCommand::SetSpeed(-35).to_line(), "v-35\n");
        assert_eq!(MotorCommand::ToggleBalance.to_line(), "b\n");
    }

    #[test]
    fn parses_speed_ack() {
        assert_eq!(
            parse_status_line("Vitesse réglée à : 150"),
            Some(StatusEvent::MotorSpeed(150))
        );
        assert_eq!(
            parse_status_line("Vitesse réglée à : -80"),
            Some(StatusEvent::MotorSpeed(-80))
        );
    }

    #[test]
    fn parses_direction_change() {
        assert_eq!(
            parse_status_line("Nouvelle direction appliquée, vitesse réglée à : -120"),
            Some(StatusEvent::MotorSpeed(-120))
        );
    }

    #[test]
    fn parses_servo_and_mode_lines() {
        assert_eq!(
            parse_status_line("Servo déplacé à : 90"),
            Some(StatusEvent::ServoAngle(90))
        );
        assert_eq!(
            parse_status_line("Mode balancier du servo activé"),
            Some(StatusEvent::BalanceModeOn)
        );
        assert_eq!(parse_status_line("Moteur arrêté"), Some(StatusEvent::MotorStopped));
    }

    #[test]
    fn ignores_chatter() {
        assert_eq!(parse_status_line("Arrêt progressif demandé"), None);
        assert_eq!(parse_status_line(""), None);
    }

    #[test]
    fn events_map_to_topics() {
        let msg = StatusEvent::MotorSpeed(42).to_message();
        assert_eq!(msg.topic, "/arduino/motor/speed");
        assert_eq!(msg.args, vec![Arg::Int(42)]);

        let msg = StatusEvent::MotorStopped.to_message();
        assert_eq!(msg.args, vec![Arg::Int(0)]);
    }
}
