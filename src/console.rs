//! Interactive console session
//!
//! `Console` owns the transport and turns parsed lines into handshakes,
//! report writes and pass-through exchanges.

use std::io::{BufRead, Write};

use rn42_transport::handshake::{self, ScanPolicy};
use rn42_transport::protocol;
use rn42_transport::{DeviceClass, ReportPacket, Transport};
use tracing::{debug, info, warn};

use crate::command::ConsoleCommand;
use crate::error::ConsoleError;

/// Prompt printed before each interactive line
pub const PROMPT: &str = ">> ";

/// What the session does after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    /// `exit` was entered and the transport is closed
    Exit,
}

/// A console bound to one open transport
pub struct Console<T: Transport> {
    link: T,
    policy: ScanPolicy,
}

impl<T: Transport> Console<T> {
    pub fn new(link: T, policy: ScanPolicy) -> Self {
        Self { link, policy }
    }

    pub fn link(&self) -> &T {
        &self.link
    }

    pub fn into_inner(self) -> T {
        self.link
    }

    /// Execute one line, writing any feedback to `out`.
    ///
    /// Recoverable errors are reported as `>> Error, <message>` and the
    /// session continues. Only fatal errors are returned.
    pub fn execute<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Outcome, ConsoleError> {
        match self.dispatch(line, out) {
            Err(e) if !e.is_fatal() => {
                debug!("Rejected {:?}: {}", line, e);
                writeln!(out, ">> Error, {}", e)?;
                Ok(Outcome::Continue)
            }
            other => other,
        }
    }

    fn dispatch<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Outcome, ConsoleError> {
        match ConsoleCommand::parse(line)? {
            ConsoleCommand::EnterCommandMode => {
                writeln!(out, ">> Attempting to enter CMD mode...")?;
                let ok = handshake::enter_command_mode(&mut self.link, &self.policy)?;
                writeln!(out, ">> enter_command_mode() = {}", ok)?;
            }
            ConsoleCommand::ExitCommandMode => {
                writeln!(out, ">> Attempting to exit CMD mode...")?;
                let ok = handshake::exit_command_mode(&mut self.link, &self.policy)?;
                writeln!(out, ">> exit_command_mode() = {}", ok)?;
            }
            ConsoleCommand::Quit => {
                let shown = writeln!(out, ">> Closing serial port and cleaning up...");
                self.close();
                shown?;
                return Ok(Outcome::Exit);
            }
            ConsoleCommand::SetHidType(hid_type) => {
                let ok = handshake::set_hid_type(&mut self.link, hid_type, &self.policy)?;
                writeln!(out, ">> set_hid_type({}) = {}", hid_type, ok)?;
            }
            ConsoleCommand::Raw(bytes) => {
                writeln!(out, "Writing... {}", protocol::format_hex(&bytes))?;
                self.link.write(&protocol::frame_line(&bytes))?;
            }
            ConsoleCommand::Action { class, fields } => {
                let packet = encode_action(class, &fields)?;
                writeln!(out, "Writing... {}", packet)?;
                self.link.write(&packet.to_line())?;
            }
            ConsoleCommand::PassThrough(text) => {
                self.pass_through(&text, out)?;
            }
        }
        Ok(Outcome::Continue)
    }

    /// Send a line as typed and print whatever the module answers.
    fn pass_through<W: Write>(&mut self, text: &str, out: &mut W) -> Result<(), ConsoleError> {
        self.link.write(&protocol::frame_line(text.as_bytes()))?;
        self.link.settle(self.policy.settle_delay);

        let reply = handshake::drain(&mut self.link)?;
        if !reply.is_empty() {
            let text = String::from_utf8_lossy(&reply);
            writeln!(out, ">>{}", text.trim_end_matches(['\r', '\n']))?;
        }
        Ok(())
    }

    /// Close the transport, logging instead of failing.
    pub fn close(&mut self) {
        match self.link.close() {
            Ok(()) => info!("Closed {}", self.link.port_info()),
            Err(e) => warn!("Closing {} failed: {}", self.link.port_info(), e),
        }
    }

    /// Interactive loop: prompt, read a line, execute, until `exit` or end
    /// of input. The transport is closed on every way out.
    ///
    /// Lines are read as bytes; anything that is not UTF-8 is decoded lossily
    /// and handled like any other line.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, out: &mut W) -> Result<(), ConsoleError> {
        let mut buf = Vec::new();
        let result = loop {
            if let Err(e) = write!(out, "{}", PROMPT).and_then(|_| out.flush()) {
                break Err(e.into());
            }
            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => {
                    debug!("End of input");
                    break Ok(());
                }
                Ok(_) => {}
                Err(e) => break Err(e.into()),
            }
            let line = String::from_utf8_lossy(&buf);
            match self.execute(line.trim_end_matches(['\r', '\n']), out) {
                Ok(Outcome::Continue) => {}
                Ok(Outcome::Exit) => return Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.close();
        result
    }

    /// Execute a fixed list of lines without prompting, then close.
    pub fn run_script<I, S, W>(&mut self, lines: I, out: &mut W) -> Result<(), ConsoleError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: Write,
    {
        for line in lines {
            match self.execute(line.as_ref(), out) {
                Ok(Outcome::Continue) => {}
                Ok(Outcome::Exit) => return Ok(()),
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
        self.close();
        Ok(())
    }
}

/// Build the data-mode packet for an `action=` line.
fn encode_action(class: &DeviceClass, fields: &str) -> Result<ReportPacket, ConsoleError> {
    let packet = class.encode(fields)?;
    debug!(
        "{} report (descriptor {}, {} fields): {}",
        class.name,
        class.descriptor,
        class.field_count(),
        packet
    );
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rn42_transport::sim::ModuleMode;
    use rn42_transport::SimulatedModule;
    use std::time::Duration;

    fn session(lines: &[&str]) -> (Console<SimulatedModule>, String) {
        let mut console = Console::new(SimulatedModule::new(), ScanPolicy::new(3, Duration::ZERO));
        let mut out = Vec::new();
        for line in lines {
            console.execute(line, &mut out).unwrap();
        }
        (console, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_configure_against_simulator() {
        let (console, out) = session(&["cmdstart", "type=gamepad", "cmdexit"]);
        assert!(out.contains(">> enter_command_mode() = true"));
        assert!(out.contains(">> set_hid_type(gamepad (0210)) = true"));
        assert!(out.contains(">> Attempting to exit CMD mode...\n>> exit_command_mode() = true"));
        assert_eq!(console.link().hid_code(), Some("0210"));
        assert_eq!(console.link().mode(), ModuleMode::Data);
    }

    #[test]
    fn test_pass_through_prints_reply() {
        let (_, out) = session(&["cmdstart", "D"]);
        assert!(out.ends_with(">>?\n"));
    }

    #[test]
    fn test_action_reaches_module() {
        let (console, out) = session(&["action=keyboard(0,4)"]);
        assert_eq!(out, "Writing... fd:09:01:00:04\n");
        assert_eq!(console.link().reports_received(), 1);
    }

    #[test]
    fn test_exit_outcome() {
        let mut console = Console::new(SimulatedModule::new(), ScanPolicy::default());
        let mut out = Vec::new();
        assert_eq!(console.execute("exit", &mut out).unwrap(), Outcome::Exit);
        assert_eq!(out, b">> Closing serial port and cleaning up...\n");
    }
}
