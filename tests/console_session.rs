//! Console sessions driven through a scripted transport

use std::io::Cursor;
use std::time::Duration;

use rn42_console::{Console, ConsoleError, Outcome};
use rn42_transport::{encode, ScanPolicy, ScriptedTransport, SimulatedModule, TransportError};

fn console(link: ScriptedTransport) -> Console<ScriptedTransport> {
    Console::new(link, ScanPolicy::new(3, Duration::ZERO))
}

fn run_line(console: &mut Console<ScriptedTransport>, line: &str) -> String {
    let mut out = Vec::new();
    let outcome = console.execute(line, &mut out).unwrap();
    assert_eq!(outcome, Outcome::Continue);
    String::from_utf8(out).unwrap()
}

#[test]
fn action_sends_encoded_packet() {
    let mut console = console(ScriptedTransport::new());
    let out = run_line(&mut console, "action=mouse(1,2,3,4)");

    assert_eq!(out, "Writing... fd:09:01:01:02:03:04\n");
    let expected = encode("mouse", "1,2,3,4").unwrap().to_line();
    assert_eq!(console.link().writes(), &[expected]);
}

#[test]
fn action_errors_send_nothing() {
    let mut console = console(ScriptedTransport::new());

    let out = run_line(&mut console, "action=mouse(1,2)");
    assert!(out.starts_with(">> Error, action syntax was incorrect"));

    let out = run_line(&mut console, "action=keyboard(300,1)");
    assert!(out.starts_with(">> Error, "));

    let out = run_line(&mut console, "action=trackball(1,2)");
    assert!(out.contains("keyboard, mouse, consumer, gamepad, joystick"));

    let out = run_line(&mut console, "action=mouse");
    assert!(out.contains("action=<name>(<v1>,<v2>,...)"));

    assert!(console.link().writes().is_empty());
}

#[test]
fn raw_odd_length_sends_nothing() {
    let mut console = console(ScriptedTransport::new());
    let out = run_line(&mut console, "raw=abc");

    assert!(out.starts_with(">> Error, raw payload is not valid hex"));
    assert_eq!(console.link().write_attempts(), 0);
}

#[test]
fn raw_sends_decoded_bytes() {
    let mut console = console(ScriptedTransport::new());
    let out = run_line(&mut console, "raw=FD0901");

    assert_eq!(out, "Writing... fd:09:01\n");
    assert_eq!(console.link().writes(), &[vec![0xFD, 0x09, 0x01, b'\r', b'\n']]);
}

#[test]
fn unknown_hid_type_sends_nothing() {
    let mut console = console(ScriptedTransport::new());
    let out = run_line(&mut console, "type=bogus");

    assert!(out.starts_with(">> Error, no RN42-HID type named bogus"));
    assert!(out.contains("usecfg"));
    assert!(console.link().writes().is_empty());
}

#[test]
fn empty_type_prints_usage() {
    let mut console = console(ScriptedTransport::new());
    let out = run_line(&mut console, "type=");
    assert!(out.contains("incorrect type format, must use type=<keyboard|gamepad|"));
}

#[test]
fn set_hid_type_writes_flag() {
    let mut console = console(ScriptedTransport::with_replies(["AOK\r\n"]));
    let out = run_line(&mut console, "type=joystick");

    assert_eq!(out, ">> set_hid_type(joystick (0240)) = true\n");
    assert_eq!(console.link().writes(), &[b"SH,0240\r\n".to_vec()]);
}

#[test]
fn cmdstart_reports_success() {
    let mut console = console(ScriptedTransport::with_replies(["", "CMD\r\n"]));
    let out = run_line(&mut console, "cmdstart");

    assert_eq!(
        out,
        ">> Attempting to enter CMD mode...\n>> enter_command_mode() = true\n"
    );
    assert_eq!(console.link().writes().len(), 2);
}

#[test]
fn cmdstart_gives_up_after_three_rounds() {
    let mut console = console(ScriptedTransport::new());
    let out = run_line(&mut console, "cmdstart");

    assert_eq!(
        out,
        ">> Attempting to enter CMD mode...\n>> enter_command_mode() = false\n"
    );
    assert_eq!(console.link().writes().len(), 3);
    assert_eq!(console.link().settle_count(), 3);
}

#[test]
fn cmdexit_reports_success() {
    let mut console = console(ScriptedTransport::with_replies(["END\r\n"]));
    let out = run_line(&mut console, "cmdexit");

    assert_eq!(
        out,
        ">> Attempting to exit CMD mode...\n>> exit_command_mode() = true\n"
    );
    assert_eq!(console.link().writes(), &[b"---\r\n".to_vec()]);
}

#[test]
fn pass_through_echoes_reply() {
    let mut console = console(ScriptedTransport::with_replies(["Settings\r\nBTA=0006664A\r\n"]));
    let out = run_line(&mut console, "D");

    assert_eq!(out, ">>Settings\r\nBTA=0006664A\n");
    assert_eq!(console.link().writes(), &[b"D\r\n".to_vec()]);
    assert_eq!(console.link().settle_count(), 1);
}

#[test]
fn pass_through_without_reply_prints_nothing() {
    let mut console = console(ScriptedTransport::new());
    let out = run_line(&mut console, "SN,MyKeyboard");

    assert!(out.is_empty());
    assert_eq!(console.link().writes(), &[b"SN,MyKeyboard\r\n".to_vec()]);
}

#[test]
fn exit_closes_transport() {
    let mut console = console(ScriptedTransport::new());
    let mut out = Vec::new();

    assert_eq!(console.execute("exit", &mut out).unwrap(), Outcome::Exit);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        ">> Closing serial port and cleaning up...\n"
    );
    assert!(console.link().is_closed());
    assert!(console.link().writes().is_empty());
}

#[test]
fn write_failure_is_fatal() {
    let mut link = ScriptedTransport::new();
    link.fail_writes();
    let mut console = console(link);
    let mut out = Vec::new();

    let err = console.execute("cmdstart", &mut out).unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(err, ConsoleError::Transport(TransportError::Io(_))));
    assert_eq!(console.link().write_attempts(), 1);
}

#[test]
fn run_loop_until_exit() {
    let mut console = console(ScriptedTransport::with_replies(["CMD\r\n"]));
    let input = Cursor::new("cmdstart\r\nraw=zz\nexit\naction=mouse(1,2,3,4)\n");
    let mut out = Vec::new();

    console.run(input, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.starts_with(
        ">> >> Attempting to enter CMD mode...\n>> enter_command_mode() = true\n>> >> Error, "
    ));
    assert!(out.ends_with(">> >> Closing serial port and cleaning up...\n"));
    assert!(!out.contains("Writing..."));
    assert!(console.link().is_closed());
    assert_eq!(console.link().writes(), &[b"$$$".to_vec()]);
}

#[test]
fn run_loop_survives_non_utf8_line() {
    let mut console = console(ScriptedTransport::new());
    let input = Cursor::new(&b"caf\xe9\nexit\n"[..]);
    let mut out = Vec::new();

    console.run(input, &mut out).unwrap();

    let out = String::from_utf8(out).unwrap();
    assert!(out.ends_with(">> Closing serial port and cleaning up...\n"));
    assert!(console.link().is_closed());
    assert_eq!(
        console.link().writes(),
        &["caf\u{FFFD}\r\n".as_bytes().to_vec()]
    );
}

#[test]
fn run_loop_closes_on_end_of_input() {
    let mut console = console(ScriptedTransport::new());
    let mut out = Vec::new();

    console.run(Cursor::new("raw=fd\n"), &mut out).unwrap();

    assert!(console.link().is_closed());
    assert_eq!(String::from_utf8(out).unwrap(), ">> Writing... fd\n>> ");
}

#[test]
fn run_loop_closes_on_fatal_error() {
    let mut link = ScriptedTransport::new();
    link.fail_writes();
    let mut console = console(link);
    let mut out = Vec::new();

    let err = console
        .run(Cursor::new("raw=fd\nexit\n"), &mut out)
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(console.link().is_closed());
}

#[test]
fn script_against_simulated_module() {
    let mut console = Console::new(SimulatedModule::new(), ScanPolicy::new(3, Duration::ZERO));
    let mut out = Vec::new();

    console
        .run_script(
            ["cmdstart", "type=mouse", "cmdexit", "action=mouse(0,5,5,0)"],
            &mut out,
        )
        .unwrap();

    let module = console.into_inner();
    assert_eq!(module.hid_code(), Some("0220"));
    assert_eq!(module.reports_received(), 1);
    let out = String::from_utf8(out).unwrap();
    assert_eq!(out.lines().filter(|l| l.ends_with("= true")).count(), 3);
}
