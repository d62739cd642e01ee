//! Console command grammar
//!
//! One input line maps to one `ConsoleCommand`. Forms are tried in priority
//! order: the bare keywords, then the `key=value` forms, and anything left
//! over passes straight through to the module.

use std::sync::OnceLock;

use regex::Regex;
use rn42_transport::{DeviceClass, HidType};

use crate::error::ConsoleError;

/// Enter command mode
pub const CMD_START: &str = "cmdstart";
/// Leave command mode
pub const CMD_EXIT: &str = "cmdexit";
/// Close the port and quit
pub const QUIT: &str = "exit";

pub const TYPE_PREFIX: &str = "type";
pub const RAW_PREFIX: &str = "raw";
pub const ACTION_PREFIX: &str = "action";

/// A parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    EnterCommandMode,
    ExitCommandMode,
    Quit,
    /// `type=<name>`
    SetHidType(HidType),
    /// `raw=<hex>`, already decoded
    Raw(Vec<u8>),
    /// `action=<name>(<fields>)`; fields are encoded at execution time
    Action {
        class: &'static DeviceClass,
        fields: String,
    },
    /// Anything else, sent as typed
    PassThrough(String),
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([^()]*?)\s*\((.*)\)\s*$").expect("valid action regex"))
}

/// Split `name(a,b,c)` into `("name", "a,b,c")`
pub fn split_action(text: &str) -> Option<(&str, &str)> {
    let caps = action_regex().captures(text)?;
    let name = caps.get(1)?.as_str();
    let fields = caps.get(2)?.as_str();
    if name.is_empty() {
        return None;
    }
    Some((name, fields))
}

impl ConsoleCommand {
    /// Parse one console line (without its line terminator).
    pub fn parse(line: &str) -> Result<Self, ConsoleError> {
        let trimmed = line.trim();
        match trimmed {
            CMD_START => return Ok(Self::EnterCommandMode),
            CMD_EXIT => return Ok(Self::ExitCommandMode),
            QUIT => return Ok(Self::Quit),
            _ => {}
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            return Ok(Self::PassThrough(line.to_string()));
        };

        match key {
            TYPE_PREFIX => parse_hid_type(value),
            RAW_PREFIX => parse_raw(value),
            ACTION_PREFIX => parse_action(value),
            _ => Ok(Self::PassThrough(line.to_string())),
        }
    }
}

fn parse_hid_type(value: &str) -> Result<ConsoleCommand, ConsoleError> {
    if value.is_empty() {
        return Err(ConsoleError::MissingValue {
            form: TYPE_PREFIX,
            usage: format!("<{}>", HidType::ALL.map(HidType::name).join("|")),
        });
    }
    HidType::from_name(value)
        .map(ConsoleCommand::SetHidType)
        .ok_or_else(|| ConsoleError::UnknownHidType {
            name: value.to_string(),
            valid: HidType::valid_names(),
        })
}

fn parse_raw(value: &str) -> Result<ConsoleCommand, ConsoleError> {
    if value.is_empty() {
        return Err(ConsoleError::MissingValue {
            form: RAW_PREFIX,
            usage: "<hex bytes>".into(),
        });
    }
    Ok(ConsoleCommand::Raw(hex::decode(value)?))
}

fn parse_action(value: &str) -> Result<ConsoleCommand, ConsoleError> {
    if value.is_empty() {
        return Err(ConsoleError::MissingValue {
            form: ACTION_PREFIX,
            usage: format!("<{}>(<values>)", DeviceClass::valid_names().replace(", ", "|")),
        });
    }
    let (name, fields) =
        split_action(value).ok_or_else(|| ConsoleError::MalformedAction(value.to_string()))?;
    let class = DeviceClass::from_name(name).ok_or_else(|| ConsoleError::UnknownDeviceClass {
        name: name.to_string(),
        valid: DeviceClass::valid_names(),
    })?;
    Ok(ConsoleCommand::Action {
        class,
        fields: fields.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(
            ConsoleCommand::parse("cmdstart").unwrap(),
            ConsoleCommand::EnterCommandMode
        );
        assert_eq!(
            ConsoleCommand::parse("cmdexit").unwrap(),
            ConsoleCommand::ExitCommandMode
        );
        assert_eq!(ConsoleCommand::parse(" exit ").unwrap(), ConsoleCommand::Quit);
    }

    #[test]
    fn test_hid_type() {
        assert_eq!(
            ConsoleCommand::parse("type=joystick").unwrap(),
            ConsoleCommand::SetHidType(HidType::Joystick)
        );
        let err = ConsoleCommand::parse("type=bogus").unwrap_err();
        assert!(matches!(err, ConsoleError::UnknownHidType { ref name, .. } if name == "bogus"));
        assert!(err.to_string().contains("digitizer"));
        assert!(matches!(
            ConsoleCommand::parse("type=").unwrap_err(),
            ConsoleError::MissingValue { form: "type", .. }
        ));
    }

    #[test]
    fn test_raw() {
        assert_eq!(
            ConsoleCommand::parse("raw=fd0902").unwrap(),
            ConsoleCommand::Raw(vec![0xFD, 0x09, 0x02])
        );
        assert!(matches!(
            ConsoleCommand::parse("raw=abc").unwrap_err(),
            ConsoleError::InvalidHex(hex::FromHexError::OddLength)
        ));
        assert!(matches!(
            ConsoleCommand::parse("raw=zz").unwrap_err(),
            ConsoleError::InvalidHex(hex::FromHexError::InvalidHexCharacter { .. })
        ));
    }

    #[test]
    fn test_action() {
        match ConsoleCommand::parse("action=mouse(1,2,3,4)").unwrap() {
            ConsoleCommand::Action { class, fields } => {
                assert_eq!(class.name, "mouse");
                assert_eq!(fields, "1,2,3,4");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_action_shape_errors() {
        assert!(matches!(
            ConsoleCommand::parse("action=mouse 1,2,3,4").unwrap_err(),
            ConsoleError::MalformedAction(_)
        ));
        assert!(matches!(
            ConsoleCommand::parse("action=(1,2)").unwrap_err(),
            ConsoleError::MalformedAction(_)
        ));
        assert!(matches!(
            ConsoleCommand::parse("action=trackball(1)").unwrap_err(),
            ConsoleError::UnknownDeviceClass { .. }
        ));
    }

    #[test]
    fn test_split_action() {
        assert_eq!(split_action("keyboard(0,4)"), Some(("keyboard", "0,4")));
        assert_eq!(split_action(" gamepad ( 1,2 ) "), Some(("gamepad", " 1,2 ")));
        assert_eq!(split_action("mouse()"), Some(("mouse", "")));
        assert_eq!(split_action("mouse(1,2"), None);
    }

    #[test]
    fn test_pass_through() {
        assert_eq!(
            ConsoleCommand::parse("D").unwrap(),
            ConsoleCommand::PassThrough("D".into())
        );
        assert_eq!(
            ConsoleCommand::parse("SN,keyboard=1").unwrap(),
            ConsoleCommand::PassThrough("SN,keyboard=1".into())
        );
        assert_eq!(
            ConsoleCommand::parse("").unwrap(),
            ConsoleCommand::PassThrough(String::new())
        );
    }
}
