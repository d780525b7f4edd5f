//! Resource surface and command-line toggles.
//!
//! Resources are named integer settings with a factory default. An external
//! persistence layer reads them through getters and writes them through the
//! manager, which forwards to the owning cartridge.

use crate::core::cartridge::{CartridgeError, CartridgeResult};

/// What a resource controls on its cartridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Cart plugged in and active
    Enabled,
    /// Physical freeze switch position
    Switch,
    /// Operating mode of multi-mode carts
    Mode,
}

/// Declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceSpec {
    pub name: &'static str,
    pub kind: ResourceKind,
    pub default: i32,
}

/// One command-line toggle: `name` sets `resource` to `value`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmdlineOption {
    pub name: &'static str,
    pub resource: &'static str,
    pub value: i32,
    pub description: &'static str,
}

/// Request a machine reset whenever a cartridge is attached or detached
pub const CARTRIDGE_RESET: ResourceSpec = ResourceSpec {
    name: "CartridgeReset",
    kind: ResourceKind::Enabled,
    default: 1,
};

/// Boolean resources accept only 0 and 1
pub fn bool_value(value: i32) -> CartridgeResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(CartridgeError::InvalidResourceValue),
    }
}

/// Find a resource by name (case-insensitive)
pub fn find<'a>(specs: &'a [ResourceSpec], name: &str) -> Option<&'a ResourceSpec> {
    specs.iter().find(|spec| spec.name.eq_ignore_ascii_case(name))
}

/// Turn an argument list into resource writes.
///
/// Returns the writes in order and every argument no option matched.
pub fn parse_cmdline<S: AsRef<str>>(
    args: &[S],
    options: &[CmdlineOption],
) -> (Vec<(&'static str, i32)>, Vec<String>) {
    let mut writes = Vec::new();
    let mut rest = Vec::new();

    for arg in args {
        let arg = arg.as_ref();
        match options.iter().find(|opt| opt.name == arg) {
            Some(opt) => writes.push((opt.resource, opt.value)),
            None => rest.push(arg.to_string()),
        }
    }

    (writes, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &[CmdlineOption] = &[
        CmdlineOption { name: "-foo", resource: "Foo", value: 1, description: "Enable foo" },
        CmdlineOption { name: "+foo", resource: "Foo", value: 0, description: "Disable foo" },
    ];

    #[test]
    fn test_parse_cmdline() {
        let (writes, rest) = parse_cmdline(&["-foo", "game.prg", "+foo"], OPTIONS);
        assert_eq!(writes, vec![("Foo", 1), ("Foo", 0)]);
        assert_eq!(rest, vec!["game.prg".to_string()]);
    }

    #[test]
    fn test_bool_value() {
        assert_eq!(bool_value(0), Ok(false));
        assert_eq!(bool_value(1), Ok(true));
        assert_eq!(bool_value(2), Err(CartridgeError::InvalidResourceValue));
    }

    #[test]
    fn test_find_ignores_case() {
        let specs = [CARTRIDGE_RESET];
        assert!(find(&specs, "cartridgereset").is_some());
        assert!(find(&specs, "Missing").is_none());
    }
}
