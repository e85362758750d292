//! Console command tree and resolver.
//!
//! The tree has a fixed root command (`ec`) whose children are produced on demand,
//! one per registered device, from the [`DeviceRegistry`]. Every device child shares
//! the same static subtree of actions:
//!
//! ```text
//! ec <device> calibration start
//! ec <device> calibration save      (settings capability)
//! ec <device> calibration load      (settings capability)
//! ec <device> scan_rate             (scan-rate capability)
//! ```
//!
//! While walking a command line the resolver remembers the token consumed by the
//! dynamic device level and hands it to the handler through an [`Invocation`].

pub mod handlers;

use std::fmt;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::calibration::SinkOptions;
use crate::console::Console;
use crate::constants::{
    errno, HELP_CALIBRATION, HELP_CALIBRATION_LOAD, HELP_CALIBRATION_SAVE, HELP_CALIBRATION_START,
    HELP_DEVICE, HELP_ROOT, HELP_SCAN_RATE, ROOT_COMMAND,
};
use crate::device::{DeviceEntry, DeviceRegistry};

/// Command handler: returns 0 on success, non-zero on failure.
pub type Handler = fn(&mut dyn Console, &Invocation<'_>) -> i32;

/// Index-to-entry lookup backing a dynamic subcommand set.
pub type DynamicLookup = Rc<dyn Fn(&DeviceRegistry, usize) -> Option<CommandEntry>>;

/// Optional command surfaces, decided once when the tree is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// `calibration save` and `calibration load`
    pub settings: bool,
    /// `scan_rate`
    pub scan_rate: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            settings: true,
            scan_rate: true,
        }
    }
}

/// Behaviour shared by every command of a shell session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellOptions {
    /// Optional command surfaces mounted in the tree
    pub capabilities: Capabilities,
    /// Rendering of calibration progress
    pub sink: SinkOptions,
    /// Return to the idle prompt when calibration is rejected mid-run
    pub restore_prompt_on_failure: bool,
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            sink: SinkOptions::default(),
            restore_prompt_on_failure: true,
        }
    }
}

/// One node of the command tree.
#[derive(Clone)]
pub struct CommandEntry {
    /// Token that selects this command
    pub syntax: String,
    /// One-line help text
    pub help: &'static str,
    /// Handler run when the command is the last token
    pub handler: Option<Handler>,
    /// Child commands, if any
    pub subcommands: Option<SubcommandSet>,
}

impl CommandEntry {
    /// Command that runs a handler.
    #[must_use]
    pub fn leaf(syntax: impl Into<String>, help: &'static str, handler: Handler) -> Self {
        Self {
            syntax: syntax.into(),
            help,
            handler: Some(handler),
            subcommands: None,
        }
    }

    /// Command that only selects one of its subcommands.
    #[must_use]
    pub fn group(syntax: impl Into<String>, help: &'static str, subcommands: SubcommandSet) -> Self {
        Self {
            syntax: syntax.into(),
            help,
            handler: None,
            subcommands: Some(subcommands),
        }
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("syntax", &self.syntax)
            .field("help", &self.help)
            .field("handler", &self.handler.is_some())
            .field("subcommands", &self.subcommands)
            .finish()
    }
}

/// Children of a command node.
#[derive(Clone)]
pub enum SubcommandSet {
    /// Fixed at build time
    Static(Rc<[CommandEntry]>),
    /// Materialized by index until the lookup reports no entry
    Dynamic(DynamicLookup),
}

impl SubcommandSet {
    /// Entry at `index`, or `None` past the end of the set.
    #[must_use]
    pub fn get(&self, registry: &DeviceRegistry, index: usize) -> Option<CommandEntry> {
        match self {
            Self::Static(entries) => entries.get(index).cloned(),
            Self::Dynamic(lookup) => lookup(registry, index),
        }
    }

    /// All entries in order.
    #[must_use]
    pub fn entries(&self, registry: &DeviceRegistry) -> Vec<CommandEntry> {
        (0..)
            .map_while(|index| self.get(registry, index))
            .collect()
    }

    /// Entry whose syntax equals `token`.
    #[must_use]
    pub fn find(&self, registry: &DeviceRegistry, token: &str) -> Option<CommandEntry> {
        (0..)
            .map_while(|index| self.get(registry, index))
            .find(|entry| entry.syntax == token)
    }

    /// True for a set materialized from the registry.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl fmt::Debug for SubcommandSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(entries) => f.debug_list().entries(entries.iter()).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// Builds the command tree for the given capabilities.
///
/// Returns the set of root commands.
#[must_use]
pub fn build_command_tree(capabilities: Capabilities) -> SubcommandSet {
    let mut calibration = vec![CommandEntry::leaf(
        "start",
        HELP_CALIBRATION_START,
        handlers::calibration_start,
    )];
    if capabilities.settings {
        calibration.push(CommandEntry::leaf(
            "save",
            HELP_CALIBRATION_SAVE,
            handlers::calibration_save,
        ));
        calibration.push(CommandEntry::leaf(
            "load",
            HELP_CALIBRATION_LOAD,
            handlers::calibration_load,
        ));
    }

    let mut device_commands = vec![CommandEntry::group(
        "calibration",
        HELP_CALIBRATION,
        SubcommandSet::Static(calibration.into()),
    )];
    if capabilities.scan_rate {
        device_commands.push(CommandEntry::leaf(
            "scan_rate",
            HELP_SCAN_RATE,
            handlers::scan_rate,
        ));
    }

    let device_subtree = SubcommandSet::Static(device_commands.into());
    let devices = SubcommandSet::Dynamic(Rc::new(move |registry: &DeviceRegistry, index| {
        registry
            .entry_at(index)
            .map(|entry| CommandEntry::group(entry.name(), HELP_DEVICE, device_subtree.clone()))
    }));

    SubcommandSet::Static(vec![CommandEntry::group(ROOT_COMMAND, HELP_ROOT, devices)].into())
}

/// Context handed to a handler.
#[derive(Debug)]
pub struct Invocation<'a> {
    registry: &'a DeviceRegistry,
    options: &'a ShellOptions,
    path: &'a [&'a str],
    device: Option<&'a str>,
}

impl<'a> Invocation<'a> {
    /// Options the shell was built with.
    #[must_use]
    pub fn options(&self) -> &'a ShellOptions {
        self.options
    }

    /// Device selected by an ancestor command.
    ///
    /// # Panics
    ///
    /// Panics when the handler is not mounted below the device level or the name is
    /// not registered. Both mean the command tree and the registry disagree.
    #[must_use]
    pub fn device(&self) -> &'a DeviceEntry {
        match self.device {
            Some(name) => self.registry.lookup_by_name(name),
            None => panic!("command '{}' has no device ancestor", self.path.join(" ")),
        }
    }
}

/// Resolver failures, reported before any handler runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShellError {
    /// The first token names no root command
    #[error("{0}: command not found")]
    CommandNotFound(String),
    /// A token names no child of the matched command
    #[error("{command}: unknown parameter: {token}")]
    UnknownParameter {
        /// Tokens matched so far
        command: String,
        /// First unmatched token
        token: String,
    },
    /// The line ended on a command without a handler
    #[error("{0}: missing subcommand")]
    MissingSubcommand(String),
    /// Extra tokens after a leaf command
    #[error("{0}: wrong parameter count")]
    WrongParameterCount(String),
}

impl ShellError {
    /// Status returned to the caller for this failure.
    #[must_use]
    pub const fn status(&self) -> i32 {
        match self {
            Self::CommandNotFound(_) => -errno::ENOEXEC,
            _ => -errno::EINVAL,
        }
    }
}

/// Outcome of walking a command line through the tree.
enum Resolution<'t> {
    Empty,
    Help(Option<CommandEntry>),
    Run {
        entry: CommandEntry,
        handler: Handler,
        path: &'t [&'t str],
        device: Option<&'t str>,
    },
}

/// A console session bound to a device registry.
pub struct Shell {
    registry: DeviceRegistry,
    root: SubcommandSet,
    options: ShellOptions,
}

impl Shell {
    /// Builds the command tree once for the session.
    #[must_use]
    pub fn new(registry: DeviceRegistry, options: ShellOptions) -> Self {
        let root = build_command_tree(options.capabilities);
        Self {
            registry,
            root,
            options,
        }
    }

    /// Devices the command tree was built from.
    #[must_use]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Options handed to every handler.
    #[must_use]
    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    /// Root command set.
    #[must_use]
    pub fn root(&self) -> &SubcommandSet {
        &self.root
    }

    /// Runs one tokenized command line and returns its status.
    pub fn execute(&self, console: &mut dyn Console, tokens: &[&str]) -> i32 {
        match self.resolve(tokens) {
            Ok(Resolution::Empty) => 0,
            Ok(Resolution::Help(entry)) => {
                self.print_help(console, entry.as_ref());
                0
            }
            Ok(Resolution::Run {
                entry,
                handler,
                path,
                device,
            }) => {
                debug!(command = %path.join(" "), device, "dispatching {}", entry.syntax);
                let invocation = Invocation {
                    registry: &self.registry,
                    options: &self.options,
                    path,
                    device,
                };
                handler(console, &invocation)
            }
            Err(err) => {
                if let ShellError::MissingSubcommand(_) = err {
                    let entry = self.deepest_match(tokens);
                    self.print_help(console, entry.as_ref());
                }
                console.error(&err.to_string());
                err.status()
            }
        }
    }

    /// Prints the children of `entry`, or the root commands when `entry` is `None`.
    pub fn print_help(&self, console: &mut dyn Console, entry: Option<&CommandEntry>) {
        let children = match entry {
            Some(entry) => {
                console.print(&format!("{} - {}", entry.syntax, entry.help));
                match &entry.subcommands {
                    Some(set) => set.entries(&self.registry),
                    None => return,
                }
            }
            None => {
                console.print("Available commands:");
                self.root.entries(&self.registry)
            }
        };

        if children.is_empty() {
            return;
        }
        if entry.is_some() {
            console.print("Subcommands:");
        }
        let width = children.iter().map(|c| c.syntax.len()).max().unwrap_or(0);
        for child in &children {
            console.print(&format!("  {:<width$} : {}", child.syntax, child.help));
        }
    }

    fn resolve<'t>(&self, tokens: &'t [&'t str]) -> Result<Resolution<'t>, ShellError> {
        let mut current: Option<CommandEntry> = None;
        let mut device = None;
        let mut consumed = 0;

        while let Some(&token) = tokens.get(consumed) {
            if is_help_flag(token) {
                return Ok(Resolution::Help(current));
            }

            let children = match &current {
                None => self.root.clone(),
                Some(entry) => match &entry.subcommands {
                    Some(set) => set.clone(),
                    None => {
                        return Err(ShellError::WrongParameterCount(
                            tokens[..consumed].join(" "),
                        ))
                    }
                },
            };

            match children.find(&self.registry, token) {
                Some(child) => {
                    if children.is_dynamic() {
                        device = Some(token);
                    }
                    current = Some(child);
                    consumed += 1;
                }
                None if current.is_none() => {
                    return Err(ShellError::CommandNotFound(token.to_string()))
                }
                None => {
                    return Err(ShellError::UnknownParameter {
                        command: tokens[..consumed].join(" "),
                        token: token.to_string(),
                    })
                }
            }
        }

        let Some(entry) = current else {
            return Ok(Resolution::Empty);
        };

        match entry.handler {
            Some(handler) => Ok(Resolution::Run {
                entry,
                handler,
                path: &tokens[..consumed],
                device,
            }),
            None => Err(ShellError::MissingSubcommand(tokens[..consumed].join(" "))),
        }
    }

    // Deepest node matched by a prefix of `tokens`.
    fn deepest_match(&self, tokens: &[&str]) -> Option<CommandEntry> {
        let mut current: Option<CommandEntry> = None;
        for &token in tokens {
            let children = match &current {
                None => self.root.clone(),
                Some(entry) => match &entry.subcommands {
                    Some(set) => set.clone(),
                    None => break,
                },
            };
            match children.find(&self.registry, token) {
                Some(child) => current = Some(child),
                None => break,
            }
        }
        current
    }
}

fn is_help_flag(token: &str) -> bool {
    token == "-h" || token == "--help"
}
