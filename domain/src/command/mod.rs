//! Command domain module
//!
//! The command tree is the in-process source of tools. Each leaf
//! [`Command`] declares its options ([`OptionSpec`]) and capability flags
//! ([`CommandMetadata`]); the direct tool loader turns those into tool
//! descriptors and executes them after [`bind_arguments`].
//!
//! Concrete commands are supplied by the embedding program. The domain only
//! defines the contract.

pub mod entities;
pub mod traits;
pub mod tree;

pub use entities::{
    BindingIssue, BoundArguments, CommandContext, CommandMetadata, CommandResponse, OptionSpec,
    ValueType, bind_arguments,
};
pub use traits::{Command, CommandError};
pub use tree::{CommandGroup, CommandTree, NAME_SEPARATOR};
