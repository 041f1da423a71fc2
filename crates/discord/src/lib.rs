pub mod commands;
pub mod context;
pub mod types;
pub mod verify;

pub use commands::{all_commands, CommandSchema};
pub use context::{
    build_modal_prompt, build_prompt_with_context, extract_referenced_message,
    extract_target_message, ReferencedMessage,
};
pub use types::*;
pub use verify::{Ed25519Verifier, SignatureVerifier, VerifyKeyError};
