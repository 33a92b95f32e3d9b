mod signer;

pub use signer::{
    generate_message, ScriptSignError, ScriptSigner, SecpSighashScriptSigner, SignError,
};
