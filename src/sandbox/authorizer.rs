use super::SandboxError;

/// Command tokens rejected outright wherever they appear. Matching is
/// token-exact: a path component such as `rm-old` must not trigger it.
pub const DESTRUCTIVE_VERBS: &[&str] = &["rm", "unlink", "rmdir", "shred"];

/// A raw command string plus its whitespace-split token sequence. Lives for
/// one authorization decision and the execution it feeds; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandIntent {
    pub command: String,
    pub tokens: Vec<String>,
}

/// Decides whether a shell command may execute against the data root.
///
/// Tokens come from a plain whitespace split; shell quoting is deliberately
/// not respected, so `echo rm` is rejected even though `rm` is only an
/// argument there. The scope check is syntactic: some token must start with
/// the literal `root_prefix` string. Paths reached through indirection
/// (symlinks, expansion) can therefore pass this layer; the accepted
/// limitation is documented in DESIGN.md.
pub fn authorize_command(command: &str, root_prefix: &str) -> Result<CommandIntent, SandboxError> {
    let tokens: Vec<String> = command.split_whitespace().map(str::to_string).collect();

    for token in &tokens {
        if DESTRUCTIVE_VERBS.contains(&token.as_str()) {
            return Err(SandboxError::DestructiveOperation {
                verb: token.clone(),
            });
        }
    }

    if !tokens.iter().any(|token| token.starts_with(root_prefix)) {
        return Err(SandboxError::OutOfScope {
            root: root_prefix.to_string(),
        });
    }

    Ok(CommandIntent {
        command: command.to_string(),
        tokens,
    })
}
