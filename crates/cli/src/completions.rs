//! `docsearch completions <shell>` — shell completion generation,
//! carried over from the teacher's `completions.rs` and generalized to
//! take any `clap::Command` rather than hand-building one.

use clap::Command;
use clap_complete::Shell;

pub fn generate(shell: Shell, mut cmd: Command) {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}
