use crate::{Role, Target, Turn};

/// Default target for tests (`mobile:0`).
pub fn target() -> Target {
    Target::new("mobile", 0)
}

/// Multi-line user turn.
pub fn user(lines: &[&str]) -> Turn {
    turn(Role::User, lines)
}

/// Multi-line assistant turn.
pub fn assistant(lines: &[&str]) -> Turn {
    turn(Role::Assistant, lines)
}

fn turn(role: Role, lines: &[&str]) -> Turn {
    Turn {
        role,
        lines: lines.iter().map(|l| l.to_string()).collect(),
    }
}

/// Assemble a pane capture from lines, newline-joined with a trailing newline
/// the way `capture-pane -p` prints it.
pub fn screen(lines: &[&str]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}
