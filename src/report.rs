/// Diagnostic surface for everything shown to the operator outside of
/// prompts. The workflow never prints directly, so it can run headless
/// under test.
pub trait Reporter {
    fn info(&self, title: &str, message: &str);
    fn warning(&self, title: &str, message: &str);
    fn error(&self, title: &str, message: &str);
}

/// Plain terminal renderer: framed blocks on stdout for info, stderr for
/// warnings and errors, mirrored as tracing events.
pub struct ConsoleReporter;

impl ConsoleReporter {
    fn framed(title: &str, message: &str) -> String {
        let mut out = format!("== {} ==\n", title);
        for line in message.lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

impl Reporter for ConsoleReporter {
    fn info(&self, title: &str, message: &str) {
        tracing::info!(title = title, "{}", message);
        print!("{}", Self::framed(title, message));
    }

    fn warning(&self, title: &str, message: &str) {
        tracing::warn!(title = title, "{}", message);
        eprint!("{}", Self::framed(title, message));
    }

    fn error(&self, title: &str, message: &str) {
        tracing::error!(title = title, "{}", message);
        eprint!("{}", Self::framed(title, message));
    }
}
