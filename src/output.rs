/// Destination for everything a running program prints.
///
/// The interpreter never writes to a process‑global stream directly; hosts
/// pick the sink (stdout for the CLI, an in‑memory buffer for tests).
pub trait Output {
    fn write_line(&mut self, line: &str);
}

/// Writes each line to the process's standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct Stdout;

impl Output for Stdout {
    fn write_line(&mut self, line: &str) {
        println!("{}", line);
    }
}
