//! Output and error-count sinks shared by every parser.
//!
//! The [`Console`] trait is the only way the engine reports anything: trace
//! lines, `ERROR:` diagnostics, and the error counter that decides the
//! exit status. The counter belongs to whoever created the console; the
//! engine only ever increments it.

/// Column width of field names in trace output
pub const FIELD_COLUMN_WIDTH: usize = 36;

/// Spaces per indentation level
pub const INDENT_WIDTH: usize = 2;

/// Sink for trace output and validation failures
pub trait Console {
    /// Print one line of output
    fn print(&mut self, line: &str);

    /// Count one validation failure
    fn increment_error_count(&mut self);

    /// Number of validation failures counted so far
    fn error_count(&self) -> u32;

    /// Current indentation level
    fn indent_level(&self) -> usize;

    /// Set the indentation level
    fn set_indent_level(&mut self, level: usize);

    /// Increase the indentation by one level
    fn indent(&mut self) {
        self.set_indent_level(self.indent_level() + 1);
    }

    /// Decrease the indentation by one level
    fn dedent(&mut self) {
        self.set_indent_level(self.indent_level().saturating_sub(1));
    }

    /// Print a diagnostic line
    fn print_diagnostic(&mut self, message: &str) {
        self.print(&format!("ERROR: {}", message));
    }

    /// Count a failure and print its diagnostic
    fn report_error(&mut self, message: &str) {
        self.increment_error_count();
        self.print_diagnostic(message);
    }

    /// Print a record label at the current indentation
    fn print_heading(&mut self, label: &str) {
        let line = format_heading(self.indent_level() * INDENT_WIDTH, label);
        self.print(&line);
    }

    /// Print a `name : value` line one level below the current indentation
    fn print_field(&mut self, name: &str, value: &str) {
        let line = format_field((self.indent_level() + 1) * INDENT_WIDTH, name, value);
        self.print(&line);
    }
}

/// Format a record heading
pub fn format_heading(indent: usize, label: &str) -> String {
    format!(
        "{:indent$}{:<width$} :",
        "",
        label,
        indent = indent,
        width = FIELD_COLUMN_WIDTH.saturating_sub(indent)
    )
}

/// Format a `name : value` line, padding the name to a fixed column
pub fn format_field(indent: usize, name: &str, value: &str) -> String {
    format!(
        "{:indent$}{:<width$} : {}",
        "",
        name,
        value,
        indent = indent,
        width = FIELD_COLUMN_WIDTH.saturating_sub(indent)
    )
}

/// Console that writes to standard output
#[derive(Debug, Default)]
pub struct StdoutConsole {
    error_count: u32,
    indent_level: usize,
}

impl StdoutConsole {
    /// Creates a console with a zero error count
    pub fn new() -> Self {
        Self::default()
    }
}

impl Console for StdoutConsole {
    fn print(&mut self, line: &str) {
        println!("{}", line);
    }

    fn increment_error_count(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    fn error_count(&self) -> u32 {
        self.error_count
    }

    fn indent_level(&self) -> usize {
        self.indent_level
    }

    fn set_indent_level(&mut self, level: usize) {
        self.indent_level = level;
    }
}

/// Console that keeps every line in memory
#[derive(Debug, Default)]
pub struct BufferConsole {
    /// Lines printed so far
    pub lines: Vec<String>,
    error_count: u32,
    indent_level: usize,
}

impl BufferConsole {
    /// Creates an empty console
    pub fn new() -> Self {
        Self::default()
    }

    /// All output joined with newlines
    pub fn output(&self) -> String {
        let mut out = self.lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// Number of lines containing `needle`
    pub fn count_lines(&self, needle: &str) -> usize {
        self.lines.iter().filter(|l| l.contains(needle)).count()
    }

    /// Lines starting with `ERROR:`
    pub fn diagnostics(&self) -> impl Iterator<Item = &str> {
        self.lines
            .iter()
            .map(String::as_str)
            .filter(|l| l.starts_with("ERROR:"))
    }
}

impl Console for BufferConsole {
    fn print(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn increment_error_count(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    fn error_count(&self) -> u32 {
        self.error_count
    }

    fn indent_level(&self) -> usize {
        self.indent_level
    }

    fn set_indent_level(&mut self, level: usize) {
        self.indent_level = level;
    }
}
