//! Console output for headertest
//!
//! Styled status lines for the result summary and command feedback.

use console::style;

/// Output handler for consistent CLI formatting
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    /// Create a new output handler
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Print a verbose message (only if verbose mode is enabled)
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Print a header/title
    pub fn header(&self, title: &str) {
        if !self.quiet {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// One line per header in the result summary
    pub fn header_result(&self, header: &str, error: Option<&str>) {
        match error {
            None => {
                if !self.quiet {
                    println!(
                        "{} {}: {}",
                        style("✔").green().bold(),
                        style(header).bold(),
                        style("compiled successfully").green()
                    );
                }
            }
            // Failures are always shown, diagnostics included
            Some(message) => println!(
                "{} {}: {}",
                style("✖").red().bold(),
                style(header).bold(),
                message
            ),
        }
    }

    /// Final pass/fail tally
    pub fn summary(&self, passed: usize, failed: usize) {
        let line = format!("Summary: {passed} successful, {failed} failed");
        if failed > 0 {
            println!("\n{}", style(line).red().bold());
        } else if !self.quiet {
            println!("\n{}", style(line).green().bold());
        }
    }

    /// Print a key-value pair with consistent styling
    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let styled_value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {:<22} {}", style(key).dim(), styled_value);
        }
    }

    /// Print a status indicator with consistent styling
    pub fn status_indicator(&self, status: &str, message: &str, is_success: bool) {
        if !self.quiet {
            let (icon, color) = if is_success {
                ("✓", style(status).green())
            } else {
                ("✗", style(status).red())
            };
            println!("{} {} {}", style(icon).bold(), color.bold(), message);
        }
    }
}
