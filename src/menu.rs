use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::batch::{BatchState, Organizer};

/// Interactive numbered menu: one file, a directory, or exit.
pub struct Menu<R, W> {
    organizer: Organizer,
    default_output: String,
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(organizer: Organizer, default_output: &str, input: R, out: W) -> Self {
        Self {
            organizer,
            default_output: default_output.to_string(),
            input,
            out,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        info!("=== PAYMENT GATEWAY ORGANIZER ===");
        info!("Scans JSON page dumps and extracts payment gateway settings");

        loop {
            self.show_menu()?;
            let Some(choice) = self.prompt("\nEnter your choice (1-3): ")? else {
                break;
            };

            match choice.as_str() {
                "1" => self.process_single_file()?,
                "2" => self.process_directory()?,
                "3" => {
                    info!("Exiting...");
                    break;
                }
                _ => warn!("Invalid option: {:?}", choice),
            }

            writeln!(self.out, "\n{}\n", "-".repeat(50))?;
        }
        Ok(())
    }

    fn show_menu(&mut self) -> Result<()> {
        writeln!(self.out, "\nChoose an option:")?;
        writeln!(self.out, "1. Process a single JSON file")?;
        writeln!(self.out, "2. Process every JSON file in a folder")?;
        writeln!(self.out, "3. Exit")?;
        Ok(())
    }

    /// Prints `label` and reads one trimmed line; `None` on end of input.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn process_single_file(&mut self) -> Result<()> {
        let path = self.prompt("Path to the JSON file: ")?.unwrap_or_default();
        if self.organizer.run_single(Path::new(&path)) {
            self.report_if_results()?;
        }
        self.organizer.clear();
        Ok(())
    }

    fn process_directory(&mut self) -> Result<()> {
        let path = self.prompt("Path to the folder with JSON files: ")?.unwrap_or_default();
        if self.organizer.run_directory(Path::new(&path)) {
            self.report_if_results()?;
        }
        self.organizer.clear();
        Ok(())
    }

    fn report_if_results(&mut self) -> Result<()> {
        if self.organizer.state() == BatchState::Idle {
            warn!("No gateways found!");
            return Ok(());
        }
        let label = format!("Excel file name (Enter for '{}'): ", self.default_output);
        let name = self
            .prompt(&label)?
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.default_output.clone());
        self.organizer.generate_report(&PathBuf::from(name));
        Ok(())
    }

    #[cfg(test)]
    fn state(&self) -> BatchState {
        self.organizer.state()
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.out
    }
}
