use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::error::ProcessError;
use crate::gateway::GatewayRecord;
use crate::processor::FileProcessor;
use crate::report::ReportWriter;
use crate::settings::Settings;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    Idle,
    HasResults,
}

/// Drives processing over files and owns the aggregated records.
pub struct Organizer {
    processor: FileProcessor,
    writer: ReportWriter,
    results: Vec<GatewayRecord>,
}

impl Organizer {
    pub fn new(settings: &Settings) -> Self {
        Self {
            processor: FileProcessor::new(settings),
            writer: ReportWriter::new(settings.max_column_width),
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[GatewayRecord] {
        &self.results
    }

    pub fn state(&self) -> BatchState {
        if self.results.is_empty() {
            BatchState::Idle
        } else {
            BatchState::HasResults
        }
    }

    pub fn clear(&mut self) {
        self.results.clear();
        info!("Results cleared");
    }

    pub fn run_single(&mut self, path: &Path) -> bool {
        if !path.exists() {
            error!("File not found: {}", path.display());
            return false;
        }
        let outcome = self.processor.process_file(path);
        self.absorb(path, outcome)
    }

    pub fn run_directory(&mut self, dir: &Path) -> bool {
        if !dir.is_dir() {
            error!("Directory not found: {}", dir.display());
            return false;
        }

        let files = list_json_files(dir);
        if files.is_empty() {
            warn!("No JSON files found in {}", dir.display());
            return false;
        }
        info!("Found {} JSON files", files.len());

        let pb = ProgressBar::new(files.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        let outcomes = self.process_all(&files, &pb);
        pb.finish_and_clear();

        let mut processed = 0usize;
        for (path, outcome) in files.iter().zip(outcomes) {
            if self.absorb(path, outcome) {
                processed += 1;
            }
        }

        info!("Processed: {}/{} files", processed, files.len());
        processed > 0
    }

    #[cfg(feature = "rayon")]
    fn process_all(
        &self,
        files: &[PathBuf],
        pb: &ProgressBar,
    ) -> Vec<Result<Vec<GatewayRecord>, ProcessError>> {
        // collect() keeps input order, so the aggregate matches a sequential run
        files
            .par_iter()
            .map(|p| {
                let out = self.processor.process_file(p);
                pb.inc(1);
                out
            })
            .collect()
    }

    #[cfg(not(feature = "rayon"))]
    fn process_all(
        &self,
        files: &[PathBuf],
        pb: &ProgressBar,
    ) -> Vec<Result<Vec<GatewayRecord>, ProcessError>> {
        files
            .iter()
            .map(|p| {
                let out = self.processor.process_file(p);
                pb.inc(1);
                out
            })
            .collect()
    }

    /// Fold one file's outcome into the aggregate. Only unreadable files
    /// count as failures; bad content is logged and yields nothing.
    fn absorb(&mut self, path: &Path, outcome: Result<Vec<GatewayRecord>, ProcessError>) -> bool {
        match outcome {
            Ok(records) => {
                self.results.extend(records);
                true
            }
            Err(e) if e.is_io() => {
                error!("Error processing {}: {}", path.display(), e);
                false
            }
            Err(e) => {
                error!("Error processing {}: {}", path.display(), e);
                true
            }
        }
    }

    /// One non-interactive round: run, then report if anything was found.
    /// Only a failed report write is an error.
    pub fn run_and_report(
        &mut self,
        output: &Path,
        run: impl FnOnce(&mut Organizer) -> bool,
    ) -> Result<()> {
        if !run(self) {
            return Ok(());
        }
        if self.state() == BatchState::Idle {
            warn!("No gateways found!");
            return Ok(());
        }
        if !self.generate_report(output) {
            bail!("could not write {}", output.display());
        }
        info!("{} gateways exported", self.results.len());
        Ok(())
    }

    pub fn generate_report(&self, output: &Path) -> bool {
        if self.state() == BatchState::Idle {
            warn!("No results to write a report for");
            return false;
        }
        match self.writer.write(&self.results, output) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to write {}: {}", output.display(), e);
                false
            }
        }
    }
}

/// Regular `*.json` files directly inside `dir`, sorted by path.
fn list_json_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                warn!("{}: {}", dir.display(), e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"))
        })
        .collect();
    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn organizer() -> Organizer {
        Organizer::new(&Settings::default())
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new("tests/fixtures").join(name)
    }

    fn copy_fixtures(dir: &Path, names: &[&str]) {
        for name in names {
            fs::copy(fixture(name), dir.join(name)).unwrap();
        }
    }

    #[test]
    fn single_file_accumulates_and_clears() {
        let mut org = organizer();
        assert_eq!(org.state(), BatchState::Idle);
        assert!(org.run_single(&fixture("shop.json")));
        assert_eq!(org.state(), BatchState::HasResults);
        assert_eq!(org.results().len(), 1);

        assert!(org.run_single(&fixture("marketplace.json")));
        assert_eq!(org.results().len(), 4);

        org.clear();
        assert_eq!(org.state(), BatchState::Idle);
        assert!(org.results().is_empty());
    }

    #[test]
    fn missing_file_fails() {
        let mut org = organizer();
        assert!(!org.run_single(&fixture("nope.json")));
        assert_eq!(org.state(), BatchState::Idle);
    }

    #[test]
    fn malformed_file_counts_as_processed_with_no_records() {
        let mut org = organizer();
        assert!(org.run_single(&fixture("broken.json")));
        assert_eq!(org.state(), BatchState::Idle);
    }

    #[test]
    fn directory_path_as_single_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let mut org = organizer();
        assert!(!org.run_single(dir.path()));
    }

    #[test]
    fn rerun_after_clear_is_identical() {
        let mut org = organizer();
        org.run_single(&fixture("marketplace.json"));
        let first = org.results().to_vec();
        org.clear();
        org.run_single(&fixture("marketplace.json"));
        assert_eq!(org.results(), first.as_slice());
    }

    #[test]
    fn directory_run_keeps_file_then_table_order() {
        let dir = tempfile::tempdir().unwrap();
        copy_fixtures(dir.path(), &["shop.json", "marketplace.json", "broken.json", "users_only.json"]);
        fs::write(dir.path().join("notes.txt"), "pay attention").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        let mut org = organizer();
        assert!(org.run_directory(dir.path()));
        let seen: Vec<(&str, &str)> = org
            .results()
            .iter()
            .map(|r| (r.source_id.as_str(), r.name.as_str()))
            .collect();
        // broken.json < marketplace.json < shop.json < users_only.json
        assert_eq!(
            seen,
            vec![
                ("https://market.example", "MercadoPago_Config"),
                ("https://market.example", "wp_pix_settings"),
                ("https://market.example", "Stripe"),
                ("shop.example", "payment_gateway"),
            ]
        );
    }

    #[test]
    fn directory_without_json_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("readme.md"), "# none").unwrap();
        let mut org = organizer();
        assert!(!org.run_directory(dir.path()));
        assert!(!org.generate_report(&dir.path().join("out.xlsx")));
        assert!(!dir.path().join("out.xlsx").exists());
    }

    #[test]
    fn missing_directory_fails() {
        let mut org = organizer();
        assert!(!org.run_directory(Path::new("tests/fixtures/no_such_dir")));
    }

    #[test]
    fn uppercase_extension_is_eligible() {
        let dir = tempfile::tempdir().unwrap();
        fs::copy(fixture("shop.json"), dir.path().join("SHOP.JSON")).unwrap();
        assert_eq!(list_json_files(dir.path()).len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::copy(fixture("shop.json"), locked.join("shop.json")).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // root ignores the mode bits, so only check when the lock holds
        let denied = fs::read_dir(&locked).is_err();
        let listed = list_json_files(&locked);
        let mut org = organizer();
        let ok = org.run_directory(&locked);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        if denied {
            assert!(listed.is_empty());
            assert!(!ok);
            assert_eq!(org.state(), BatchState::Idle);
        }
    }

    #[test]
    fn run_and_report_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.xlsx");
        let mut org = organizer();
        org.run_and_report(&out, |o| o.run_single(&fixture("nope.json")))
            .unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn run_and_report_without_gateways_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.xlsx");
        let mut org = organizer();
        org.run_and_report(&out, |o| o.run_single(&fixture("users_only.json")))
            .unwrap();
        assert!(!out.exists());
    }

    #[test]
    fn run_and_report_writes_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.xlsx");
        let mut org = organizer();
        org.run_and_report(&out, |o| o.run_single(&fixture("shop.json")))
            .unwrap();
        assert!(out.exists());
    }

    #[test]
    fn run_and_report_fails_on_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing").join("out.xlsx");
        let mut org = organizer();
        assert!(org
            .run_and_report(&out, |o| o.run_single(&fixture("shop.json")))
            .is_err());
    }

    #[test]
    fn report_written_when_results_exist() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gateways.xlsx");
        let mut org = organizer();
        org.run_single(&fixture("shop.json"));
        assert!(org.generate_report(&out));
        assert!(out.exists());
    }
}
