use std::path::{Path, PathBuf};

pub const PROGRAMS_FILE_NAME: &str = "programs.json";

#[must_use]
pub fn programs_file(data_dir: &Path) -> PathBuf {
    data_dir.join(PROGRAMS_FILE_NAME)
}
