use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::generators::GeneratedFiles;

/// Outcome of writing one staged target
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
}

/// Write generated files to the given output directory.
/// Creates the directory if it does not exist. A file whose content is
/// already on disk is left alone.
pub fn write_files(output_dir: &Path, files: &GeneratedFiles) -> Result<WriteReport> {
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    let mut report = WriteReport::default();
    for (filename, contents) in &files.files {
        let path = output_dir.join(filename);
        if is_current(&path, contents)? {
            report.unchanged += 1;
            continue;
        }
        write_file(&path, contents)?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        report.written.push(path);
    }

    Ok(report)
}

/// Files that `write_files` would write, without touching the disk
pub fn changed_files(output_dir: &Path, files: &GeneratedFiles) -> Result<Vec<PathBuf>> {
    let mut changed = Vec::new();
    for (filename, contents) in &files.files {
        let path = output_dir.join(filename);
        if !is_current(&path, contents)? {
            changed.push(path);
        }
    }
    Ok(changed)
}

fn is_current(path: &Path, contents: &str) -> Result<bool> {
    match fs::read(path) {
        Ok(existing) => Ok(existing == contents.as_bytes()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(path, e)),
    }
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .map_err(|e| Error::io(path, e))?;
    writer.flush().map_err(|e| Error::io(path, e))
}

/// Path from directory `from` to `to`, with `/` separators.
///
/// Relative inputs are resolved against the working directory and `.`/`..`
/// are folded lexically, so mixed absolute and relative inputs agree.
/// Symlinks are not followed.
pub fn relative_path(from: &Path, to: &Path) -> Result<String> {
    let from = normalize(from)?;
    let to = normalize(to)?;
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    Ok(parts.join("/"))
}

/// Absolute form of `path` without `.` or `..` components
fn normalize(path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::io(path, e))?
            .join(path)
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    Ok(out)
}
