use std::fs::read_dir;
use std::io;
use std::path::{Path, PathBuf};

/// Walks `dir` depth-first and maps every regular file found below it.
///
/// The result is sorted by path so listings are stable across platforms.
pub fn list_files<T, F>(dir: &Path, map_fn: F) -> io::Result<Vec<T>>
where
    F: Fn(&Path) -> T,
{
    let mut files: Vec<PathBuf> = Vec::new();
    let mut stack: Vec<PathBuf> = Vec::new();

    if dir.is_dir() {
        stack.push(dir.to_path_buf());
    }

    while let Some(c_dir) = stack.pop() {
        for e in read_dir(&c_dir)? {
            let e = e?.path();
            if e.is_file() {
                files.push(e);
            } else if e.is_dir() {
                stack.push(e);
            }
        }
    }

    files.sort();
    Ok(files.iter().map(|p| map_fn(p)).collect())
}
