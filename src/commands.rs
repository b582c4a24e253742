use std::io::{self, Read, Seek, SeekFrom, Write};
use std::time::UNIX_EPOCH;

use anyhow::Context;
use tracing::{debug, span, Level};

use crate::object_store::ObjectStore;

pub fn list<S: ObjectStore>(store: &S, out: &mut impl Write) -> anyhow::Result<()> {
    for key in store.list().context("Could not list objects")? {
        writeln!(out, "{key}")?;
    }
    Ok(())
}

pub fn stat<S: ObjectStore>(store: &S, key: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let file = store.open(key).context(format!("Could not open {key}"))?;
    let info = file.stat();

    let modified = info
        .modified()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|| String::from("-"));

    writeln!(out, "{}\t{}\t{}", info.name(), info.size(), modified)?;
    Ok(())
}

/// Copies an object to `out`, starting at `offset` when one is given.
pub fn cat<S: ObjectStore>(
    store: &S,
    key: &str,
    offset: Option<u64>,
    out: &mut impl Write,
) -> anyhow::Result<u64> {
    let c_span = span!(Level::DEBUG, "cat", key = key);
    let _g = c_span.enter();

    let mut file = store.open(key).context(format!("Could not open {key}"))?;
    if let Some(offset) = offset {
        file.seek(SeekFrom::Start(offset))
            .context(format!("Could not seek {key} to {offset}"))?;
    }

    let copied = io::copy(&mut file, out).context(format!("Could not read {key}"))?;
    debug!("Copied {} bytes, materialized: {}", copied, file.is_materialized());
    Ok(copied)
}

/// Probes the object length the cheap way and reports whether that forced a
/// full download.
pub fn probe_size<S: ObjectStore>(
    store: &S,
    key: &str,
    out: &mut impl Write,
) -> anyhow::Result<u64> {
    let mut file = store.open(key).context(format!("Could not open {key}"))?;

    // The end probe answers the position of the last byte, not the length.
    let last = file.seek(SeekFrom::End(0))?;
    let size = if file.stat().size() == 0 { 0 } else { last + 1 };

    writeln!(out, "{}\t{}\tmaterialized={}", key, size, file.is_materialized())?;
    Ok(size)
}

pub fn digest<S: ObjectStore>(
    store: &S,
    key: &str,
    out: &mut impl Write,
) -> anyhow::Result<String> {
    let mut file = store.open(key).context(format!("Could not open {key}"))?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .context(format!("Could not read {key}"))?;

    let hex = sha256::digest(bytes);
    writeln!(out, "{hex}  {key}")?;
    Ok(hex)
}

/// Lists the entries of a zip archive stored as an object.
pub fn zip_list<S: ObjectStore>(
    store: &S,
    key: &str,
    out: &mut impl Write,
) -> anyhow::Result<usize> {
    let mut file = store.open(key).context(format!("Could not open {key}"))?;
    // zip sizes the archive with SeekFrom::End(0) and needs the exact length.
    file.materialize()?;
    let mut archive = zip::ZipArchive::new(file).context(format!("{key} is not a zip archive"))?;

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        writeln!(out, "{}\t{}", entry.name(), entry.size())?;
    }
    Ok(archive.len())
}
