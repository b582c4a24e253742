use std::fs;
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom, Write};

use lazyseek::{commands, DirStore, LazySeekError, LazySeeker, ObjectStore, SeekerState};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[test]
fn zip_archive_is_readable_through_a_chunked_store() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = build_zip(&[("a.txt", &b"alpha"[..]), ("nested/b.txt", &b"bravo bravo"[..])]);
    fs::write(tmp.path().join("bundle.zip"), &archive).unwrap();

    let store = DirStore::new(tmp.path(), 7);

    let mut out = Vec::new();
    assert_eq!(commands::zip_list(&store, "bundle.zip", &mut out).unwrap(), 2);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "a.txt\t5\nnested/b.txt\t11\n"
    );

    let mut file = store.open("bundle.zip").unwrap();
    file.materialize().unwrap();
    let mut zip = zip::ZipArchive::new(file).unwrap();
    let mut contents = String::new();
    zip.by_name("nested/b.txt")
        .unwrap()
        .read_to_string(&mut contents)
        .unwrap();
    assert_eq!(contents, "bravo bravo");
}

#[test]
fn unchunked_object_streams_without_buffering() {
    let tmp = tempfile::tempdir().unwrap();
    let data: Vec<u8> = (0..4096u32).map(|i| (i % 256) as u8).collect();
    fs::write(tmp.path().join("blob"), &data).unwrap();

    let store = DirStore::new(tmp.path(), 0);
    let mut file = store.open("blob").unwrap();

    assert_eq!(file.seek(SeekFrom::End(0)).unwrap(), 4095);
    assert_eq!(file.seek(SeekFrom::Start(0)).unwrap(), 0);

    let mut buf = vec![0u8; 4096];
    assert_eq!(file.read(&mut buf).unwrap(), 4096);
    assert_eq!(buf, data);
    assert!(!file.is_materialized());
}

#[test]
fn seek_into_chunked_object_reads_tail() {
    let tmp = tempfile::tempdir().unwrap();
    fs::write(tmp.path().join("log.txt"), b"line one\nline two\n").unwrap();

    let store = DirStore::new(tmp.path(), 4);
    let mut out = Vec::new();
    commands::cat(&store, "log.txt", Some(9), &mut out).unwrap();

    assert_eq!(out, b"line two\n");
}

#[test]
fn root_cannot_be_opened() {
    let tmp = tempfile::tempdir().unwrap();
    let store = DirStore::new(tmp.path(), 0);

    assert!(matches!(
        store.open("/"),
        Err(lazyseek::StoreError::PermissionDenied(_))
    ));
}

/// Hands out `good` in one short read, then fails.
struct FlakyBody {
    good: Option<Vec<u8>>,
}

impl Read for FlakyBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.good.take() {
            Some(chunk) => {
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            None => Err(io::Error::new(ErrorKind::ConnectionAborted, "peer went away")),
        }
    }
}

#[test]
fn broken_body_is_an_error_not_a_panic() {
    let mut seeker = LazySeeker::new(
        FlakyBody {
            good: Some(b"head".to_vec()),
        },
        1024,
    );

    let mut buf = [0u8; 16];
    let err = seeker.read(&mut buf).unwrap_err();

    assert!(LazySeekError::is_drain_failure(&err));
    assert_eq!(seeker.state(), SeekerState::Poisoned);
    drop(seeker);
}
