use crate::{astro, error::ScanError};
use anyhow::{Context, Result};
use std::{
    fs,
    io::{self, Read},
    path::Path,
};

/// List the `.pak` archives directly inside `dir`, sorted by filename.
/// Subdirectories are not descended into, and the integrator's reserved
/// output file is not a mod.
pub fn list_pak_files(dir: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("list archives in {}", dir.display()))?;

    let mut paks = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("list archives in {}", dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(astro::PAK_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if name == astro::INTEGRATOR_OUTPUT {
            continue;
        }
        paks.push(name.to_string());
    }
    paks.sort();
    Ok(paks)
}

/// Names of the entries contained in an archive.
pub fn list_entries(archive: &Path) -> Result<Vec<String>, ScanError> {
    let zip = open_archive(archive)?;
    Ok(zip.file_names().map(|name| name.to_string()).collect())
}

/// Read the bytes of a named entry, `None` when the archive carries no
/// entry of that name.
pub fn read_entry(archive: &Path, entry: &str) -> Result<Option<Vec<u8>>, ScanError> {
    let mut zip = open_archive(archive)?;
    let mut file = match zip.by_name(entry) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(unreadable(archive, err)),
    };

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| ScanError::ArchiveUnreadable {
            path: archive.to_path_buf(),
            source,
        })?;
    Ok(Some(bytes))
}

fn open_archive(archive: &Path) -> Result<zip::ZipArchive<fs::File>, ScanError> {
    let file = fs::File::open(archive).map_err(|source| ScanError::ArchiveUnreadable {
        path: archive.to_path_buf(),
        source,
    })?;
    zip::ZipArchive::new(file).map_err(|err| unreadable(archive, err))
}

fn unreadable(archive: &Path, err: zip::result::ZipError) -> ScanError {
    ScanError::ArchiveUnreadable {
        path: archive.to_path_buf(),
        source: io::Error::new(io::ErrorKind::Other, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        for (name, bytes) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn lists_sorted_paks_excluding_reserved_output() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("002-B_P.pak"), b"x").unwrap();
        fs::write(dir.path().join("001-A_P.pak"), b"x").unwrap();
        fs::write(dir.path().join(astro::INTEGRATOR_OUTPUT), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::write(dir.path().join("003-C_P.PAK"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested.pak")).unwrap();

        let paks = list_pak_files(dir.path()).unwrap();
        assert_eq!(paks, vec!["001-A_P.pak", "002-B_P.pak"]);
    }

    #[test]
    fn reads_named_entry_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("001-A_P.pak");
        write_archive(
            &archive,
            &[
                ("metadata.json", b"{}".as_slice()),
                ("data.bin", b"\x00".as_slice()),
            ],
        );

        let entries = list_entries(&archive).unwrap();
        assert!(entries.contains(&"metadata.json".to_string()));

        let bytes = read_entry(&archive, "metadata.json").unwrap();
        assert_eq!(bytes.as_deref(), Some(b"{}".as_slice()));
        assert!(read_entry(&archive, "missing.json").unwrap().is_none());
    }

    #[test]
    fn garbage_archive_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("001-A_P.pak");
        fs::write(&archive, b"not an archive").unwrap();

        let err = read_entry(&archive, "metadata.json").unwrap_err();
        assert!(matches!(err, ScanError::ArchiveUnreadable { .. }));
    }
}
