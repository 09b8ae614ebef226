//! Version-control metadata link extraction
//!
//! A web root that still serves its `.git/` or `.svn/` directory lists every
//! tracked file. This module reads those lists:
//!
//! - `.git/index` (dircache versions 2, 3 and 4)
//! - `.svn/entries` (the plain-text format of Subversion 1.4 to 1.6, and the
//!   older XML format)
//! - `.svn/wc.db` (the SQLite working-copy database of Subversion 1.7+)
//!
//! Tracked paths are relative to the working-copy root, which is the directory
//! holding the metadata directory, so links come back as absolute paths below
//! that directory.

use super::LinkExtractor;
use crate::resource::Resource;
use rusqlite::{Connection, OpenFlags};
use scraper::{Html, Selector};
use std::io::Write;
use thiserror::Error;

const GIT_INDEX: &str = "/.git/index";
const SVN_ENTRIES: &str = "/.svn/entries";
const SVN_WC_DB: &str = "/.svn/wc.db";

/// Size of a dircache entry before its path name
const GIT_ENTRY_HEADER: usize = 62;
const GIT_EXTENDED_FLAG: u16 = 0x4000;

/// Extracts tracked file paths from exposed Git and Subversion metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct VcsMetadataExtractor;

impl VcsMetadataExtractor {
    /// Returns true if the request path is a metadata file this extractor reads
    pub fn handles(path: &str) -> bool {
        [GIT_INDEX, SVN_ENTRIES, SVN_WC_DB]
            .iter()
            .any(|file| path.ends_with(file))
    }

    /// Extracts the files tracked by a `.git/index`
    pub fn extract_from_git_index(data: &[u8]) -> Vec<String> {
        git_index_paths(data).unwrap_or_default()
    }

    /// Extracts files and directories listed by a `.svn/entries` file
    ///
    /// Directories are returned with a trailing `/`, followed by their own
    /// `.svn/entries` so that older working copies can be walked.
    pub fn extract_from_svn_entries(content: &str) -> Vec<String> {
        let entries = if content.trim_start().starts_with('<') {
            svn_xml_entries(content)
        } else {
            svn_text_entries(content)
        };

        let mut links = Vec::new();
        for (name, is_dir) in entries {
            if is_dir {
                links.push(format!("{}/", name));
                links.push(format!("{}/.svn/entries", name));
            } else {
                links.push(name);
            }
        }
        links
    }

    /// Extracts files and directories recorded in a `.svn/wc.db` database
    pub fn extract_from_wc_db(data: &[u8]) -> Vec<String> {
        match wc_db_nodes(data) {
            Ok(nodes) => nodes
                .into_iter()
                .map(|(path, is_dir)| if is_dir { format!("{}/", path) } else { path })
                .collect(),
            Err(e) => {
                tracing::debug!("Unreadable wc.db: {}", e);
                Vec::new()
            }
        }
    }
}

impl LinkExtractor for VcsMetadataExtractor {
    fn extract(&self, resource: &Resource) -> Vec<String> {
        let Some(response) = &resource.response else {
            return Vec::new();
        };
        if !(200..300).contains(&response.status) {
            return Vec::new();
        }

        let path = resource.path();
        let (marker, relative) = if path.ends_with(GIT_INDEX) {
            (GIT_INDEX, Self::extract_from_git_index(&response.body))
        } else if path.ends_with(SVN_ENTRIES) {
            (SVN_ENTRIES, Self::extract_from_svn_entries(&response.body_text()))
        } else if path.ends_with(SVN_WC_DB) {
            (SVN_WC_DB, Self::extract_from_wc_db(&response.body))
        } else {
            return Vec::new();
        };

        let root = &path[..path.len() - marker.len() + 1];
        relative
            .into_iter()
            .map(|file| format!("{}{}", root, file.trim_start_matches('/')))
            .collect()
    }
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes(bytes.try_into().ok()?))
}

/// Reads the prefix-strip length of a version 4 entry
///
/// Returns the value and the number of bytes it occupied.
fn read_git_varint(data: &[u8]) -> Option<(usize, usize)> {
    let mut byte = *data.first()?;
    let mut value = usize::from(byte & 0x7f);
    let mut used = 1;

    while byte & 0x80 != 0 {
        byte = *data.get(used)?;
        used += 1;
        value = value
            .checked_add(1)?
            .checked_mul(128)?
            .checked_add(usize::from(byte & 0x7f))?;
    }

    Some((value, used))
}

/// Walks the dircache entries; stops at the first malformed one
fn git_index_paths(data: &[u8]) -> Option<Vec<String>> {
    if data.get(..4)? != b"DIRC" {
        return None;
    }
    let version = read_u32(data, 4)?;
    if !(2..=4).contains(&version) {
        return None;
    }
    let count = read_u32(data, 8)?;

    let mut paths = Vec::new();
    let mut previous: Vec<u8> = Vec::new();
    let mut offset = 12;

    for _ in 0..count {
        let Some(flags) = read_u16(data, offset + GIT_ENTRY_HEADER - 2) else {
            break;
        };
        let mut header = GIT_ENTRY_HEADER;
        if version >= 3 && flags & GIT_EXTENDED_FLAG != 0 {
            header += 2;
        }

        let mut name_start = offset + header;
        let mut strip = 0;
        if version == 4 {
            let Some((value, used)) = data.get(name_start..).and_then(read_git_varint) else {
                break;
            };
            strip = value;
            name_start += used;
        }

        let Some(name_len) = data
            .get(name_start..)
            .and_then(|rest| rest.iter().position(|&b| b == 0))
        else {
            break;
        };
        let suffix = &data[name_start..name_start + name_len];

        let name = if version == 4 {
            let Some(keep) = previous.len().checked_sub(strip) else {
                break;
            };
            let mut name = previous[..keep].to_vec();
            name.extend_from_slice(suffix);
            offset = name_start + name_len + 1;
            name
        } else {
            // Entries are NUL-padded to a multiple of eight bytes
            offset += (header + name_len + 8) & !7;
            suffix.to_vec()
        };

        paths.push(String::from_utf8_lossy(&name).into_owned());
        previous = name;
    }

    Some(paths)
}

/// Parses the form-feed separated text format
///
/// Each entry starts with its name and kind lines; the unnamed first entry is
/// the directory itself.
fn svn_text_entries(content: &str) -> Vec<(String, bool)> {
    content
        .split('\x0c')
        .filter_map(|entry| {
            let mut lines = entry.trim_start_matches('\n').lines();
            let name = lines.next()?.trim();
            let kind = lines.next()?.trim();
            match kind {
                "file" if !name.is_empty() => Some((name.to_string(), false)),
                "dir" if !name.is_empty() => Some((name.to_string(), true)),
                _ => None,
            }
        })
        .collect()
}

/// Parses the `<wc-entries>` XML format
fn svn_xml_entries(content: &str) -> Vec<(String, bool)> {
    let document = Html::parse_fragment(content);
    let Ok(selector) = Selector::parse("entry") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|entry| {
            let name = entry.value().attr("name")?.trim();
            if name.is_empty() {
                return None;
            }
            match entry.value().attr("kind")? {
                "file" => Some((name.to_string(), false)),
                "dir" => Some((name.to_string(), true)),
                _ => None,
            }
        })
        .collect()
}

#[derive(Debug, Error)]
enum WcDbError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Reads `(local_relpath, is_dir)` for every node of a working-copy database
fn wc_db_nodes(data: &[u8]) -> Result<Vec<(String, bool)>, WcDbError> {
    // SQLite reads from a file, not from memory
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(data)?;
    file.flush()?;

    let conn = Connection::open_with_flags(file.path(), OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut stmt = conn.prepare(
        "SELECT DISTINCT local_relpath, kind FROM NODES
         WHERE local_relpath <> '' ORDER BY local_relpath",
    )?;
    let nodes = stmt
        .query_map([], |row| {
            let path: String = row.get(0)?;
            let kind: String = row.get(1)?;
            Ok((path, kind == "dir"))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(nodes)
}
