//! Parsing of `stat --format` output returned by the remote host

use std::path::Path;

use crate::drivers::error::{DriverError, Result};
use crate::types::{FileMode, PathAttributes, PathType};

/// Map the `%F` file type string to a [`PathType`]
pub fn parse_file_type(output: &str) -> PathType {
    match output.trim() {
        "directory" => PathType::Directory,
        "regular file" | "regular empty file" => PathType::File,
        _ => PathType::Other,
    }
}

/// Parse a `%u|%g|%f` record (uid, gid, raw mode in hex)
pub fn parse_attributes(path: &Path, output: &str) -> Result<PathAttributes> {
    let invalid = || DriverError::StatParse {
        path: path.to_path_buf(),
        output: output.to_string(),
    };

    let fields: Vec<&str> = output.trim().split('|').collect();
    let [uid, gid, raw_mode] = fields.as_slice() else {
        return Err(invalid());
    };

    let uid = uid.parse::<u32>().map_err(|_| invalid())?;
    let gid = gid.parse::<u32>().map_err(|_| invalid())?;
    let raw_mode = u32::from_str_radix(raw_mode, 16).map_err(|_| invalid())?;

    Ok(PathAttributes::new()
        .with_owner(uid)
        .with_group(gid)
        .with_mode(FileMode::from_raw(raw_mode)))
}
