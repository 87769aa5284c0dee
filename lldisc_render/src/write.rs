//! Write-to-temporary-then-rename discipline (spec §5) so readers of the
//! exported DOT file never observe a torn write.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::RenderError;

pub fn write_atomic(path: &str, contents: &str) -> Result<(), RenderError> {
    let target = Path::new(path);
    let parent = target.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        fs::create_dir_all(parent)?;
    }

    let tmp_path = tmp_path_for(target);
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, target)?;
    Ok(())
}

fn tmp_path_for(target: &Path) -> std::path::PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    target.with_file_name(format!(".{file_name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_file_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("topology.dot");
        write_atomic(path.to_str().unwrap(), "digraph lldiscovery {}\n").unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "digraph lldiscovery {}\n");
    }

    #[test]
    fn readers_never_see_a_partial_file_on_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.dot");
        write_atomic(path.to_str().unwrap(), "first").unwrap();
        write_atomic(path.to_str().unwrap(), "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        // the temp file never lingers after a successful rename
        assert!(!dir.path().join(".topology.dot.tmp").exists());
    }
}
