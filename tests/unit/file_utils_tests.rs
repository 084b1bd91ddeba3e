/*!
 * Tests for file utility functions
 */

use std::fs;
use std::io::{BufRead, Write};
use anyhow::Result;
use csub::errors::ShiftError;
use csub::file_utils::FileManager;
use crate::common;

/// Test same-file detection
#[test]
fn test_same_file_withEquivalentPaths_shouldMatch() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let a = common::create_test_file(temp_dir.path(), "a.srt", "1\n")?;
    let b = common::create_test_file(temp_dir.path(), "b.srt", "1\n")?;

    assert!(FileManager::same_file(&a, &a));
    assert!(FileManager::same_file(&a, temp_dir.path().join(".").join("a.srt")));
    assert!(!FileManager::same_file(&a, &b));
    // Not yet existing paths only match by text
    assert!(FileManager::same_file("new.srt", "new.srt"));
    assert!(!FileManager::same_file(temp_dir.path().join("new.srt"), &a));
    Ok(())
}

/// Test opening a missing source
#[test]
fn test_open_source_withMissingFile_shouldFailWithOpenInput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let missing = temp_dir.path().join("missing.srt");

    match FileManager::open_source(Some(missing.as_path())) {
        Err(ShiftError::OpenInput { path, .. }) => assert_eq!(path, missing),
        Err(other) => panic!("expected OpenInput, got {:?}", other),
        Ok(_) => panic!("missing file opened"),
    }
    Ok(())
}

/// Test reading lines from an opened source
#[test]
fn test_open_source_withExistingFile_shouldReadLines() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_subtitle(temp_dir.path(), "sample.srt")?;

    let reader = FileManager::open_source(Some(path.as_path()))?;
    let lines: Vec<String> = reader.lines().collect::<Result<_, _>>()?;
    assert_eq!(lines[0], "1");
    assert_eq!(lines[1], "00:00:01,000 --> 00:00:04,000");
    Ok(())
}

/// Test staging output and committing it over the destination
#[test]
fn test_stage_and_commit_withExistingDestination_shouldReplaceContent() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let destination = common::create_test_file(temp_dir.path(), "out.srt", "old\n")?;

    let mut staged = FileManager::stage_output(&destination)?;
    staged.write_all(b"new\n")?;
    assert_eq!(fs::read_to_string(&destination)?, "old\n");

    FileManager::commit_staged(staged, &destination)?;
    assert_eq!(fs::read_to_string(&destination)?, "new\n");
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 1);
    Ok(())
}

/// Test that a dropped staging file leaves no trace
#[test]
fn test_stage_output_withoutCommit_shouldLeaveNothingBehind() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let destination = temp_dir.path().join("fresh.srt");

    {
        let mut staged = FileManager::stage_output(&destination)?;
        staged.write_all(b"partial")?;
    }

    assert!(!destination.exists());
    assert_eq!(fs::read_dir(temp_dir.path())?.count(), 0);
    Ok(())
}

/// Test staging into a directory that does not exist
#[test]
fn test_stage_output_withMissingDirectory_shouldFailWithOpenOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let destination = temp_dir.path().join("no_such_dir").join("out.srt");

    let err = FileManager::stage_output(&destination).unwrap_err();
    assert!(matches!(err, ShiftError::OpenOutput { .. }));
    assert_eq!(err.exit_code(), 42);
    Ok(())
}

/// Test that a committed file keeps the permissions of the file it replaces
#[cfg(unix)]
#[test]
fn test_stage_and_commit_withExistingDestination_shouldKeepPermissions() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = common::create_temp_dir()?;
    let destination = common::create_test_file(temp_dir.path(), "out.srt", "old\n")?;
    fs::set_permissions(&destination, fs::Permissions::from_mode(0o640))?;

    let mut staged = FileManager::stage_output(&destination)?;
    staged.write_all(b"new\n")?;
    FileManager::commit_staged(staged, &destination)?;

    assert_eq!(fs::metadata(&destination)?.permissions().mode() & 0o777, 0o640);
    Ok(())
}

/// Test that a fresh output gets the same permissions as any new file
#[cfg(unix)]
#[test]
fn test_stage_and_commit_withFreshDestination_shouldUseDefaultPermissions() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let temp_dir = common::create_temp_dir()?;
    let reference = common::create_test_file(temp_dir.path(), "reference.srt", "")?;
    let destination = temp_dir.path().join("fresh.srt");

    let staged = FileManager::stage_output(&destination)?;
    FileManager::commit_staged(staged, &destination)?;

    let mode = |path: &std::path::Path| -> std::io::Result<u32> {
        Ok(fs::metadata(path)?.permissions().mode() & 0o777)
    };
    assert_eq!(mode(&destination)?, mode(&reference)?);
    Ok(())
}

/// Test that destinations behind symlinks resolve to the link target
#[cfg(unix)]
#[test]
fn test_resolve_destination_withSymlinks_shouldFollowLink() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let real = common::create_test_file(temp_dir.path(), "real.srt", "1\n")?;
    let link = temp_dir.path().join("link.srt");
    std::os::unix::fs::symlink(&real, &link)?;

    assert_eq!(FileManager::resolve_destination(&link), fs::canonicalize(&real)?);

    let dangling = temp_dir.path().join("dangling.srt");
    std::os::unix::fs::symlink("target.srt", &dangling)?;
    assert_eq!(
        FileManager::resolve_destination(&dangling),
        temp_dir.path().join("target.srt")
    );

    let fresh = temp_dir.path().join("fresh.srt");
    assert_eq!(FileManager::resolve_destination(&fresh), fresh);
    Ok(())
}
