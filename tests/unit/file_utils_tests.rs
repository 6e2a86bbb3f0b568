/*!
 * Tests for file utilities
 */

use autocaption::file_utils::{FileManager, FileType, FsMediaLoader, SUBTITLE_SUFFIX, VIDEO_SUFFIX};
use autocaption::providers::{MediaLoader, MediaRef};
use bytes::Bytes;

use crate::common;

#[test]
fn test_fileExists_shouldOnlyReportFiles() {
    let dir = common::create_temp_dir().unwrap();
    let file = common::create_test_file(dir.path(), "a.txt", "x").unwrap();
    assert!(FileManager::file_exists(&file));
    assert!(!FileManager::file_exists(dir.path()));
    assert!(!FileManager::file_exists(dir.path().join("missing")));
}

#[test]
fn test_outputPaths_withoutExtension_shouldStillAppendSuffix() {
    let dir = common::create_temp_dir().unwrap();
    let subtitle = FileManager::subtitle_output_path("recording", dir.path());
    let video = FileManager::video_output_path("recording", dir.path());
    assert_eq!(subtitle, dir.path().join(format!("recording{}", SUBTITLE_SUFFIX)));
    assert_eq!(video, dir.path().join(format!("recording{}", VIDEO_SUFFIX)));
}

#[test]
fn test_detectFileType_bySrtExtension_shouldBeSubtitle() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_subtitle(dir.path(), "talk.srt").unwrap();
    assert_eq!(FileManager::detect_file_type(&path).unwrap(), FileType::Subtitle);
}

#[test]
fn test_ensureDir_shouldCreateNestedDirectories() {
    let dir = common::create_temp_dir().unwrap();
    let nested = dir.path().join("a").join("b");
    FileManager::ensure_dir(&nested).unwrap();
    assert!(nested.is_dir());
    FileManager::ensure_dir(&nested).unwrap();
}

#[test]
fn test_fsMediaLoader_withMemoryMedia_shouldPassBytesThrough() {
    let media = MediaRef::Memory {
        name: "upload.mov".to_string(),
        bytes: Bytes::from_static(b"in memory"),
    };
    let data = tokio_test::block_on(FsMediaLoader.load(&media)).unwrap();
    assert_eq!(data.name, "upload.mov");
    assert_eq!(&data.bytes[..], b"in memory");
}
