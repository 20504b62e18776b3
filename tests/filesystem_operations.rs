//! End-to-end coverage exercising [`vfsmem::FileSystem`] the way a caller
//! would: through paths and channels only, never the crate's internals.

use std::io::{Read, Write};
use std::time::Duration;

use vfsmem::{AttrValue, Error, FileSystem, FileType};

#[test]
fn nested_directories_and_files_round_trip() {
    let fs = FileSystem::unix_like().unwrap();
    fs.create_directories(&fs.path("/work/a/b/c").unwrap()).unwrap();
    fs.create_file(&fs.path("/work/a/b/c/leaf.txt").unwrap()).unwrap();

    let mut writer = fs.open_write(&fs.path("/work/a/b/c/leaf.txt").unwrap(), true, false).unwrap();
    writer.write_all(b"deep content").unwrap();
    drop(writer);

    let mut reader = fs.open_read(&fs.path("/work/a/b/c/leaf.txt").unwrap()).unwrap();
    let mut buf = String::new();
    reader.read_to_string(&mut buf).unwrap();
    assert_eq!(buf, "deep content");

    let entries = fs.read_directory(&fs.path("/work/a/b/c").unwrap()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "leaf.txt");
    assert_eq!(entries[0].file_type, FileType::Regular);
}

#[test]
fn rename_across_directories_preserves_content() {
    let fs = FileSystem::unix_like().unwrap();
    fs.create_directory(&fs.path("/work/src").unwrap()).unwrap();
    fs.create_directory(&fs.path("/work/dst").unwrap()).unwrap();
    fs.create_file(&fs.path("/work/src/file.txt").unwrap()).unwrap();

    let mut writer = fs.open_write(&fs.path("/work/src/file.txt").unwrap(), true, false).unwrap();
    writer.write_all(b"payload").unwrap();
    drop(writer);

    fs.move_file(&fs.path("/work/src/file.txt").unwrap(), &fs.path("/work/dst/file.txt").unwrap(), false).unwrap();
    assert!(!fs.exists(&fs.path("/work/src/file.txt").unwrap()));

    let mut reader = fs.open_read(&fs.path("/work/dst/file.txt").unwrap()).unwrap();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"payload");
}

#[test]
fn copy_with_attributes_preserves_owner() {
    let fs = FileSystem::unix_like().unwrap();
    let source = fs.path("/work/original.txt").unwrap();
    let dest = fs.path("/work/copy.txt").unwrap();
    fs.create_file(&source).unwrap();
    fs.set_attribute(&source, "owner:owner", AttrValue::String("alice".to_owned())).unwrap();

    fs.copy(&source, &dest, false, true).unwrap();
    let owner = fs.get_attribute(&dest, "owner:owner").unwrap();
    assert_eq!(owner.as_str(), Some("alice"));
}

#[test]
fn copy_without_attributes_resets_to_defaults() {
    let fs = FileSystem::unix_like().unwrap();
    let source = fs.path("/work/original.txt").unwrap();
    let dest = fs.path("/work/copy.txt").unwrap();
    fs.create_file(&source).unwrap();
    fs.set_attribute(&source, "owner:owner", AttrValue::String("alice".to_owned())).unwrap();

    fs.copy(&source, &dest, false, false).unwrap();
    let owner = fs.get_attribute(&dest, "owner:owner").unwrap();
    assert_eq!(owner.as_str(), Some("root"));
}

#[test]
fn hard_link_keeps_content_alive_after_original_deleted() {
    let fs = FileSystem::unix_like().unwrap();
    let original = fs.path("/work/original.txt").unwrap();
    let linked = fs.path("/work/linked.txt").unwrap();
    fs.create_file(&original).unwrap();

    let mut writer = fs.open_write(&original, true, false).unwrap();
    writer.write_all(b"shared bytes").unwrap();
    drop(writer);

    fs.create_link(&linked, &original).unwrap();
    fs.delete(&original).unwrap();

    let mut reader = fs.open_read(&linked).unwrap();
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).unwrap();
    assert_eq!(buf, b"shared bytes");
}

#[test]
fn symbolic_link_resolves_through_directory() {
    let fs = FileSystem::unix_like().unwrap();
    fs.create_directory(&fs.path("/work/real").unwrap()).unwrap();
    fs.create_file(&fs.path("/work/real/target.txt").unwrap()).unwrap();
    fs.create_symbolic_link(&fs.path("/work/link").unwrap(), fs.path("/work/real").unwrap()).unwrap();

    assert!(fs.exists(&fs.path("/work/link/target.txt").unwrap()));
    let target = fs.read_symbolic_link(&fs.path("/work/link").unwrap()).unwrap();
    assert_eq!(target, fs.path("/work/real").unwrap());
}

#[test]
fn self_referential_symlink_chain_is_too_many_links() {
    let fs = FileSystem::unix_like().unwrap();
    fs.create_symbolic_link(&fs.path("/work/a").unwrap(), fs.path("/work/b").unwrap()).unwrap();
    fs.create_symbolic_link(&fs.path("/work/b").unwrap(), fs.path("/work/a").unwrap()).unwrap();

    assert!(!fs.exists(&fs.path("/work/a").unwrap()));
    let result = fs.open_read(&fs.path("/work/a").unwrap());
    assert!(matches!(result, Err(Error::TooManyLinks { .. })));
}

#[test]
fn deleting_nonempty_directory_fails_and_empty_succeeds() {
    let fs = FileSystem::unix_like().unwrap();
    fs.create_directory(&fs.path("/work/dir").unwrap()).unwrap();
    fs.create_file(&fs.path("/work/dir/file.txt").unwrap()).unwrap();

    assert!(fs.delete(&fs.path("/work/dir").unwrap()).is_err());
    fs.delete(&fs.path("/work/dir/file.txt").unwrap()).unwrap();
    fs.delete(&fs.path("/work/dir").unwrap()).unwrap();
    assert!(!fs.exists(&fs.path("/work/dir").unwrap()));
}

#[test]
fn watch_reports_create_modify_and_delete() {
    let fs = FileSystem::unix_like().unwrap();
    let key = fs.watch(&fs.path("/work").unwrap()).unwrap();

    fs.create_file(&fs.path("/work/note.txt").unwrap()).unwrap();
    let created = key.take().unwrap();
    assert_eq!(created.name.display(), "note.txt");

    let mut writer = fs.open_write(&fs.path("/work/note.txt").unwrap(), false, true).unwrap();
    writer.write_all(b"hi").unwrap();
    drop(writer);
    let modified = key.poll(Duration::from_secs(2)).unwrap().expect("modify event");
    assert_eq!(modified.name.display(), "note.txt");

    fs.delete(&fs.path("/work/note.txt").unwrap()).unwrap();
    let deleted = key.poll(Duration::from_secs(2)).unwrap().expect("delete event");
    assert_eq!(deleted.name.display(), "note.txt");
}

#[test]
fn windows_lookup_is_case_insensitive_through_dot_dot() {
    let fs = FileSystem::windows_like().unwrap();
    fs.create_directory(&fs.path("C:\\work\\Foo").unwrap()).unwrap();

    assert!(fs.exists(&fs.path("C:\\work\\foo").unwrap()));
    assert!(fs.exists(&fs.path("C:\\work\\FOO\\..\\foo").unwrap()));
}

#[test]
fn unix_attribute_view_reports_derived_mode_and_link_count() {
    let fs = FileSystem::unix_like().unwrap();
    let path = fs.path("/work/file.txt").unwrap();
    fs.create_file(&path).unwrap();

    let view = fs.read_attribute_view(&path, "unix").unwrap();
    let mode = view.get("mode").and_then(AttrValue::as_integer).unwrap();
    assert_eq!(mode & 0o100000, 0o100000);
    assert_eq!(view.get("nlink").and_then(AttrValue::as_integer), Some(1));
}
