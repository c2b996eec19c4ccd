use std::fs::{create_dir_all, write, File};
use std::io::Read;
use std::path::Path;

use pumproom_sync::archive::{create_archive, IgnoreList, ARCHIVE_FILE_NAME};
use pumproom_sync::local_fs::LocalFs;
use tempfile::tempdir;

/// Names and contents of every entry in a zip on disk.
fn read_zip(path: &Path) -> Vec<(String, String)> {
    let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut out = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        out.push((entry.name().to_string(), content));
    }
    out.sort();
    out
}

fn touch(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    create_dir_all(path.parent().unwrap()).unwrap();
    write(path, content).unwrap();
}

#[test]
fn preserves_relative_directory_structure() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    touch(&source, "a/b/c.txt", "deep");
    touch(&source, "top.md", "top");
    let dest = tmp.path().join(ARCHIVE_FILE_NAME);

    let summary =
        create_archive(&LocalFs::new(), &source, &dest, &IgnoreList::default()).unwrap();

    assert_eq!(summary.entries.len(), 2);
    assert!(summary.bytes > 0);
    assert_eq!(
        read_zip(&dest),
        vec![
            ("a/b/c.txt".to_string(), "deep".to_string()),
            ("top.md".to_string(), "top".to_string()),
        ]
    );
}

#[test]
fn directories_contribute_no_entries() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    create_dir_all(source.join("empty/nested")).unwrap();
    touch(&source, "lesson/task.md", "task");
    let dest = tmp.path().join("out.zip");

    create_archive(&LocalFs::new(), &source, &dest, &IgnoreList::default()).unwrap();

    let names: Vec<String> = read_zip(&dest).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["lesson/task.md".to_string()]);
}

#[test]
fn never_includes_ignored_fragments() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    for rel in [
        "lessons/intro/README.md",
        "lessons/intro/solution.py",
        "drafts/idea.md",
        "lessons/drafts/old.md",
        "node_modules/pkg/index.js",
        "redistribute/notes.txt",
        ".git/config",
        ".github/workflows/publish.yml",
        "inzhenerka.yml",
    ] {
        touch(&source, rel, rel);
    }

    let combos = ["", "drafts", "drafts,node_modules", " dist , .py ", "intro"];
    for (i, raw) in combos.iter().enumerate() {
        let ignore = IgnoreList::with_user_fragments(raw);
        let dest = tmp.path().join(format!("out-{i}.zip"));
        create_archive(&LocalFs::new(), &source, &dest, &ignore).unwrap();

        let names: Vec<String> = read_zip(&dest).into_iter().map(|(n, _)| n).collect();
        assert!(names.contains(&"inzhenerka.yml".to_string()), "{raw:?}: {names:?}");
        for name in &names {
            let full = source.join(name);
            assert!(
                !ignore.matches(&full),
                "{raw:?}: ignored path {name} was archived"
            );
        }
    }
}

#[test]
fn substring_matching_prunes_partial_segment_names() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    touch(&source, "redistribute/notes.txt", "x");
    touch(&source, "src/main.rs", "fn main() {}");
    let dest = tmp.path().join("out.zip");

    create_archive(
        &LocalFs::new(),
        &source,
        &dest,
        &IgnoreList::with_user_fragments("dist"),
    )
    .unwrap();

    let names: Vec<String> = read_zip(&dest).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["src/main.rs".to_string()]);
}

#[test]
fn stale_archive_in_the_tree_is_not_archived_again() {
    let tmp = tempdir().unwrap();
    let source = tmp.path().to_path_buf();
    touch(&source, "lesson/task.md", "task");
    touch(&source, ARCHIVE_FILE_NAME, "stale zip bytes");
    let dest = source.join(ARCHIVE_FILE_NAME);

    create_archive(&LocalFs::new(), &source, &dest, &IgnoreList::default()).unwrap();

    let names: Vec<String> = read_zip(&dest).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["lesson/task.md".to_string()]);
}

#[cfg(target_os = "linux")]
#[test]
fn non_utf8_file_names_are_left_out() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = tempdir().unwrap();
    let source = tmp.path().join("source");
    touch(&source, "lessons/task.md", "task");
    write(
        source.join("lessons").join(OsStr::from_bytes(b"caf\xe9.txt")),
        "menu",
    )
    .unwrap();
    let dest = tmp.path().join("out.zip");

    let summary =
        create_archive(&LocalFs::new(), &source, &dest, &IgnoreList::default()).unwrap();

    assert_eq!(summary.entries.len(), 1);
    assert_eq!(
        read_zip(&dest),
        vec![("lessons/task.md".to_string(), "task".to_string())]
    );
}
