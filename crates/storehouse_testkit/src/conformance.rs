//! Contract checks every storage driver must pass.
//!
//! Each check panics with a descriptive message on violation, so it can be
//! called directly from a `#[test]`. Checks use their own paths and can run
//! one after another against the same backend.

use storehouse::{FileInfo, StorageBackend, StoreError, StoreStatus};

/// A path that no check ever writes.
pub const NEVER_WRITTEN: &str = "conformance/never/written";

/// A missing path is reported as not existing, not as an error.
pub fn check_missing_path_info(backend: &StorageBackend) {
    let info = backend
        .get_file_info(NEVER_WRITTEN)
        .expect("get_file_info on a missing path must succeed");
    assert_eq!(info, FileInfo::missing(), "missing path info");
}

/// Appended chunks read back as their concatenation, and the size matches.
pub fn check_round_trip(backend: &StorageBackend, path: &str, chunks: &[&[u8]]) {
    let mut file = backend
        .make_write_file(path)
        .unwrap_or_else(|e| panic!("make_write_file({path}) failed: {e}"));
    for chunk in chunks {
        file.append(chunk)
            .unwrap_or_else(|e| panic!("append to {path} failed: {e}"));
    }
    file.save()
        .unwrap_or_else(|e| panic!("save of {path} failed: {e}"));

    let expected: Vec<u8> = chunks.concat();
    let file = backend
        .make_random_read_file(path)
        .unwrap_or_else(|e| panic!("make_random_read_file({path}) failed: {e}"));
    let size = file.get_size().expect("get_size after save");
    assert_eq!(size, expected.len() as u64, "size of {path}");

    let data = file.read(0, expected.len()).expect("full read");
    assert_eq!(data, expected, "content of {path}");

    let info = backend.get_file_info(path).expect("get_file_info after save");
    assert_eq!(info, FileInfo::file(size), "info of {path}");
}

/// A read past the end reports `EndOfFile` with at most the remaining bytes.
pub fn check_read_past_end(backend: &StorageBackend) {
    let path = "conformance/past_end";
    backend
        .write_all(path, b"0123456789")
        .expect("write_all for past-end check");
    let file = backend.make_random_read_file(path).expect("open past-end file");

    match file.read(7, 10) {
        Err(StoreError::EndOfFile { partial, .. }) => {
            assert_eq!(partial, b"789", "partial bytes before the end");
        }
        other => panic!("expected EndOfFile, got {other:?}"),
    }

    let beyond = file.read(20, 4);
    assert_eq!(StoreStatus::of(&beyond), StoreStatus::EndOfFile);
    if let Err(StoreError::EndOfFile { partial, .. }) = beyond {
        assert!(partial.is_empty(), "no bytes exist past the end");
    }

    let empty_beyond = file.read(11, 0);
    assert_eq!(
        StoreStatus::of(&empty_beyond),
        StoreStatus::EndOfFile,
        "zero-length read starting past the end"
    );

    assert_eq!(file.read(6, 4).expect("read ending exactly at size"), b"6789");
    assert!(file.read(10, 0).expect("zero-length read at size").is_empty());
}

/// Creating the same directory twice succeeds both times.
pub fn check_make_dir_idempotent(backend: &StorageBackend) {
    let path = "conformance/dirs/nested/leaf";
    backend.make_dir(path).expect("first make_dir");
    backend.make_dir(path).expect("second make_dir");

    let info = backend.get_file_info(path).expect("info of created dir");
    assert!(info.file_exists && info.file_is_folder, "{path} is a folder");
}

/// Deleting an absent file fails; deleting a present one removes it.
pub fn check_delete_file(backend: &StorageBackend) {
    let path = "conformance/delete_me";
    let missing = backend.delete_file(path);
    assert_eq!(StoreStatus::of(&missing), StoreStatus::FileDoesNotExist);

    backend.write_all(path, b"short lived").expect("write file to delete");
    backend.delete_file(path).expect("delete present file");

    let info = backend.get_file_info(path).expect("info after delete");
    assert!(!info.file_exists, "{path} still exists after delete");
}

/// Deleting a directory eventually removes everything beneath it.
pub fn check_delete_dir(backend: &StorageBackend) {
    let root = "conformance/tree";
    for path in ["a", "b/c", "b/d/e"] {
        backend
            .write_all(&format!("{root}/{path}"), path.as_bytes())
            .expect("populate tree");
    }
    backend.make_dir(&format!("{root}/empty")).expect("empty subdir");

    backend.delete_dir(root).expect("delete_dir");
    for path in ["", "/a", "/b/c", "/b/d/e", "/empty"] {
        let info = backend
            .get_file_info(&format!("{root}{path}"))
            .expect("info after delete_dir");
        assert!(!info.file_exists, "{root}{path} survived delete_dir");
    }

    let again = backend.delete_dir(root);
    assert_eq!(StoreStatus::of(&again), StoreStatus::FileDoesNotExist);
}

/// The worked example: two appends, then whole and partial reads.
pub fn check_hello_world(backend: &StorageBackend) {
    let mut file = backend.make_write_file("data/1").expect("open data/1");
    file.append(b"hello ").expect("append hello");
    file.append(b"world").expect("append world");
    file.save().expect("save data/1");

    let file = backend.make_random_read_file("data/1").expect("reopen data/1");
    assert_eq!(file.get_size().expect("size"), 11);
    assert_eq!(file.read(0, 11).expect("read all"), b"hello world");
    assert_eq!(file.read(6, 5).expect("read tail"), b"world");
}

/// Opening a never-written path for reading yields no handle.
pub fn check_missing_read_file(backend: &StorageBackend) {
    let result = backend.make_random_read_file(NEVER_WRITTEN);
    assert_eq!(StoreStatus::of(&result), StoreStatus::FileDoesNotExist);
}

/// A saved handle rejects further appends and saves.
pub fn check_write_after_save(backend: &StorageBackend) {
    let mut file = backend
        .make_write_file("conformance/sealed")
        .expect("open sealed");
    file.append(b"x").expect("append");
    file.save().expect("save");

    let append = file.append(b"y");
    assert_eq!(StoreStatus::of(&append), StoreStatus::InvalidArgument);
    let save = file.save();
    assert_eq!(StoreStatus::of(&save), StoreStatus::InvalidArgument);
}

/// A handle dropped without saving leaves the previous object in place.
pub fn check_unsaved_write_discarded(backend: &StorageBackend) {
    let path = "conformance/unsaved";
    backend.write_all(path, b"original").expect("initial write");
    {
        let mut file = backend.make_write_file(path).expect("open for overwrite");
        file.append(b"never committed").expect("append");
    }
    assert_eq!(backend.read_all(path).expect("read back"), b"original");
}

/// Saving over an existing object replaces it entirely.
pub fn check_overwrite(backend: &StorageBackend) {
    let path = "conformance/overwrite";
    backend.write_all(path, b"a much longer first version").expect("first");
    backend.write_all(path, b"v2").expect("second");
    assert_eq!(backend.read_all(path).expect("read back"), b"v2");
}

/// Operations aimed at the wrong kind of entry fail the same way everywhere.
pub fn check_type_mismatches(backend: &StorageBackend) {
    let dir = "conformance/kinds/dir";
    let file = "conformance/kinds/file";
    backend.make_dir(dir).expect("make_dir for kind checks");
    backend.write_all(file, b"x").expect("write_all for kind checks");

    let delete_dir_as_file = backend.delete_file(dir);
    assert_eq!(
        StoreStatus::of(&delete_dir_as_file),
        StoreStatus::InvalidArgument,
        "delete_file on a directory"
    );
    let delete_file_as_dir = backend.delete_dir(file);
    assert_eq!(
        StoreStatus::of(&delete_file_as_dir),
        StoreStatus::InvalidArgument,
        "delete_dir on a file"
    );
    let dir_over_file = backend.make_dir(file);
    assert_eq!(
        StoreStatus::of(&dir_over_file),
        StoreStatus::FileExists,
        "make_dir over a file"
    );

    let info = backend.get_file_info(dir).expect("info of surviving dir");
    assert!(info.file_is_folder, "{dir} is still a folder");
    assert_eq!(backend.read_all(file).expect("file survives"), b"x");
}

/// A path below a regular file is absent, and nothing can be created there.
pub fn check_below_file(backend: &StorageBackend) {
    let file = "conformance/blocker";
    let child = "conformance/blocker/child";
    backend.write_all(file, b"x").expect("write_all blocker");

    let info = backend.get_file_info(child).expect("info below a file");
    assert!(!info.file_exists, "{child} cannot exist");

    let read = backend.make_random_read_file(child);
    assert_eq!(StoreStatus::of(&read), StoreStatus::FileDoesNotExist);
    let delete = backend.delete_file(child);
    assert_eq!(StoreStatus::of(&delete), StoreStatus::FileDoesNotExist);
    let delete_dir = backend.delete_dir(child);
    assert_eq!(StoreStatus::of(&delete_dir), StoreStatus::FileDoesNotExist);

    let write = backend.make_write_file(child);
    assert_eq!(
        StoreStatus::of(&write),
        StoreStatus::InvalidArgument,
        "make_write_file below a file"
    );
    let mkdir = backend.make_dir(&format!("{child}/deeper"));
    assert_eq!(
        StoreStatus::of(&mkdir),
        StoreStatus::InvalidArgument,
        "make_dir below a file"
    );
    assert_eq!(backend.read_all(file).expect("blocker survives"), b"x");
}

/// Runs every check against one backend.
pub fn run_all(backend: &StorageBackend) {
    check_missing_path_info(backend);
    check_missing_read_file(backend);
    check_hello_world(backend);
    check_round_trip(backend, "conformance/round_trip", &[b"ab", b"", b"cdef"]);
    check_read_past_end(backend);
    check_make_dir_idempotent(backend);
    check_delete_file(backend);
    check_delete_dir(backend);
    check_write_after_save(backend);
    check_unsaved_write_discarded(backend);
    check_overwrite(backend);
    check_type_mismatches(backend);
    check_below_file(backend);
}
