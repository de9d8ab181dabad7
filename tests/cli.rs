/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::fs;
use std::os::unix::fs::PermissionsExt;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn shredder() -> Command {
    Command::cargo_bin("shredder").expect("binary built")
}

#[test]
fn simple_delete() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("a.bin");
    fs::write(&path, [0x41u8; 10]).unwrap();

    shredder()
        .arg("-n")
        .arg("1")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("shredded, verified, and deleted"));

    assert!(!path.exists());
}

#[test]
fn keep_after_overwrite() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("b.txt");
    fs::write(&path, vec![0x42u8; 4096]).unwrap();

    shredder()
        .arg("-n")
        .arg("2")
        .arg("-k")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("overwritten without deletion"));

    assert!(path.exists());
    assert_eq!(fs::metadata(&path).unwrap().len(), 4096);
}

#[test]
fn directory_without_recursive_flag_is_untouched() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("dir1");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("x"), b"x").unwrap();
    fs::write(target.join("y"), b"y").unwrap();

    shredder()
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Use -r"));

    assert!(target.exists());
    assert!(target.join("x").exists());
    assert!(target.join("y").exists());
}

#[test]
fn recursive_cleanup_removes_directory() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("dir2");
    fs::create_dir(&target).unwrap();
    fs::write(target.join("a"), b"one").unwrap();
    fs::write(target.join("b"), b"two").unwrap();

    shredder()
        .arg("-r")
        .arg("-n")
        .arg("1")
        .arg(&target)
        .assert()
        .success();

    assert!(!target.exists());
}

#[test]
fn denied_without_force_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.ro");
    fs::write(&path, b"secret").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o400)).unwrap();

    shredder()
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("no write permission"));

    assert!(path.exists());
    fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();
}

#[test]
fn denied_with_force_widens_permissions_and_deletes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c.ro");
    fs::write(&path, b"secret").unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o400)).unwrap();

    shredder().arg("-f").arg(&path).assert().success();

    assert!(!path.exists());
}

#[test]
fn dry_run_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("c");
    let original = b"do-not-touch".to_vec();
    fs::write(&path, &original).unwrap();

    shredder()
        .arg("-d")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Simulating shredding file"));

    assert_eq!(fs::read(&path).unwrap(), original);
}

#[test]
fn missing_path_exits_nonzero() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    shredder().arg(&missing).assert().failure().code(1);
}

#[test]
fn help_flag_exits_with_code_two() {
    shredder().arg("-h").assert().code(2);
}

#[test]
fn no_path_argument_is_a_fatal_usage_error() {
    shredder().assert().failure().code(1);
}
