// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const SAMPLE: &str = "\
total 8
drwxr-xr-x 2 root root 4096 Feb 25 12:00 .
drwxr-xr-x 2 root root 4096 Feb 25 12:00 ..
-rw-r--r-- 1 root root  123 Feb 25 12:00 notes.txt
drwxr-xr-x 2 root root 4096 Feb 25 12:00 sub dir
";

#[test]
fn parses_sample_listing_dirs_first() {
    let entries = parse_listing(SAMPLE, "/");
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].name, "sub dir");
    assert!(entries[0].is_dir);
    assert_eq!(entries[0].relative_path, "/sub dir");

    assert_eq!(entries[1].name, "notes.txt");
    assert!(!entries[1].is_dir);
    assert_eq!(entries[1].size, 123);
    assert_eq!(entries[1].relative_path, "/notes.txt");
}

#[test]
fn joins_below_nested_base_path() {
    let entries = parse_listing("-rw-r--r-- 1 root root 9 Feb 25 12:00 a.log\n", "/var/log");
    assert_eq!(entries[0].relative_path, "/var/log/a.log");
}

#[test]
fn base_path_trailing_slash_is_normalized() {
    let entries = parse_listing("-rw-r--r-- 1 root root 9 Feb 25 12:00 a.log\n", "/var/log/");
    assert_eq!(entries[0].relative_path, "/var/log/a.log");
}

#[test]
fn preserves_spaces_in_names() {
    let raw = "-rw-r--r-- 1 root root 42 Feb 25 12:00 my  spaced  file.txt\n";
    let entries = parse_listing(raw, "/");
    assert_eq!(entries[0].name, "my  spaced  file.txt");
}

#[test]
fn captures_permissions_and_mod_time() {
    let entries = parse_listing(SAMPLE, "/");
    assert_eq!(entries[1].permissions, "-rw-r--r--");
    assert_eq!(entries[1].mod_time, "Feb 25 12:00");
}

#[test]
fn sorts_directories_before_files_then_by_name() {
    let raw = "\
-rw-r--r-- 1 root root 1 Feb 25 12:00 zz.txt
drwxr-xr-x 2 root root 4096 Feb 25 12:00 beta
-rw-r--r-- 1 root root 1 Feb 25 12:00 aa.txt
drwxr-xr-x 2 root root 4096 Feb 25 12:00 alpha
";
    let entries = parse_listing(raw, "/");
    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta", "aa.txt", "zz.txt"]);
}

#[yare::parameterized(
    blank_line      = { "" },
    total_summary   = { "total 42" },
    too_few_fields  = { "drwxr-xr-x 2 root root" },
    dot_entry       = { "drwxr-xr-x 2 root root 4096 Feb 25 12:00 ." },
    dot_dot_entry   = { "drwxr-xr-x 2 root root 4096 Feb 25 12:00 .." },
)]
fn skipped_lines(line: &str) {
    assert!(parse_listing(line, "/").is_empty());
}

#[test]
fn malformed_lines_do_not_poison_the_rest() {
    let raw = "garbage\n-rw-r--r-- 1 root root 5 Feb 25 12:00 ok.txt\n";
    let entries = parse_listing(raw, "/");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, "ok.txt");
}

#[test]
fn unparseable_size_defaults_to_zero() {
    let raw = "-rw-r--r-- 1 root root ? Feb 25 12:00 odd.txt\n";
    let entries = parse_listing(raw, "/");
    assert_eq!(entries[0].size, 0);
}
