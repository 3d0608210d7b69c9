use assert_cmd::Command;

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn version_flag() {
    let assert = Command::cargo_bin("mnemo")
        .unwrap()
        .arg("--version")
        .assert()
        .success();
    assert!(stdout_of(assert).contains("mnemo"));
}

#[test]
fn piped_quit_sequence_exits_cleanly() {
    // Escape opens the quit confirmation, `y` confirms.
    Command::cargo_bin("mnemo")
        .unwrap()
        .arg("--minimal")
        .write_stdin("\x1by")
        .assert()
        .success();
}

#[test]
fn piped_session_executes_operations() {
    // Load A with decimal 5, add decimal 3, then quit.
    let assert = Command::cargo_bin("mnemo")
        .unwrap()
        .arg("--minimal")
        .write_stdin("ld5\nad3\n\x1by")
        .assert()
        .success();
    let output = stdout_of(assert);
    assert!(output.contains("Load register A"));
    assert!(output.contains("Add with carry"));
}

#[test]
fn invalid_binary_literal_is_reported_not_fatal() {
    let assert = Command::cargo_bin("mnemo")
        .unwrap()
        .arg("--minimal")
        .write_stdin("ab1010\n\x1b\x1b\x1by")
        .assert()
        .success();
    let output = stdout_of(assert);
    assert!(output.contains("ERROR: BINARY LITERAL MUST BE EXACTLY 8 DIGITS"));
}
