#[test]
fn mailstrip_version_text_output_contract() {
    let bin = assert_cmd::cargo::cargo_bin!("mailstrip");
    let out = std::process::Command::new(bin)
        .args(["version"])
        .output()
        .expect("run mailstrip version");

    assert!(out.status.success(), "mailstrip version failed");
    let s = String::from_utf8_lossy(&out.stdout);
    assert!(
        s.trim_start().starts_with("mailstrip "),
        "expected version output to start with `mailstrip `"
    );
}
