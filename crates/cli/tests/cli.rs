use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("catalog-cli")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["serve", "migrate", "create-user"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn create_user_requires_a_username() {
    Command::cargo_bin("catalog-cli")
        .unwrap()
        .args(["create-user", "--password", "secret"])
        .assert()
        .failure();
}

#[test]
fn create_user_then_migrate_against_a_temporary_database() {
    let dir = std::env::temp_dir().join(format!("catalog-cli-test-{}", std::process::id()));
    std::fs::remove_dir_all(&dir).ok();
    std::fs::create_dir_all(&dir).unwrap();
    let db_url = format!("sqlite://{}", dir.join("catalog.db").display());

    Command::cargo_bin("catalog-cli")
        .unwrap()
        .env("CATALOG_CONFIG_DIR", &dir)
        .env("CATALOG__DATABASE__URL", &db_url)
        .args([
            "create-user",
            "--username",
            "librarian",
            "--password",
            "secret",
            "--permission",
            "catalog.can_mark_returned",
        ])
        .assert()
        .success();

    // The username is now taken.
    Command::cargo_bin("catalog-cli")
        .unwrap()
        .env("CATALOG_CONFIG_DIR", &dir)
        .env("CATALOG__DATABASE__URL", &db_url)
        .args(["create-user", "--username", "librarian", "--password", "other"])
        .assert()
        .failure();

    Command::cargo_bin("catalog-cli")
        .unwrap()
        .env("CATALOG_CONFIG_DIR", &dir)
        .env("CATALOG__DATABASE__URL", &db_url)
        .arg("migrate")
        .assert()
        .success();

    std::fs::remove_dir_all(&dir).ok();
}
