//! Integration tests for Kiln

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const TOGGLES: &[&str] = &[
        "KILN_ENV",
        "KILN_SITE",
        "KILN_LOG_FORMAT",
        "KILN_PRESERVE_DOWNLOAD_CACHE",
        "KILN_PRESERVE_COMPILER_CACHE",
        "KILN_PAGE_BUILD_ON_DATA_CHANGES",
    ];

    fn kiln() -> Command {
        let mut cmd = cargo_bin_cmd!("kiln");
        for var in TOGGLES {
            cmd.env_remove(var);
        }
        cmd
    }

    fn bootstrap(site: &Path) -> assert_cmd::assert::Assert {
        kiln()
            .args(["bootstrap", "--workers", "1", "--site"])
            .arg(site)
            .assert()
    }

    fn write_plugin_config(site: &Path, version: &str) {
        fs::write(
            site.join("kiln.toml"),
            format!(
                r#"
[[plugins]]
name = "kiln-plugin-head"
version = "{version}"
server_hooks = ["onRenderBody"]

[plugins.options]
title = "Home"

[[plugins]]
name = "kiln-plugin-fonts"
version = "1.0.0"
"#
            ),
        )
        .unwrap();
        let fonts = site.join("plugins/kiln-plugin-fonts");
        fs::create_dir_all(&fonts).unwrap();
        fs::write(fonts.join("kiln-browser.js"), "import './fonts.css'\n").unwrap();
    }

    #[test]
    fn help_displays() {
        kiln()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("build bootstrap and cache orchestrator"));
    }

    #[test]
    fn version_displays() {
        kiln()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln"));
    }

    #[test]
    fn bootstrap_first_run_scaffolds_site() {
        let site = TempDir::new().unwrap();

        bootstrap(site.path())
            .success()
            .stdout(predicate::str::contains("kept (first-run)"))
            .stdout(predicate::str::contains("Ready to build"));

        assert!(site.path().join(".cache/json").is_dir());
        assert!(site.path().join(".cache/fragments").is_dir());
        assert!(site.path().join("public/static").is_dir());
        assert!(site.path().join(".cache/kiln-status.json").is_file());
        assert!(site.path().join(".cache/api-runner-browser-plugins.js").is_file());
        assert!(site.path().join(".kiln-journal.log").is_file());
    }

    #[test]
    fn bootstrap_writes_dispatch_tables() {
        let site = TempDir::new().unwrap();
        write_plugin_config(site.path(), "1.0.0");

        bootstrap(site.path())
            .success()
            .stdout(predicate::str::contains("1 client, 1 server"));

        let client =
            fs::read_to_string(site.path().join(".cache/api-runner-browser-plugins.js")).unwrap();
        assert!(client.contains("../plugins/kiln-plugin-fonts/kiln-browser"));
        assert!(!client.contains("kiln-plugin-head"));

        let server = fs::read_to_string(site.path().join(".cache/api-runner-ssr.js")).unwrap();
        assert!(server.contains("var plugins = ["));
        assert!(server.contains("\"title\":\"Home\""));
    }

    #[test]
    fn rerun_keeps_cache_until_plugins_change() {
        let site = TempDir::new().unwrap();
        write_plugin_config(site.path(), "1.0.0");
        bootstrap(site.path()).success();
        fs::write(site.path().join(".cache/json/page.json"), "{}").unwrap();

        bootstrap(site.path())
            .success()
            .stdout(predicate::str::contains("kept (none)"));
        assert!(site.path().join(".cache/json/page.json").exists());

        write_plugin_config(site.path(), "2.0.0");
        bootstrap(site.path())
            .success()
            .stdout(predicate::str::contains("fingerprint-mismatch"));
        assert!(!site.path().join(".cache/json/page.json").exists());
    }

    #[test]
    fn interrupted_run_is_recovered() {
        let site = TempDir::new().unwrap();
        bootstrap(site.path()).success();
        fs::remove_dir_all(site.path().join("public")).unwrap();

        bootstrap(site.path())
            .success()
            .stdout(predicate::str::contains("corrupt-directory"));
        assert!(site.path().join("public/static").is_dir());
    }

    #[test]
    fn preserve_toggle_spares_download_cache() {
        let site = TempDir::new().unwrap();
        write_plugin_config(site.path(), "1.0.0");
        bootstrap(site.path()).success();
        let downloads = site.path().join(".cache/caches/downloads");
        fs::create_dir_all(&downloads).unwrap();
        fs::write(downloads.join("hero.jpg"), "jpg").unwrap();

        write_plugin_config(site.path(), "1.1.0");
        kiln()
            .env("KILN_PRESERVE_DOWNLOAD_CACHE", "true")
            .args(["bootstrap", "--site"])
            .arg(site.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("kept caches/downloads"));

        assert!(downloads.join("hero.jpg").exists());
    }

    #[test]
    fn production_build_removes_stale_pages() {
        let site = TempDir::new().unwrap();
        fs::create_dir_all(site.path().join("public/static")).unwrap();
        fs::write(site.path().join("public/index.html"), "<html>").unwrap();
        fs::write(site.path().join("public/static/logo.svg"), "<svg/>").unwrap();

        kiln()
            .args(["bootstrap", "--mode", "build", "--site"])
            .arg(site.path())
            .assert()
            .success();

        assert!(!site.path().join("public/index.html").exists());
        assert!(site.path().join("public/static/logo.svg").exists());
    }

    #[test]
    fn bootstrap_missing_site_fails_with_hint() {
        let site = TempDir::new().unwrap();
        kiln()
            .args(["bootstrap", "--site"])
            .arg(site.path().join("missing"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Site directory not found"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let site = TempDir::new().unwrap();
        fs::write(site.path().join("kiln.toml"), "[paths\ncache_dir = 1").unwrap();

        bootstrap(site.path())
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn deprecated_key_warns() {
        let site = TempDir::new().unwrap();
        fs::write(site.path().join("kiln.toml"), "[general]\npolyfill = true\n").unwrap();

        bootstrap(site.path())
            .success()
            .stderr(predicate::str::contains("deprecated"));
    }

    #[test]
    fn status_json_previews_without_writing() {
        let site = TempDir::new().unwrap();

        let output = kiln()
            .args(["status", "--format", "json", "--site"])
            .arg(site.path())
            .output()
            .unwrap();
        assert!(output.status.success());

        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(report["decision"]["reason"], "first-run");
        assert_eq!(report["decision"]["purge"], false);
        assert!(report["stored_fingerprint"].is_null());
        assert!(!site.path().join(".cache").exists());
    }

    #[test]
    fn status_table_after_bootstrap() {
        let site = TempDir::new().unwrap();
        bootstrap(site.path()).success();

        kiln()
            .args(["status", "--site"])
            .arg(site.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("keeps cache (none)"));
    }

    #[test]
    fn clean_requires_confirmation() {
        let site = TempDir::new().unwrap();
        bootstrap(site.path()).success();

        kiln()
            .args(["clean", "--site"])
            .arg(site.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Cancelled"));
        assert!(site.path().join(".cache").exists());

        kiln()
            .args(["clean", "--yes", "--site"])
            .arg(site.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Clean complete"));
        assert!(!site.path().join(".cache").exists());
        assert!(!site.path().join("public").exists());
    }

    #[test]
    fn config_path() {
        let site = TempDir::new().unwrap();
        kiln()
            .args(["config", "path", "--site"])
            .arg(site.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln.toml"));
    }

    #[test]
    fn config_show() {
        let site = TempDir::new().unwrap();
        kiln()
            .args(["config", "show", "--site"])
            .arg(site.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("cache_dir = \".cache\""));
    }

    #[test]
    fn json_logs() {
        let site = TempDir::new().unwrap();
        kiln()
            .args(["-v", "--log-format", "json", "bootstrap", "--site"])
            .arg(site.path())
            .assert()
            .success()
            .stderr(predicate::str::contains("\"level\":\"INFO\""));
    }
}
