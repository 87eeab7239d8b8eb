use super::*;
use crate::machine::build_record;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("mark script executable");
    path
}

fn records(names: &[&str]) -> Vec<MachineSpec> {
    names
        .iter()
        .map(|name| build_record(name, "ubuntu", 1.0, 2.0))
        .collect()
}

#[test]
fn invokes_script_once_per_record_in_order() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let calls = temp.path().join("calls.txt");
    let script = write_script(
        temp.path(),
        "install.sh",
        &format!("echo \"$#:$1\" >> '{}'", calls.display()),
    );
    let mut console = Vec::new();

    let summary = install_services(&script, &records(&["web01", "db1", "web01"]), &mut console)
        .expect("run install pass");

    assert_eq!(
        summary,
        InstallSummary {
            succeeded: 3,
            failed: 0
        }
    );
    let calls = std::fs::read_to_string(&calls).expect("read calls");
    assert_eq!(calls, "1:web01\n1:db1\n1:web01\n");
    let console = String::from_utf8(console).expect("console is UTF-8");
    assert!(console.contains("Trying to install services on 'db1'.."));
}

#[test]
fn failures_do_not_stop_remaining_records() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let script = write_script(
        temp.path(),
        "install.sh",
        "if [ \"$1\" = \"bad\" ]; then echo 'nginx missing' >&2; exit 3; fi\necho ok",
    );
    let mut console = Vec::new();

    let summary = install_services(&script, &records(&["a1", "bad", "c3"]), &mut console)
        .expect("run install pass");

    assert_eq!(
        summary,
        InstallSummary {
            succeeded: 2,
            failed: 1
        }
    );
}

struct ClosedConsole;

impl Write for ClosedConsole {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn closed_console_does_not_stop_remaining_records() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let calls = temp.path().join("calls.txt");
    let script = write_script(
        temp.path(),
        "install.sh",
        &format!("echo \"$1\" >> '{}'", calls.display()),
    );

    let summary = install_services(&script, &records(&["web01", "db1"]), &mut ClosedConsole)
        .expect("console failures are not fatal");

    assert_eq!(summary.succeeded, 2);
    assert_eq!(
        std::fs::read_to_string(&calls).expect("read calls"),
        "web01\ndb1\n"
    );
}

#[test]
fn missing_script_counts_every_record_as_failed() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let script = temp.path().join("absent.sh");
    let mut console = Vec::new();

    let summary = install_services(&script, &records(&["web01", "db1"]), &mut console)
        .expect("spawn failures are not fatal");

    assert_eq!(
        summary,
        InstallSummary {
            succeeded: 0,
            failed: 2
        }
    );
}

#[test]
fn run_install_reads_records_from_the_store() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let mut settings = Settings::defaults(temp.path());
    let calls = temp.path().join("calls.txt");
    settings.script_path = write_script(
        temp.path(),
        "install.sh",
        &format!("echo \"$1\" >> '{}'", calls.display()),
    );
    let store = settings.open_store();
    for record in records(&["web01", "db1"]) {
        store.append(&record).expect("append record");
    }
    let mut console = Vec::new();

    let summary = run_install(&settings, &mut console).expect("run install");

    assert_eq!(summary.succeeded, 2);
    assert_eq!(
        std::fs::read_to_string(&calls).expect("read calls"),
        "web01\ndb1\n"
    );
}

#[test]
fn run_install_with_empty_store_skips_the_script() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let settings = Settings::defaults(temp.path());
    let mut console = Vec::new();

    let summary = run_install(&settings, &mut console).expect("run install");

    assert_eq!(summary, InstallSummary::default());
    let console = String::from_utf8(console).expect("console is UTF-8");
    assert!(console.contains("No provisioned machines found."));
}

#[test]
fn multi_line_output_is_joined_for_the_log() {
    assert_eq!(
        single_line("Installing nginx...\n\n  done  \n"),
        "Installing nginx...; done"
    );
}
