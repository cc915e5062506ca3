//! Tracking the real process. Environment and working directory are shared by
//! every thread of this test binary, so each test holds `PROCESS_STATE`.

use std::env;
use std::fs;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use termcolor::{ColorSpec, NoColor, WriteColor};
use testleak::config::Config;
use testleak::{LeakCategory, LeakLog, ProcessProbe, Session, Tracker, CURRENT_TEST_VAR};

static PROCESS_STATE: Mutex<()> = Mutex::new(());

fn lock() -> MutexGuard<'static, ()> {
    PROCESS_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

#[test]
fn detects_added_env_var() {
    let _guard = lock();
    let mut t = Tracker::default();
    t.snapshot();
    env::set_var("_TL_TEST_ADD", "leaked");
    t.diff("tests/demo.rs::leaker");
    env::remove_var("_TL_TEST_ADD");

    let leaks = t.log().all();
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].category(), LeakCategory::EnvAdded);
    assert_eq!(leaks[0].key(), "_TL_TEST_ADD");
    assert_eq!(leaks[0].after(), Some("leaked"));
}

#[test]
fn detects_changed_env_var() {
    let _guard = lock();
    env::set_var("_TL_TEST_CHG", "old");
    let mut t = Tracker::default();
    t.snapshot();
    env::set_var("_TL_TEST_CHG", "new");
    t.diff("tests/demo.rs::mutator");
    env::remove_var("_TL_TEST_CHG");

    let leaks = t.log().all();
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].category(), LeakCategory::EnvChanged);
    assert_eq!(leaks[0].before(), Some("old"));
    assert_eq!(leaks[0].after(), Some("new"));
}

#[test]
fn detects_removed_env_var() {
    let _guard = lock();
    env::set_var("_TL_TEST_DEL", "present");
    let mut t = Tracker::default();
    t.snapshot();
    env::remove_var("_TL_TEST_DEL");
    t.diff("tests/demo.rs::deleter");

    let leaks = t.log().all();
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].category(), LeakCategory::EnvRemoved);
    assert_eq!(leaks[0].before(), Some("present"));
}

#[test]
fn detects_search_path_addition() {
    let _guard = lock();
    let var = "_TL_TEST_SEARCH_PATH";
    env::set_var(var, env::join_paths(["/usr/bin", "/bin"]).unwrap());
    let mut t = Tracker::for_process(ProcessProbe::new(var), Default::default());
    t.snapshot();
    let fake = "/testleak/fake/injected/path";
    env::set_var(var, env::join_paths([fake, "/usr/bin", "/bin"]).unwrap());
    t.diff("tests/demo.rs::path_polluter");
    env::remove_var(var);

    let path_leaks: Vec<_> = t
        .log()
        .all()
        .iter()
        .filter(|l| l.category() == LeakCategory::PathAdded)
        .collect();
    assert_eq!(path_leaks.len(), 1);
    assert_eq!(path_leaks[0].key(), fake);
}

#[test]
fn search_path_entry_is_one_record() {
    let _guard = lock();
    let original = env::var_os("PATH").unwrap_or_default();
    let injected = "/testleak/fake/injected/bin";
    let mut entries: Vec<PathBuf> = vec![PathBuf::from(injected)];
    entries.extend(env::split_paths(&original));

    let mut t = Tracker::default();
    t.snapshot();
    env::set_var("PATH", env::join_paths(&entries).unwrap());
    let records = t.diff("tests/demo.rs::path_prepend").to_vec();
    env::set_var("PATH", &original);

    assert_eq!(records.len(), 1, "{records:?}");
    assert_eq!(records[0].category(), LeakCategory::PathAdded);
    assert_eq!(records[0].key(), injected);
}

#[test]
fn search_path_shrinking_is_silent() {
    let _guard = lock();
    let original = env::var_os("PATH").unwrap_or_default();
    let seeded = env::join_paths(
        env::split_paths(&original).chain([PathBuf::from("/testleak/fake/temporary")]),
    )
    .unwrap();
    env::set_var("PATH", &seeded);

    let mut t = Tracker::default();
    t.snapshot();
    env::set_var("PATH", &original);
    t.diff("tests/demo.rs::path_trim");

    assert!(t.log().is_empty(), "{:?}", t.log().all());
}

#[test]
fn detects_cwd_change() {
    let _guard = lock();
    let original = env::current_dir().unwrap();
    let target = tempfile::tempdir().unwrap();
    let mut t = Tracker::default();
    t.snapshot();
    env::set_current_dir(target.path()).unwrap();
    let moved_to = env::current_dir().unwrap();
    t.diff("tests/demo.rs::chdir");
    env::set_current_dir(&original).unwrap();

    let cwd_leaks: Vec<_> = t
        .log()
        .all()
        .iter()
        .filter(|l| l.category() == LeakCategory::CwdChanged)
        .collect();
    assert_eq!(cwd_leaks.len(), 1);
    assert_eq!(cwd_leaks[0].before(), Some(original.to_str().unwrap()));
    assert_eq!(cwd_leaks[0].after(), Some(moved_to.to_str().unwrap()));
}

#[test]
fn no_false_positives() {
    let _guard = lock();
    let mut t = Tracker::default();
    t.snapshot();
    let _ = (0..1000).sum::<u64>();
    t.diff("tests/demo.rs::clean");
    assert!(t.log().is_empty());
}

#[test]
fn json_export() {
    let _guard = lock();
    let mut t = Tracker::default();
    t.snapshot();
    env::set_var("_TL_TEST_JSON", "val");
    t.diff("tests/demo.rs::json");
    env::remove_var("_TL_TEST_JSON");

    let data: serde_json::Value = serde_json::from_slice(&t.log().serialize().unwrap()).unwrap();
    let items = data.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["category"], "env_added");
    assert_eq!(items[0]["test_id"], "tests/demo.rs::json");
    assert!(items[0]["before"].is_null());
}

// ============================================================================
// SESSION
// ============================================================================

#[test]
fn session_ignores_its_own_marker() {
    let _guard = lock();
    let mut session = Session::default();
    let seen = session.run_unit("tests/demo.rs::marker", || env::var(CURRENT_TEST_VAR).ok());

    assert_eq!(seen.as_deref(), Some("tests/demo.rs::marker"));
    assert!(env::var_os(CURRENT_TEST_VAR).is_none());
    assert!(session.log().is_empty());
}

#[test]
fn session_diffs_panicking_units() {
    let _guard = lock();
    let mut session = Session::default();
    let result = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        session.run_unit("tests/demo.rs::boom", || {
            env::set_var("_TL_TEST_PANIC", "1");
            panic!("unit failed");
        })
    }));
    env::remove_var("_TL_TEST_PANIC");

    assert!(result.is_err());
    assert_eq!(session.leaks().len(), 1);
    assert_eq!(session.leaks()[0].unit_id(), "tests/demo.rs::boom");
}

#[test]
fn session_finish_writes_report_and_sets_status() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let report: PathBuf = dir.path().join("leaks.json");
    let config = Config {
        report_path: Some(report.clone()),
        fail_on_leak: true,
        ..Config::default()
    };
    let mut session = Session::new(config);
    session.run_unit("tests/demo.rs::leaker", || env::set_var("_TL_TEST_REPORT", "x"));
    session.run_unit("tests/demo.rs::clean", || ());
    env::remove_var("_TL_TEST_REPORT");

    let mut out = NoColor::new(Vec::new());
    let status = session.finish(&mut out);
    let text = String::from_utf8(out.into_inner()).unwrap();

    assert!(status.should_fail());
    assert_eq!(status.exit_code(), 1);
    assert!(status.report_error.is_none());
    assert!(text.contains("1 leak(s) detected!"));
    assert!(text.contains("Report written to"));

    let written = LeakLog::deserialize(&fs::read(&report).unwrap()).unwrap();
    assert_eq!(&written, session.log());
}

#[test]
fn sessions_sharing_a_report_keep_every_record() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("leaks.json");
    let config = Config {
        report_path: Some(report.clone()),
        ..Config::default()
    };

    let mut first = Session::new(config.clone());
    first.run_unit("src/lib.rs::first", || env::set_var("_TL_TEST_FIRST", "1"));
    first.finish(&mut NoColor::new(Vec::new()));

    let mut second = Session::new(config);
    second.run_unit("tests/more.rs::second", || env::set_var("_TL_TEST_SECOND", "2"));
    second.finish(&mut NoColor::new(Vec::new()));
    env::remove_var("_TL_TEST_FIRST");
    env::remove_var("_TL_TEST_SECOND");

    let written = LeakLog::deserialize(&fs::read(&report).unwrap()).unwrap();
    let units: Vec<_> = written.group_by_unit().iter().map(|g| g.unit_id.to_string()).collect();
    assert_eq!(units, vec!["src/lib.rs::first", "tests/more.rs::second"]);
}

#[test]
fn report_failure_does_not_change_status() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        report_path: Some(dir.path().join("no-such-dir").join("leaks.json")),
        ..Config::default()
    };
    let mut session = Session::new(config);
    session.run_unit("tests/demo.rs::clean", || ());

    let status = session.finish(&mut NoColor::new(Vec::new()));
    assert!(status.is_clean());
    assert_eq!(status.exit_code(), 0);
    assert!(status.report_error.is_some());
}

/// A terminal that has gone away: every write fails.
struct ClosedTerminal;

impl io::Write for ClosedTerminal {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"))
    }
}

impl WriteColor for ClosedTerminal {
    fn supports_color(&self) -> bool {
        false
    }

    fn set_color(&mut self, _: &ColorSpec) -> io::Result<()> {
        Ok(())
    }

    fn reset(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn closed_terminal_still_writes_report_and_status() {
    let _guard = lock();
    let dir = tempfile::tempdir().unwrap();
    let report = dir.path().join("leaks.json");
    let config = Config {
        report_path: Some(report.clone()),
        fail_on_leak: true,
        ..Config::default()
    };
    let mut session = Session::new(config);
    session.run_unit("tests/demo.rs::quiet", || env::set_var("_TL_TEST_CLOSED", "1"));
    env::remove_var("_TL_TEST_CLOSED");

    let status = session.finish(&mut ClosedTerminal);

    assert_eq!(status.exit_code(), 1);
    assert!(status.report_error.is_none());
    assert_eq!(read_units(&report), vec!["tests/demo.rs::quiet"]);
}

fn read_units(report: &std::path::Path) -> Vec<String> {
    let written = LeakLog::deserialize(&fs::read(report).unwrap()).unwrap();
    written.all().iter().map(|r| r.unit_id().to_string()).collect()
}
