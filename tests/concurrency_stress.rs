mod support;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use assert_cmd::cargo::cargo_bin;
use trk::change::ChangeLog;
use trk::company::CompanyStore;
use trk::error::Error;
use trk::lock::FileLock;
use trk::milestone::MilestoneStore;
use trk::nudge::NudgeLog;
use trk::project::{NewProject, ProjectStore};
use trk::task::{NewTask, TaskStore};
use trk::workflow::{TaskKind, TaskPriority, TaskStatus};
use tempfile::TempDir;

use support::TestTracker;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(25);
const READY_TIMEOUT: Duration = Duration::from_secs(2);

fn trk_bin() -> PathBuf {
    cargo_bin("trk")
}

fn spawn_trk(root: &Path, args: &[String], actor: Option<&str>) -> std::io::Result<Child> {
    let mut cmd = Command::new(trk_bin());
    cmd.current_dir(root);
    cmd.env_remove("TRK_ACTOR");
    if let Some(actor) = actor {
        cmd.env("TRK_ACTOR", actor);
    }
    cmd.args(args);
    cmd.spawn()
}

fn seed_milestone(tracker: &TestTracker) -> Result<String, Box<dyn std::error::Error>> {
    let storage = tracker.storage();
    let company = CompanyStore::new(storage.clone()).create("Acme")?;
    let project = ProjectStore::new(storage.clone()).create(NewProject {
        name: "Platform".to_string(),
        company: company.id,
        ..NewProject::default()
    })?;
    let milestone = MilestoneStore::new(storage).create("Beta", &project.id, None)?;
    Ok(milestone.id)
}

fn seed_task(tracker: &TestTracker) -> Result<String, Box<dyn std::error::Error>> {
    let milestone = seed_milestone(tracker)?;
    let task = TaskStore::new(tracker.storage()).create(NewTask {
        name: "Shared".to_string(),
        description: String::new(),
        milestone,
        status: TaskStatus::default(),
        priority: TaskPriority::default(),
        kind: TaskKind::default(),
        duration: 1,
    })?;
    Ok(task.id)
}

#[test]
fn lock_helper_process() {
    if std::env::var("TRK_LOCK_HELPER").ok().as_deref() != Some("1") {
        return;
    }

    let path = std::env::var("TRK_LOCK_PATH").expect("TRK_LOCK_PATH");
    let ready = std::env::var("TRK_LOCK_READY").expect("TRK_LOCK_READY");

    let _lock = FileLock::acquire(&path, 5000).expect("lock helper acquire");
    std::fs::write(&ready, "ready").expect("ready write");
    thread::sleep(Duration::from_secs(2));
}

#[test]
fn file_lock_timeout_when_held_by_other_process() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let lock_path = dir.path().join("lockfile.lock");
    let ready_path = dir.path().join("ready");

    let mut child = Command::new(std::env::current_exe()?)
        .args(["--exact", "lock_helper_process", "--nocapture"])
        .env("TRK_LOCK_HELPER", "1")
        .env("TRK_LOCK_PATH", lock_path.display().to_string())
        .env("TRK_LOCK_READY", ready_path.display().to_string())
        .spawn()?;

    let start = Instant::now();
    while !ready_path.exists() {
        if start.elapsed() > READY_TIMEOUT {
            let _ = child.kill();
            return Err("lock helper not ready".into());
        }
        thread::sleep(READY_POLL_INTERVAL);
    }

    match FileLock::acquire(&lock_path, 100) {
        Ok(_) => return Err("expected lock timeout".into()),
        Err(err) => assert!(matches!(err, Error::LockFailed(_))),
    }

    child.wait()?;
    Ok(())
}

#[test]
fn task_creation_is_safe_under_parallel_calls() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::init()?;
    let milestone = seed_milestone(&tracker)?;

    let root = tracker.path().to_path_buf();
    let bin = Arc::new(trk_bin());
    let count = 4;

    let mut handles = Vec::new();
    for idx in 0..count {
        let root = root.clone();
        let bin = Arc::clone(&bin);
        let milestone = milestone.clone();
        let name = format!("task-{idx}");
        handles.push(thread::spawn(move || {
            Command::new(bin.as_ref())
                .current_dir(&root)
                .args(["task", "new", &name, "--milestone", &milestone])
                .status()
        }));
    }

    for handle in handles {
        let status = handle.join().expect("join thread")?;
        assert!(status.success());
    }

    let tasks = TaskStore::new(tracker.storage()).list(&Default::default())?;
    assert_eq!(tasks.len(), count);

    let ids: HashSet<_> = tasks.iter().map(|task| task.id.as_str()).collect();
    assert_eq!(ids.len(), count);

    Ok(())
}

#[test]
fn concurrent_saves_keep_every_record_and_one_final_state(
) -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::init()?;
    let task_id = seed_task(&tracker)?;

    let root = tracker.path().to_path_buf();
    let count = 4;

    let mut handles = Vec::new();
    for idx in 0..count {
        let root = root.clone();
        let task_id = task_id.clone();
        let actor = format!("writer-{idx}");
        let duration = format!("{}", 10 + idx);
        handles.push(thread::spawn(move || {
            let args = vec![
                "task".to_string(),
                "edit".to_string(),
                task_id,
                "--duration".to_string(),
                duration,
            ];
            spawn_trk(&root, &args, Some(&actor)).and_then(|mut child| child.wait())
        }));
    }

    for handle in handles {
        let status = handle.join().expect("join thread")?;
        assert!(status.success());
    }

    // Every save appended its record under the log lock.
    let records = ChangeLog::new(tracker.storage()).for_task(&task_id)?;
    let duration_records: Vec<_> = records
        .iter()
        .filter(|record| record.field.as_str() == "duration")
        .collect();
    assert_eq!(duration_records.len(), count);

    let seqs: HashSet<_> = duration_records.iter().map(|record| record.seq).collect();
    assert_eq!(seqs.len(), count);

    let written: HashSet<_> = duration_records
        .iter()
        .filter_map(|record| record.new_value.as_deref())
        .collect();
    for idx in 0..count {
        assert!(written.contains(format!("{}", 10 + idx).as_str()));
    }

    // The registry keeps whichever save wrote last.
    let task = TaskStore::new(tracker.storage()).get(&task_id)?;
    assert!((10..10 + count as i64).contains(&task.duration));

    Ok(())
}

#[test]
fn nudge_append_under_contention() -> Result<(), Box<dyn std::error::Error>> {
    let tracker = TestTracker::init()?;
    let task_id = seed_task(&tracker)?;

    let root = tracker.path().to_path_buf();
    let count = 4;

    let mut handles = Vec::new();
    for idx in 0..count {
        let root = root.clone();
        let task_id = task_id.clone();
        let actor = format!("nudger-{idx}");
        handles.push(thread::spawn(move || {
            let args = vec!["task".to_string(), "nudge".to_string(), task_id];
            spawn_trk(&root, &args, Some(&actor)).and_then(|mut child| child.wait())
        }));
    }

    for handle in handles {
        let status = handle.join().expect("join thread")?;
        assert!(status.success());
    }

    let nudges = NudgeLog::new(tracker.storage()).for_task(&task_id)?;
    assert_eq!(nudges.len(), count);

    let actors: HashSet<_> = nudges.iter().map(|nudge| nudge.actor.as_str()).collect();
    assert_eq!(actors.len(), count);

    Ok(())
}
