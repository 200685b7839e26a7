use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn entry(name: &str, text: &str, links: &[&str]) -> Value {
    json!({
        "data": {"name": name, "text": text, "links": links},
        "admin": {"lastUsed": 1_700_000_000.0, "timesUsed": 1},
    })
}

fn write_cache(dir: &Path, pages: Vec<Value>) -> std::path::PathBuf {
    let mut snapshot = serde_json::Map::new();
    for page in pages {
        let name = page["data"]["name"].as_str().unwrap().to_string();
        snapshot.insert(name, page);
    }
    let path = dir.join("pagecache.json");
    fs::write(&path, serde_json::to_string_pretty(&Value::Object(snapshot)).unwrap()).unwrap();
    path
}

#[allow(deprecated)]
fn wikipath(cache: &Path) -> Command {
    let mut cmd = Command::cargo_bin("wikipath").expect("binary");
    cmd.arg("--offline")
        .arg("--quiet")
        .arg("--seed")
        .arg("7")
        .arg("--cache-file")
        .arg(cache);
    cmd
}

#[test]
fn direct_link_prints_two_step_route() {
    let temp = tempdir().unwrap();
    let cache = write_cache(
        temp.path(),
        vec![
            entry("Love", "love emotion affection", &["Apple", "Emotion"]),
            entry("Apple", "apple fruit tree", &[]),
        ],
    );

    wikipath(&cache)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Route:\n"))
        .stdout(predicate::str::contains("1.. Love"))
        .stdout(predicate::str::contains("2.. Apple"))
        .stdout(predicate::str::contains("en.wikipedia.org/wiki/Apple"));
}

#[test]
fn greedy_route_is_reported_as_json() {
    let temp = tempdir().unwrap();
    let cache = write_cache(
        temp.path(),
        vec![
            entry("Love", "love feeling warmth", &["Car", "Banana"]),
            entry("Car", "car vehicle wheels engine", &["Love"]),
            entry("Banana", "banana sweet edible fruit", &["Apple"]),
            entry("Apple", "apple sweet edible fruit trees", &[]),
        ],
    );

    let output = wikipath(&cache).arg("--json").output().expect("run");
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let names: Vec<&str> = body["route"]
        .as_array()
        .unwrap()
        .iter()
        .map(|step| step["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Love", "Banana", "Apple"]);
    assert_eq!(body["hops"], 1);
}

#[test]
fn language_selects_the_wikipedia_edition() {
    let temp = tempdir().unwrap();
    let cache = write_cache(
        temp.path(),
        vec![
            entry("Liebe", "liebe gefühl", &["Apfel"]),
            entry("Apfel", "apfel frucht", &[]),
        ],
    );

    wikipath(&cache)
        .args(["--language", "de", "--start", "Liebe", "--end", "Apfel"])
        .assert()
        .success()
        .stdout(predicate::str::contains("de.wikipedia.org/wiki/Apfel"));
}

#[test]
fn exhausted_search_fails_with_message() {
    let temp = tempdir().unwrap();
    let cache = write_cache(
        temp.path(),
        vec![
            entry("Alpha", "alpha words", &["Beta"]),
            entry("Beta", "beta words", &["Alpha"]),
            entry("Omega", "omega words", &[]),
        ],
    );

    wikipath(&cache)
        .args(["--start", "Alpha", "--end", "Omega"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("All possibilities exhausted"));
}

#[test]
fn uncached_target_is_not_found_offline() {
    let temp = tempdir().unwrap();
    let cache = write_cache(temp.path(), vec![entry("Love", "love", &["Apple"])]);

    wikipath(&cache)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Target page not found: Apple"));
}

#[test]
fn cache_is_saved_after_a_run() {
    let temp = tempdir().unwrap();
    let cache = write_cache(
        temp.path(),
        vec![
            entry("Love", "love", &["Apple"]),
            entry("Apple", "apple", &[]),
        ],
    );

    wikipath(&cache).assert().success();

    let saved: Value = serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
    assert_eq!(saved["Love"]["admin"]["timesUsed"], 2);
    assert_eq!(saved["Apple"]["admin"]["timesUsed"], 2);
}

#[test]
fn corrupt_cache_aborts_before_searching() {
    let temp = tempdir().unwrap();
    let cache = temp.path().join("pagecache.json");
    fs::write(&cache, "{ not json").unwrap();

    wikipath(&cache)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load page cache"));
    assert_eq!(fs::read_to_string(&cache).unwrap(), "{ not json");
}

#[test]
#[allow(deprecated)]
fn help_lists_search_flags() {
    Command::cargo_bin("wikipath")
        .expect("binary")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-download"))
        .stdout(predicate::str::contains("--cache-backend"));
}
