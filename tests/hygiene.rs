//! Hygiene: budget scans over the library's production sources.
//!
//! Each budget names the source patterns it counts and a ceiling (zero for
//! all of them). Test files (`*_test.rs`) are not scanned. A budget only
//! moves down.

use std::fs;
use std::path::Path;

struct Budget {
    name: &'static str,
    patterns: &'static [&'static str],
    max: usize,
    hint: &'static str,
}

// Panics crash the page's wasm instance.
const UNWRAP: Budget = Budget { name: ".unwrap()", patterns: &[".unwrap()"], max: 0, hint: "propagate or log" };
const EXPECT: Budget = Budget { name: ".expect()", patterns: &[".expect("], max: 0, hint: "propagate or log" };
const PANICS: Budget = Budget {
    name: "panicking macros",
    patterns: &["panic!(", "unreachable!(", "todo!(", "unimplemented!("],
    max: 0,
    hint: "return a GuardError or StorageError",
};

// Storage failures are logged, never dropped.
const SILENT_DISCARD: Budget = Budget {
    name: "silent discards",
    patterns: &["let _ =", ".ok()"],
    max: 0,
    hint: "match the error and log it",
};

const ALLOW_DEAD_CODE: Budget =
    Budget { name: "#[allow(dead_code)]", patterns: &["#[allow(dead_code)]"], max: 0, hint: "delete it" };

// Everything runs on one event loop.
const SYNC_PRIMITIVES: Budget =
    Budget { name: "Arc/Mutex", patterns: &["Mutex<", "Arc<"], max: 0, hint: "use Rc/RefCell" };

// Handler slots (`el.oninput = ...`) clobber the page's own handlers.
const HANDLER_SLOTS: Budget = Budget {
    name: "DOM handler slots",
    patterns: &["set_oninput(", "set_onchange(", "set_onsubmit(", "set_onreset("],
    max: 0,
    hint: "use add_event_listener",
};

fn sources(dir: &Path, out: &mut Vec<(String, String)>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            sources(&path, out);
            continue;
        }
        let name = path.to_string_lossy().to_string();
        if !name.ends_with(".rs") || name.ends_with("_test.rs") {
            continue;
        }
        if let Ok(content) = fs::read_to_string(&path) {
            out.push((name, content));
        }
    }
}

fn check(budget: &Budget) {
    let mut files = Vec::new();
    sources(Path::new("src"), &mut files);
    assert!(!files.is_empty(), "no sources found under src/");

    let hits: Vec<(String, usize)> = files
        .iter()
        .map(|(path, content)| {
            let count = content
                .lines()
                .filter(|line| budget.patterns.iter().any(|p| line.contains(p)))
                .count();
            (path.clone(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();
    let found: usize = hits.iter().map(|(_, c)| c).sum();
    let listing = hits.iter().map(|(p, c)| format!("  {p}: {c}")).collect::<Vec<_>>().join("\n");
    assert!(
        found <= budget.max,
        "{} budget exceeded: found {found}, max {}. {}.\n{listing}",
        budget.name,
        budget.max,
        budget.hint
    );
}

#[test]
fn unwrap_budget() {
    check(&UNWRAP);
}

#[test]
fn expect_budget() {
    check(&EXPECT);
}

#[test]
fn panic_budget() {
    check(&PANICS);
}

#[test]
fn silent_discard_budget() {
    check(&SILENT_DISCARD);
}

#[test]
fn allow_dead_code_budget() {
    check(&ALLOW_DEAD_CODE);
}

#[test]
fn sync_primitive_budget() {
    check(&SYNC_PRIMITIVES);
}

#[test]
fn handler_slot_budget() {
    check(&HANDLER_SLOTS);
}
