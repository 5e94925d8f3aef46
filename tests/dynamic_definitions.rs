//! End-to-end tests for dynamic definitions compiled through a project
//!
//! Each test loads text into a `ProjectIndex` backed by a `MemoryStore` and
//! checks what the compiler wrote back.

use nodetext::nodetext::dynamic::{
    phase, Accumulator, CompileContext, DirectiveOp, DirectiveRegistry, Outcome,
};
use nodetext::nodetext::error::{CompileError, DirectiveError, ProjectError};
use nodetext::nodetext::project::{MemoryStore, ProjectIndex};
use nodetext::nodetext::Settings;
use std::fs;
use std::path::Path;

fn read_sample(name: &str) -> String {
    fs::read_to_string(format!("docs/samples/{name}")).expect("Failed to read sample document")
}

fn load(files: &[(&str, &str)]) -> ProjectIndex {
    let mut store = MemoryStore::new();
    for (path, text) in files {
        store = store.with_file(*path, text);
    }
    let mut index = ProjectIndex::new(store, Settings::default());
    index.load().expect("project to load");
    index
}

fn read(index: &ProjectIndex, path: &str) -> String {
    index.store().read_text(Path::new(path)).expect("file to exist")
}

fn interior(index: &ProjectIndex, id: &str) -> String {
    index.get_node(id).expect("node").contents().to_string()
}

#[test]
fn test_three_most_recent_done_entries() {
    let index = load(&[("journal.txt", &read_sample("journal.txt"))]);
    assert_eq!(
        interior(&index, "Latest"),
        "id::Latest\n\
         Renew passport | Renew passport >\n\
         Plan the trip | Plan the trip >\n\
         Call the bank | Call the bank >\n"
    );
    assert!(index.errors().is_empty());
}

#[test]
fn test_editing_a_source_node_updates_the_target() {
    let mut index = load(&[("journal.txt", &read_sample("journal.txt"))]);
    let edited = read(&index, "journal.txt").replace("date::<2024-01-05>", "date::<2024-05-01>");
    index
        .set_buffer_contents(Path::new("journal.txt"), &edited)
        .unwrap();

    assert!(interior(&index, "Latest").starts_with("id::Latest\nMorning run | Morning run >\n"));
    assert!(!interior(&index, "Latest").contains("Call the bank"));
}

#[test]
fn test_output_is_stable_across_reloads() {
    let index = load(&[("journal.txt", &read_sample("journal.txt"))]);
    let compiled = read(&index, "journal.txt");

    let reloaded = load(&[("journal.txt", &compiled)]);
    assert_eq!(read(&reloaded, "journal.txt"), compiled);
}

#[test]
fn test_targets_in_other_files() {
    let index = load(&[
        ("index.txt", "Index\n{ Open work\n[[INCLUDE(status = open) SORT(title) ID(Board)]] }"),
        ("tasks.txt", "Tasks\n{ Paint\nstatus::open }\n{ Sand\nstatus::open }\n{ Prime\nstatus::done }"),
        ("board.txt", "Boards\n{ Board }"),
    ]);
    assert_eq!(
        read(&index, "board.txt"),
        "Boards\n{id::Board\nPaint | Paint >\nSand | Sand >\n}"
    );
}

#[test]
fn test_count_title_and_spacing() {
    let index = load(&[(
        "n.txt",
        "Root\n{ Stats\n[[INCLUDE(status = open) COUNT() TITLE(Open) SPACES(2) ID(Out)]] }\n\
         { A\nstatus::open }\n{ B\nstatus::open }\n{ Out }",
    )]);
    assert_eq!(interior(&index, "Out"), "id::Out\n  Open\n  2\n");
}

#[test]
fn test_freeze_leaves_target_alone() {
    let text = "Root\n{ Src\n[[FREEZE() INCLUDE(all) ID(Kept)]] }\n{ Kept\nhand written }";
    let index = load(&[("f.txt", text)]);
    assert_eq!(read(&index, "f.txt"), text);
}

#[test]
fn test_exclude_removes_from_selection() {
    let index = load(&[(
        "e.txt",
        "Root\n{ Src\n[[INCLUDE(kind = fruit) EXCLUDE(color = green) ID(Out)]] }\n\
         { Apple\nkind::fruit\ncolor::red }\n{ Lime\nkind::fruit\ncolor::green }\n{ Out }",
    )]);
    assert_eq!(interior(&index, "Out"), "id::Out\nApple | Apple >\n");
}

#[test]
fn test_parent_target_is_rejected() {
    let text = "Root\n{ Parent\n{ Child\n[[INCLUDE(all) ID(@parent)]] } }";
    let index = load(&[("p.txt", text)]);
    assert_eq!(read(&index, "p.txt"), text);
    assert!(index.errors().iter().any(|err| matches!(
        err,
        ProjectError::Compile(CompileError::InvalidTarget { target, .. }) if target == "Parent"
    )));
}

#[test]
fn test_unknown_directive_is_reported_per_file() {
    let index = load(&[("u.txt", "Root\n{ Src\n[[EXPLODE(now) ID(Out)]] }\n{ Out }")]);
    assert!(index.errors().iter().any(|err| matches!(
        err,
        ProjectError::Directive { source: DirectiveError::UnknownDirective(name), .. }
            if name == "EXPLODE"
    )));
    assert_eq!(interior(&index, "Out"), " Out ");
}

/// Reverses the selection; registered under a custom name
#[derive(Debug, Default)]
struct Reverse;

impl DirectiveOp for Reverse {
    fn name(&self) -> &'static str {
        "REVERSE"
    }

    fn phase(&self) -> u32 {
        phase::LIMIT + 5
    }

    fn parse_argument_string(&mut self, _argument: &str) -> Result<(), DirectiveError> {
        Ok(())
    }

    fn dynamic_output(&self, accumulator: &Accumulator, _context: &CompileContext) -> Outcome {
        let mut next = accumulator.clone();
        next.nodes.reverse();
        Outcome::Replace(next)
    }
}

fn reverse() -> Box<dyn DirectiveOp> {
    Box::new(Reverse)
}

#[test]
fn test_custom_directive_from_registry() {
    let mut registry = DirectiveRegistry::with_defaults();
    registry.register("REVERSE", reverse);

    let store = MemoryStore::new().with_file(
        "r.txt",
        "Root\n{ Src\n[[INCLUDE(n ? x) SORT(n) reverse() SHOW($id,) ID(Out)]] }\n\
         { One\nn::x1 }\n{ Two\nn::x2 }\n{ Three\nn::x3 }\n{ Out }",
    );
    let mut index = ProjectIndex::with_registry(store, Settings::default(), registry);
    index.load().unwrap();
    assert_eq!(interior(&index, "Out"), "id::Out\nThree,Two,One,");
}
