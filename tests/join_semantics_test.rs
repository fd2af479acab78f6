// ==========================================
// Join semantics tests
// ==========================================
// Owner resolution and folding on hand-built batches, including
// rows the per-batch key filter would normally keep out.
// ==========================================

use kbo_loader::domain::{CodeEntry, Diagnostics, Headers, OwnerKind, RawRow, SourceFile, WarningKind};
use kbo_loader::importer::child_processor::distribute;
use kbo_loader::importer::{
    attach_branches, attach_establishments, AddressProcessor, BatchArena, CodeLookup, CodeResolver,
    DenominationProcessor, EntityBuilder,
};

fn rows(header: &[&str], values: &[&[&str]]) -> Vec<RawRow> {
    let headers: Headers = header.iter().map(|h| h.to_string()).collect();
    values
        .iter()
        .enumerate()
        .map(|(i, row)| RawRow::new(headers.clone(), row.iter().map(|v| v.to_string()).collect(), i as u64 + 2))
        .collect()
}

fn codes() -> CodeResolver {
    CodeResolver::from_entries(
        vec![
            CodeEntry::new("Status", "01", "FR", "Actif"),
            CodeEntry::new("TypeOfAddress", "REGO", "FR", "Siège"),
        ],
        "FR",
    )
}

fn arena(codes: &CodeResolver) -> (BatchArena, Diagnostics) {
    let builder = EntityBuilder::new(codes);
    BatchArena::build(
        &builder,
        &rows(&["EnterpriseNumber", "Status"], &[&["E1", "01"], &["E2", "01"]]),
        &rows(
            &["EstablishmentNumber", "StartDate", "EnterpriseNumber"],
            &[&["S1", "", "E1"], &["S9", "", "E9"]],
        ),
        &rows(&["Id", "StartDate", "EnterpriseNumber"], &[&["B1", "", "E2"]]),
    )
}

#[test]
fn test_orphan_child_produces_one_warning_and_no_attachment() {
    let codes = codes();
    let (mut arena, _) = arena(&codes);
    let addresses = rows(
        &["EntityNumber", "TypeOfAddress", "Zipcode"],
        &[&["E1", "REGO", "9000"], &["999999", "REGO", "1000"]],
    );

    let outcome = {
        let owners = &arena;
        distribute(&AddressProcessor, &addresses, &codes, &|key: &str| owners.resolve_owner(key))
    };
    let warnings = outcome.diagnostics.into_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::OrphanChild);
    assert_eq!(warnings[0].key, "999999");
    assert_eq!(warnings[0].line, Some(3));

    assert_eq!(arena.apply(outcome.attachments), 1);
    let e1 = arena.enterprises.get(0).unwrap();
    assert_eq!(e1.children.addresses[0].zipcode.as_deref(), Some("9000"));
    assert_eq!(e1.children.addresses[0].type_of_address.as_deref(), Some("Siège"));
}

#[test]
fn test_lookup_order_enterprise_establishment_branch() {
    let codes = codes();
    let (arena, _) = arena(&codes);
    assert_eq!(arena.resolve_owner("E2").unwrap().kind, OwnerKind::Enterprise);
    assert_eq!(arena.resolve_owner("S1").unwrap().kind, OwnerKind::Establishment);
    assert_eq!(arena.resolve_owner("B1").unwrap().kind, OwnerKind::Branch);
    assert_eq!(codes.describe("Status", "01"), Some("Actif"));
}

#[test]
fn test_orphan_establishment_is_dropped_not_emitted() {
    let codes = codes();
    let (arena, build_warnings) = arena(&codes);
    assert!(build_warnings.is_empty());

    let mut enterprises = arena.enterprises;
    let mut diagnostics = Diagnostics::new();
    assert_eq!(attach_establishments(&mut enterprises, arena.establishments, &mut diagnostics), 1);
    assert_eq!(attach_branches(&mut enterprises, arena.branches, &mut diagnostics), 1);

    let warnings = diagnostics.into_warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].kind, WarningKind::OrphanEstablishment);
    assert_eq!(warnings[0].key, "S9");
    assert_eq!(warnings[0].source, SourceFile::Establishment);
    // same file context as child warnings: physical line of the S9 row
    assert_eq!(warnings[0].line, Some(3));

    let documents: Vec<_> = enterprises.into_entries().map(|(_, doc)| doc).collect();
    assert_eq!(documents.len(), 2);
    assert!(documents[0].establishments.contains_key("S1"));
    assert!(documents[1].branches.contains_key("B1"));
    assert!(documents.iter().all(|doc| !doc.establishments.contains_key("S9")));
}

#[test]
fn test_textual_key_collision_resolves_by_file_of_origin() {
    let codes = codes();
    let builder = EntityBuilder::new(&codes);
    // a branch whose id equals an enterprise number
    let (mut arena, _) = BatchArena::build(
        &builder,
        &rows(&["EnterpriseNumber"], &[&["X1"]]),
        &[],
        &rows(&["Id", "StartDate", "EnterpriseNumber"], &[&["X1", "", "X1"]]),
    );
    let denominations = rows(&["EntityNumber", "Denomination"], &[&["X1", "ACME"]]);

    let outcome = {
        let owners = &arena;
        distribute(&DenominationProcessor, &denominations, &codes, &|key: &str| owners.resolve_owner(key))
    };
    assert_eq!(arena.apply(outcome.attachments), 1);

    let mut enterprises = arena.enterprises;
    let mut diagnostics = Diagnostics::new();
    attach_branches(&mut enterprises, arena.branches, &mut diagnostics);

    let doc = enterprises.get(0).unwrap();
    // enterprise wins the lookup; the branch keeps its own empty containers
    assert_eq!(doc.children.denominations.len(), 1);
    assert!(doc.branches["X1"].children.denominations.is_empty());
}
