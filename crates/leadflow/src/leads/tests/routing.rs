use crate::leads::routing::RoutingTable;

#[test]
fn keyword_rules_win_over_source_fallbacks() {
    let table = RoutingTable::standard();
    let owner = table.resolve("Microsoft 365 Business Standard", Some("google-ads"));
    assert_eq!(owner, Some("Priya Sharma"));
}

#[test]
fn source_fallback_applies_when_no_keyword_matches() {
    let table = RoutingTable::standard();
    let owner = table.resolve("Custom ERP integration", Some("referral"));
    assert_eq!(owner, Some("Priya Sharma"));
}

#[test]
fn unmatched_input_resolves_to_unassigned() {
    let table = RoutingTable::standard();
    assert_eq!(table.resolve("Custom ERP integration", Some("billboard")), None);
    assert_eq!(table.resolve("Custom ERP integration", None), None);
}

#[test]
fn resolution_is_deterministic() {
    let table = RoutingTable::standard();
    let first = table.resolve("endpoint security for 40 devices", Some("google-ads"));
    let second = table.resolve("endpoint security for 40 devices", Some("google-ads"));
    assert_eq!(first, second);
    assert_eq!(first, Some("Rohit Verma"));
}

#[test]
fn matching_is_case_insensitive() {
    let table = RoutingTable::standard();
    assert_eq!(
        table.resolve("GOOGLE WORKSPACE migration", None),
        Some("Arjun Mehta")
    );
}

#[test]
fn agent_roster_is_distinct() {
    let table = RoutingTable::standard();
    let agents = table.agents();
    let mut deduped = agents.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(agents.len(), deduped.len());
    assert!(agents.contains(&"Neha Kapoor"));
}
