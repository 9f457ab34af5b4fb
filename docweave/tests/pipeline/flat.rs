//! Flat markup output, snapshotted inline.

use crate::common::pipeline;
use insta::assert_snapshot;

fn flat(markdown: &str) -> String {
    pipeline()
        .to_flat(markdown)
        .expect("flat conversion to succeed")
        .markup
}

#[test]
fn panel_with_marks() {
    assert_snapshot!(flat(":::panel type=\"warning\"\nCareful **now**\n:::"), @r"
    {warning}
    Careful *now*
    {warning}
    ");
}

#[test]
fn expand_with_list() {
    assert_snapshot!(flat(":::expand title=\"More\"\n- a\n- b\n:::"), @r"
    {expand:More}
    * a
    * b
    {expand}
    ");
}

#[test]
fn inline_plugins() {
    assert_snapshot!(
        flat("Ping @alice: {status:color=green}Done{/status}"),
        @"Ping [~alice]: *[DONE]*"
    );
    assert_snapshot!(flat("Due {date:2024-03-15} :tada:"), @"Due 2024-03-15 🎉");
}

#[test]
fn heading_list_and_code() {
    assert_snapshot!(flat("## Setup\n\n1. install\n2. run\n\n```sh\nmake\n```"), @r"
    h2. Setup

    # install
    # run

    {code:sh}
    make
    {code}
    ");
}

#[test]
fn unknown_plugin_syntax_passes_through() {
    assert_snapshot!(flat("Unknown :notanemoji: stays"), @"Unknown :notanemoji: stays");
}
