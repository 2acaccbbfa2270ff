use crate::prelude::*;

#[test]
fn top_level_help_lists_the_four_subcommands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("start")
        .stdout_has("status")
        .stdout_has("cancel")
        .stdout_has("recover");
}

#[test]
fn recover_help_lists_the_three_actions() {
    cli()
        .args(&["recover", "--help"])
        .passes()
        .stdout_has("retry")
        .stdout_has("skip")
        .stdout_has("abort");
}

#[test]
fn unknown_subcommand_fails_with_a_usage_error() {
    cli().args(&["frobnicate"]).fails().stderr_has("error");
}
