use proptest::prelude::*;

use crate::bag::Arg;
use crate::platform::memory::Fixtures;
use crate::{Engine, Settings};

fn engine() -> Engine {
    Engine::new(Settings::default(), Fixtures::default().into_backends()).unwrap()
}

#[test]
fn command_examples_matching() {
    // Array of (expected_grammar, input_string)
    let cases: Vec<(&str, &str)> = vec![
        ("list campaigns", "/mgid list"),
        ("list campaigns", "/mgid camps 1023198"),
        ("list campaigns", "/zeropark list all"),
        ("list campaigns", "/thrive list 10013"),
        ("campaign stats", "/mgid stats"),
        ("campaign stats", "/zeropark stats 1023198 7d"),
        ("campaign stats", "/MGID Stats all 1w"),
        ("campaign stats", "/zeropark stats 0f8fad5b-d9cb-469f-a165-70867728950e"),
        ("campaign stats", "/thrive stats all yesterday"),
        ("campaign spent", "/mgid spent all yesterday /fields:id,spent"),
        ("campaign spent", "  /mgid   spent   "),
        ("campaign bot traffic", "/mgid bot-traffic"),
        ("campaign bot traffic", "/zeropark bot-traffic 12 30d /ie"),
        ("traffic sources", "/thrive sources"),
        ("traffic sources", "/thrive sources 30d --limit 3"),
        ("widgets top", "/mgid widgets-top 1023198"),
        ("widgets top", "/mgid top-widgets 1023198 3 7d"),
        ("widgets stats", "/mgid widgets-stats 1023198"),
        ("widgets stats", "/mgid widgets-stats 1023198 501 today"),
        ("widgets high cpa", "/mgid widgets-high-cpa 1023198 4.5"),
        ("widgets low cpa", "/zeropark widgets-low-cpa 1023198"),
        ("widgets low cpa", "/zeropark widgets-low-cpa 1023198 2 /time:7d"),
        ("widgets kill longtail", "/mgid widgets-kill-longtail 1 .5 today"),
        ("widgets kill bot", "/mgid widgets-kill-bot 1 80"),
        ("widgets turn on all", "/mgid widgets-turn-on-all 1"),
    ];

    let engine = engine();
    for (expected, input) in cases {
        let parsed = engine.parse(input);
        assert!(
            parsed.as_ref().is_ok_and(|p| p.grammar == expected),
            "Expected grammar '{}' for input '{}' (got: {:#?})",
            expected,
            input,
            parsed
        );
    }
}

#[test]
fn command_examples_rejected() {
    let cases: Vec<&str> = vec![
        "",
        "/mgid",
        "mgid stats",
        "/mgid statsx",
        "/mgid stats all 7d extra",
        "/mgid stats /fields:id 123 7d extra",
        "/mgid list /ie 123 456",
        "/mgid widgets-high-cpa 1023198",
        "/mgid widgets-top abc",
        "/mgid widgets-kill-bot 1 -5",
        "/facebook stats",
        "/thrive widgets-stats 1",
        "/thrive spent",
        "/mgid sources",
    ];

    let engine = engine();
    for input in cases {
        let err = engine.parse(input).err();
        assert!(
            err.as_ref().is_some_and(|e| e.kind() == "Invalid Command"),
            "Expected '{}' to be rejected as an invalid command (got: {:?})",
            input,
            err
        );
    }
}

#[test]
fn resolved_argument_examples() {
    // Array of (input_string, argument, expected_value)
    let cases: Vec<(&str, &str, Arg)> = vec![
        ("/mgid stats", "campaign_id", Arg::None),
        ("/mgid stats all", "campaign_id", Arg::None),
        ("/mgid stats ALL", "campaign_id", Arg::None),
        ("/mgid stats 1023198", "campaign_id", Arg::Text("1023198".into())),
        ("/mgid stats", "time_interval", Arg::Text("360d".into())),
        ("/mgid stats all 7D", "time_interval", Arg::Text("7d".into())),
        ("/mgid stats all 7d", "date_interval", Arg::Text("lastSeven".into())),
        ("/mgid stats all 30d", "date_interval", Arg::Text("last30Days".into())),
        ("/mgid stats all today", "date_interval", Arg::Text("today".into())),
        ("/mgid stats all 2w", "date_interval", Arg::Text("interval".into())),
        ("/mgid stats all 30d /time:7d", "date_interval", Arg::Text("lastSeven".into())),
        ("/zeropark stats all yesterday", "interval", Arg::Text("YESTERDAY".into())),
        ("/zeropark stats all 1m", "interval", Arg::Text("LAST_30_DAYS".into())),
        ("/thrive stats all 7d", "time_range", Arg::Text("7d".into())),
        ("/mgid widgets-high-cpa 1 4.5", "threshold", Arg::Number(4.5)),
        ("/mgid widgets-low-cpa 1", "threshold", Arg::Number(5.0)),
        ("/mgid widgets-low-cpa 1 2", "threshold", Arg::Number(2.0)),
        ("/mgid widgets-top 1", "filter_limit", Arg::Integer(5)),
        ("/mgid top-widgets 1", "filter_limit", Arg::Integer(5)),
        ("/mgid widgets-top 1 3", "filter_limit", Arg::Integer(3)),
        ("/mgid widgets-stats 1 all", "widget_id", Arg::None),
        ("/mgid widgets-stats 1 501", "widget_id", Arg::Text("501".into())),
        ("/mgid spent /limit:2", "limit", Arg::Integer(2)),
        ("/mgid spent --ignore-errors", "ignore_errors", Arg::Switch),
        ("/mgid spent /fields:id,,spent,", "fields", Arg::List(vec!["id".into(), "spent".into()])),
        ("/mgid stats /fields:id 123", "campaign_id", Arg::Text("123".into())),
        ("/mgid stats /fields:id 123", "fields", Arg::List(vec!["id".into()])),
        ("/mgid stats /ie 123 7d", "campaign_id", Arg::Text("123".into())),
        ("/mgid stats /ie 123 7d", "time_interval", Arg::Text("7d".into())),
        ("/mgid stats --limit 4 all 30d", "date_interval", Arg::Text("last30Days".into())),
        ("/mgid spent /fields:id,spent", "fields", Arg::List(vec!["id".into(), "spent".into()])),
        ("/mgid spent /date:2013-01-01", "date_range", Arg::Text("2013-01-01".into())),
    ];

    let engine = engine();
    for (input, name, expected) in cases {
        let parsed = engine.parse(input);
        let actual = parsed.as_ref().ok().and_then(|p| p.args.get(name));
        assert_eq!(actual, Some(&expected), "Argument '{}' for input '{}' (parsed: {:#?})", name, input, parsed);
    }
}

#[test]
fn conditional_defaults_stay_with_their_commands() {
    let engine = engine();

    let stats = engine.parse("/mgid widgets-stats 1").unwrap();
    assert!(!stats.args.contains("threshold"));
    assert!(!stats.args.contains("filter_limit"));

    let high = engine.parse("/mgid widgets-high-cpa 1 9").unwrap();
    assert_eq!(high.args.number("threshold"), Some(9.0));
    assert!(!high.args.contains("filter_limit"));
}

proptest! {
    #[test]
    fn resolution_ignores_flag_order_and_position(
        campaign in "[0-9]{1,9}",
        days in 1u32..400,
        limit in 1i64..50,
    ) {
        let engine = engine();
        let a = format!("/mgid stats {campaign} {days}d /limit:{limit} /fields:id,spent /ie");
        let b = format!("/mgid stats {campaign} {days}d /ie --fields id,spent --limit {limit}");
        let c = format!("/mgid stats /limit {limit} {campaign} /ie {days}d --fields id,spent");

        let first = engine.parse(&a).unwrap();
        prop_assert_eq!(&first.args, &engine.parse(&a).unwrap().args);
        prop_assert_eq!(&first.args, &engine.parse(&b).unwrap().args);
        prop_assert_eq!(&first.args, &engine.parse(&c).unwrap().args);
        prop_assert_eq!(first.args.text("campaign_id"), Some(campaign.as_str()));
    }
}
