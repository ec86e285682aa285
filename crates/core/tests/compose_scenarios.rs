//! End-to-end composition of rules against the reference plan emitter.

use lde_core::*;

fn at(line: u32, column: u32) -> Pos {
    Pos::new(line, column)
}

fn act(line: u32, kind: ActionKind) -> Action {
    Action::new(at(line, 1), kind)
}

fn field(name: &str, ty: FieldType, line: u32) -> Field {
    Field {
        name: name.to_string(),
        ty,
        pos: at(line, 3),
    }
}

fn rule(name: &str, actions: Vec<Action>) -> Rule {
    Rule {
        name: name.to_string(),
        pos: at(1, 1),
        actions,
    }
}

fn compose(rule: &Rule) -> (PlanEmitter, Result<Vec<Op>, RuleError>) {
    let composer = Composer::new(&SnakeCase);
    let mut emitter = PlanEmitter::new();
    let res = composer.compose(&mut emitter, rule);
    (emitter, res)
}

fn declares_any_field(emitter: &PlanEmitter) -> bool {
    emitter
        .rules()
        .iter()
        .flat_map(|r| r.ops.iter())
        .any(|op| matches!(op, Op::DeclareField { .. }))
}

// ──────────────────────────────────────────────
// Scenarios
// ──────────────────────────────────────────────

#[test]
fn request_line_take_until_space() {
    let r = rule(
        "R",
        vec![
            act(1, ActionKind::StartString { value: "GET ".into() }),
            act(
                2,
                ActionKind::Take {
                    field: field("path", FieldType::String, 2),
                    limit: Limit::char(' '),
                },
            ),
        ],
    );
    let (emitter, res) = compose(&r);
    let ops = res.unwrap();

    let expected = vec![
        Op::Checkpoint { path: "".into() },
        Op::Head {
            literal: Literal::String("GET ".into()),
            optional: false,
        },
        Op::Checkpoint {
            path: "path".into(),
        },
        Op::DeclareField {
            name: "path".into(),
            ty: FieldType::String,
            pos: at(2, 3),
        },
        Op::TakeBefore {
            name: "path".into(),
            ty: FieldType::String,
            literal: Literal::Char(' '),
            lower: 0,
            upper: 0,
            close: false,
            or_rest: false,
        },
    ];
    assert_eq!(ops, expected);

    let plan = emitter.rule("R").expect("rule R committed");
    assert_eq!(plan.pos, at(1, 1));
    assert_eq!(plan.ops, expected);
}

#[test]
fn take_inside_anonymous_option_is_scope_violation() {
    let r = rule(
        "R",
        vec![act(
            1,
            ActionKind::AnonymousOption {
                actions: vec![act(
                    2,
                    ActionKind::Take {
                        field: field("x", FieldType::Int32, 2),
                        limit: Limit::char(','),
                    },
                )],
            },
        )],
    );
    let (emitter, res) = compose(&r);
    let err = res.unwrap_err();
    assert_eq!(err.error, ComposeError::ScopeViolation { what: "take" });
    assert_eq!(err.pos, at(2, 3));
    assert_eq!(err.rule, "R");
    assert!(emitter.rules().is_empty());
    assert!(!declares_any_field(&emitter));
}

#[test]
fn take_rest_and_take_until_or_rest_inside_anonymous_option_fail() {
    for kind in [
        ActionKind::TakeRest {
            field: field("x", FieldType::String, 2),
        },
        ActionKind::TakeUntilOrRest {
            field: field("x", FieldType::String, 2),
            limit: Limit::string("--"),
        },
    ] {
        let r = rule(
            "R",
            vec![act(1, ActionKind::AnonymousOption { actions: vec![act(2, kind)] })],
        );
        let (emitter, res) = compose(&r);
        assert!(matches!(
            res.unwrap_err().error,
            ComposeError::ScopeViolation { .. }
        ));
        assert!(!declares_any_field(&emitter));
    }
}

#[test]
fn sibling_options_with_same_name_collide_on_field() {
    let option = |line| {
        act(
            line,
            ActionKind::NamedOptional {
                name: "foo".into(),
                actions: vec![act(
                    line,
                    ActionKind::Take {
                        field: field("bar", FieldType::String, line),
                        limit: Limit::char(';'),
                    },
                )],
            },
        )
    };
    let r = rule("R", vec![option(1), option(2)]);
    let (emitter, res) = compose(&r);
    let err = res.unwrap_err();
    assert_eq!(
        err.error,
        ComposeError::DuplicateField {
            path: "foo.bar".into(),
            ty: FieldType::String,
        }
    );
    assert_eq!(err.pos, at(2, 3));
    assert!(emitter.rules().is_empty());
}

#[test]
fn fixed_offset_pass_keeps_shape_across_tolerance() {
    let limit = Limit::string("ab").bounded(5, 5);

    let (_, strict) = compose(&rule(
        "R",
        vec![act(1, ActionKind::PassUntil { limit: limit.clone() })],
    ));
    let (_, tolerant) = compose(&rule(
        "R",
        vec![act(1, ActionKind::PassUntilOrIgnore { limit })],
    ));

    let fixed = |ignore| Op::LookupFixed {
        literal: Literal::String("ab".into()),
        offset: 5,
        ignore,
    };
    assert_eq!(strict.unwrap()[1], fixed(false));
    assert_eq!(tolerant.unwrap()[1], fixed(true));
}

// ──────────────────────────────────────────────
// Properties
// ──────────────────────────────────────────────

#[test]
fn lookup_shape_follows_limit_bounds() {
    let cases = [
        ((0, 0), false),
        ((3, 3), true),
        ((1, 1), true),
        ((2, 5), false),
        ((4, 0), false),
        ((0, 6), false),
    ];
    for ((lower, upper), fixed) in cases {
        for limit in [
            Limit::char('|').bounded(lower, upper),
            Limit::string("||").bounded(lower, upper),
        ] {
            let (_, res) = compose(&rule("R", vec![act(1, ActionKind::PassUntil { limit })]));
            let op = res.unwrap().pop().unwrap();
            assert_eq!(
                matches!(op, Op::LookupFixed { .. }),
                fixed,
                "bounds [{}:{}] gave {:?}",
                lower,
                upper,
                op
            );
        }
    }
}

#[test]
fn tolerant_lookup_keeps_shape_and_close_flag() {
    let cases = [(0, 0), (3, 3), (2, 5), (4, 0), (0, 6)];
    for (lower, upper) in cases {
        for close in [false, true] {
            let mut limit = Limit::string("||").bounded(lower, upper);
            if close {
                limit = limit.closed();
            }
            let (_, res) = compose(&rule(
                "R",
                vec![act(1, ActionKind::PassUntilOrIgnore { limit })],
            ));
            let op = res.unwrap().pop().unwrap();
            let literal = Literal::String("||".into());
            let want = if lower == upper && lower > 0 {
                Op::LookupFixed {
                    literal,
                    offset: lower,
                    ignore: true,
                }
            } else {
                Op::Lookup {
                    literal,
                    lower,
                    upper,
                    close,
                    ignore: true,
                }
            };
            assert_eq!(op, want, "bounds [{}:{}] close={}", lower, upper, close);
        }
    }
}

#[test]
fn composing_twice_yields_identical_sequences() {
    let r = rule(
        "access",
        vec![
            act(1, ActionKind::ErrorOnMismatch),
            act(
                1,
                ActionKind::Take {
                    field: field("ip", FieldType::String, 1),
                    limit: Limit::char(' '),
                },
            ),
            act(
                2,
                ActionKind::NamedOptional {
                    name: "user".into(),
                    actions: vec![
                        act(2, ActionKind::StartChar { value: '[' }),
                        act(
                            2,
                            ActionKind::Take {
                                field: field("name", FieldType::String, 2),
                                limit: Limit::char(']').closed(),
                            },
                        ),
                    ],
                },
            ),
            act(
                3,
                ActionKind::AnonymousOption {
                    actions: vec![act(3, ActionKind::MayBeStartString { value: "- ".into() })],
                },
            ),
            act(4, ActionKind::PassFirst { count: 1 }),
            act(
                5,
                ActionKind::TakeUntilOrRest {
                    field: field("status", FieldType::Uint16, 5),
                    limit: Limit::char(' ').bounded(0, 4),
                },
            ),
            act(
                6,
                ActionKind::TakeRest {
                    field: field("tail", FieldType::Bytes, 6),
                },
            ),
        ],
    );
    let (first, a) = compose(&r);
    let (second, b) = compose(&r);
    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(first.rules(), second.rules());
}

#[test]
fn misnamed_field_never_reaches_emitter() {
    let r = rule(
        "R",
        vec![act(
            1,
            ActionKind::TakeRest {
                field: field("UserName", FieldType::String, 1),
            },
        )],
    );
    let (emitter, res) = compose(&r);
    let err = res.unwrap_err();
    assert_eq!(
        err.error,
        ComposeError::InvalidIdentifier {
            what: "field",
            name: "UserName".into(),
            expected: "user_name".into(),
        }
    );
    assert_eq!(err.to_string(), "1:3: wrong field identifier UserName, must be user_name");
    assert!(!declares_any_field(&emitter));
}

#[test]
fn dotted_field_name_cannot_shadow_option_path() {
    let r = rule(
        "R",
        vec![
            act(
                1,
                ActionKind::Take {
                    field: field("a.b", FieldType::String, 1),
                    limit: Limit::char(' '),
                },
            ),
            act(
                2,
                ActionKind::NamedOptional {
                    name: "a".into(),
                    actions: vec![act(
                        2,
                        ActionKind::TakeRest {
                            field: field("b", FieldType::String, 2),
                        },
                    )],
                },
            ),
        ],
    );
    let (emitter, res) = compose(&r);
    let err = res.unwrap_err();
    assert_eq!(err.pos, at(1, 3));
    assert_eq!(
        err.error,
        ComposeError::InvalidIdentifier {
            what: "field",
            name: "a.b".into(),
            expected: "a_b".into(),
        }
    );
    assert!(emitter.rules().is_empty());
}

#[test]
fn empty_option_name_is_rejected() {
    let r = rule(
        "R",
        vec![act(
            3,
            ActionKind::NamedOptional {
                name: String::new(),
                actions: vec![act(
                    3,
                    ActionKind::TakeRest {
                        field: field("x", FieldType::String, 3),
                    },
                )],
            },
        )],
    );
    let (emitter, res) = compose(&r);
    let err = res.unwrap_err();
    assert_eq!(err.pos, at(3, 1));
    assert!(matches!(
        err.error,
        ComposeError::InvalidIdentifier { what: "option", ref name, .. } if name.is_empty()
    ));
    assert!(emitter.rules().is_empty());
}

#[test]
fn camel_policy_rejects_dotted_names() {
    let composer = Composer::new(&PublicCamel);
    let mut emitter = PlanEmitter::new();
    let r = rule(
        "R",
        vec![act(
            1,
            ActionKind::TakeRest {
                field: field("A.b", FieldType::String, 1),
            },
        )],
    );
    let err = composer.compose(&mut emitter, &r).unwrap_err();
    assert_eq!(
        err.to_string(),
        "1:3: wrong field identifier A.b, must be AB"
    );
}

#[test]
fn camel_policy_accepts_public_names() {
    let composer = Composer::new(&PublicCamel);
    let mut emitter = PlanEmitter::new();
    let r = rule(
        "R",
        vec![act(
            1,
            ActionKind::NamedOptional {
                name: "UserID".into(),
                actions: vec![act(
                    1,
                    ActionKind::TakeRest {
                        field: field("Value", FieldType::Int64, 1),
                    },
                )],
            },
        )],
    );
    composer.compose(&mut emitter, &r).unwrap();
    let ops = &emitter.rule("R").unwrap().ops;
    assert!(ops.contains(&Op::Checkpoint {
        path: "UserID.Value".into()
    }));
}

#[test]
fn field_named_like_a_later_option_trips_checkpoint() {
    let r = rule(
        "R",
        vec![
            act(
                1,
                ActionKind::Take {
                    field: field("foo", FieldType::String, 1),
                    limit: Limit::char(' '),
                },
            ),
            act(
                2,
                ActionKind::NamedOptional {
                    name: "foo".into(),
                    actions: vec![act(3, ActionKind::StartChar { value: '#' })],
                },
            ),
        ],
    );
    let (emitter, res) = compose(&r);
    let err = res.unwrap_err();
    assert_eq!(err.pos, at(3, 1));
    assert_eq!(
        err.error,
        ComposeError::CheckpointViolation(EmitError::ScopeReentered { path: "foo".into() })
    );
    assert!(emitter.rules().is_empty());
}

#[test]
fn scopes_bracket_their_body_in_order() {
    let r = rule(
        "R",
        vec![act(
            1,
            ActionKind::NamedOptional {
                name: "opt".into(),
                actions: vec![act(
                    2,
                    ActionKind::AnonymousOption {
                        actions: vec![act(3, ActionKind::AtEnd)],
                    },
                )],
            },
        )],
    );
    let (_, res) = compose(&r);
    assert_eq!(
        res.unwrap(),
        vec![
            Op::Checkpoint { path: "".into() },
            Op::OpenNamedScope {
                name: "opt".into(),
                pos: at(1, 1),
            },
            Op::OpenUnnamedScope { pos: at(2, 1) },
            Op::Checkpoint { path: "opt".into() },
            Op::AtEnd,
            Op::CloseUnnamedScope,
            Op::CloseNamedScope,
        ]
    );
}

// ──────────────────────────────────────────────
// Sessions
// ──────────────────────────────────────────────

#[test]
fn failing_rule_does_not_affect_the_next_one() {
    let bad = rule(
        "bad",
        vec![act(
            1,
            ActionKind::AnonymousOption {
                actions: vec![act(
                    1,
                    ActionKind::TakeRest {
                        field: field("x", FieldType::String, 1),
                    },
                )],
            },
        )],
    );
    let good = rule(
        "good",
        vec![act(
            2,
            ActionKind::TakeRest {
                field: field("x", FieldType::String, 2),
            },
        )],
    );
    let composer = Composer::new(&SnakeCase);
    let mut emitter = PlanEmitter::new();
    let report = compose_rules(&composer, &mut emitter, &[bad, good], true);

    assert!(!report.is_ok());
    assert_eq!(report.composed, vec!["good".to_string()]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].rule, "bad");
    assert_eq!(emitter.rules().len(), 1);
    assert_eq!(emitter.rules()[0].name, "good");
}

#[test]
fn session_stops_at_first_failure_without_keep_going() {
    let rules = vec![
        rule("a", vec![act(1, ActionKind::AtEnd)]),
        rule("a", vec![act(2, ActionKind::AtEnd)]),
        rule("b", vec![act(3, ActionKind::AtEnd)]),
    ];
    let composer = Composer::new(&SnakeCase);
    let mut emitter = PlanEmitter::new();
    let report = compose_rules(&composer, &mut emitter, &rules, false);

    assert_eq!(report.composed, vec!["a".to_string()]);
    assert_eq!(report.skipped, 1);
    assert_eq!(
        report.failures[0].error,
        ComposeError::EmitterRejection(EmitError::RuleExists { name: "a".into() })
    );
    assert_eq!(emitter.rules().len(), 1);
}
