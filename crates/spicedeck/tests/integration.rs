//! Cross-crate integration: netlist text through the parser, parameter
//! expressions through the expression engine, re-evaluation through the
//! dependency registry.

use std::rc::Rc;

use spicedeck::prelude::*;

/// Build a scope from every `.PARAM name=value` statement in a netlist.
fn scope_from_params(netlist: &Netlist, dialect: &Dialect) -> Rc<Scope> {
    let scope = Scope::root();
    for statement in netlist.statements() {
        let params = match statement {
            Statement::Control { name, params, .. } if name.eq_ignore_ascii_case("PARAM") => {
                params
            }
            _ => continue,
        };
        for param in params {
            if let Parameter::Assignment { name, values } = param {
                let image = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                let body = match &values[..] {
                    [Parameter::Expression(body)] => body.clone(),
                    _ => image,
                };
                if let Ok(parsed) = spicedeck::expr::parse_expression(&body, dialect) {
                    scope.set_parameter(name, parsed);
                }
            }
        }
    }
    scope
}

#[test]
fn test_end_to_end_example_netlist() {
    let netlist = spicedeck::parse("Title\nR1 1 0 10\nV1 1 0 150\n.SAVE I(R1)\n.OP\n.END").unwrap();

    assert_eq!(netlist.title(), Some("Title"));
    assert_eq!(netlist.len(), 4);
    assert_eq!(netlist.components().count(), 2);
    assert_eq!(netlist.controls().count(), 2);

    // No validation warnings: R1 is declared
    let warnings =
        spicedeck::core::validate::validate_entity_references(&netlist, &CaseSensitivity::default());
    assert!(warnings.is_empty());
}

#[test]
fn test_case_sensitivity_toggle_on_entity_reference() {
    let netlist = spicedeck::parse("Title\nR1 1 0 10\n.SAVE I(r1)\n.END").unwrap();

    let insensitive =
        spicedeck::core::validate::validate_entity_references(&netlist, &CaseSensitivity::default());
    assert!(insensitive.is_empty());

    let sensitive = spicedeck::core::validate::validate_entity_references(
        &netlist,
        &CaseSensitivity {
            entity_names: true,
            dot_statements: false,
        },
    );
    assert_eq!(sensitive.len(), 1);
    assert!(sensitive[0].message.contains("r1"));
}

#[test]
fn test_param_statements_feed_expression_scope() {
    let netlist = spicedeck::parse_netlist(
        ".PARAM RBASE=1k SCALE=2\n\
         R1 1 0 {RBASE*SCALE}\n",
        &ParserOptions {
            has_title: false,
            ..Default::default()
        },
    )
    .unwrap();

    let dialect = Dialect::spice3();
    let scope = scope_from_params(&netlist, &dialect);
    let evaluator = Evaluator::new(dialect);

    // Find the component's expression parameter and resolve it
    let expression = netlist
        .components()
        .find_map(|s| match s {
            Statement::Component { params, .. } => params.iter().find_map(|p| match p {
                Parameter::Expression(body) => Some(body.clone()),
                _ => None,
            }),
            _ => None,
        })
        .unwrap();

    assert_eq!(evaluator.evaluate_text(&expression, &scope).unwrap(), 2000.0);
}

#[test]
fn test_subcircuit_defaults_become_child_scope() {
    let netlist = spicedeck::parse_netlist(
        ".PARAM W=5\n\
         .SUBCKT RES in out PARAMS: R=1k\n\
         R1 in out {R*W}\n\
         .ENDS RES\n",
        &ParserOptions {
            has_title: false,
            ..Default::default()
        },
    )
    .unwrap();

    let dialect = Dialect::spice3();
    let global = scope_from_params(&netlist, &dialect);
    let evaluator = Evaluator::new(dialect);

    let def = netlist
        .statements()
        .iter()
        .find_map(|s| match s {
            Statement::Subcircuit(def) => Some(def),
            _ => None,
        })
        .unwrap();

    // Instance scope: subcircuit defaults under the instantiating scope
    let instance = Scope::child(&global);
    for (name, image) in &def.defaults {
        if let Ok(parsed) = spicedeck::expr::parse_expression(image, &dialect) {
            instance.set_parameter(name, parsed);
        }
    }

    let body_expr = match &def.statements[0] {
        Statement::Component { params, .. } => params
            .iter()
            .find_map(|p| match p {
                Parameter::Expression(body) => Some(body.clone()),
                _ => None,
            })
            .unwrap(),
        _ => unreachable!(),
    };

    // R from the instance scope, W inherited from the global scope
    assert_eq!(
        evaluator.evaluate_text(&body_expr, &instance).unwrap(),
        5000.0
    );

    // An override shadows the default without touching the parent
    instance.set_constant("R", 2e3);
    assert_eq!(
        evaluator.evaluate_text(&body_expr, &instance).unwrap(),
        10000.0
    );
    assert!(!global.is_defined("R"));
}

#[test]
fn test_dependency_registry_drives_reevaluation() {
    let dialect = Dialect::spice3();
    let evaluator = Evaluator::new(dialect);
    let scope = Scope::root();
    scope.set_constant("x", 1.0);
    scope.set_constant("y", 10.0);

    let e1 = Rc::new(spicedeck::expr::parse_expression("x * 2", &dialect).unwrap());
    let e2 = Rc::new(spicedeck::expr::parse_expression("x + y", &dialect).unwrap());

    let mut registry = DependencyRegistry::new();
    registry.register_parsed(Rc::clone(&e1));
    registry.register_parsed(Rc::clone(&e2));

    let deps_x: Vec<_> = registry.dependents_of("x").collect();
    assert_eq!(deps_x.len(), 2);
    let deps_y: Vec<_> = registry.dependents_of("y").collect();
    assert_eq!(deps_y.len(), 1);
    assert_eq!(deps_y[0].text, "x + y");

    // Mutate x and re-fire only its dependents
    scope.set_constant("x", 3.0);
    let refreshed: Vec<f64> = registry
        .dependents_of("x")
        .map(|e| evaluator.evaluate(e, &scope).unwrap())
        .collect();
    assert_eq!(refreshed, vec![6.0, 13.0]);
}

#[test]
fn test_dialects_differ_on_same_netlist_text() {
    let netlist = spicedeck::parse_netlist(
        "R1 1 0 {pow(-2, 1.5)}\n",
        &ParserOptions {
            has_title: false,
            ..Default::default()
        },
    )
    .unwrap();

    let body = match &netlist.statements()[0] {
        Statement::Component { params, .. } => params
            .iter()
            .find_map(|p| match p {
                Parameter::Expression(body) => Some(body.clone()),
                _ => None,
            })
            .unwrap(),
        _ => unreachable!(),
    };

    let scope = Scope::root();
    assert_eq!(
        Evaluator::new(Dialect::ltspice())
            .evaluate_text(&body, &scope)
            .unwrap(),
        0.0
    );
    assert_eq!(
        Evaluator::new(Dialect::pspice())
            .evaluate_text(&body, &scope)
            .unwrap(),
        -2.0
    );
}

#[test]
fn test_custom_function_from_control_statement() {
    // .FUNC-style definition carried through the object model
    let netlist = spicedeck::parse_netlist(
        ".FUNC gain(a,b) {a * b + 1}\n",
        &ParserOptions {
            has_title: false,
            ..Default::default()
        },
    )
    .unwrap();

    let (signature, body) = match &netlist.statements()[0] {
        Statement::Control { params, .. } => {
            let signature = match params.get(0) {
                Some(Parameter::Bracket { name, args }) => {
                    let formals: Vec<String> = args
                        .iter()
                        .flat_map(|a| match a {
                            Parameter::Vector(items) => items.clone(),
                            other => vec![other.clone()],
                        })
                        .filter_map(|p| p.image().map(str::to_string))
                        .collect();
                    (name.clone(), formals)
                }
                other => panic!("expected bracket, got {:?}", other),
            };
            let body = match params.get(1) {
                Some(Parameter::Expression(body)) => body.clone(),
                other => panic!("expected expression, got {:?}", other),
            };
            (signature, body)
        }
        _ => unreachable!(),
    };

    let scope = Scope::root();
    scope.define_function(CustomFunction::new(signature.0, signature.1, body));

    let evaluator = Evaluator::default();
    assert_eq!(evaluator.evaluate_text("gain(6, 7)", &scope).unwrap(), 43.0);
}

#[test]
fn test_lex_parse_eval_error_lines() {
    // Lex error carries the line
    let err = spicedeck::parse("Title\nR1 1 0 1.2.3\n").unwrap_err();
    match err {
        ParseError::Lex(LexError::MalformedNumber { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected lex error, got {:?}", other),
    }

    // Parse error carries the line
    let err = spicedeck::parse("Title\nR1 1 0 1k\n= nonsense\n").unwrap_err();
    match err {
        ParseError::UnexpectedToken { line, .. } => assert_eq!(line, 3),
        other => panic!("expected parse error, got {:?}", other),
    }
}
