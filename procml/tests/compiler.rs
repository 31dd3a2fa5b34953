use procml::choice::ChoiceRegistry;
use procml::compiler::{Command, CompileError, Compiler, IdLookup, Param};
use procml::element::{Element, Node};
use procml::parser::Parser;

struct TestIds;

impl IdLookup for TestIds {
    fn variable_id(&self, name: &str) -> Option<i64> {
        match name {
            "gold" => Some(3),
            "hp" => Some(7),
            _ => None,
        }
    }

    fn location_id(&self, name: &str) -> Option<i64> {
        match name {
            "village" => Some(2),
            _ => None,
        }
    }
}

fn parse_root(body: &str) -> Element {
    let source = format!("<proc id=\"t\">{body}</proc>");
    let nodes = Parser::new(source, 0).parse().expect("parse failed");
    nodes
        .into_iter()
        .find_map(|n| match n {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
        .expect("no root element")
}

fn compile_with(body: &str, registry: &mut ChoiceRegistry) -> Vec<Command> {
    Compiler::new(&TestIds, registry)
        .compile(&parse_root(body))
        .expect("compile failed")
}

fn compile(body: &str) -> Vec<Command> {
    compile_with(body, &mut ChoiceRegistry::new())
}

fn compile_err(body: &str) -> CompileError {
    let mut registry = ChoiceRegistry::new();
    Compiler::new(&TestIds, &mut registry)
        .compile(&parse_root(body))
        .expect_err("expected a compile error")
}

fn shape(commands: &[Command]) -> Vec<(i64, usize)> {
    commands.iter().map(|c| (c.code, c.indent)).collect()
}

#[test]
fn empty_procedure_is_one_terminator() {
    let commands = compile("");
    assert_eq!(shape(&commands), vec![(0, 0)]);
    assert!(commands[0].parameters.is_empty());
}

#[test]
fn unknown_tag_is_fatal() {
    let err = compile_err("<not-a-real-tag></not-a-real-tag>");
    assert!(matches!(err, CompileError::UnknownTag(name) if name == "not-a-real-tag"));
}

#[test]
fn nested_blocks_carry_depth_and_terminators() {
    let commands = compile("<loop><break/></loop>");
    assert_eq!(shape(&commands), vec![(112, 0), (113, 1), (0, 1), (0, 0)]);
}

#[test]
fn hidden_block_appends_its_closer() {
    let commands = compile("<hidden><wait>5</wait></hidden>");
    assert_eq!(
        shape(&commands),
        vec![(221, 0), (230, 1), (0, 1), (222, 0), (0, 0)]
    );
}

#[test]
fn else_follows_an_if_block() {
    let commands = compile("<if js=\"x\"><exit/></if><else><menu/></else>");
    assert_eq!(
        shape(&commands),
        vec![(111, 0), (115, 1), (0, 1), (110, 0), (351, 1), (0, 1), (0, 0)]
    );
    assert_eq!(commands[0].parameters, vec![Param::Str("x".to_string())]);
}

#[test]
fn orphaned_else_is_silently_skipped() {
    let commands = compile("<menu/><else><exit/></else>");
    assert_eq!(shape(&commands), vec![(351, 0), (0, 0)]);
}

#[test]
fn input_resolves_variable_names() {
    let commands = compile("<input var=\"gold\" digits=\"4\"/>");
    assert_eq!(commands[0].code, 103);
    assert_eq!(commands[0].parameters, vec![Param::Int(3), Param::Int(4)]);
}

#[test]
fn missing_required_attribute_fails() {
    let err = compile_err("<input digits=\"4\"/>");
    assert!(matches!(err, CompileError::Attr(_)));
}

#[test]
fn unknown_variable_name_fails() {
    let err = compile_err("<input var=\"mana\" digits=\"4\"/>");
    assert!(matches!(err, CompileError::UnknownVariable(name) if name == "mana"));
}

#[test]
fn fractional_literal_is_rejected_for_int_fields() {
    let err = compile_err("<wait>2.0</wait>");
    assert!(matches!(err, CompileError::Attr(_)));
    let commands = compile("<wait>2</wait>");
    assert_eq!(commands[0].parameters, vec![Param::Int(2)]);
}

#[test]
fn out_of_range_int_fails() {
    let err = compile_err("<shake power=\"12\" speed=\"3\"/>");
    assert!(matches!(err, CompileError::Attr(_)));
}

#[test]
fn visibility_uses_inverted_encoding() {
    assert_eq!(
        compile("<visibility>on</visibility>")[0].parameters,
        vec![Param::Int(0)]
    );
    assert_eq!(
        compile("<visibility>off</visibility>")[0].parameters,
        vec![Param::Int(1)]
    );
    // absent content defaults to hidden
    assert_eq!(
        compile("<visibility></visibility>")[0].parameters,
        vec![Param::Int(1)]
    );
}

#[test]
fn color_requires_four_channels_in_range() {
    assert!(matches!(
        compile_err("<tint color=\"1 2 3\"/>"),
        CompileError::Attr(_)
    ));
    assert!(matches!(
        compile_err("<tint color=\"0 0 0 300\"/>"),
        CompileError::Attr(_)
    ));
}

#[test]
fn absent_color_defaults_to_full_intensity() {
    let commands = compile("<tint/>");
    assert_eq!(
        commands[0].parameters,
        vec![
            Param::IntList(vec![255, 255, 255, 255]),
            Param::Int(60),
            Param::Bool(true),
        ]
    );
}

#[test]
fn unrecognized_blend_word_falls_back_to_normal() {
    let commands = compile("<show-pict id=\"1\" blend=\"sparkle\">img</show-pict>");
    assert_eq!(commands[0].code, 231);
    assert_eq!(commands[0].parameters[1], Param::Str("img".to_string()));
    assert_eq!(commands[0].parameters[9], Param::Int(0));
}

#[test]
fn show_picture_full_parameter_shape() {
    let commands = compile(
        "<show-pict id=\"7\" pos=\"center 10 20\" scale=\"50 75\" opacity=\"128\" blend=\"add\">hero</show-pict>",
    );
    assert_eq!(
        commands[0].parameters,
        vec![
            Param::Int(7),
            Param::Str("hero".to_string()),
            Param::Int(1),
            Param::Int(0),
            Param::Float(10.0),
            Param::Float(20.0),
            Param::Float(50.0),
            Param::Float(75.0),
            Param::Int(128),
            Param::Int(1),
        ]
    );
}

#[test]
fn move_picture_adds_duration_and_wait() {
    let commands = compile("<move-pict id=\"2\" pos=\"lefttop 1 2\" duration=\"30\"/>");
    let params = &commands[0].parameters;
    assert_eq!(params[0], Param::Int(2));
    assert_eq!(params[1], Param::Int(0));
    assert_eq!(params[params.len() - 2], Param::Int(30));
    assert_eq!(params[params.len() - 1], Param::Bool(true));
}

#[test]
fn switch_commands_share_one_opcode() {
    assert_eq!(
        compile("<sw-on>5</sw-on>")[0].parameters,
        vec![Param::Int(5), Param::Int(5), Param::Int(0)]
    );
    assert_eq!(
        compile("<sw-off>5</sw-off>")[0].parameters,
        vec![Param::Int(5), Param::Int(5), Param::Int(1)]
    );
}

#[test]
fn transfer_resolves_location_names() {
    let commands = compile("<transfer map=\"village\"/>");
    assert_eq!(commands[0].code, 201);
    assert_eq!(commands[0].parameters[1], Param::Int(2));
    let err = compile_err("<transfer map=\"nowhere\"/>");
    assert!(matches!(err, CompileError::UnknownLocation(name) if name == "nowhere"));
}

#[test]
fn weather_type_vocabulary_is_enforced() {
    let commands = compile("<weather type=\"rain\"/>");
    assert_eq!(commands[0].parameters[0], Param::Str("rain".to_string()));
    assert_eq!(commands[0].parameters[1], Param::Int(5));
    let err = compile_err("<weather type=\"plasma\"/>");
    assert!(matches!(err, CompileError::Attr(_)));
}

#[test]
fn commands_serialize_to_the_wire_shape() {
    let commands = compile("<tint color=\"1 2 3 4\" duration=\"30\" wait=\"off\"/>");
    let json = serde_json::to_value(&commands[0]).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "code": 223,
            "indent": 0,
            "parameters": [[1, 2, 3, 4], 30, false],
        })
    );
}

#[test]
fn script_payload_is_not_trimmed() {
    let commands = compile("<script> x < 3 </script>");
    assert_eq!(commands[0].code, 356);
    assert_eq!(
        commands[0].parameters,
        vec![Param::Str(" x < 3 ".to_string())]
    );
}

// message blocks

#[test]
fn leading_blanks_flush_after_the_implicit_header() {
    let commands = compile("<m>\n\nhello</m>");
    assert_eq!(shape(&commands), vec![(101, 0), (401, 0), (401, 0), (401, 0), (0, 0)]);
    assert_eq!(
        commands[0].parameters,
        vec![
            Param::Str(String::new()),
            Param::Int(0),
            Param::Int(0),
            Param::Int(2),
        ]
    );
    assert_eq!(commands[1].parameters, vec![Param::Str(String::new())]);
    assert_eq!(commands[2].parameters, vec![Param::Str(String::new())]);
    assert_eq!(commands[3].parameters, vec![Param::Str("hello".to_string())]);
}

#[test]
fn trailing_blanks_are_dropped() {
    let commands = compile("<m>hello\n\n</m>");
    assert_eq!(shape(&commands), vec![(101, 0), (401, 0), (0, 0)]);
    assert_eq!(commands[1].parameters, vec![Param::Str("hello".to_string())]);
}

#[test]
fn header_directive_names_the_speaker_and_drops_pending_blanks() {
    let commands = compile("<m>\n:Alice:\nhi</m>");
    assert_eq!(shape(&commands), vec![(101, 0), (401, 0), (0, 0)]);
    assert_eq!(commands[0].parameters[0], Param::Str("Alice".to_string()));
    assert_eq!(commands[1].parameters, vec![Param::Str("hi".to_string())]);
}

#[test]
fn text_lines_are_trimmed() {
    let commands = compile("<m>  padded  </m>");
    assert_eq!(commands[1].parameters, vec![Param::Str("padded".to_string())]);
}

// choice blocks

#[test]
fn choice_compiles_to_invoke_and_branch_openers() {
    let mut registry = ChoiceRegistry::new();
    let commands = compile_with(
        "<choice cancel=\"1\"><yes text=\"Yes\"/><no text=\"No\" cond=\"gold > 0\"/></choice>",
        &mut registry,
    );
    assert_eq!(
        shape(&commands),
        vec![(356, 0), (402, 0), (0, 1), (402, 0), (0, 1), (0, 0)]
    );
    assert_eq!(
        commands[0].parameters,
        vec![Param::Str("procml conditional-choices 0".to_string())]
    );
    assert_eq!(
        commands[1].parameters,
        vec![Param::Int(0), Param::Str("Yes".to_string())]
    );
    assert_eq!(
        commands[3].parameters,
        vec![Param::Int(1), Param::Str("No".to_string())]
    );

    assert_eq!(registry.len(), 1);
    let set = registry.get(0).expect("set registered");
    assert_eq!(set.candidates.len(), 2);
    assert_eq!(set.candidates[0].symbol, "yes");
    assert_eq!(set.candidates[0].condition, "");
    assert_eq!(set.candidates[1].condition, "gold > 0");
    assert_eq!(set.default_index, 0);
    assert_eq!(set.cancel_index, 1);
    assert_eq!(set.position_type, 2);
    assert_eq!(set.background, 0);
}

#[test]
fn choice_ids_increase_across_compiles_sharing_a_registry() {
    let body = "<choice><yes text=\"Yes\"/></choice>";
    let mut registry = ChoiceRegistry::new();
    let first = compile_with(body, &mut registry);
    let second = compile_with(body, &mut registry);
    assert_eq!(
        first[0].parameters,
        vec![Param::Str("procml conditional-choices 0".to_string())]
    );
    assert_eq!(
        second[0].parameters,
        vec![Param::Str("procml conditional-choices 1".to_string())]
    );
    assert_eq!(registry.len(), 2);
}

#[test]
fn compilation_is_idempotent_apart_from_choice_ids() {
    let body = "<m>hi</m><loop><break/></loop>";
    assert_eq!(compile(body), compile(body));
}

#[test]
fn duplicate_candidate_symbols_are_rejected() {
    let err = compile_err("<choice><yes text=\"a\"/><yes text=\"b\"/></choice>");
    assert!(matches!(err, CompileError::DuplicateChoiceSymbol { symbol } if symbol == "yes"));
}

#[test]
fn candidate_text_is_required() {
    let err = compile_err("<choice><yes/></choice>");
    assert!(matches!(err, CompileError::Attr(_)));
}

#[test]
fn candidate_children_compile_as_nested_blocks() {
    let commands = compile("<choice><yes text=\"Yes\"><exit/></yes></choice>");
    assert_eq!(
        shape(&commands),
        vec![(356, 0), (402, 0), (115, 1), (0, 1), (0, 0)]
    );
}
