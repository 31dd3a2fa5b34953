use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::compiler::{CompileError, IdLookup, Param};
use crate::element::Element;
use crate::validate::{self, StringRules};

pub(crate) const CODE_IF: i64 = 111;
const CODE_HIDDEN_CLOSE: i64 = 222;

pub(crate) type BuildFn = fn(&Element, &dyn IdLookup) -> Result<Vec<Param>, CompileError>;

/// One dispatch-table entry: the opcode, whether the tag carries a nested
/// block, the paired closing opcode if any, and the parameter builder.
pub(crate) struct CommandSpec {
    pub code: i64,
    pub has_block: bool,
    pub closer: Option<i64>,
    pub build: BuildFn,
}

impl CommandSpec {
    const fn leaf(code: i64, build: BuildFn) -> Self {
        CommandSpec {
            code,
            has_block: false,
            closer: None,
            build,
        }
    }

    const fn block(code: i64, build: BuildFn) -> Self {
        CommandSpec {
            code,
            has_block: true,
            closer: None,
            build,
        }
    }

    const fn wrapped(code: i64, closer: i64, build: BuildFn) -> Self {
        CommandSpec {
            code,
            has_block: true,
            closer: Some(closer),
            build,
        }
    }
}

pub(crate) fn lookup(name: &str) -> Option<&'static CommandSpec> {
    TABLE.get(name)
}

static TABLE: Lazy<HashMap<&'static str, CommandSpec>> = Lazy::new(|| {
    let mut t = HashMap::new();
    t.insert("input", CommandSpec::leaf(103, build_input));
    t.insert("select-item", CommandSpec::leaf(104, build_select_item));
    t.insert("if", CommandSpec::block(CODE_IF, build_if));
    t.insert("loop", CommandSpec::block(112, no_params));
    t.insert("break", CommandSpec::leaf(113, no_params));
    t.insert("exit", CommandSpec::leaf(115, no_params));
    t.insert("label", CommandSpec::leaf(118, build_data_word));
    t.insert("jump", CommandSpec::leaf(119, build_data_word));
    t.insert("goto", CommandSpec::leaf(119, build_data_word));
    t.insert("sw-on", CommandSpec::leaf(121, build_switch_on));
    t.insert("sw-off", CommandSpec::leaf(121, build_switch_off));
    t.insert("transfer", CommandSpec::leaf(201, build_transfer));
    t.insert("visibility", CommandSpec::leaf(211, build_visibility));
    // obscured screen; wrapped by a fadeout and a closing fadein
    t.insert("hidden", CommandSpec::wrapped(221, CODE_HIDDEN_CLOSE, no_params));
    t.insert("tint", CommandSpec::leaf(223, build_screen_color));
    t.insert("flash", CommandSpec::leaf(224, build_screen_color));
    t.insert("shake", CommandSpec::leaf(225, build_shake));
    t.insert("wait", CommandSpec::leaf(230, build_wait));
    t.insert("show-pict", CommandSpec::leaf(231, build_show_picture));
    t.insert("move-pict", CommandSpec::leaf(232, build_move_picture));
    t.insert("rotate-pict", CommandSpec::leaf(233, build_rotate_picture));
    t.insert("tint-pict", CommandSpec::leaf(234, build_tint_picture));
    t.insert("erase-pict", CommandSpec::leaf(235, build_erase_picture));
    t.insert("weather", CommandSpec::leaf(236, build_weather));
    t.insert("bgm", CommandSpec::leaf(241, build_data_word));
    t.insert("fadeout-bgm", CommandSpec::leaf(242, build_fadeout));
    t.insert("save-bgm", CommandSpec::leaf(243, no_params));
    t.insert("resume-bgm", CommandSpec::leaf(244, no_params));
    t.insert("bgs", CommandSpec::leaf(245, build_data_word));
    t.insert("fadeout-bgs", CommandSpec::leaf(246, build_fadeout));
    t.insert("me", CommandSpec::leaf(249, build_data_word));
    t.insert("se", CommandSpec::leaf(250, build_data_word));
    t.insert("stop-se", CommandSpec::leaf(251, no_params));
    t.insert("movie", CommandSpec::leaf(261, build_data_word));
    t.insert("menu", CommandSpec::leaf(351, no_params));
    t.insert("save", CommandSpec::leaf(352, no_params));
    t.insert("game-over", CommandSpec::leaf(353, no_params));
    t.insert("title", CommandSpec::leaf(354, no_params));
    t.insert("script", CommandSpec::leaf(356, build_script));
    t
});

// ---------------------------------------------------------------------------
// Parameter builders
// ---------------------------------------------------------------------------

fn no_params(_e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(Vec::new())
}

/// The element's trimmed text content as the single parameter.
fn build_data_word(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![Param::Str(e.data().trim().to_string())])
}

/// Embedded host-language payload, passed through untrimmed.
fn build_script(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![Param::Str(e.data())])
}

fn build_input(e: &Element, ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let var = variable(e, ids)?;
    let digits = e.require_int("digits", Some(1), None)?;
    Ok(vec![Param::Int(var), Param::Int(digits)])
}

fn build_select_item(e: &Element, ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let var = variable(e, ids)?;
    let kind = e.require_int("type", Some(0), Some(3))?;
    Ok(vec![Param::Int(var), Param::Int(kind)])
}

fn build_if(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let js = e.require_word("js", &StringRules::none())?;
    Ok(vec![Param::Str(js)])
}

fn build_switch_on(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let id = e.int_content(None, None, None)?;
    Ok(vec![Param::Int(id), Param::Int(id), Param::Int(0)])
}

fn build_switch_off(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let id = e.int_content(None, None, None)?;
    Ok(vec![Param::Int(id), Param::Int(id), Param::Int(1)])
}

fn build_transfer(e: &Element, ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let name = e.require_word("map", &StringRules::none())?;
    let map = ids
        .location_id(&name)
        .ok_or(CompileError::UnknownLocation(name))?;
    Ok(vec![
        Param::Int(0),
        Param::Int(map),
        Param::Int(0),
        Param::Int(0),
        Param::Int(0),
        Param::Int(0),
    ])
}

/// Inverted encoding on the wire: shown is 0, hidden is 1.
fn build_visibility(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let shown = e.bool_content(Some(false))?;
    Ok(vec![Param::Int(if shown { 0 } else { 1 })])
}

/// Shared by `tint` and `flash`: a 4-channel color, duration, wait flag.
fn build_screen_color(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![
        Param::IntList(color4(e, "color")?),
        Param::Int(e.int("duration", Some(1), None, 60)?),
        Param::Bool(e.bool("wait", true)?),
    ])
}

fn build_shake(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![
        Param::Int(e.require_int("power", Some(0), Some(9))?),
        Param::Int(e.require_int("speed", Some(0), Some(9))?),
        Param::Bool(e.bool("wait", true)?),
    ])
}

fn build_wait(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![Param::Int(e.int_content(Some(1), None, None)?)])
}

fn build_show_picture(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let mut params = vec![
        Param::Int(e.require_int("id", Some(0), Some(100))?),
        Param::Str(e.data().trim().to_string()),
    ];
    params.extend(placement(e)?);
    Ok(params)
}

/// Same placement shape as `show-pict`, with a zero in place of the image
/// name, plus duration and wait.
fn build_move_picture(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    let mut params = vec![
        Param::Int(e.require_int("id", Some(0), Some(100))?),
        Param::Int(0),
    ];
    params.extend(placement(e)?);
    params.push(Param::Int(e.int("duration", Some(1), None, 60)?));
    params.push(Param::Bool(e.bool("wait", true)?));
    Ok(params)
}

fn build_rotate_picture(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![
        Param::Int(e.require_int("id", Some(0), Some(100))?),
        Param::Float(e.float("speed", None, None, 0.0)?),
    ])
}

fn build_tint_picture(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![
        Param::Int(e.require_int("id", Some(0), Some(100))?),
        Param::IntList(color4(e, "color")?),
        Param::Int(e.int("duration", Some(1), None, 60)?),
        Param::Bool(e.bool("wait", true)?),
    ])
}

fn build_erase_picture(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![Param::Int(e.require_int("id", Some(0), Some(100))?)])
}

static WEATHER_TYPE: Lazy<StringRules> = Lazy::new(|| StringRules {
    pattern: Some(Regex::new("^(none|rain|storm|snow)$").unwrap()),
    length: None,
});

fn build_weather(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![
        Param::Str(e.require_word("type", &WEATHER_TYPE)?),
        Param::Int(e.int("power", Some(0), Some(9), 5)?),
        Param::Int(e.int("duration", Some(1), None, 60)?),
        Param::Bool(e.bool("wait", true)?),
    ])
}

fn build_fadeout(e: &Element, _ids: &dyn IdLookup) -> Result<Vec<Param>, CompileError> {
    Ok(vec![Param::Float(e.require_float("duration", Some(0.0), None)?)])
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn variable(e: &Element, ids: &dyn IdLookup) -> Result<i64, CompileError> {
    let name = e.require_word("var", &StringRules::none())?;
    ids.variable_id(&name)
        .ok_or(CompileError::UnknownVariable(name))
}

/// 4-channel color attribute: exactly four tokens, each an int in [0,255].
/// An absent attribute means full intensity on every channel.
fn color4(e: &Element, name: &str) -> Result<Vec<i64>, CompileError> {
    let tokens = e.split(name, 4)?;
    if tokens.is_empty() {
        return Ok(vec![255; 4]);
    }
    let mut channels = Vec::with_capacity(4);
    for token in &tokens {
        let c = validate::int(Some(token), Some(0), Some(255), None)
            .map_err(|err| e.attr_error(name, err))?;
        channels.push(c);
    }
    Ok(channels)
}

/// Picture placement: `pos` is origin word plus two floats, `scale` is two
/// floats, then opacity and blend mode. Unrecognized origin and blend words
/// silently fall back to their defaults.
fn placement(e: &Element) -> Result<Vec<Param>, CompileError> {
    let pos = e.split("pos", 3)?;
    let origin_word = validate::word(
        pos.first().map(String::as_str),
        &StringRules::none(),
        Some("lefttop"),
    )
    .map_err(|err| e.attr_error("pos", err))?;
    let origin = match origin_word.as_str() {
        "center" => 1,
        _ => 0,
    };
    let x = validate::float(pos.get(1).map(String::as_str), None, None, Some(0.0))
        .map_err(|err| e.attr_error("pos", err))?;
    let y = validate::float(pos.get(2).map(String::as_str), None, None, Some(0.0))
        .map_err(|err| e.attr_error("pos", err))?;

    let scale = e.split("scale", 2)?;
    let scale_x = validate::float(scale.first().map(String::as_str), None, None, Some(100.0))
        .map_err(|err| e.attr_error("scale", err))?;
    let scale_y = validate::float(scale.get(1).map(String::as_str), None, None, Some(100.0))
        .map_err(|err| e.attr_error("scale", err))?;

    let opacity = e.int("opacity", Some(0), Some(255), 255)?;
    let blend = match e.word("blend", &StringRules::none(), "normal")?.as_str() {
        "add" => 1,
        "multiply" => 2,
        "screen" => 3,
        "overlay" => 4,
        "darken" => 5,
        "lighten" => 6,
        _ => 0,
    };

    Ok(vec![
        Param::Int(origin),
        Param::Int(0),
        Param::Float(x),
        Param::Float(y),
        Param::Float(scale_x),
        Param::Float(scale_y),
        Param::Int(opacity),
        Param::Int(blend),
    ])
}
