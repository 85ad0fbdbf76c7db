//! Slide deck settings and content
//!
//! All functions are rejected outside `slides` documents.

use quill_ast::{Node, NodeKind, SlideFragment};
use quill_core::document::DocumentType;
use quill_core::function::{Function, OnlyForDocumentTypes};
use quill_core::value::{ParamType, Value};

const TRANSITIONS: &[&str] = &["none", "fade", "slide", "convex", "concave", "zoom"];
const BEHAVIORS: &[&str] = &["show", "hide", "semihide", "showhide"];

pub(crate) fn functions() -> Vec<Function> {
    vec![
        Function::new("slides", |call| {
            let slides = &mut call.ctx.document.slides;
            if let Some(transition) = call.args.opt_enumeration("transition") {
                slides.transition = Some(transition.to_string());
            }
            if let Some(center) = call.args.opt_boolean("center") {
                slides.center = Some(center);
            }
            if let Some(controls) = call.args.opt_boolean("controls") {
                slides.controls = Some(controls);
            }
            Ok(Value::Void)
        })
        .optional("transition", ParamType::Enum(TRANSITIONS))
        .optional("center", ParamType::Boolean)
        .optional("controls", ParamType::Boolean),
        Function::new("fragment", |call| {
            let fragment = SlideFragment {
                behavior: call.args.enumeration("behavior")?.to_string(),
            };
            let body = call.args.content("body")?;
            Ok(Value::Content(vec![Node::with_children(
                NodeKind::SlideFragment(fragment),
                body,
            )]))
        })
        .defaulted("behavior", ParamType::Enum(BEHAVIORS), Value::Enum("show".to_string()))
        .body("body", ParamType::Content),
        Function::new("speakernote", |call| {
            let body = call.args.content("body")?;
            Ok(Value::Content(vec![Node::with_children(NodeKind::SpeakerNote, body)]))
        })
        .body("body", ParamType::Content),
    ]
    .into_iter()
    .map(|function| function.validator(OnlyForDocumentTypes(vec![DocumentType::Slides])))
    .collect()
}
