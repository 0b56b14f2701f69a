//! Edge Enumerator and Secondary-File Checker: builds the source index,
//! walks every sink, applies the conditional/loop context rewrites, invokes
//! the Link-Merge Adapter per edge, and assembles the accumulated
//! diagnostics.
//!
//! Grounded on `static_checker`, `_check_all_types` and `missing_subset` in
//! the reference checker this crate was extracted from. Where that system
//! threads a `_SrcSink` NamedTuple through `_check_all_types`, this crate
//! resolves each sink's sources inline and recurses case-by-case (the
//! closed `Parameter`/`Step` types make the NamedTuple's bookkeeping
//! unnecessary).

use std::collections::HashMap;
use std::rc::Rc;

use crate::diagnostics::{dedup_source_lines, format_warning_block};
use crate::error::{CheckerError, CheckerErrorKind};
use crate::linkmerge::{self, LinkMergeOutcome};
use crate::model::{short_name, LinkMerge, OutputMethod, Parameter, PickValue, Step, Type, TypeKind};

fn type_includes_null(t: &Type) -> bool {
    match &t.kind {
        TypeKind::Null => true,
        TypeKind::Union(branches) => branches.iter().any(|b| matches!(b.kind, TypeKind::Null)),
        _ => false,
    }
}

/// Walk every step input and workflow output, checking its wired-up sources
/// against its own declared type. Warnings are logged as a single block at
/// `warn` severity; exceptions (including the required-parameter sweep) are
/// accumulated and returned together. An unresolved source id is raised
/// immediately rather than batched, since nothing downstream can be checked
/// meaningfully once a reference doesn't resolve.
pub fn static_check(
    workflow_inputs: &[Rc<Parameter>],
    workflow_outputs: &[Rc<Parameter>],
    step_inputs: &[Rc<Parameter>],
    step_outputs: &[Rc<Parameter>],
    param_to_step: &HashMap<String, Rc<Step>>,
) -> Result<(), CheckerError> {
    let mut src_dict: HashMap<String, Rc<Parameter>> = HashMap::new();
    for p in workflow_inputs.iter().chain(step_outputs.iter()) {
        src_dict.insert(p.id.clone(), Rc::clone(p));
    }

    let mut warnings: Vec<String> = Vec::new();
    let mut exceptions: Vec<String> = Vec::new();

    for sink in step_inputs.iter().chain(workflow_outputs.iter()) {
        let Some(source_ids) = &sink.source else {
            continue;
        };
        let ids = source_ids.as_slice();

        let mut effective_link_merge = sink.link_merge;
        if effective_link_merge.is_none() && ids.len() > 1 {
            effective_link_merge = Some(LinkMerge::MergeNested);
        }
        if matches!(
            sink.pick_value,
            Some(PickValue::FirstNonNull) | Some(PickValue::TheOnlyNonNull)
        ) {
            effective_link_merge = None;
        }

        let mut resolved: Vec<Rc<Parameter>> = Vec::with_capacity(ids.len());
        for id in &ids {
            match src_dict.get(*id) {
                Some(src) => resolved.push(Rc::clone(src)),
                None => {
                    return Err(CheckerError::new(
                        CheckerErrorKind::MissingSource,
                        sink.source_ref.format(
                            &format!("refers to an unknown source '{id}'"),
                            &sink.id,
                        ),
                    ));
                }
            }
        }

        for src in &resolved {
            if let Some(step) = param_to_step.get(&src.id) {
                if step.is_conditional() {
                    if sink.pick_value.is_none() {
                        warnings.push(sink.source_ref.format(
                            "Source is from conditional step, but pickValue is not used",
                            &sink.id,
                        ));
                    }
                    if ids.len() == 1 && !type_includes_null(&sink.ty()) {
                        warnings.push(sink.source_ref.format(
                            "Source is from conditional step and may produce null",
                            &sink.id,
                        ));
                        src.promote_conditional_null();
                    }
                }
                if step.has_loop && step.output_method == Some(OutputMethod::AllIterations) {
                    src.promote_loop_array();
                }
            }
        }

        if sink.pick_value.is_some() && ids.len() == 1 {
            warnings.push(sink.source_ref.format(
                "pickValue is used but only a single input source is declared",
                &sink.id,
            ));
        }

        for src in &resolved {
            let outcome = linkmerge::check(
                &src.ty(),
                &sink.ty(),
                effective_link_merge,
                sink.unknown_link_merge.as_deref(),
                sink.value_from.is_some(),
            )?;
            match outcome {
                LinkMergeOutcome::Pass => {}
                LinkMergeOutcome::Exception(msg) => {
                    exceptions.push(sink.source_ref.format(&msg, &sink.id));
                }
                LinkMergeOutcome::Warning(msg) => {
                    let sink_step = param_to_step.get(&sink.id).map(Rc::as_ref);
                    if let Some(line) =
                        build_warning_message(src, sink, &msg, effective_link_merge, sink_step)
                    {
                        warnings.push(line);
                    }
                }
            }
        }
    }

    for sink in step_inputs {
        if sink.source.is_some() || sink.has_default || sink.value_from.is_some() {
            continue;
        }
        if type_includes_null(&sink.ty()) {
            continue;
        }
        exceptions.push(sink.source_ref.format(
            &format!(
                "Required parameter '{}' does not have source, default, or valueFrom expression",
                short_name(&sink.id)
            ),
            &sink.id,
        ));
    }

    if !warnings.is_empty() {
        log::warn!("{}", format_warning_block(&warnings));
    }

    if !exceptions.is_empty() {
        let deduped = dedup_source_lines(&exceptions);
        return Err(CheckerError::from_lines(CheckerErrorKind::TypeMismatch, deduped));
    }

    Ok(())
}

fn build_warning_message(
    src: &Parameter,
    sink: &Parameter,
    base_msg: &str,
    link_merge: Option<LinkMerge>,
    sink_step: Option<&Step>,
) -> Option<String> {
    let src_ty = src.ty();
    let sink_ty = sink.ty();

    if let (TypeKind::FileT(src_file), TypeKind::FileT(sink_file)) = (&src_ty.kind, &sink_ty.kind) {
        let missing: Vec<&str> = sink_file
            .secondary_files
            .iter()
            .filter(|p| p.required)
            .filter(|p| !src_file.secondary_files.iter().any(|sp| sp.pattern == p.pattern))
            .map(|p| p.pattern.as_str())
            .collect();
        if !missing.is_empty() {
            return Some(format!(
                "{}\n  {}\n  {}\n  {}",
                sink.source_ref.format(
                    &format!(
                        "sink requires secondary files {missing:?} not provided by source '{}'",
                        src.id
                    ),
                    &sink.id,
                ),
                src.source_ref.format(&format!("source '{}' declared here", src.id), &src.id),
                src.source_ref.format("source secondaryFiles declared here", "secondaryFiles"),
                sink.source_ref.format("sink secondaryFiles declared here", "secondaryFiles"),
            ));
        }
    }

    if sink_ty.not_connected {
        if sink.used_by_step {
            return None;
        }
        let run = sink_step.map(|s| s.run.as_str()).unwrap_or("<unknown>");
        let expected: Vec<&str> = sink_step
            .map(|s| {
                s.inputs
                    .iter()
                    .filter(|i| !i.not_connected)
                    .map(|i| i.name.as_str())
                    .collect()
            })
            .unwrap_or_default();
        return Some(sink.source_ref.format(
            &format!(
                "'{}' is not an input parameter of '{run}', expected {}",
                short_name(&sink.id),
                expected.join(", ")
            ),
            &sink.id,
        ));
    }

    let mut message = sink.source_ref.format(
        &format!(
            "Source '{}' of type '{src_ty}' may be incompatible with sink '{}' of type '{sink_ty}'",
            src.id, sink.id
        ),
        &sink.id,
    );
    if let Some(lm) = link_merge {
        message.push_str(&format!("\n  source has linkMerge method {lm:?}"));
    }
    if !base_msg.is_empty() {
        message.push_str(&format!("\n  {base_msg}"));
    }
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PlainSourceRef, SourceIds, StepInputSummary};

    fn src_ref(tag: &str) -> Rc<dyn crate::model::SourceRef> {
        Rc::new(PlainSourceRef(tag.to_string()))
    }

    #[test]
    fn plain_compatible_edge_has_no_diagnostics() {
        let wf_input = Rc::new(Parameter::new("wf#in", Type::new(TypeKind::Int), src_ref("wf#in")));
        let step_in = Rc::new(
            Parameter::new("wf#s1/in", Type::new(TypeKind::Int), src_ref("wf#s1/in"))
                .with_source(SourceIds::Single("wf#in".to_string())),
        );
        let param_to_step = HashMap::new();
        let result = static_check(&[wf_input], &[], &[step_in], &[], &param_to_step);
        assert!(result.is_ok());
    }

    #[test]
    fn missing_required_parameter_is_an_exception() {
        let step_in = Rc::new(Parameter::new(
            "wf#s1/in",
            Type::new(TypeKind::Int),
            src_ref("wf#s1/in"),
        ));
        let param_to_step = HashMap::new();
        let err = static_check(&[], &[], &[step_in], &[], &param_to_step).unwrap_err();
        assert_eq!(err.kind, CheckerErrorKind::TypeMismatch);
        assert!(err.context[0].contains("does not have source"));
    }

    #[test]
    fn unresolved_source_id_raises_missing_source_immediately() {
        let step_in = Rc::new(
            Parameter::new("wf#s1/in", Type::new(TypeKind::Int), src_ref("wf#s1/in"))
                .with_source(SourceIds::Single("wf#nope".to_string())),
        );
        let param_to_step = HashMap::new();
        let err = static_check(&[], &[], &[step_in], &[], &param_to_step).unwrap_err();
        assert_eq!(err.kind, CheckerErrorKind::MissingSource);
    }

    #[test]
    fn conditional_source_promotes_sink_type_in_place() {
        let step_out = Rc::new(Parameter::new("wf#s1/out", Type::new(TypeKind::Int), src_ref("wf#s1/out")));
        let step_in = Rc::new(
            Parameter::new("wf#s2/in", Type::new(TypeKind::Int), src_ref("wf#s2/in"))
                .with_source(SourceIds::Single("wf#s1/out".to_string())),
        );
        let conditional_step = Rc::new(Step {
            id: "wf#s1".to_string(),
            when: Some("expr".to_string()),
            has_loop: false,
            output_method: None,
            scatter: None,
            inputs: vec![StepInputSummary {
                name: "in".to_string(),
                not_connected: false,
            }],
            run: "tool".to_string(),
            source_ref: src_ref("wf#s1"),
        });
        let mut param_to_step = HashMap::new();
        param_to_step.insert("wf#s1/out".to_string(), Rc::clone(&conditional_step));

        let result = static_check(&[], &[], &[step_in], &[step_out.clone()], &param_to_step);
        assert!(result.is_ok());
        assert!(matches!(step_out.ty().kind, TypeKind::Union(_)));
    }

    #[test]
    fn pick_value_with_single_source_warns() {
        let wf_input = Rc::new(Parameter::new("wf#in", Type::new(TypeKind::Int), src_ref("wf#in")));
        let step_in = Rc::new(
            Parameter::new("wf#s1/in", Type::new(TypeKind::Int), src_ref("wf#s1/in"))
                .with_source(SourceIds::Single("wf#in".to_string()))
                .with_pick_value(PickValue::FirstNonNull),
        );
        let param_to_step = HashMap::new();
        assert!(static_check(&[wf_input], &[], &[step_in], &[], &param_to_step).is_ok());
    }

    #[test]
    fn adjacent_duplicate_exception_lines_are_collapsed() {
        let missing_a = Rc::new(Parameter::new(
            "wf#s1/in",
            Type::new(TypeKind::Int),
            src_ref("wf#s1/in"),
        ));
        let missing_b = Rc::new(Parameter::new(
            "wf#s1/in",
            Type::new(TypeKind::Int),
            src_ref("wf#s1/in"),
        ));
        let param_to_step = HashMap::new();
        let err =
            static_check(&[], &[], &[missing_a, missing_b], &[], &param_to_step).unwrap_err();
        assert_eq!(err.kind, CheckerErrorKind::TypeMismatch);
        assert_eq!(err.context.len(), 1);
    }
}
