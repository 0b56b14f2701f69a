//! Diagnostic formatting: two output streams (warnings, exceptions), each
//! deduplicated so identical adjacent lines collapse into one, and rendered
//! as a single bulleted block for the caller.

/// Collapse adjacent identical lines. Two diagnostics anchored at the same
/// source line often repeat that anchor text verbatim; only the first of a
/// run survives.
pub fn dedup_source_lines(lines: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if out.last() != Some(line) {
            out.push(line.clone());
        }
    }
    out
}

fn format_block(header: &str, lines: &[String]) -> String {
    let deduped = dedup_source_lines(lines);
    let mut out = String::from(header);
    for (i, line) in deduped.iter().enumerate() {
        out.push('\n');
        if i == 0 {
            out.push_str("- ");
        } else {
            out.push_str("  ");
        }
        out.push_str(line);
    }
    out
}

pub fn format_warning_block(lines: &[String]) -> String {
    format_block("Workflow contains type mismatches that may be compatible at runtime:", lines)
}

pub fn format_exception_block(lines: &[String]) -> String {
    format_block("Workflow contains incompatible types:", lines)
}
