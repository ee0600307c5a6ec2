//! HTML result document emission and the auxiliary tag-slice extractors
//! (`ecom`, `edat`, `elog`, `emes`, `emod`) that filter lines between a
//! pair of matching HTML comment tags, equivalent to a simple `sed` slice.

use build_html::{Html, HtmlPage};

use crate::parameter_space::ParameterSpace;

/// One row of the optional trace log: generation, fitness, and the
/// smallest/largest per-axis step at that point.
#[derive(Debug, Clone, Copy)]
pub struct TraceRow {
    pub generation: usize,
    pub cost: f64,
    pub min_step: f64,
    pub max_step: f64,
}

#[derive(Debug, Clone)]
pub struct ResultDocument<'a> {
    pub command: String,
    pub model_text: &'a str,
    pub trace: &'a [TraceRow],
    pub message: String,
}

fn wrap(tag: &str, body: &str) -> String {
    format!("<!-- <{tag}> -->\n{body}\n<!-- </{tag}> -->\n")
}

fn command_block(command: &str) -> String {
    wrap("command", &html_escape(command))
}

fn model_block(model_text: &str) -> String {
    wrap("model", &format!("<pre>{}</pre>", html_escape(model_text)))
}

fn log_block(trace: &[TraceRow]) -> String {
    let mut lines = String::new();
    for row in trace {
        lines.push_str(&format!("{} {:.6e} {:.6e} {:.6e}\n", row.generation, row.cost, row.min_step, row.max_step));
    }
    wrap("log", &format!("<pre>{}</pre>", html_escape(&lines)))
}

fn message_block(message: &str) -> String {
    format!("<message>{}</message>\n", html_escape(message))
}

fn data_block(space: &ParameterSpace) -> String {
    let mut rows = String::new();
    for section in space.sections() {
        for i in 0..section.len() {
            let norm_flux = section.flux[i] / section.continuum[i].max(f64::MIN_POSITIVE);
            let norm_unc = section.uncertainty[i] / section.continuum[i].max(f64::MIN_POSITIVE);
            rows.push_str(&format!(
                "{} {} {} {} {} {} {} {} {} {} {} {} {} {}\n",
                section.id,
                section.wavelength[i],
                section.flux[i],
                section.uncertainty[i],
                section.mask[i] as u8,
                section.optical_depth[i],
                section.transmittance[i],
                section.convolved[i],
                section.continuum[i],
                section.model_flux[i],
                section.model_flux[i],
                section.residual[i],
                norm_flux,
                norm_unc,
            ));
        }
    }
    wrap("data", &format!("<pre>{}</pre>", html_escape(&rows)))
}

fn parameter_tables(space: &ParameterSpace) -> String {
    let mut html = String::from("<h2>Parameters</h2>\n<table border=\"1\">\n<tr><th>slot</th><th>value</th><th>uncertainty</th></tr>\n");
    for slot in space.slots() {
        html.push_str(&format!("<tr><td>{}</td><td>{:.6}</td><td>{:.6}</td></tr>\n", html_escape(&slot.id), slot.value, slot.uncertainty));
    }
    html.push_str("</table>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Render the full result document: command echo, model echo, trace log,
/// per-sample data table, status message, and parameter tables.
pub fn render(doc: &ResultDocument, space: &ParameterSpace) -> String {
    let body = format!(
        "{}{}{}{}{}{}",
        command_block(&doc.command),
        model_block(doc.model_text),
        log_block(doc.trace),
        data_block(space),
        message_block(&doc.message),
        parameter_tables(space),
    );
    HtmlPage::new().with_title("specfit result").with_raw(body).to_html_string()
}

fn extract_tag(html: &str, tag: &str) -> String {
    let open = format!("<!-- <{tag}> -->");
    let close = format!("<!-- </{tag}> -->");
    match (html.find(&open), html.find(&close)) {
        (Some(start), Some(end)) if start < end => {
            let inner_start = start + open.len();
            html[inner_start..end].trim_matches('\n').to_string()
        }
        _ => String::new(),
    }
}

pub fn ecom(html: &str) -> String {
    extract_tag(html, "command")
}

pub fn edat(html: &str) -> String {
    extract_tag(html, "data")
}

pub fn elog(html: &str) -> String {
    extract_tag(html, "log")
}

pub fn emod(html: &str) -> String {
    extract_tag(html, "model")
}

pub fn emes(html: &str) -> String {
    match (html.find("<message>"), html.find("</message>")) {
        (Some(start), Some(end)) if start < end => html[start + "<message>".len()..end].to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extractors_round_trip_their_own_block() {
        let html = format!("{}{}", command_block("specfit 1 4 8"), message_block("optimisation completed"));
        assert_eq!(ecom(&html).trim(), "specfit 1 4 8");
        assert_eq!(emes(&html), "optimisation completed");
    }

    #[test]
    fn missing_tag_yields_empty_string() {
        assert_eq!(edat("<html></html>"), "");
    }
}
