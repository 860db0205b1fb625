use std::io::Write;

use anyhow::Result;

use super::{Report, Section};

const PAGE_TITLE: &str = "Southern Africa Buildings Census and Recent Storms";
const HEADING: &str = "Southern Africa Buildings Census";
const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

/// Write the whole report page.
pub(crate) fn write_report<W: Write>(writer: &mut W, report: &Report) -> Result<()> {
    write_html_header(writer, report.country())?;
    for (i, section) in report.sections().iter().enumerate() {
        write_section(writer, i, section)?;
    }
    write_html_footer(writer)
}

pub(crate) fn write_html_header<W: Write>(writer: &mut W, country: &str) -> Result<()> {
    writeln!(writer, r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{PAGE_TITLE}</title>
<script src="{PLOTLY_JS}" charset="utf-8"></script>
<style>
    body {{ font-family: sans-serif; max-width: 960px; margin: 0 auto; padding: 1rem; color: #111827; }}
    .figure {{ width: 100%; min-height: 300px; margin-bottom: 2rem; }}
</style>
</head>
<body>
<h1>{HEADING}</h1>
<h2>{}</h2>"#, escape_html(country))?;
    Ok(())
}

pub(crate) fn write_section<W: Write>(writer: &mut W, index: usize, section: &Section) -> Result<()> {
    if let Some(heading) = section.heading {
        writeln!(writer, "<h3>{heading}</h3>")?;
    }
    for note in &section.notes {
        writeln!(writer, "<p>{note}</p>")?;
    }

    let id = format!("figure-{index}");
    writeln!(writer, r#"<div id="{id}" class="figure" title="{}"></div>"#, escape_html(&section.title))?;
    writeln!(writer, "<script>")?;
    writeln!(writer, "Plotly.newPlot({:?}, {}, {}, {{\"responsive\": true}});",
        id,
        script_json(&section.figure.data)?,
        script_json(&section.figure.layout)?,
    )?;
    writeln!(writer, "</script>")?;
    Ok(())
}

pub(crate) fn write_html_footer<W: Write>(writer: &mut W) -> Result<()> {
    writeln!(writer, "</body>\n</html>")?;
    Ok(())
}

/// Serialise for embedding in a <script> block; a "</" inside a string would end the block.
pub(crate) fn script_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
