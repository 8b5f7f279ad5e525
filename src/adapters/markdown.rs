use super::{guard_path, io_error, require_existing, AdapterError};
use crate::config::Settings;
use crate::shared::fs_atomic::atomic_write_file;
use pulldown_cmark::{html, Options, Parser};
use std::fs;
use std::path::Path;

/// The narrow rendering seam: markdown text in, HTML text out.
pub fn render(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut output = String::new();
    html::push_html(&mut output, parser);
    output
}

pub fn convert_to_html(
    settings: &Settings,
    md_path: &str,
    output_path: &str,
) -> Result<(), AdapterError> {
    let source = guard_path(settings, Path::new(md_path))?;
    let target = guard_path(settings, Path::new(output_path))?;
    require_existing(&source)?;

    let markdown = fs::read_to_string(source.as_path())
        .map_err(|source_err| io_error(source.as_path(), source_err))?;
    let rendered = render(&markdown);

    atomic_write_file(target.as_path(), rendered.as_bytes())
        .map_err(|source_err| io_error(target.as_path(), source_err))
}
